//! Chunked AEAD framing shared by the cipher adapters.
//!
//! Plaintext is re-chunked to a fixed size and every chunk is sealed as
//! one frame:
//!
//! ```text
//! wire:  length (u32 BE) || nonce || ciphertext+tag
//! plain: index (u64 BE)  || last flag (u8) || chunk bytes
//! ```
//!
//! The frame index and last flag ride inside the authenticated plaintext,
//! so reordered frames, a truncated stream, and bytes appended after the
//! final frame all fail verification. A frame is fully verified before
//! its chunk is yielded; no unauthenticated plaintext ever reaches the
//! caller.

use chacha20poly1305::aead::generic_array::typenum::Unsigned;
use chacha20poly1305::aead::{Aead, AeadCore, Nonce, OsRng};

use crate::capability::ByteChunks;
use ezseal_common::{Error, Result};

/// Bytes of frame metadata sealed ahead of each chunk: index + last flag.
const FRAME_META_LEN: usize = 9;
/// Size of the per-frame length prefix.
const LENGTH_PREFIX_LEN: usize = 4;

fn nonce_len<A: AeadCore>() -> usize {
    A::NonceSize::to_usize()
}

fn tag_len<A: AeadCore>() -> usize {
    A::TagSize::to_usize()
}

/// Lazily encrypts a plaintext chunk sequence into wire frames.
pub(crate) struct FrameEncryptor<A: Aead + AeadCore> {
    aead: A,
    chunk_size: usize,
    input: Option<ByteChunks>,
    buf: Vec<u8>,
    index: u64,
    done: bool,
}

impl<A: Aead + AeadCore> FrameEncryptor<A> {
    pub(crate) fn new(aead: A, chunk_size: usize, input: ByteChunks) -> Self {
        Self {
            aead,
            chunk_size: chunk_size.max(1),
            input: Some(input),
            buf: Vec::new(),
            index: 0,
            done: false,
        }
    }

    fn fill_buf(&mut self) -> Result<()> {
        while self.buf.len() < self.chunk_size {
            let Some(input) = self.input.as_mut() else {
                break;
            };
            match input.next() {
                Some(chunk) => self.buf.extend_from_slice(&chunk?),
                None => {
                    self.input = None;
                    break;
                }
            }
        }
        Ok(())
    }

    fn seal_next(&mut self) -> Result<Vec<u8>> {
        self.fill_buf()?;

        let take = self.buf.len().min(self.chunk_size);
        let chunk: Vec<u8> = self.buf.drain(..take).collect();
        let last = self.input.is_none() && self.buf.is_empty();

        let mut plain = Vec::with_capacity(FRAME_META_LEN + chunk.len());
        plain.extend_from_slice(&self.index.to_be_bytes());
        plain.push(u8::from(last));
        plain.extend_from_slice(&chunk);

        let nonce = A::generate_nonce(&mut OsRng);
        let sealed = self
            .aead
            .encrypt(&nonce, plain.as_slice())
            .map_err(|_| Error::Crypto("frame encryption failed".to_string()))?;

        let body_len = nonce.len() + sealed.len();
        let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + body_len);
        frame.extend_from_slice(&(body_len as u32).to_be_bytes());
        frame.extend_from_slice(&nonce);
        frame.extend_from_slice(&sealed);

        self.index += 1;
        if last {
            self.done = true;
        }
        Ok(frame)
    }
}

impl<A: Aead + AeadCore> Iterator for FrameEncryptor<A> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.seal_next() {
            Ok(frame) => Some(Ok(frame)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Lazily decrypts wire frames back into verified plaintext chunks.
pub(crate) struct FrameDecryptor<A: Aead + AeadCore> {
    aead: A,
    input: ChunkCursor,
    index: u64,
    max_body_len: usize,
    done: bool,
}

impl<A: Aead + AeadCore> FrameDecryptor<A> {
    pub(crate) fn new(aead: A, chunk_size: usize, input: ByteChunks) -> Self {
        Self {
            aead,
            input: ChunkCursor::new(input),
            index: 0,
            max_body_len: nonce_len::<A>() + tag_len::<A>() + FRAME_META_LEN + chunk_size.max(1),
            done: false,
        }
    }

    fn open_next(&mut self) -> Result<Vec<u8>> {
        let length_bytes = match self.input.read_exact(LENGTH_PREFIX_LEN)? {
            Some(bytes) => bytes,
            // End of stream before the last-flagged frame.
            None => return Err(Error::Authentication("ciphertext truncated".to_string())),
        };
        let body_len = u32::from_be_bytes(length_bytes.try_into().expect("exact read")) as usize;

        let min_body_len = nonce_len::<A>() + tag_len::<A>() + FRAME_META_LEN;
        if body_len < min_body_len || body_len > self.max_body_len {
            return Err(Error::Authentication("invalid frame length".to_string()));
        }

        let body = self
            .input
            .read_exact(body_len)?
            .ok_or_else(|| Error::Authentication("ciphertext truncated".to_string()))?;
        let (nonce_bytes, sealed) = body.split_at(nonce_len::<A>());
        let nonce = Nonce::<A>::from_slice(nonce_bytes);

        let plain = self
            .aead
            .decrypt(nonce, sealed)
            .map_err(|_| Error::Authentication("frame authentication failed".to_string()))?;
        if plain.len() < FRAME_META_LEN {
            return Err(Error::Authentication("invalid frame format".to_string()));
        }

        let index = u64::from_be_bytes(plain[..8].try_into().expect("exact slice"));
        if index != self.index {
            return Err(Error::Authentication("frame order mismatch".to_string()));
        }
        let last = match plain[8] {
            0 => false,
            1 => true,
            _ => return Err(Error::Authentication("invalid frame format".to_string())),
        };

        self.index += 1;
        if last {
            if !self.input.is_exhausted()? {
                return Err(Error::Authentication(
                    "trailing data after final frame".to_string(),
                ));
            }
            self.done = true;
        }
        Ok(plain[FRAME_META_LEN..].to_vec())
    }
}

impl<A: Aead + AeadCore> Iterator for FrameDecryptor<A> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.open_next() {
            Ok(chunk) => Some(Ok(chunk)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read-exact view over a chunk sequence with arbitrary chunk boundaries.
struct ChunkCursor {
    input: Option<ByteChunks>,
    pending: Vec<u8>,
    pos: usize,
}

impl ChunkCursor {
    fn new(input: ByteChunks) -> Self {
        Self {
            input: Some(input),
            pending: Vec::new(),
            pos: 0,
        }
    }

    fn refill(&mut self) -> Result<bool> {
        loop {
            let Some(input) = self.input.as_mut() else {
                return Ok(false);
            };
            match input.next() {
                Some(chunk) => {
                    let chunk = chunk?;
                    if chunk.is_empty() {
                        continue;
                    }
                    self.pending = chunk;
                    self.pos = 0;
                    return Ok(true);
                }
                None => {
                    self.input = None;
                    return Ok(false);
                }
            }
        }
    }

    /// Read exactly `n` bytes. `Ok(None)` on a clean end of stream before
    /// the first byte; a partial read is an authentication failure since
    /// the stream ended inside a frame.
    fn read_exact(&mut self, n: usize) -> Result<Option<Vec<u8>>> {
        let mut out = Vec::with_capacity(n.min(1 << 16));
        while out.len() < n {
            if self.pos < self.pending.len() {
                let take = (n - out.len()).min(self.pending.len() - self.pos);
                out.extend_from_slice(&self.pending[self.pos..self.pos + take]);
                self.pos += take;
                continue;
            }
            if !self.refill()? {
                if out.is_empty() {
                    return Ok(None);
                }
                return Err(Error::Authentication("ciphertext truncated".to_string()));
            }
        }
        Ok(Some(out))
    }

    /// True once no further bytes can be produced.
    fn is_exhausted(&mut self) -> Result<bool> {
        if self.pos < self.pending.len() {
            return Ok(false);
        }
        Ok(!self.refill()?)
    }
}
