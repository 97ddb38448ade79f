//! Authenticated cipher adapters.
//!
//! Two AEAD adapters over the shared chunked framing: AES-256-GCM and
//! XChaCha20-Poly1305. XChaCha20-Poly1305 carries a 24-byte nonce that is
//! safe for random generation at high volume; AES-256-GCM is provided for
//! interoperability and hardware acceleration.

use aes_gcm::Aes256Gcm;
use chacha20poly1305::aead::KeyInit;
use chacha20poly1305::XChaCha20Poly1305;
use serde_json::{json, Value};

use crate::capability::{ByteChunks, Cipher};
use crate::frame::{FrameDecryptor, FrameEncryptor};
use crate::keys::{DerivedKey, KEY_LENGTH};
use ezseal_common::{Error, Result};

/// Algorithm name of the AES-256-GCM adapter.
pub const AES_256_GCM: &str = "aes-256-gcm";
/// Algorithm name of the XChaCha20-Poly1305 adapter.
pub const XCHACHA20_POLY1305: &str = "xchacha20-poly1305";

/// Default plaintext chunk size per frame (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
/// Upper bound accepted for a deserialized chunk size (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

fn chunk_size_from(record: &Value) -> Result<usize> {
    let chunk_size = record
        .get("chunk_size")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::MalformedHeader("cipher chunk_size missing".to_string()))?;
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE as u64 {
        return Err(Error::MalformedHeader(format!(
            "cipher chunk_size out of range: {chunk_size}"
        )));
    }
    Ok(chunk_size as usize)
}

fn check_key(key: &DerivedKey) -> Result<()> {
    if key.len() != KEY_LENGTH {
        return Err(Error::Crypto(format!(
            "invalid key length: expected {KEY_LENGTH}, got {}",
            key.len()
        )));
    }
    Ok(())
}

/// AES-256-GCM cipher adapter.
pub struct Aes256GcmCipher {
    chunk_size: usize,
}

impl Aes256GcmCipher {
    /// Create an adapter with the default chunk size.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set a custom plaintext chunk size per frame.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    /// Reconstruct an adapter from its serialized header record.
    pub fn deserialize(record: &Value) -> Result<Self> {
        Ok(Self {
            chunk_size: chunk_size_from(record)?,
        })
    }
}

impl Default for Aes256GcmCipher {
    fn default() -> Self {
        Self::new()
    }
}

impl Cipher for Aes256GcmCipher {
    fn algorithm(&self) -> &'static str {
        AES_256_GCM
    }

    fn key_length(&self) -> usize {
        KEY_LENGTH
    }

    fn encrypt(&self, key: &DerivedKey, plaintext: ByteChunks) -> Result<ByteChunks> {
        check_key(key)?;
        let aead = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| Error::Crypto("invalid key length".to_string()))?;
        Ok(Box::new(FrameEncryptor::new(aead, self.chunk_size, plaintext)))
    }

    fn decrypt(&self, key: &DerivedKey, ciphertext: ByteChunks) -> Result<ByteChunks> {
        check_key(key)?;
        let aead = Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|_| Error::Crypto("invalid key length".to_string()))?;
        Ok(Box::new(FrameDecryptor::new(aead, self.chunk_size, ciphertext)))
    }

    fn serialize(&self) -> Result<Value> {
        Ok(json!({
            "algorithm": AES_256_GCM,
            "chunk_size": self.chunk_size,
        }))
    }
}

/// XChaCha20-Poly1305 cipher adapter.
pub struct XChaCha20Poly1305Cipher {
    chunk_size: usize,
}

impl XChaCha20Poly1305Cipher {
    /// Create an adapter with the default chunk size.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set a custom plaintext chunk size per frame.
    pub fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.clamp(1, MAX_CHUNK_SIZE);
        self
    }

    /// Reconstruct an adapter from its serialized header record.
    pub fn deserialize(record: &Value) -> Result<Self> {
        Ok(Self {
            chunk_size: chunk_size_from(record)?,
        })
    }
}

impl Default for XChaCha20Poly1305Cipher {
    fn default() -> Self {
        Self::new()
    }
}

impl Cipher for XChaCha20Poly1305Cipher {
    fn algorithm(&self) -> &'static str {
        XCHACHA20_POLY1305
    }

    fn key_length(&self) -> usize {
        KEY_LENGTH
    }

    fn encrypt(&self, key: &DerivedKey, plaintext: ByteChunks) -> Result<ByteChunks> {
        check_key(key)?;
        let aead = XChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|_| Error::Crypto("invalid key length".to_string()))?;
        Ok(Box::new(FrameEncryptor::new(aead, self.chunk_size, plaintext)))
    }

    fn decrypt(&self, key: &DerivedKey, ciphertext: ByteChunks) -> Result<ByteChunks> {
        check_key(key)?;
        let aead = XChaCha20Poly1305::new_from_slice(key.as_bytes())
            .map_err(|_| Error::Crypto("invalid key length".to_string()))?;
        Ok(Box::new(FrameDecryptor::new(aead, self.chunk_size, ciphertext)))
    }

    fn serialize(&self) -> Result<Value> {
        Ok(json!({
            "algorithm": XCHACHA20_POLY1305,
            "chunk_size": self.chunk_size,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_key() -> DerivedKey {
        DerivedKey::from_bytes(vec![42u8; KEY_LENGTH])
    }

    fn chunks_of(data: &[u8]) -> ByteChunks {
        Box::new(std::iter::once(Ok(data.to_vec())))
    }

    fn collect(chunks: ByteChunks) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for chunk in chunks {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }

    fn roundtrip(cipher: &dyn Cipher, plaintext: &[u8]) -> Result<Vec<u8>> {
        let key = test_key();
        let sealed = collect(cipher.encrypt(&key, chunks_of(plaintext))?)?;
        collect(cipher.decrypt(&key, chunks_of(&sealed))?)
    }

    #[test]
    fn test_aes_roundtrip() {
        let cipher = Aes256GcmCipher::new();
        let plaintext = b"Hello, World!";
        assert_eq!(roundtrip(&cipher, plaintext).unwrap(), plaintext);
    }

    #[test]
    fn test_xchacha_roundtrip() {
        let cipher = XChaCha20Poly1305Cipher::new();
        let plaintext = b"Hello, World!";
        assert_eq!(roundtrip(&cipher, plaintext).unwrap(), plaintext);
    }

    #[test]
    fn test_empty_plaintext_roundtrip() {
        let cipher = XChaCha20Poly1305Cipher::new();
        assert_eq!(roundtrip(&cipher, b"").unwrap(), b"");
    }

    #[test]
    fn test_multi_frame_roundtrip() {
        let cipher = XChaCha20Poly1305Cipher::new().with_chunk_size(16);
        let plaintext = vec![0xAB; 1000];
        assert_eq!(roundtrip(&cipher, &plaintext).unwrap(), plaintext);
    }

    #[test]
    fn test_exact_chunk_boundary_roundtrip() {
        let cipher = XChaCha20Poly1305Cipher::new().with_chunk_size(16);
        let plaintext = vec![0xCD; 64];
        assert_eq!(roundtrip(&cipher, &plaintext).unwrap(), plaintext);
    }

    #[test]
    fn test_fresh_nonce_each_call() {
        let cipher = XChaCha20Poly1305Cipher::new();
        let key = test_key();
        let ct1 = collect(cipher.encrypt(&key, chunks_of(b"same")).unwrap()).unwrap();
        let ct2 = collect(cipher.encrypt(&key, chunks_of(b"same")).unwrap()).unwrap();
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_tampered_frame_fails_before_yield() {
        let cipher = XChaCha20Poly1305Cipher::new();
        let key = test_key();
        let mut sealed = collect(cipher.encrypt(&key, chunks_of(b"Important data")).unwrap()).unwrap();
        if let Some(last) = sealed.last_mut() {
            *last ^= 0xFF;
        }
        let err = collect(cipher.decrypt(&key, chunks_of(&sealed)).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_truncated_stream_fails() {
        let cipher = XChaCha20Poly1305Cipher::new();
        let key = test_key();
        let mut sealed = collect(cipher.encrypt(&key, chunks_of(b"Important data")).unwrap()).unwrap();
        sealed.truncate(sealed.len() - 5);
        let err = collect(cipher.decrypt(&key, chunks_of(&sealed)).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_trailing_data_fails() {
        let cipher = XChaCha20Poly1305Cipher::new();
        let key = test_key();
        let mut sealed = collect(cipher.encrypt(&key, chunks_of(b"payload")).unwrap()).unwrap();
        sealed.extend_from_slice(b"garbage");
        let err = collect(cipher.decrypt(&key, chunks_of(&sealed)).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_reordered_frames_fail() {
        let cipher = XChaCha20Poly1305Cipher::new().with_chunk_size(4);
        let key = test_key();
        let sealed = collect(cipher.encrypt(&key, chunks_of(b"12345678")).unwrap()).unwrap();

        // Split the wire stream back into its length-prefixed frames.
        let mut frames = Vec::new();
        let mut offset = 0;
        while offset < sealed.len() {
            let len = u32::from_be_bytes(sealed[offset..offset + 4].try_into().unwrap()) as usize;
            frames.push(sealed[offset..offset + 4 + len].to_vec());
            offset += 4 + len;
        }
        assert!(frames.len() >= 2);
        frames.swap(0, 1);

        let swapped: Vec<u8> = frames.concat();
        let err = collect(cipher.decrypt(&key, chunks_of(&swapped)).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_wrong_key_fails() {
        let cipher = Aes256GcmCipher::new();
        let sealed = collect(
            cipher
                .encrypt(&test_key(), chunks_of(b"Secret data"))
                .unwrap(),
        )
        .unwrap();
        let other = DerivedKey::from_bytes(vec![43u8; KEY_LENGTH]);
        let err = collect(cipher.decrypt(&other, chunks_of(&sealed)).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Authentication(_)));
    }

    #[test]
    fn test_invalid_key_length() {
        let cipher = Aes256GcmCipher::new();
        let short = DerivedKey::from_bytes(vec![0u8; 16]);
        assert!(cipher.encrypt(&short, chunks_of(b"data")).is_err());
    }

    #[test]
    fn test_chunked_input_matches_flat_length() {
        let cipher = XChaCha20Poly1305Cipher::new().with_chunk_size(16);
        let key = test_key();
        let data = vec![7u8; 100];

        let flat = collect(cipher.encrypt(&key, chunks_of(&data)).unwrap()).unwrap();
        let split: ByteChunks = Box::new(data.chunks(13).map(|c| Ok(c.to_vec())).collect::<Vec<_>>().into_iter());
        let chunked = collect(cipher.encrypt(&key, split).unwrap()).unwrap();

        assert_eq!(flat.len(), chunked.len());
        assert_eq!(collect(cipher.decrypt(&key, chunks_of(&chunked)).unwrap()).unwrap(), data);
    }

    #[test]
    fn test_deserialize_rejects_bad_chunk_size() {
        let record = json!({ "algorithm": AES_256_GCM, "chunk_size": 0 });
        assert!(matches!(
            Aes256GcmCipher::deserialize(&record).err().unwrap(),
            Error::MalformedHeader(_)
        ));

        let record = json!({ "algorithm": AES_256_GCM });
        assert!(matches!(
            Aes256GcmCipher::deserialize(&record).err().unwrap(),
            Error::MalformedHeader(_)
        ));
    }

    proptest! {
        #[test]
        fn prop_roundtrip_arbitrary_payloads(
            data in proptest::collection::vec(any::<u8>(), 0..2048),
            chunk_size in 1usize..256,
        ) {
            let cipher = XChaCha20Poly1305Cipher::new().with_chunk_size(chunk_size);
            prop_assert_eq!(roundtrip(&cipher, &data).unwrap(), data);
        }
    }
}
