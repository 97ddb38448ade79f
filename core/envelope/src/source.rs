//! Uniform pull-based reading over the supported input shapes.
//!
//! The envelope codec never branches on where its bytes come from: a flat
//! buffer, a pre-chunked sequence, and a filesystem path all present the
//! same two operations: read exactly what the header parse needs, then
//! hand the remainder to the cipher as a chunk sequence.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use ezseal_common::Result;
use ezseal_crypto::ByteChunks;

/// Chunk size used when draining file-backed sources (64 KiB).
pub const FILE_CHUNK_SIZE: usize = 64 * 1024;

/// An input accepted by the envelope codec.
pub enum Input {
    /// A flat in-memory buffer.
    Bytes(Vec<u8>),
    /// A pre-chunked sequence of buffers; original chunk boundaries are
    /// preserved when the remainder is drained.
    Chunks(Box<dyn Iterator<Item = Vec<u8>> + Send>),
    /// A filesystem path, opened when the reader is constructed.
    Path(PathBuf),
}

impl Input {
    /// Input from a flat buffer.
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    /// Input from a chunk sequence.
    pub fn chunks<I>(chunks: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
        I::IntoIter: Send + 'static,
    {
        Self::Chunks(Box::new(chunks.into_iter()))
    }

    /// Input from a filesystem path.
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }
}

impl From<Vec<u8>> for Input {
    fn from(data: Vec<u8>) -> Self {
        Self::Bytes(data)
    }
}

impl From<&[u8]> for Input {
    fn from(data: &[u8]) -> Self {
        Self::Bytes(data.to_vec())
    }
}

impl From<PathBuf> for Input {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for Input {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

enum Source {
    Exhausted,
    Chunks(Box<dyn Iterator<Item = Vec<u8>> + Send>),
    File(File),
}

/// Buffered pull-based reader over an [`Input`].
///
/// Any file handle opened to satisfy the abstraction is owned by the
/// reader and, after [`SourceReader::into_chunks`], by the returned
/// iterator; dropping either, on normal completion or early
/// termination, releases it.
pub struct SourceReader {
    pending: Vec<u8>,
    pos: usize,
    source: Source,
}

impl SourceReader {
    /// Open a reader over the given input.
    ///
    /// # Errors
    /// - I/O error if a path input cannot be opened
    pub fn open(input: Input) -> Result<Self> {
        let (pending, source) = match input {
            Input::Bytes(data) => (data, Source::Exhausted),
            Input::Chunks(iter) => (Vec::new(), Source::Chunks(iter)),
            Input::Path(path) => (Vec::new(), Source::File(File::open(path)?)),
        };
        Ok(Self {
            pending,
            pos: 0,
            source,
        })
    }

    /// Read up to `n` bytes.
    ///
    /// Returns fewer than `n` bytes only at end-of-stream, and an empty
    /// buffer only when the input is exhausted.
    pub fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(n.min(FILE_CHUNK_SIZE));
        while out.len() < n {
            if self.pos < self.pending.len() {
                let take = (n - out.len()).min(self.pending.len() - self.pos);
                out.extend_from_slice(&self.pending[self.pos..self.pos + take]);
                self.pos += take;
                continue;
            }
            if !self.refill()? {
                break;
            }
        }
        Ok(out)
    }

    fn refill(&mut self) -> Result<bool> {
        loop {
            match &mut self.source {
                Source::Exhausted => return Ok(false),
                Source::Chunks(iter) => match iter.next() {
                    Some(chunk) if chunk.is_empty() => continue,
                    Some(chunk) => {
                        self.pending = chunk;
                        self.pos = 0;
                        return Ok(true);
                    }
                    None => {
                        self.source = Source::Exhausted;
                        return Ok(false);
                    }
                },
                Source::File(file) => {
                    let mut buf = vec![0u8; FILE_CHUNK_SIZE];
                    let read = file.read(&mut buf)?;
                    if read == 0 {
                        self.source = Source::Exhausted;
                        return Ok(false);
                    }
                    buf.truncate(read);
                    self.pending = buf;
                    self.pos = 0;
                    return Ok(true);
                }
            }
        }
    }

    /// Hand off all remaining unread bytes as a chunk sequence.
    ///
    /// Pre-chunked sources keep their original chunk boundaries;
    /// file-backed sources are drained in [`FILE_CHUNK_SIZE`] chunks; any
    /// partially consumed buffer is yielded first.
    pub fn into_chunks(self) -> ByteChunks {
        let leftover = if self.pos < self.pending.len() {
            Some(self.pending[self.pos..].to_vec())
        } else {
            None
        };
        let rest: ByteChunks = match self.source {
            Source::Exhausted => Box::new(std::iter::empty()),
            Source::Chunks(iter) => Box::new(iter.map(Ok)),
            Source::File(file) => Box::new(FileChunks { file: Some(file) }),
        };
        Box::new(leftover.map(Ok).into_iter().chain(rest))
    }
}

struct FileChunks {
    file: Option<File>,
}

impl Iterator for FileChunks {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let file = self.file.as_mut()?;
        let mut buf = vec![0u8; FILE_CHUNK_SIZE];
        match file.read(&mut buf) {
            Ok(0) => {
                // End of file: drop the handle now rather than when the
                // iterator itself goes away.
                self.file = None;
                None
            }
            Ok(read) => {
                buf.truncate(read);
                Some(Ok(buf))
            }
            Err(e) => {
                self.file = None;
                Some(Err(e.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn drain(chunks: ByteChunks) -> Vec<Vec<u8>> {
        chunks.map(|c| c.unwrap()).collect()
    }

    #[test]
    fn test_read_from_bytes() {
        let mut reader = SourceReader::open(Input::bytes(b"hello world".as_slice())).unwrap();
        assert_eq!(reader.read(5).unwrap(), b"hello");
        assert_eq!(reader.read(100).unwrap(), b" world");
        assert_eq!(reader.read(1).unwrap(), b"");
    }

    #[test]
    fn test_read_spans_chunk_boundaries() {
        let input = Input::chunks(vec![b"he".to_vec(), b"llo ".to_vec(), b"world".to_vec()]);
        let mut reader = SourceReader::open(input).unwrap();
        assert_eq!(reader.read(5).unwrap(), b"hello");
        assert_eq!(reader.read(6).unwrap(), b" world");
    }

    #[test]
    fn test_into_chunks_preserves_boundaries() {
        let input = Input::chunks(vec![b"ab".to_vec(), b"cd".to_vec(), b"ef".to_vec()]);
        let reader = SourceReader::open(input).unwrap();
        assert_eq!(reader.into_chunks().map(|c| c.unwrap()).count(), 3);
    }

    #[test]
    fn test_into_chunks_yields_unread_remainder_first() {
        let input = Input::chunks(vec![b"abcd".to_vec(), b"ef".to_vec()]);
        let mut reader = SourceReader::open(input).unwrap();
        assert_eq!(reader.read(1).unwrap(), b"a");
        let chunks = drain(reader.into_chunks());
        assert_eq!(chunks, vec![b"bcd".to_vec(), b"ef".to_vec()]);
    }

    #[test]
    fn test_empty_chunks_are_skipped() {
        let input = Input::chunks(vec![Vec::new(), b"ab".to_vec(), Vec::new()]);
        let mut reader = SourceReader::open(input).unwrap();
        assert_eq!(reader.read(2).unwrap(), b"ab");
        assert_eq!(reader.read(1).unwrap(), b"");
    }

    #[test]
    fn test_read_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"file contents here").unwrap();

        let mut reader = SourceReader::open(Input::path(tmp.path())).unwrap();
        assert_eq!(reader.read(4).unwrap(), b"file");
        let rest: Vec<u8> = drain(reader.into_chunks()).concat();
        assert_eq!(rest, b" contents here");
    }

    #[test]
    fn test_missing_file_fails_at_open() {
        let result = SourceReader::open(Input::path("/nonexistent/ezseal-test"));
        assert!(result.is_err());
    }
}
