//! Envelope encoding and decoding.
//!
//! `encrypt` derives a key from the configured capabilities, serializes
//! their parameters into the header, and emits the envelope as a lazy
//! chunk sequence. `decrypt` parses the header strictly and fail-fast,
//! reconstructs the capabilities through the registry, re-derives the
//! key, and returns the lazily decrypted plaintext.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use ezseal_common::{Error, Result};
use ezseal_crypto::{default_registry, AlgorithmRegistry, ByteChunks, Cipher, Kdf};

use crate::source::{Input, SourceReader};

/// Magic bytes identifying an ezseal envelope.
pub const MAGIC: [u8; 2] = *b"EZ";

/// Size of the big-endian header length field.
const HEADER_LENGTH_SIZE: usize = 4;

/// The envelope header: one serialized record per capability.
///
/// A pure description of parameters: it never carries the password, the
/// derived key, or any plaintext.
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    kdf: Value,
    cipher: Value,
}

/// Encrypt `input` into an envelope.
///
/// # Postconditions
/// - The output is a valid envelope decodable by [`decrypt`] with the
///   same password
/// - No side effects beyond producing the output sequence; the derived
///   key never appears in the header and is zeroized when this call
///   returns
///
/// # Errors
/// - KDF failures propagate unchanged
/// - `Error::Serialization` if a capability record cannot be encoded
/// - I/O errors if a path input cannot be opened
pub fn encrypt(
    password: &str,
    kdf: &dyn Kdf,
    cipher: &dyn Cipher,
    input: Input,
) -> Result<ByteChunks> {
    let key = kdf.derive(password, cipher.key_length())?;

    let header = Header {
        kdf: kdf.serialize()?,
        cipher: cipher.serialize()?,
    };
    let header_bytes = serde_json::to_vec(&header)
        .map_err(|e| Error::Serialization(format!("header encoding failed: {e}")))?;
    let header_length = u32::try_from(header_bytes.len())
        .map_err(|_| Error::InvalidInput("header too large".to_string()))?;

    let mut prefix = Vec::with_capacity(MAGIC.len() + HEADER_LENGTH_SIZE + header_bytes.len());
    prefix.extend_from_slice(&MAGIC);
    prefix.extend_from_slice(&header_length.to_be_bytes());
    prefix.extend_from_slice(&header_bytes);

    let reader = SourceReader::open(input)?;
    let body = cipher.encrypt(&key, reader.into_chunks())?;

    Ok(Box::new(std::iter::once(Ok(prefix)).chain(body)))
}

/// Decrypt an envelope using the default algorithm registry.
pub fn decrypt(password: &str, input: Input) -> Result<ByteChunks> {
    decrypt_with_registry(password, input, default_registry())
}

/// Decrypt an envelope, resolving algorithms through `registry`.
///
/// Parsing is strict and fail-fast: the magic, the length field, the
/// header bytes, the header structure, and the algorithm names are
/// checked in that order, and both algorithms must be registered before
/// any parameters are parsed or any key is derived.
///
/// The returned sequence owns the underlying reader; it stays alive for
/// as long as the caller keeps pulling and is released on drop.
///
/// # Errors
/// - `Error::Format` on malformed framing
/// - `Error::UnsupportedAlgorithm` if the header names an unregistered
///   algorithm
/// - `Error::MalformedHeader` if algorithm parameters are invalid
/// - KDF failures propagate unchanged
/// - `Error::Authentication` (during iteration) on tampered ciphertext
pub fn decrypt_with_registry(
    password: &str,
    input: Input,
    registry: &AlgorithmRegistry,
) -> Result<ByteChunks> {
    let mut reader = SourceReader::open(input)?;

    let magic = reader.read(MAGIC.len())?;
    if magic != MAGIC {
        return Err(Error::Format("magic header missing".to_string()));
    }

    let length_bytes = reader.read(HEADER_LENGTH_SIZE)?;
    let length_bytes: [u8; HEADER_LENGTH_SIZE] = length_bytes
        .try_into()
        .map_err(|_| Error::Format("header length field missing".to_string()))?;
    // Decoded as unsigned; a negative header length is unrepresentable.
    let header_length = u32::from_be_bytes(length_bytes) as usize;

    let header_bytes = reader.read(header_length)?;
    if header_bytes.len() != header_length {
        return Err(Error::Format("reached EOF while reading header".to_string()));
    }

    let header: Header = serde_json::from_slice(&header_bytes)
        .map_err(|_| Error::Format("invalid header encoding".to_string()))?;
    let kdf_name = algorithm_name(&header.kdf, "kdf")?;
    let cipher_name = algorithm_name(&header.cipher, "cipher")?;
    debug!(kdf = kdf_name, cipher = cipher_name, "parsed envelope header");

    // Both algorithms must be known before any parameters are parsed or
    // any key is derived.
    let kdf_factory = registry.kdf(kdf_name)?;
    let cipher_factory = registry.cipher(cipher_name)?;

    let kdf = kdf_factory(&header.kdf)?;
    let cipher = cipher_factory(&header.cipher)?;

    let key = kdf.derive(password, cipher.key_length())?;

    cipher.decrypt(&key, reader.into_chunks())
}

fn algorithm_name<'a>(record: &'a Value, section: &str) -> Result<&'a str> {
    record
        .get("algorithm")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::MalformedHeader(format!("{section} algorithm missing")))
}

/// Collect a chunk sequence into one buffer.
pub fn collect_chunks(chunks: ByteChunks) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    for chunk in chunks {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

/// Encrypt and collect the whole envelope.
///
/// Convenience for when the complete output is wanted in memory.
pub fn encrypt_to_vec(
    password: &str,
    kdf: &dyn Kdf,
    cipher: &dyn Cipher,
    input: Input,
) -> Result<Vec<u8>> {
    collect_chunks(encrypt(password, kdf, cipher, input)?)
}

/// Decrypt and collect the whole plaintext.
pub fn decrypt_to_vec(password: &str, input: Input) -> Result<Vec<u8>> {
    collect_chunks(decrypt(password, input)?)
}
