//! Capability contracts satisfied by every concrete algorithm adapter.
//!
//! The envelope codec never names a concrete algorithm: it drives these
//! two traits and lets the registry reconstruct instances from their
//! serialized records.

use serde_json::Value;

use crate::keys::DerivedKey;
use ezseal_common::Result;

/// Lazy, finite, single-pass sequence of byte chunks.
///
/// Consumed at most once and not restartable; chunk ordering is
/// significant and preserved bit-for-bit across an encrypt/decrypt
/// round trip.
pub type ByteChunks = Box<dyn Iterator<Item = Result<Vec<u8>>> + Send>;

/// Key-derivation capability.
pub trait Kdf: Send + Sync {
    /// Exact algorithm name this adapter registers under.
    fn algorithm(&self) -> &'static str;

    /// Derive key material from a password.
    ///
    /// # Postconditions
    /// - Returns exactly `key_length` bytes
    /// - Deterministic for a fixed (password, parameters, key_length)
    ///
    /// # Errors
    /// - `Error::KeyDerivation` if the configured parameters are invalid,
    ///   the requested key length is unsupported, or the password is empty
    fn derive(&self, password: &str, key_length: usize) -> Result<DerivedKey>;

    /// Serialize the adapter's public parameters into a header record.
    ///
    /// The record includes `algorithm` and everything needed to
    /// reconstruct an equivalent instance. It never includes the password
    /// or any derived key.
    fn serialize(&self) -> Result<Value>;
}

/// Authenticated-cipher capability.
pub trait Cipher: Send + Sync {
    /// Exact algorithm name this adapter registers under.
    fn algorithm(&self) -> &'static str;

    /// Key length in bytes required by this cipher.
    fn key_length(&self) -> usize;

    /// Encrypt a plaintext chunk sequence.
    ///
    /// # Postconditions
    /// - The output embeds a fresh, unpredictable nonce per frame; nonces
    ///   never live in the shared header, so repeated encryptions under
    ///   the same header never reuse one
    ///
    /// # Errors
    /// - `Error::Crypto` if `key` has the wrong length
    fn encrypt(&self, key: &DerivedKey, plaintext: ByteChunks) -> Result<ByteChunks>;

    /// Decrypt a ciphertext chunk sequence.
    ///
    /// # Postconditions
    /// - Every yielded plaintext chunk has been fully authenticated;
    ///   tampering, truncation, reordering, or trailing garbage surfaces
    ///   as `Error::Authentication` before any affected plaintext is
    ///   yielded
    ///
    /// # Errors
    /// - `Error::Crypto` if `key` has the wrong length
    /// - `Error::Authentication` (during iteration) on integrity failure
    fn decrypt(&self, key: &DerivedKey, ciphertext: ByteChunks) -> Result<ByteChunks>;

    /// Serialize the adapter's public parameters into a header record.
    ///
    /// Mirrors [`Kdf::serialize`]: includes `algorithm` and public
    /// parameters, never the key.
    fn serialize(&self) -> Result<Value>;
}
