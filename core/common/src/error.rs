//! Common error types for ezseal.

use thiserror::Error;

/// Top-level error type for ezseal operations.
///
/// Every failure is terminal to the current operation: nothing is retried
/// internally, and no variant is ever downgraded to another before it
/// reaches the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed envelope framing: bad magic, truncated length field or
    /// header, undecodable header text.
    #[error("Invalid envelope format: {0}")]
    Format(String),

    /// The header names an algorithm that is not in the registry.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The algorithm is recognized but its serialized parameters are
    /// missing or out of range.
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The KDF rejected its own parameters, the requested key length, or
    /// the password.
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// The cipher's integrity check failed: a tampered, truncated, or
    /// reordered ciphertext stream.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Cryptographic operation failed outside of integrity verification
    /// (e.g., an invalid key length on the encrypt side).
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
