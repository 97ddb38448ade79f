//! Key material with secure memory handling.
//!
//! Derived keys automatically zeroize their memory on drop to prevent
//! sensitive data from persisting in memory.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key length in bytes used by the built-in 256-bit ciphers.
pub const KEY_LENGTH: usize = 32;

/// Key material produced by a [`crate::Kdf`] for a single
/// encrypt/decrypt call.
///
/// The length always equals the `key_length()` of the cipher the key was
/// derived for. The key is owned exclusively by the short-lived cipher
/// call and is never persisted or logged.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: Vec<u8>,
}

impl DerivedKey {
    /// Wrap raw derived bytes.
    pub fn from_bytes(key: Vec<u8>) -> Self {
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.key.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey([REDACTED; {} bytes])", self.key.len())
    }
}
