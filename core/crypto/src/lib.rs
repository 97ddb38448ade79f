//! Pluggable cryptographic capabilities for the ezseal envelope format.
//!
//! This module provides:
//! - The [`Kdf`] and [`Cipher`] capability contracts, including
//!   self-describing serialization to header records
//! - An Argon2 key-derivation adapter covering the argon2id, argon2i,
//!   and argon2d variants
//! - AES-256-GCM and XChaCha20-Poly1305 cipher adapters with chunked,
//!   authenticated streaming
//! - The algorithm registry used to reconstruct adapters from a parsed
//!   envelope header
//!
//! # Security Guarantees
//! - Derived key material is automatically zeroized on drop
//! - No password, key, or plaintext ever appears in a serialized record
//! - Every nonce is generated fresh per frame and embedded in the
//!   ciphertext stream, never in the shared header

pub mod aead;
pub mod capability;
mod frame;
pub mod kdf;
pub mod keys;
pub mod registry;

pub use aead::{Aes256GcmCipher, XChaCha20Poly1305Cipher, DEFAULT_CHUNK_SIZE};
pub use capability::{ByteChunks, Cipher, Kdf};
pub use kdf::{Argon2Kdf, Argon2Variant, KdfParams};
pub use keys::DerivedKey;
pub use registry::{create_default_registry, default_registry, AlgorithmRegistry};
