//! Self-describing, streaming, password-based encrypted envelopes.
//!
//! An envelope is the ordered concatenation of:
//!
//! | offset | field | size | encoding |
//! |---|---|---|---|
//! | 0 | magic | 2 bytes | ASCII `"EZ"` |
//! | 2 | header_length | 4 bytes | big-endian unsigned |
//! | 6 | header | header_length bytes | UTF-8 JSON |
//! | 6+header_length | ciphertext | remainder | cipher-defined |
//!
//! The header names the KDF and cipher that produced the envelope along
//! with their public parameters, so a decryptor needs no prior knowledge
//! of which algorithms were used. Everything after the header belongs to
//! the cipher layer and is opaque here.

pub mod codec;
pub mod source;

pub use codec::{
    collect_chunks, decrypt, decrypt_to_vec, decrypt_with_registry, encrypt, encrypt_to_vec, MAGIC,
};
pub use source::{Input, SourceReader};
