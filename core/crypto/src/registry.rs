//! Algorithm registry for reconstructing adapters from header records.
//!
//! Maps exact, case-sensitive algorithm names to deserialization
//! factories, separately for KDFs and ciphers. The default registry is
//! built once at first use and is read-only thereafter; additional
//! registries can be assembled and extended at initialization time.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;

use crate::aead::{self, Aes256GcmCipher, XChaCha20Poly1305Cipher};
use crate::capability::{Cipher, Kdf};
use crate::kdf::{self, Argon2Kdf};
use ezseal_common::{Error, Result};

/// Factory function type for reconstructing KDF adapters.
pub type KdfFactory = Box<dyn Fn(&Value) -> Result<Box<dyn Kdf>> + Send + Sync>;

/// Factory function type for reconstructing cipher adapters.
pub type CipherFactory = Box<dyn Fn(&Value) -> Result<Box<dyn Cipher>> + Send + Sync>;

/// Registry of algorithm deserialization factories.
pub struct AlgorithmRegistry {
    kdfs: HashMap<String, KdfFactory>,
    ciphers: HashMap<String, CipherFactory>,
}

impl AlgorithmRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            kdfs: HashMap::new(),
            ciphers: HashMap::new(),
        }
    }

    /// Register a KDF factory.
    ///
    /// # Errors
    /// - Returns error if the name is already registered
    pub fn register_kdf(&mut self, name: impl Into<String>, factory: KdfFactory) -> Result<()> {
        let name = name.into();
        if self.kdfs.contains_key(&name) {
            return Err(Error::AlreadyExists(format!(
                "KDF '{name}' is already registered"
            )));
        }
        self.kdfs.insert(name, factory);
        Ok(())
    }

    /// Register a cipher factory.
    ///
    /// # Errors
    /// - Returns error if the name is already registered
    pub fn register_cipher(&mut self, name: impl Into<String>, factory: CipherFactory) -> Result<()> {
        let name = name.into();
        if self.ciphers.contains_key(&name) {
            return Err(Error::AlreadyExists(format!(
                "Cipher '{name}' is already registered"
            )));
        }
        self.ciphers.insert(name, factory);
        Ok(())
    }

    /// Look up a KDF factory by exact name.
    ///
    /// # Errors
    /// - `Error::UnsupportedAlgorithm` if the name is not registered
    pub fn kdf(&self, name: &str) -> Result<&KdfFactory> {
        self.kdfs
            .get(name)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("KDF '{name}'")))
    }

    /// Look up a cipher factory by exact name.
    ///
    /// # Errors
    /// - `Error::UnsupportedAlgorithm` if the name is not registered
    pub fn cipher(&self, name: &str) -> Result<&CipherFactory> {
        self.ciphers
            .get(name)
            .ok_or_else(|| Error::UnsupportedAlgorithm(format!("Cipher '{name}'")))
    }

    /// Look up and reconstruct a KDF adapter in one step.
    pub fn resolve_kdf(&self, name: &str, record: &Value) -> Result<Box<dyn Kdf>> {
        (self.kdf(name)?)(record)
    }

    /// Look up and reconstruct a cipher adapter in one step.
    pub fn resolve_cipher(&self, name: &str, record: &Value) -> Result<Box<dyn Cipher>> {
        (self.cipher(name)?)(record)
    }

    /// Registered KDF names, sorted.
    pub fn kdf_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.kdfs.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Registered cipher names, sorted.
    pub fn cipher_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.ciphers.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Check if a KDF is registered.
    pub fn has_kdf(&self, name: &str) -> bool {
        self.kdfs.contains_key(name)
    }

    /// Check if a cipher is registered.
    pub fn has_cipher(&self, name: &str) -> bool {
        self.ciphers.contains_key(name)
    }
}

impl Default for AlgorithmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with the built-in algorithms.
pub fn create_default_registry() -> AlgorithmRegistry {
    let mut registry = AlgorithmRegistry::new();

    // All three Argon2 variants route through one deserializer; the
    // record's own algorithm field selects the variant.
    for name in [kdf::ARGON2ID, kdf::ARGON2I, kdf::ARGON2D] {
        registry
            .register_kdf(name, Box::new(|record| {
                Ok(Box::new(Argon2Kdf::deserialize(record)?))
            }))
            .expect("Failed to register Argon2 KDF");
    }

    registry
        .register_cipher(aead::AES_256_GCM, Box::new(|record| {
            Ok(Box::new(Aes256GcmCipher::deserialize(record)?))
        }))
        .expect("Failed to register AES-256-GCM cipher");

    registry
        .register_cipher(aead::XCHACHA20_POLY1305, Box::new(|record| {
            Ok(Box::new(XChaCha20Poly1305Cipher::deserialize(record)?))
        }))
        .expect("Failed to register XChaCha20-Poly1305 cipher");

    registry
}

/// The process-wide default registry, built once and immutable after.
pub fn default_registry() -> &'static AlgorithmRegistry {
    static REGISTRY: OnceLock<AlgorithmRegistry> = OnceLock::new();
    REGISTRY.get_or_init(create_default_registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_registry_entries() {
        let registry = default_registry();
        assert_eq!(registry.kdf_names(), ["argon2d", "argon2i", "argon2id"]);
        assert_eq!(registry.cipher_names(), ["aes-256-gcm", "xchacha20-poly1305"]);
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let registry = default_registry();
        assert!(matches!(
            registry.kdf("scrypt").err().unwrap(),
            Error::UnsupportedAlgorithm(_)
        ));
        assert!(matches!(
            registry.cipher("xyz").err().unwrap(),
            Error::UnsupportedAlgorithm(_)
        ));
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let registry = default_registry();
        assert!(registry.has_cipher("aes-256-gcm"));
        assert!(!registry.has_cipher("AES-256-GCM"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = create_default_registry();
        let result = registry.register_cipher(
            aead::AES_256_GCM,
            Box::new(|record| Ok(Box::new(Aes256GcmCipher::deserialize(record)?))),
        );
        assert!(matches!(result.unwrap_err(), Error::AlreadyExists(_)));
    }

    #[test]
    fn test_resolve_cipher_constructs_adapter() {
        let registry = default_registry();
        let record = json!({ "algorithm": aead::AES_256_GCM, "chunk_size": 4096 });
        let cipher = registry.resolve_cipher(aead::AES_256_GCM, &record).unwrap();
        assert_eq!(cipher.algorithm(), aead::AES_256_GCM);
        assert_eq!(cipher.key_length(), 32);
    }

    #[test]
    fn test_resolve_kdf_propagates_malformed_params() {
        let registry = default_registry();
        let record = json!({ "algorithm": "argon2id" });
        assert!(matches!(
            registry.resolve_kdf("argon2id", &record).err().unwrap(),
            Error::MalformedHeader(_)
        ));
    }
}
