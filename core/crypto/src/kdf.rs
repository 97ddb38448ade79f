//! Key derivation using the Argon2 family.
//!
//! Argon2 is a memory-hard password hashing function that provides
//! resistance to both GPU and time-memory trade-off attacks. All three
//! variants are supported and share one adapter; the serialized record
//! carries the variant name.

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::capability::Kdf;
use crate::keys::DerivedKey;
use ezseal_common::{Error, Result};

/// Algorithm name of the Argon2id variant.
pub const ARGON2ID: &str = "argon2id";
/// Algorithm name of the Argon2i variant.
pub const ARGON2I: &str = "argon2i";
/// Algorithm name of the Argon2d variant.
pub const ARGON2D: &str = "argon2d";

/// Length of the Argon2 salt in bytes.
pub const SALT_LENGTH: usize = 32;

/// Argon2 variant selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argon2Variant {
    Argon2d,
    Argon2i,
    Argon2id,
}

impl Argon2Variant {
    /// The exact registry name of this variant.
    pub fn name(self) -> &'static str {
        match self {
            Self::Argon2d => ARGON2D,
            Self::Argon2i => ARGON2I,
            Self::Argon2id => ARGON2ID,
        }
    }

    /// Parse a registry name. Lookup is exact and case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            ARGON2D => Some(Self::Argon2d),
            ARGON2I => Some(Self::Argon2i),
            ARGON2ID => Some(Self::Argon2id),
            _ => None,
        }
    }

    fn algorithm(self) -> Algorithm {
        match self {
            Self::Argon2d => Algorithm::Argon2d,
            Self::Argon2i => Algorithm::Argon2i,
            Self::Argon2id => Algorithm::Argon2id,
        }
    }
}

/// Parameters for Argon2 key derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB (e.g., 65536 = 64 MiB).
    pub memory_cost: u32,
    /// Number of iterations.
    pub time_cost: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl KdfParams {
    /// Create parameters suitable for interactive use.
    ///
    /// These parameters provide a balance between security and usability,
    /// targeting approximately 0.5-1 second of derivation time.
    pub fn interactive() -> Self {
        Self {
            memory_cost: 65536, // 64 MiB
            time_cost: 3,
            parallelism: 4,
        }
    }

    /// Create parameters suitable for sensitive data.
    ///
    /// Higher security parameters that may take several seconds.
    pub fn sensitive() -> Self {
        Self {
            memory_cost: 262144, // 256 MiB
            time_cost: 4,
            parallelism: 4,
        }
    }

    /// Create moderate parameters for constrained devices.
    pub fn moderate() -> Self {
        Self {
            memory_cost: 32768, // 32 MiB
            time_cost: 3,
            parallelism: 2,
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::interactive()
    }
}

/// Argon2 KDF adapter.
///
/// Every instance carries its own salt: [`Argon2Kdf::new`] generates a
/// fresh random one, so two encryptions with separately constructed
/// adapters derive distinct keys from the same password.
pub struct Argon2Kdf {
    variant: Argon2Variant,
    salt: [u8; SALT_LENGTH],
    params: KdfParams,
}

impl Argon2Kdf {
    /// Create an adapter with a fresh random salt.
    pub fn new(variant: Argon2Variant, params: KdfParams) -> Self {
        let mut salt = [0u8; SALT_LENGTH];
        rand::rng().fill_bytes(&mut salt);
        Self {
            variant,
            salt,
            params,
        }
    }

    /// Create an adapter with a caller-provided salt.
    ///
    /// Needed to reconstruct an equivalent instance from a serialized
    /// record; also useful for deterministic tests.
    pub fn with_salt(variant: Argon2Variant, salt: [u8; SALT_LENGTH], params: KdfParams) -> Self {
        Self {
            variant,
            salt,
            params,
        }
    }

    /// Reconstruct an adapter from its serialized header record.
    ///
    /// # Errors
    /// - `Error::MalformedHeader` if required fields are missing, the
    ///   salt is not valid base64 of the expected length, or a cost
    ///   parameter is out of its valid range
    pub fn deserialize(record: &Value) -> Result<Self> {
        let variant = record
            .get("algorithm")
            .and_then(Value::as_str)
            .and_then(Argon2Variant::from_name)
            .ok_or_else(|| Error::MalformedHeader("kdf algorithm missing or unknown".to_string()))?;

        let salt_text = record
            .get("salt")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedHeader("kdf salt missing".to_string()))?;
        let salt_bytes = BASE64
            .decode(salt_text)
            .map_err(|_| Error::MalformedHeader("kdf salt is not valid base64".to_string()))?;
        let salt: [u8; SALT_LENGTH] = salt_bytes.try_into().map_err(|bytes: Vec<u8>| {
            Error::MalformedHeader(format!(
                "kdf salt must be {SALT_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;

        let params: KdfParams = serde_json::from_value(record.clone())
            .map_err(|e| Error::MalformedHeader(format!("invalid kdf parameters: {e}")))?;
        if params.memory_cost < 8 || params.time_cost < 1 || params.parallelism < 1 {
            return Err(Error::MalformedHeader(
                "kdf cost parameters out of range".to_string(),
            ));
        }

        Ok(Self {
            variant,
            salt,
            params,
        })
    }

    /// The configured parameters.
    pub fn params(&self) -> &KdfParams {
        &self.params
    }
}

impl Kdf for Argon2Kdf {
    fn algorithm(&self) -> &'static str {
        self.variant.name()
    }

    fn derive(&self, password: &str, key_length: usize) -> Result<DerivedKey> {
        if password.is_empty() {
            return Err(Error::KeyDerivation("password cannot be empty".to_string()));
        }

        let params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            Some(key_length),
        )
        .map_err(|e| Error::KeyDerivation(format!("invalid Argon2 parameters: {e}")))?;

        let argon2 = Argon2::new(self.variant.algorithm(), Version::V0x13, params);

        let mut key = vec![0u8; key_length];
        argon2
            .hash_password_into(password.as_bytes(), &self.salt, &mut key)
            .map_err(|e| Error::KeyDerivation(format!("key derivation failed: {e}")))?;

        Ok(DerivedKey::from_bytes(key))
    }

    fn serialize(&self) -> Result<Value> {
        Ok(json!({
            "algorithm": self.variant.name(),
            "salt": BASE64.encode(self.salt),
            "memory_cost": self.params.memory_cost,
            "time_cost": self.params.time_cost,
            "parallelism": self.params.parallelism,
        }))
    }
}
