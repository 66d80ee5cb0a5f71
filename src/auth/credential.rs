//! The single administrative credential and its verifier.
//!
//! Flow Overview:
//! 1) Operators run `folio hash` to turn a password into a salt + reference hash.
//! 2) The server loads that pair once at startup into a [`CredentialReference`].
//! 3) Each login derives a key from the submitted password and compares it in
//!    constant time against the reference.

use rand::{RngCore, rngs::OsRng};

use super::error::ConfigError;
use super::kdf::{KdfParams, constant_time_eq};

const GENERATED_SALT_BYTES: usize = 16;

/// Immutable reference hash and salt for the admin password.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialReference {
    salted_hash: Vec<u8>,
    salt: String,
}

impl CredentialReference {
    /// Parse the configured pair, checking the hash length against `params`.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] for missing, non-hex or wrongly sized values.
    pub fn from_hex(hash_hex: &str, salt: &str, params: &KdfParams) -> Result<Self, ConfigError> {
        let hash_hex = hash_hex.trim();
        if hash_hex.is_empty() {
            return Err(ConfigError::MissingReferenceHash);
        }
        if salt.is_empty() {
            return Err(ConfigError::MissingSalt);
        }
        let salted_hash = hex::decode(hash_hex).map_err(|_| ConfigError::MalformedReferenceHash)?;
        if salted_hash.len() != params.key_length() {
            return Err(ConfigError::HashLengthMismatch {
                expected: params.key_length(),
                actual: salted_hash.len(),
            });
        }
        Ok(Self {
            salted_hash,
            salt: salt.to_string(),
        })
    }

    #[must_use]
    pub fn salt(&self) -> &str {
        &self.salt
    }

    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(&self.salted_hash)
    }
}

impl std::fmt::Debug for CredentialReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialReference")
            .field("salted_hash", &"***")
            .field("salt", &"***")
            .finish()
    }
}

/// Derive a reference from a plaintext password with the runtime parameters.
///
/// `salt` defaults to 16 random bytes, hex encoded.
#[must_use]
pub fn provision(password: &str, salt: Option<&str>, params: &KdfParams) -> CredentialReference {
    let salt = salt
        .map(str::to_string)
        .filter(|salt| !salt.is_empty())
        .unwrap_or_else(generate_salt);
    let salted_hash = params.derive(password.as_bytes(), salt.as_bytes());
    CredentialReference { salted_hash, salt }
}

#[must_use]
pub fn generate_salt() -> String {
    let mut bytes = [0u8; GENERATED_SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[derive(Debug, Clone)]
pub struct CredentialVerifier {
    reference: CredentialReference,
    params: KdfParams,
}

impl CredentialVerifier {
    #[must_use]
    pub fn new(reference: CredentialReference, params: KdfParams) -> Self {
        Self { reference, params }
    }

    #[must_use]
    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Check `password` against the reference. Blocking; see [`KdfParams::derive`].
    ///
    /// An empty password is refused before derivation with the same `false`
    /// verdict as a mismatch.
    #[must_use]
    pub fn verify(&self, password: &str) -> bool {
        if password.is_empty() {
            return false;
        }
        let derived = self
            .params
            .derive(password.as_bytes(), self.reference.salt.as_bytes());
        constant_time_eq(&derived, &self.reference.salted_hash)
    }
}
