//! PBKDF2 parameters and the constant-time comparison used by credential checks.

use pbkdf2::pbkdf2_hmac;
use sha2::{Sha384, Sha512};
use std::{fmt, str::FromStr};

use super::error::ConfigError;

pub const MIN_ITERATIONS: u32 = 100_000;
pub const MIN_KEY_LENGTH: usize = 64;
pub const DEFAULT_ITERATIONS: u32 = MIN_ITERATIONS;
pub const DEFAULT_KEY_LENGTH: usize = MIN_KEY_LENGTH;

/// HMAC digests allowed for derivation. Both have a 512-bit internal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Digest {
    Sha384,
    #[default]
    Sha512,
}

impl Digest {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Digest {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(ConfigError::UnsupportedDigest(value.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
    key_length: usize,
    digest: Digest,
}

impl KdfParams {
    /// # Errors
    /// Returns an error when the parameters are weaker than the supported floor.
    pub fn new(iterations: u32, key_length: usize, digest: Digest) -> Result<Self, ConfigError> {
        if iterations < MIN_ITERATIONS {
            return Err(ConfigError::WeakIterations {
                iterations,
                minimum: MIN_ITERATIONS,
            });
        }
        if key_length < MIN_KEY_LENGTH {
            return Err(ConfigError::ShortKey {
                key_length,
                minimum: MIN_KEY_LENGTH,
            });
        }
        Ok(Self {
            iterations,
            key_length,
            digest,
        })
    }

    #[must_use]
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    #[must_use]
    pub fn key_length(&self) -> usize {
        self.key_length
    }

    #[must_use]
    pub fn digest(&self) -> Digest {
        self.digest
    }

    /// Derive `key_length` bytes from `password` and `salt`.
    ///
    /// CPU-bound and deliberately slow; async callers run it on a blocking thread.
    #[must_use]
    pub fn derive(&self, password: &[u8], salt: &[u8]) -> Vec<u8> {
        let mut key = vec![0u8; self.key_length];
        match self.digest {
            Digest::Sha384 => pbkdf2_hmac::<Sha384>(password, salt, self.iterations, &mut key),
            Digest::Sha512 => pbkdf2_hmac::<Sha512>(password, salt, self.iterations, &mut key),
        }
        key
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            key_length: DEFAULT_KEY_LENGTH,
            digest: Digest::default(),
        }
    }
}

/// Compare two byte strings without short-circuiting on the first mismatch.
///
/// Length is not secret here: both sides are fixed-length KDF outputs.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    std::hint::black_box(diff) == 0
}
