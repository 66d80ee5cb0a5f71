/// Startup configuration problems. Any of these stops the server before it binds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("reference password hash is missing")]
    MissingReferenceHash,
    #[error("reference password salt is missing")]
    MissingSalt,
    #[error("reference password hash is not valid hex")]
    MalformedReferenceHash,
    #[error("reference password hash is {actual} bytes, expected {expected}")]
    HashLengthMismatch { expected: usize, actual: usize },
    #[error("kdf iterations {iterations} below minimum {minimum}")]
    WeakIterations { iterations: u32, minimum: u32 },
    #[error("kdf key length {key_length} below minimum {minimum}")]
    ShortKey { key_length: usize, minimum: usize },
    #[error("unsupported kdf digest: {0}")]
    UnsupportedDigest(String),
    #[error("invalid {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },
}
