//! Admin authentication core.
//!
//! Flow Overview:
//! 1) [`rate_limit::RateLimiter`] reserves an attempt for the client.
//! 2) [`credential::CredentialVerifier`] checks the password with PBKDF2.
//! 3) [`session::SessionIssuer`] mints a token into the shared cache.
//! 4) [`authorize::Authorizer`] resolves tokens on every protected request.
//!
//! Nothing here knows about HTTP; see `crate::api` for the transport.

pub mod authorize;
pub mod credential;
pub mod error;
pub mod kdf;
pub mod login;
pub mod rate_limit;
pub mod session;

pub use self::error::ConfigError;
