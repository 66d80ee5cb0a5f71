//! # Folio (portfolio admin authentication)
//!
//! `folio` guards the admin panel of the portfolio site. It verifies the single
//! administrative password, issues opaque session tokens, stores them in a shared
//! cache with a fixed lifetime, and authorizes every protected request.
//!
//! ## Login Flow
//!
//! Each login runs three steps in a fixed order:
//!
//! 1. The per-IP rate limiter reserves an attempt (or denies the request).
//! 2. The credential verifier derives a PBKDF2 key from the submitted password
//!    and compares it in constant time with the configured reference hash.
//! 3. The session issuer mints a random 32-byte token and stores it in the cache.
//!
//! The limiter runs first so that a locked-out address never reaches the
//! expensive key derivation.
//!
//! ## Sessions
//!
//! Tokens are carried by a same-origin cookie or an `Authorization: Bearer`
//! header. The cache only ever sees a SHA-256 digest of the token, and its own
//! expiry is the source of truth for session lifetime. A cache outage fails
//! closed: logins return `503` and protected routes return `401`.
//!
//! ## Client Lockout Mirror
//!
//! `folio login` keeps a local attempt counter with a lockout timestamp. It is a
//! hint for the operator, not a security boundary; the server limiter is
//! authoritative.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod client;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
