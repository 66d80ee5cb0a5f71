//! Auth handlers and supporting modules.
//!
//! This module exposes the admin login, session introspection and logout
//! endpoints, plus the [`principal::require_session`] middleware that every
//! protected route is mounted behind.
//!
//! ## Session Transport
//!
//! The token is set as an `HttpOnly`, `SameSite=Strict` cookie on login and is
//! also returned in the body for API clients, which send it back as
//! `Authorization: Bearer <token>`. When both are present the cookie wins.

pub(crate) mod login;
pub(crate) mod principal;
pub(crate) mod session;
mod state;
pub(crate) mod types;
mod utils;

pub use principal::{Principal, require_session};
pub use state::{AuthConfig, AuthState, DEFAULT_SESSION_COOKIE_NAME};
