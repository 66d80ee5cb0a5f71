//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::auth::session::Session;

/// Login payload. `salt` is accepted for provisioning tools and ignored.
#[derive(ToSchema, Deserialize)]
pub struct LoginRequest {
    pub password: String,
    #[serde(default)]
    pub salt: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl From<&Session> for LoginResponse {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token().to_string(),
            issued_at: session.issued_at(),
            expires_at: session.expires_at(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SessionResponse {
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            issued_at: session.issued_at(),
            expires_at: session.expires_at(),
        }
    }
}
