//! Verdicts for protected routes.
//!
//! Transport concerns (cookie vs bearer) stay in the HTTP layer; this only sees
//! the extracted token, if any.

use tracing::error;

use super::session::{Session, SessionStore, is_well_formed_token};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnauthorizedReason {
    NoCredential,
    InvalidOrExpired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Authorized(Session),
    Unauthorized(UnauthorizedReason),
}

#[derive(Clone)]
pub struct Authorizer {
    store: SessionStore,
}

impl Authorizer {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self { store }
    }

    /// Resolve a token into a verdict. Cache failures fail closed.
    pub async fn authorize(&self, token: Option<&str>) -> Verdict {
        let Some(token) = token else {
            return Verdict::Unauthorized(UnauthorizedReason::NoCredential);
        };
        if !is_well_formed_token(token) {
            return Verdict::Unauthorized(UnauthorizedReason::InvalidOrExpired);
        }
        match self.store.get(token).await {
            Ok(Some(session)) => Verdict::Authorized(session),
            Ok(None) => Verdict::Unauthorized(UnauthorizedReason::InvalidOrExpired),
            Err(err) => {
                error!("Failed to lookup session: {err}");
                Verdict::Unauthorized(UnauthorizedReason::InvalidOrExpired)
            }
        }
    }
}
