//! Login orchestration: limiter, then verifier, then issuer.
//!
//! This is the only place the order of the three steps is expressed. The
//! verifier runs on the blocking pool so slow derivations do not stall the
//! async workers.

use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    credential::CredentialVerifier,
    rate_limit::{RateLimitDecision, RateLimiter},
    session::{Session, SessionError, SessionIssuer},
};
use crate::cache::CacheError;

/// Password check seam. [`CredentialVerifier`] is the production implementation.
pub trait PasswordVerifier: Send + Sync + 'static {
    fn verify(&self, password: &str) -> bool;
}

impl PasswordVerifier for CredentialVerifier {
    fn verify(&self, password: &str) -> bool {
        CredentialVerifier::verify(self, password)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("too many login attempts")]
    RateLimited,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("rate limit store unavailable")]
    LimiterUnavailable(#[source] CacheError),
    #[error("session store unavailable")]
    SessionUnavailable(#[source] SessionError),
    #[error("credential verification task failed")]
    Verification(#[source] tokio::task::JoinError),
}

#[derive(Clone)]
pub struct LoginService {
    limiter: RateLimiter,
    verifier: Arc<dyn PasswordVerifier>,
    issuer: SessionIssuer,
}

impl LoginService {
    #[must_use]
    pub fn new(
        limiter: RateLimiter,
        verifier: Arc<dyn PasswordVerifier>,
        issuer: SessionIssuer,
    ) -> Self {
        Self {
            limiter,
            verifier,
            issuer,
        }
    }

    #[must_use]
    pub fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    /// Run one login attempt for `client_key`.
    ///
    /// # Errors
    /// Returns a [`LoginError`] describing why no session was issued.
    #[instrument(skip_all, fields(client = %client_key))]
    pub async fn login(
        &self,
        client_key: &str,
        password: SecretString,
    ) -> Result<Session, LoginError> {
        match self
            .limiter
            .check_and_record_attempt(client_key)
            .await
            .map_err(LoginError::LimiterUnavailable)?
        {
            RateLimitDecision::Allowed => {}
            RateLimitDecision::Denied => return Err(LoginError::RateLimited),
        }

        let verifier = Arc::clone(&self.verifier);
        let verified =
            tokio::task::spawn_blocking(move || verifier.verify(password.expose_secret()))
                .await
                .map_err(LoginError::Verification)?;
        if !verified {
            warn!("Invalid admin credentials");
            return Err(LoginError::InvalidCredentials);
        }

        let session = self
            .issuer
            .issue()
            .await
            .map_err(LoginError::SessionUnavailable)?;

        // Only a stored session earns back the attempt budget.
        if let Err(err) = self.limiter.record_success(client_key).await {
            warn!("Failed to reset login attempts: {err}");
        }
        info!("Admin session issued");
        Ok(session)
    }
}
