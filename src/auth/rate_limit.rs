//! Per-client attempt limiting for the login flow.
//!
//! Each attempt is reserved by an atomic increment before the password is checked:
//! the counter lives in the shared cache with the window as its TTL, so
//! `Fresh -> Tracking -> Exceeded -> Fresh` is driven entirely by the cache clock.

use std::{sync::Arc, time::Duration};
use tracing::{debug, warn};

use super::error::ConfigError;
use crate::cache::{Cache, CacheError, Keyspace};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Denied,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitPolicy {
    max_attempts: u32,
    window: Duration,
    reset_on_success: bool,
}

impl RateLimitPolicy {
    /// # Errors
    /// Returns an error when `max_attempts` or `window` is zero.
    pub fn new(max_attempts: u32, window: Duration) -> Result<Self, ConfigError> {
        if max_attempts == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "rate limit max attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if window.is_zero() {
            return Err(ConfigError::InvalidSetting {
                name: "rate limit window",
                reason: "must be positive".to_string(),
            });
        }
        Ok(Self {
            max_attempts,
            window,
            reset_on_success: true,
        })
    }

    /// Whether a successful login clears the client's counter.
    #[must_use]
    pub fn with_reset_on_success(mut self, reset_on_success: bool) -> Self {
        self.reset_on_success = reset_on_success;
        self
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    #[must_use]
    pub fn reset_on_success(&self) -> bool {
        self.reset_on_success
    }
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window: DEFAULT_WINDOW,
            reset_on_success: true,
        }
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<dyn Cache>,
    keyspace: Keyspace,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, keyspace: Keyspace, policy: RateLimitPolicy) -> Self {
        Self {
            cache,
            keyspace,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Count one attempt for `client_key` and decide whether it may proceed.
    ///
    /// The attempt is recorded even when denied, so hammering a locked key does
    /// not shorten the lockout; the window still ends at its original deadline.
    ///
    /// # Errors
    /// Returns the cache error when the counter cannot be updated.
    pub async fn check_and_record_attempt(
        &self,
        client_key: &str,
    ) -> Result<RateLimitDecision, CacheError> {
        let key = self.keyspace.attempts(client_key);
        let count = self
            .cache
            .increment_window(&key, self.policy.window)
            .await?;

        if count > u64::from(self.policy.max_attempts) {
            warn!(client = client_key, attempts = count, "Login attempts exceeded");
            return Ok(RateLimitDecision::Denied);
        }
        debug!(client = client_key, attempts = count, "Login attempt recorded");
        Ok(RateLimitDecision::Allowed)
    }

    /// Clear the client's record after a verified login, if the policy says so.
    ///
    /// # Errors
    /// Returns the cache error when the record cannot be removed.
    pub async fn record_success(&self, client_key: &str) -> Result<(), CacheError> {
        if !self.policy.reset_on_success {
            return Ok(());
        }
        self.cache
            .delete(&self.keyspace.attempts(client_key))
            .await
    }
}
