//! Key-value-with-TTL capability shared by the session store and the rate limiter.
//!
//! Two implementations exist: [`MemoryCache`] (tests and single-process dev) and
//! [`RedisCache`] (production). Callers only see the [`Cache`] trait, so the auth
//! core is exercised without a network dependency.
//!
//! Expiry is enforced by the cache itself: an entry past its TTL must read as
//! absent, whatever the caller's clock says.

mod memory;
mod remote;

pub use self::memory::MemoryCache;
pub use self::remote::RedisCache;

use async_trait::async_trait;
use std::{sync::Arc, time::Duration};
use tracing::warn;
use url::Url;

const DEFAULT_KEY_PREFIX: &str = "folio";

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("corrupt cache entry at {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

#[async_trait]
pub trait Cache: Send + Sync {
    /// Store `value` under `key`, replacing any previous entry, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Fetch a live entry. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Remove an entry. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Atomically increment the counter at `key` and return the new value.
    ///
    /// A missing or expired counter starts over at 1 with `window` as its TTL;
    /// incrementing never extends an existing window.
    async fn increment_window(&self, key: &str, window: Duration) -> Result<u64, CacheError>;

    /// Round-trip to the backend (health checks).
    async fn ping(&self) -> Result<(), CacheError>;
}

/// Application-specific key prefix so the shared cache can host unrelated systems.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyspace {
    prefix: String,
}

impl Keyspace {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        let prefix = prefix.trim().trim_end_matches(':');
        let prefix = if prefix.is_empty() {
            DEFAULT_KEY_PREFIX
        } else {
            prefix
        };
        Self {
            prefix: prefix.to_string(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    #[must_use]
    pub fn session(&self, token_digest: &str) -> String {
        format!("{}:session:{token_digest}", self.prefix)
    }

    #[must_use]
    pub fn attempts(&self, client_key: &str) -> String {
        format!("{}:attempts:{client_key}", self.prefix)
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_PREFIX)
    }
}

/// Build a cache from its URL: `redis://`, `rediss://` or `memory://`.
///
/// # Errors
/// Returns an error for unknown schemes or when the Redis client cannot be created.
pub async fn connect(cache_url: &str, op_timeout: Duration) -> anyhow::Result<Arc<dyn Cache>> {
    let parsed = Url::parse(cache_url)
        .map_err(|err| anyhow::anyhow!("Invalid cache URL: {err}"))?;

    match parsed.scheme() {
        "redis" | "rediss" => {
            let cache = RedisCache::connect(cache_url, op_timeout).await?;
            Ok(Arc::new(cache))
        }
        "memory" => {
            warn!("Using in-process memory cache; sessions and limits are not shared");
            Ok(Arc::new(MemoryCache::new()))
        }
        scheme => Err(anyhow::anyhow!("Unsupported cache scheme: {scheme}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyspace_namespaces_keys() {
        let keyspace = Keyspace::new("portfolio");
        assert_eq!(keyspace.session("abc"), "portfolio:session:abc");
        assert_eq!(keyspace.attempts("10.0.0.1"), "portfolio:attempts:10.0.0.1");
    }

    #[test]
    fn keyspace_trims_separator_and_falls_back() {
        assert_eq!(Keyspace::new("site:").prefix(), "site");
        assert_eq!(Keyspace::new("  ").prefix(), DEFAULT_KEY_PREFIX);
        assert_eq!(Keyspace::default().prefix(), DEFAULT_KEY_PREFIX);
    }

    #[tokio::test]
    async fn connect_memory_scheme() -> anyhow::Result<()> {
        let cache = connect("memory://", Duration::from_secs(1)).await?;
        cache.ping().await?;
        Ok(())
    }

    #[tokio::test]
    async fn connect_rejects_unknown_scheme() {
        let result = connect("memcached://localhost:11211", Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
