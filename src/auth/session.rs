//! Opaque session tokens and their storage in the shared cache.
//!
//! Tokens are 32 random bytes, hex encoded. Only `sha256(token)` is used as the
//! cache key, so a dump of the cache does not hand out live sessions.

use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{fmt, sync::Arc, time::Duration};
use time::OffsetDateTime;
use tracing::debug;

use crate::cache::{Cache, CacheError, Keyspace};

pub const TOKEN_BYTES: usize = 32;
pub const TOKEN_HEX_LEN: usize = TOKEN_BYTES * 2;
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("failed to generate session token")]
    Entropy(#[source] rand::Error),
    #[error("session record is not valid JSON")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    issued_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl Session {
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    #[must_use]
    pub fn issued_at(&self) -> OffsetDateTime {
        self.issued_at
    }

    #[must_use]
    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Cached value; the token itself is the key.
#[derive(Serialize, Deserialize)]
struct SessionRecord {
    #[serde(with = "time::serde::rfc3339")]
    issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    expires_at: OffsetDateTime,
}

/// Create a new session token for the auth cookie and bearer header.
///
/// # Errors
/// Returns an error if the OS random source fails.
pub fn generate_session_token() -> Result<String, SessionError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(SessionError::Entropy)?;
    Ok(hex::encode(bytes))
}

/// Hash a session token so raw values never touch the cache.
#[must_use]
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shape check only: 64 hex characters.
#[must_use]
pub fn is_well_formed_token(token: &str) -> bool {
    token.len() == TOKEN_HEX_LEN && token.bytes().all(|byte| byte.is_ascii_hexdigit())
}

#[derive(Clone)]
pub struct SessionStore {
    cache: Arc<dyn Cache>,
    keyspace: Keyspace,
}

impl SessionStore {
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, keyspace: Keyspace) -> Self {
        Self { cache, keyspace }
    }

    fn key(&self, token: &str) -> String {
        self.keyspace.session(&hash_session_token(token))
    }

    /// # Errors
    /// Returns an error if the record cannot be encoded or written.
    pub async fn put(&self, session: &Session, ttl: Duration) -> Result<(), SessionError> {
        let record = serde_json::to_string(&SessionRecord {
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        })?;
        self.cache.set(&self.key(&session.token), &record, ttl).await?;
        Ok(())
    }

    /// Look up a live session. Expired and unknown tokens are both `None`.
    ///
    /// # Errors
    /// Returns an error if the cache fails or holds an undecodable record.
    pub async fn get(&self, token: &str) -> Result<Option<Session>, SessionError> {
        let Some(raw) = self.cache.get(&self.key(token)).await? else {
            return Ok(None);
        };
        let record: SessionRecord = serde_json::from_str(&raw)?;
        Ok(Some(Session {
            token: token.to_string(),
            issued_at: record.issued_at,
            expires_at: record.expires_at,
        }))
    }

    /// # Errors
    /// Returns an error if the cache fails. Deleting an unknown token succeeds.
    pub async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.cache.delete(&self.key(token)).await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SessionIssuer {
    store: SessionStore,
    ttl: Duration,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(store: SessionStore, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a token and store it for the configured lifetime.
    ///
    /// # Errors
    /// Returns an error if no token can be generated or the store rejects it.
    pub async fn issue(&self) -> Result<Session, SessionError> {
        let token = generate_session_token()?;
        let issued_at = OffsetDateTime::now_utc();
        let session = Session {
            token,
            issued_at,
            expires_at: issued_at + self.ttl,
        };
        self.store.put(&session, self.ttl).await?;
        debug!(expires_at = %session.expires_at, "Session issued");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use anyhow::Result;

    fn store() -> (Arc<MemoryCache>, SessionStore) {
        let cache = Arc::new(MemoryCache::new());
        let store = SessionStore::new(cache.clone(), Keyspace::default());
        (cache, store)
    }

    #[test]
    fn generated_tokens_are_hex_and_unique() -> Result<()> {
        let first = generate_session_token()?;
        let second = generate_session_token()?;
        assert_eq!(first.len(), TOKEN_HEX_LEN);
        assert!(is_well_formed_token(&first));
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn hash_session_token_is_stable_sha256() {
        let first = hash_session_token("token");
        assert_eq!(first, hash_session_token("token"));
        assert_ne!(first, hash_session_token("token2"));
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn well_formed_token_checks_shape() {
        assert!(is_well_formed_token(&"a".repeat(64)));
        assert!(is_well_formed_token(&format!("{}ffff", "AbC123".repeat(10))));
        assert!(!is_well_formed_token(&"a".repeat(63)));
        assert!(!is_well_formed_token(&"g".repeat(64)));
        assert!(!is_well_formed_token(""));
    }

    #[tokio::test]
    async fn issued_session_is_retrievable() -> Result<()> {
        let (_, store) = store();
        let issuer = SessionIssuer::new(store.clone(), DEFAULT_SESSION_TTL);
        let session = issuer.issue().await?;

        let found = store.get(session.token()).await?;
        assert_eq!(found.as_ref(), Some(&session));
        assert_eq!(session.expires_at() - session.issued_at(), time::Duration::hours(24));

        assert_eq!(store.get(&"0".repeat(64)).await?, None);
        assert_eq!(store.get("not-a-token").await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn raw_token_never_used_as_key() -> Result<()> {
        let (cache, store) = store();
        let issuer = SessionIssuer::new(store, DEFAULT_SESSION_TTL);
        let session = issuer.issue().await?;

        let hashed = Keyspace::default().session(&hash_session_token(session.token()));
        assert!(cache.get(&hashed).await?.is_some());
        let raw = Keyspace::default().session(session.token());
        assert!(cache.get(&raw).await?.is_none());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn session_expires_at_ttl() -> Result<()> {
        let (_, store) = store();
        let ttl = Duration::from_secs(60);
        let session = SessionIssuer::new(store.clone(), ttl).issue().await?;

        tokio::time::advance(ttl - Duration::from_millis(1)).await;
        assert!(store.get(session.token()).await?.is_some());

        tokio::time::advance(Duration::from_millis(2)).await;
        assert!(store.get(session.token()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_overwrite_is_clean() -> Result<()> {
        let (cache, store) = store();
        let session = SessionIssuer::new(store.clone(), DEFAULT_SESSION_TTL).issue().await?;

        store.put(&session, DEFAULT_SESSION_TTL).await?;
        assert_eq!(cache.len().await, 1);
        assert_eq!(store.get(session.token()).await?.as_ref(), Some(&session));

        store.delete(session.token()).await?;
        store.delete(session.token()).await?;
        assert!(store.get(session.token()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_record_is_an_error() -> Result<()> {
        let (cache, store) = store();
        let token = "f".repeat(64);
        cache
            .set(
                &Keyspace::default().session(&hash_session_token(&token)),
                "{not json",
                DEFAULT_SESSION_TTL,
            )
            .await?;
        assert!(matches!(store.get(&token).await, Err(SessionError::Corrupt(_))));
        Ok(())
    }

    #[test]
    fn debug_hides_token() -> Result<()> {
        let token = generate_session_token()?;
        let now = OffsetDateTime::now_utc();
        let session = Session {
            token: token.clone(),
            issued_at: now,
            expires_at: now,
        };
        assert!(!format!("{session:?}").contains(&token));
        Ok(())
    }
}
