//! Redis-backed cache shared by every service instance.
//!
//! Each operation is bounded by `op_timeout` so an unreachable server surfaces as
//! [`CacheError::Timeout`] instead of stalling the request. Callers decide how to
//! fail closed.

use ::redis::{Client, RedisError, Script, aio::ConnectionManager};
use anyhow::Context;
use async_trait::async_trait;
use std::{future::Future, time::Duration};
use tracing::{Instrument, info_span};

use super::{Cache, CacheError};

// INCR and PEXPIRE run as one script so the window cannot be lost between them.
// A counter left without a TTL (PTTL = -1) gets its window re-armed.
const INCREMENT_WINDOW_LUA: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 or redis.call('PTTL', KEYS[1]) < 0 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
";

pub struct RedisCache {
    connection: ConnectionManager,
    op_timeout: Duration,
    increment_window: Script,
}

impl RedisCache {
    /// Open a managed connection (reconnects automatically after failures).
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the first connection cannot be made.
    pub async fn connect(url: &str, op_timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::open(url).context("Invalid Redis URL")?;
        let connection = tokio::time::timeout(op_timeout, ConnectionManager::new(client))
            .await
            .context("Timed out connecting to Redis")?
            .context("Failed to connect to Redis")?;

        Ok(Self {
            connection,
            op_timeout,
            increment_window: Script::new(INCREMENT_WINDOW_LUA),
        })
    }

    async fn bounded<T, F>(&self, operation: &'static str, future: F) -> Result<T, CacheError>
    where
        F: Future<Output = ::redis::RedisResult<T>>,
    {
        let span = info_span!("cache.command", cache.system = "redis", cache.operation = operation);
        match tokio::time::timeout(self.op_timeout, future.instrument(span)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(CacheError::Unavailable(err.to_string())),
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        self.bounded("SET", async move {
            let _: () = ::redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("PX")
                .arg(millis(ttl))
                .query_async(&mut connection)
                .await?;
            Ok::<_, RedisError>(())
        })
        .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut connection = self.connection.clone();
        self.bounded("GET", async move {
            let value: Option<String> = ::redis::cmd("GET")
                .arg(key)
                .query_async(&mut connection)
                .await?;
            Ok::<_, RedisError>(value)
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        self.bounded("DEL", async move {
            let _: i64 = ::redis::cmd("DEL")
                .arg(key)
                .query_async(&mut connection)
                .await?;
            Ok::<_, RedisError>(())
        })
        .await
    }

    async fn increment_window(&self, key: &str, window: Duration) -> Result<u64, CacheError> {
        let mut connection = self.connection.clone();
        let script = &self.increment_window;
        self.bounded("EVALSHA", async move {
            let count: u64 = script
                .key(key)
                .arg(millis(window))
                .invoke_async(&mut connection)
                .await?;
            Ok::<_, RedisError>(count)
        })
        .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        self.bounded("PING", async move {
            let _: String = ::redis::cmd("PING").query_async(&mut connection).await?;
            Ok::<_, RedisError>(())
        })
        .await
    }
}
