//! Client-side lockout mirror.
//!
//! Keeps a local failure counter per server so the CLI stops hammering a server
//! that is about to (or already does) refuse logins. It is guidance only: the
//! server limiter decides, and nothing here is ever sent to the server.

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};
use time::OffsetDateTime;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum LockoutError {
    #[error("lockout file I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("lockout file could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("no user cache directory available; pass --lockout-file")]
    NoCacheDir,
}

/// `<user cache dir>/folio/lockout.json`
///
/// # Errors
/// Returns an error when the platform has no cache directory.
pub fn default_lockout_path() -> Result<PathBuf, LockoutError> {
    dirs::cache_dir()
        .map(|dir| dir.join("folio").join("lockout.json"))
        .ok_or(LockoutError::NoCacheDir)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockoutPolicy {
    max_attempts: u32,
    lockout: Duration,
}

impl LockoutPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            lockout,
        }
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn lockout(&self) -> Duration {
        self.lockout
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockoutCheck {
    Proceed,
    Wait { remaining: Duration },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct LockoutRecord {
    attempt_count: u32,
    #[serde(default, with = "time::serde::rfc3339::option")]
    lockout_until: Option<OffsetDateTime>,
}

pub struct LockoutMirror {
    path: PathBuf,
    server: String,
    policy: LockoutPolicy,
    records: BTreeMap<String, LockoutRecord>,
}

impl LockoutMirror {
    /// Read the mirror for `server` from `path`. A missing file is an empty mirror;
    /// an unreadable one is discarded with a warning.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: &Path, server: &str, policy: LockoutPolicy) -> Result<Self, LockoutError> {
        let records = match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!("Ignoring corrupt lockout file {}: {err}", path.display());
                BTreeMap::new()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            server: server.to_string(),
            policy,
            records,
        })
    }

    #[must_use]
    pub fn attempt_count(&self) -> u32 {
        self.records
            .get(&self.server)
            .map_or(0, |record| record.attempt_count)
    }

    #[must_use]
    pub fn check(&self, now: SystemTime) -> LockoutCheck {
        let now = OffsetDateTime::from(now);
        match self
            .records
            .get(&self.server)
            .and_then(|record| record.lockout_until)
        {
            Some(until) if until > now => LockoutCheck::Wait {
                remaining: Duration::try_from(until - now).unwrap_or_default(),
            },
            _ => LockoutCheck::Proceed,
        }
    }

    pub fn record_failure(&mut self, now: SystemTime) {
        let now = OffsetDateTime::from(now);
        let policy = self.policy;
        let record = self.records.entry(self.server.clone()).or_default();
        // An expired lockout starts a fresh count.
        if record.lockout_until.is_some_and(|until| until <= now) {
            *record = LockoutRecord::default();
        }
        record.attempt_count = record.attempt_count.saturating_add(1);
        if record.attempt_count >= policy.max_attempts {
            record.lockout_until = Some(now + policy.lockout);
        }
    }

    /// The server already refused us; mirror that as a full lockout.
    pub fn record_lockout(&mut self, now: SystemTime) {
        let now = OffsetDateTime::from(now);
        let policy = self.policy;
        let record = self.records.entry(self.server.clone()).or_default();
        record.attempt_count = record.attempt_count.max(policy.max_attempts);
        record.lockout_until = Some(now + policy.lockout);
    }

    pub fn record_success(&mut self) {
        self.records.remove(&self.server);
    }

    /// Persist all servers' records.
    ///
    /// # Errors
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self) -> Result<(), LockoutError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let encoded = serde_json::to_string_pretty(&self.records)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, encoded)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}
