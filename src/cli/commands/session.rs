use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

use crate::{
    api::handlers::auth::DEFAULT_SESSION_COOKIE_NAME,
    auth::{ConfigError, session::DEFAULT_SESSION_TTL},
};

pub const ARG_SESSION_COOKIE_NAME: &str = "session-cookie-name";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";

const MAX_SESSION_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

#[derive(Debug)]
pub struct Options {
    pub cookie_name: String,
    pub ttl: Duration,
}

impl Options {
    /// # Errors
    /// Returns an error if the TTL is zero or longer than 30 days, or the cookie name is unusable.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let ttl_seconds = matches
            .get_one::<u64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(DEFAULT_SESSION_TTL.as_secs());
        if ttl_seconds == 0 || ttl_seconds > MAX_SESSION_TTL_SECONDS {
            return Err(ConfigError::InvalidSetting {
                name: "session ttl",
                reason: format!("must be between 1 and {MAX_SESSION_TTL_SECONDS} seconds"),
            }
            .into());
        }

        let cookie_name = matches
            .get_one::<String>(ARG_SESSION_COOKIE_NAME)
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_SESSION_COOKIE_NAME.to_string());
        if !cookie_name
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-')
        {
            return Err(ConfigError::InvalidSetting {
                name: "session cookie name",
                reason: "only ASCII letters, digits, '_' and '-' are allowed".to_string(),
            }
            .into());
        }

        Ok(Self {
            cookie_name,
            ttl: Duration::from_secs(ttl_seconds),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_COOKIE_NAME)
                .long(ARG_SESSION_COOKIE_NAME)
                .help("Name of the session cookie")
                .env("FOLIO_SESSION_COOKIE_NAME")
                .default_value(DEFAULT_SESSION_COOKIE_NAME),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session lifetime in seconds")
                .env("FOLIO_SESSION_TTL_SECONDS")
                .default_value("86400")
                .value_parser(clap::value_parser!(u64)),
        )
}
