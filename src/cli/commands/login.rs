use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use std::{path::PathBuf, time::Duration};

use crate::client::lockout::{LockoutPolicy, default_lockout_path};

pub const ARG_SERVER_URL: &str = "server-url";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_LOCKOUT_FILE: &str = "lockout-file";
pub const ARG_LOCKOUT_MAX_ATTEMPTS: &str = "lockout-max-attempts";
pub const ARG_LOCKOUT_SECONDS: &str = "lockout-seconds";

#[derive(Debug)]
pub struct Options {
    pub server_url: String,
    pub password: SecretString,
    pub lockout_file: PathBuf,
    pub lockout: LockoutPolicy,
}

impl Options {
    /// # Errors
    /// Returns an error if the password is missing, the URL is invalid or no
    /// lockout file location can be determined.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let server_url = matches
            .get_one::<String>(ARG_SERVER_URL)
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_SERVER_URL}"))?;
        url::Url::parse(&server_url)
            .map_err(|err| anyhow::anyhow!("invalid --{ARG_SERVER_URL}: {err}"))?;

        let password = matches
            .get_one::<String>(ARG_PASSWORD)
            .cloned()
            .map(SecretString::from)
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_PASSWORD}"))?;

        let lockout_file = match matches.get_one::<String>(ARG_LOCKOUT_FILE) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => default_lockout_path()?,
        };

        let max_attempts = matches
            .get_one::<u32>(ARG_LOCKOUT_MAX_ATTEMPTS)
            .copied()
            .unwrap_or(10);
        let lockout_seconds = matches
            .get_one::<u64>(ARG_LOCKOUT_SECONDS)
            .copied()
            .unwrap_or(900);

        Ok(Self {
            server_url,
            password,
            lockout_file,
            lockout: LockoutPolicy::new(max_attempts, Duration::from_secs(lockout_seconds)),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SERVER_URL)
                .long(ARG_SERVER_URL)
                .help("Base URL of the folio server")
                .env("FOLIO_SERVER_URL")
                .default_value("http://localhost:8080"),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .long(ARG_PASSWORD)
                .help("Admin password")
                .env("FOLIO_ADMIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_FILE)
                .long(ARG_LOCKOUT_FILE)
                .help("Where to keep the local attempt counter (default: user cache dir)")
                .env("FOLIO_LOCKOUT_FILE"),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_MAX_ATTEMPTS)
                .long(ARG_LOCKOUT_MAX_ATTEMPTS)
                .help("Failed logins before the client stops trying")
                .env("FOLIO_LOCKOUT_MAX_ATTEMPTS")
                .default_value("10")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_LOCKOUT_SECONDS)
                .long(ARG_LOCKOUT_SECONDS)
                .help("How long the client waits after too many failures")
                .env("FOLIO_LOCKOUT_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
}
