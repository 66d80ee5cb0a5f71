use clap::{Arg, ArgMatches, Command};
use std::time::Duration;

pub const ARG_CACHE_URL: &str = "cache-url";
pub const ARG_CACHE_KEY_PREFIX: &str = "cache-key-prefix";
pub const ARG_CACHE_TIMEOUT_MS: &str = "cache-timeout-ms";

#[derive(Debug)]
pub struct Options {
    pub url: String,
    pub key_prefix: String,
    pub timeout: Duration,
}

impl Options {
    /// # Errors
    /// Returns an error if the cache URL is missing or the timeout is zero.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = matches
            .get_one::<String>(ARG_CACHE_URL)
            .cloned()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --{ARG_CACHE_URL}"))?;
        let key_prefix = matches
            .get_one::<String>(ARG_CACHE_KEY_PREFIX)
            .cloned()
            .unwrap_or_default();
        let timeout_ms = matches
            .get_one::<u64>(ARG_CACHE_TIMEOUT_MS)
            .copied()
            .unwrap_or(2000);
        if timeout_ms == 0 {
            anyhow::bail!("--{ARG_CACHE_TIMEOUT_MS} must be positive");
        }
        Ok(Self {
            url,
            key_prefix,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CACHE_URL)
                .long(ARG_CACHE_URL)
                .help("Shared cache URL: redis://, rediss:// or memory:// (single process only)")
                .env("FOLIO_CACHE_URL")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_CACHE_KEY_PREFIX)
                .long(ARG_CACHE_KEY_PREFIX)
                .help("Prefix for every key this service writes")
                .env("FOLIO_CACHE_KEY_PREFIX")
                .default_value("folio"),
        )
        .arg(
            Arg::new(ARG_CACHE_TIMEOUT_MS)
                .long(ARG_CACHE_TIMEOUT_MS)
                .help("Timeout for each cache operation in milliseconds")
                .env("FOLIO_CACHE_TIMEOUT_MS")
                .default_value("2000")
                .value_parser(clap::value_parser!(u64)),
        )
}
