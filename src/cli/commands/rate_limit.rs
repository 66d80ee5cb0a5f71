use clap::{Arg, ArgAction, ArgMatches, Command};
use std::time::Duration;

use crate::auth::rate_limit::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW, RateLimitPolicy};

pub const ARG_MAX_ATTEMPTS: &str = "rate-limit-max-attempts";
pub const ARG_WINDOW_SECONDS: &str = "rate-limit-window-seconds";
pub const ARG_RESET_ON_SUCCESS: &str = "rate-limit-reset-on-success";

/// # Errors
/// Returns an error if the attempt budget or window is zero.
pub fn parse(matches: &ArgMatches) -> anyhow::Result<RateLimitPolicy> {
    let max_attempts = matches
        .get_one::<u32>(ARG_MAX_ATTEMPTS)
        .copied()
        .unwrap_or(DEFAULT_MAX_ATTEMPTS);
    let window = matches
        .get_one::<u64>(ARG_WINDOW_SECONDS)
        .copied()
        .map_or(DEFAULT_WINDOW, Duration::from_secs);
    let reset_on_success = matches
        .get_one::<bool>(ARG_RESET_ON_SUCCESS)
        .copied()
        .unwrap_or(true);
    Ok(RateLimitPolicy::new(max_attempts, window)?.with_reset_on_success(reset_on_success))
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_MAX_ATTEMPTS)
                .long(ARG_MAX_ATTEMPTS)
                .help("Login attempts allowed per client IP within one window")
                .env("FOLIO_RATE_LIMIT_MAX_ATTEMPTS")
                .default_value("10")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new(ARG_WINDOW_SECONDS)
                .long(ARG_WINDOW_SECONDS)
                .help("Rate limit window in seconds, counted from the first attempt")
                .env("FOLIO_RATE_LIMIT_WINDOW_SECONDS")
                .default_value("900")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_RESET_ON_SUCCESS)
                .long(ARG_RESET_ON_SUCCESS)
                .help("Clear the client's attempt count after a successful login")
                .env("FOLIO_RATE_LIMIT_RESET_ON_SUCCESS")
                .default_value("true")
                .action(ArgAction::Set)
                .value_parser(clap::value_parser!(bool)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() -> anyhow::Result<()> {
        temp_env::with_vars(
            [
                ("FOLIO_RATE_LIMIT_MAX_ATTEMPTS", None::<&str>),
                ("FOLIO_RATE_LIMIT_WINDOW_SECONDS", None::<&str>),
                ("FOLIO_RATE_LIMIT_RESET_ON_SUCCESS", None::<&str>),
            ],
            || {
                let matches = with_args(Command::new("test")).try_get_matches_from(["test"])?;
                assert_eq!(parse(&matches)?, RateLimitPolicy::default());
                Ok(())
            },
        )
    }

    #[test]
    fn env_overrides() -> anyhow::Result<()> {
        temp_env::with_vars(
            [
                ("FOLIO_RATE_LIMIT_MAX_ATTEMPTS", Some("5")),
                ("FOLIO_RATE_LIMIT_WINDOW_SECONDS", Some("60")),
                ("FOLIO_RATE_LIMIT_RESET_ON_SUCCESS", Some("false")),
            ],
            || {
                let matches = with_args(Command::new("test")).try_get_matches_from(["test"])?;
                let policy = parse(&matches)?;
                assert_eq!(policy.max_attempts(), 5);
                assert_eq!(policy.window(), Duration::from_secs(60));
                assert!(!policy.reset_on_success());
                Ok(())
            },
        )
    }

    #[test]
    fn zero_budget_rejected() -> anyhow::Result<()> {
        let matches = with_args(Command::new("test"))
            .try_get_matches_from(["test", "--rate-limit-max-attempts", "0"])?;
        assert!(parse(&matches).is_err());
        Ok(())
    }
}
