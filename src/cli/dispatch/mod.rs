//! Command-line argument dispatch.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action. Configuration errors surface here, before anything binds or connects.

use crate::cli::{
    actions::{Action, hash, login as login_action, server},
    commands::{self, cache, credential, login, rate_limit, session},
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    match matches.subcommand() {
        Some((commands::CMD_SERVER, sub)) => server_action(sub),
        Some((commands::CMD_HASH, sub)) => hash_action(sub),
        Some((commands::CMD_LOGIN, sub)) => {
            let options = login::Options::parse(sub)?;
            Ok(Action::Login(login_action::Args {
                server_url: options.server_url,
                password: options.password,
                lockout_file: options.lockout_file,
                lockout: options.lockout,
            }))
        }
        Some((name, _)) => anyhow::bail!("unknown subcommand: {name}"),
        None => anyhow::bail!("missing subcommand"),
    }
}

fn server_action(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let frontend_base_url = matches
        .get_one::<String>("frontend-base-url")
        .cloned()
        .context("missing required argument: --frontend-base-url")?;

    let trusted_proxy_hops = matches
        .get_one::<usize>(commands::ARG_TRUSTED_PROXY_HOPS)
        .copied()
        .unwrap_or(0);

    Ok(Action::Server(server::Args {
        port,
        frontend_base_url,
        trusted_proxy_hops,
        credential: credential::Options::parse(matches)?,
        session: session::Options::parse(matches)?,
        rate_limit: rate_limit::parse(matches)?,
        cache: cache::Options::parse(matches)?,
    }))
}

fn hash_action(matches: &clap::ArgMatches) -> Result<Action> {
    let password = matches
        .get_one::<String>(commands::ARG_HASH_PASSWORD)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --password")?;
    let salt = matches
        .get_one::<String>(commands::ARG_HASH_SALT)
        .cloned()
        .filter(|salt| !salt.is_empty());

    Ok(Action::Hash(hash::Args {
        password,
        salt,
        params: credential::parse_kdf(matches)?,
    }))
}
