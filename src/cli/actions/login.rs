use crate::client::{
    self, ClientError,
    lockout::{LockoutCheck, LockoutMirror, LockoutPolicy},
};
use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use std::{path::PathBuf, time::SystemTime};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct Args {
    pub server_url: String,
    pub password: SecretString,
    pub lockout_file: PathBuf,
    pub lockout: LockoutPolicy,
}

/// Log in against a running server, guided by the local lockout mirror.
/// # Errors
/// Returns an error if the client is locked out locally, the server refuses the
/// login, or the lockout file cannot be read or written.
pub async fn execute(args: Args) -> Result<()> {
    let mut mirror = LockoutMirror::load(&args.lockout_file, &args.server_url, args.lockout)
        .with_context(|| format!("Failed to load {}", args.lockout_file.display()))?;

    if let LockoutCheck::Wait { remaining } = mirror.check(SystemTime::now()) {
        bail!(
            "Too many failed attempts; wait {}s before trying again",
            remaining.as_secs().max(1)
        );
    }

    let http = client::http_client()?;
    match client::login(&http, &args.server_url, &args.password).await {
        Ok(login) => {
            mirror.record_success();
            mirror.save().context("Failed to update lockout file")?;
            debug!(expires_at = %login.expires_at, "Login succeeded");
            println!("{}", login.token);
            Ok(())
        }
        Err(ClientError::InvalidCredentials) => {
            mirror.record_failure(SystemTime::now());
            if let Err(err) = mirror.save() {
                warn!("Failed to update lockout file: {err}");
            }
            bail!("Invalid credentials")
        }
        Err(ClientError::RateLimited) => {
            mirror.record_lockout(SystemTime::now());
            if let Err(err) = mirror.save() {
                warn!("Failed to update lockout file: {err}");
            }
            bail!("Server rate limit reached; try again later")
        }
        Err(err) => Err(err.into()),
    }
}
