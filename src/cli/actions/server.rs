use crate::{
    api::{self, AuthConfig, handlers::auth::AuthState},
    auth::{credential::CredentialVerifier, rate_limit::RateLimitPolicy},
    cache::{self, Keyspace},
    cli::commands::{cache as cache_args, credential, session},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub frontend_base_url: String,
    pub trusted_proxy_hops: usize,
    pub credential: credential::Options,
    pub session: session::Options,
    pub rate_limit: RateLimitPolicy,
    pub cache: cache_args::Options,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the cache cannot be reached or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!(
        iterations = args.credential.params.iterations(),
        digest = %args.credential.params.digest(),
        max_attempts = args.rate_limit.max_attempts(),
        window_seconds = args.rate_limit.window().as_secs(),
        trusted_proxy_hops = args.trusted_proxy_hops,
        "Server configuration loaded"
    );

    let cache = cache::connect(&args.cache.url, args.cache.timeout)
        .await
        .context("Failed to initialize session cache")?;
    let keyspace = Keyspace::new(&args.cache.key_prefix);
    info!(prefix = keyspace.prefix(), "Session cache ready");

    let verifier = Arc::new(CredentialVerifier::new(
        args.credential.reference,
        args.credential.params,
    ));

    let auth_config = AuthConfig::new(args.frontend_base_url)
        .with_session_cookie_name(args.session.cookie_name)
        .with_session_ttl(args.session.ttl)
        .with_trusted_proxy_hops(args.trusted_proxy_hops);

    let auth_state = Arc::new(AuthState::new(
        auth_config,
        Arc::clone(&cache),
        keyspace,
        verifier,
        args.rate_limit,
    ));

    api::new(args.port, auth_state, cache).await
}
