//! Auth state and HTTP-facing configuration.

use std::{sync::Arc, time::Duration};

use crate::{
    auth::{
        authorize::Authorizer,
        login::{LoginService, PasswordVerifier},
        rate_limit::{RateLimitPolicy, RateLimiter},
        session::{DEFAULT_SESSION_TTL, SessionIssuer, SessionStore},
    },
    cache::{Cache, Keyspace},
};

pub const DEFAULT_SESSION_COOKIE_NAME: &str = "folio_session";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_cookie_name: String,
    session_ttl: Duration,
    trusted_proxy_hops: usize,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_cookie_name: DEFAULT_SESSION_COOKIE_NAME.to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
            trusted_proxy_hops: 0,
        }
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: String) -> Self {
        self.session_cookie_name = name;
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Number of reverse proxies whose `X-Forwarded-For` entries are trusted.
    #[must_use]
    pub fn with_trusted_proxy_hops(mut self, hops: usize) -> Self {
        self.trusted_proxy_hops = hops;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn session_cookie_name(&self) -> &str {
        &self.session_cookie_name
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }

    #[must_use]
    pub fn trusted_proxy_hops(&self) -> usize {
        self.trusted_proxy_hops
    }

    pub(super) fn session_cookie_secure(&self) -> bool {
        self.frontend_base_url.starts_with("https://")
    }
}

pub struct AuthState {
    config: AuthConfig,
    login: LoginService,
    authorizer: Authorizer,
    sessions: SessionStore,
}

impl AuthState {
    /// Wire the auth core over one shared cache.
    #[must_use]
    pub fn new(
        config: AuthConfig,
        cache: Arc<dyn Cache>,
        keyspace: Keyspace,
        verifier: Arc<dyn PasswordVerifier>,
        policy: RateLimitPolicy,
    ) -> Self {
        let sessions = SessionStore::new(Arc::clone(&cache), keyspace.clone());
        let login = LoginService::new(
            RateLimiter::new(cache, keyspace, policy),
            verifier,
            SessionIssuer::new(sessions.clone(), config.session_ttl()),
        );
        Self {
            config,
            login,
            authorizer: Authorizer::new(sessions.clone()),
            sessions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn login(&self) -> &LoginService {
        &self.login
    }

    #[must_use]
    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}
