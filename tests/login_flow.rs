//! End-to-end tests for the admin login flow.
//!
//! Each test builds the full application router over an in-memory cache and
//! drives it with `tower::ServiceExt::oneshot`, so no socket is bound. Clients
//! are told apart by the `ConnectInfo` peer address attached to each request.

use anyhow::{Context, Result};
use axum::{
    Router,
    body::{Body, to_bytes},
    extract::ConnectInfo,
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    response::Response,
};
use folio::{
    api::{self, AuthConfig, handlers::auth::AuthState},
    auth::{
        credential::{CredentialVerifier, provision},
        kdf::KdfParams,
        rate_limit::RateLimitPolicy,
    },
    cache::{Cache, Keyspace, MemoryCache},
};
use serde_json::{Value, json};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::Duration,
};
use tower::ServiceExt;

const PASSWORD: &str = "correct-horse-battery-staple";
const FRONTEND: &str = "https://folio.dev";

fn app_with_policy(policy: RateLimitPolicy) -> Result<Router> {
    app_with(policy, 0)
}

fn app_with(policy: RateLimitPolicy, trusted_proxy_hops: usize) -> Result<Router> {
    let params = KdfParams::default();
    let reference = provision(PASSWORD, Some("integration-salt"), &params);
    let verifier = Arc::new(CredentialVerifier::new(reference, params));
    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());
    let state = Arc::new(AuthState::new(
        AuthConfig::new(FRONTEND.to_string()).with_trusted_proxy_hops(trusted_proxy_hops),
        Arc::clone(&cache),
        Keyspace::new("folio-test"),
        verifier,
        policy,
    ));
    api::app(state, cache)
}

fn app() -> Result<Router> {
    app_with_policy(RateLimitPolicy::default())
}

fn login_request(ip: &str, password: &str) -> Result<Request<Body>> {
    let peer = SocketAddr::new(ip.parse::<IpAddr>()?, 51_000);
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "password": password }).to_string()))?;
    request.extensions_mut().insert(ConnectInfo(peer));
    Ok(request)
}

fn forwarded_login(peer: &str, forwarded_for: &str, password: &str) -> Result<Request<Body>> {
    let mut request = login_request(peer, password)?;
    request
        .headers_mut()
        .insert("x-forwarded-for", forwarded_for.parse()?);
    Ok(request)
}

fn get(uri: &str) -> Request<Body> {
    let mut request = Request::new(Body::empty());
    *request.uri_mut() = uri.parse().unwrap_or_default();
    request
}

async fn json_body(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn login_token(app: &Router, ip: &str) -> Result<String> {
    let response = app.clone().oneshot(login_request(ip, PASSWORD)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    body["token"]
        .as_str()
        .map(ToString::to_string)
        .context("login response has no token")
}

#[tokio::test]
async fn login_sets_cookie_and_returns_session() -> Result<()> {
    let app = app()?;
    let response = app
        .clone()
        .oneshot(login_request("203.0.113.1", PASSWORD)?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .context("missing Set-Cookie")?
        .to_str()?
        .to_string();
    assert!(cookie.starts_with("folio_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains("Max-Age=86400"));
    assert!(cookie.contains("Secure"));

    let body = json_body(response).await?;
    let token = body["token"].as_str().context("missing token")?;
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(cookie.contains(token));
    assert!(body["issued_at"].is_string());
    assert!(body["expires_at"].is_string());
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_unauthorized() -> Result<()> {
    let response = app()?
        .oneshot(login_request("203.0.113.2", "wrong")?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(SET_COOKIE).is_none());
    Ok(())
}

#[tokio::test]
async fn missing_payload_is_bad_request() -> Result<()> {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/login")
        .body(Body::empty())?;
    let response = app()?.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn repeated_failures_are_rate_limited_per_client() -> Result<()> {
    let policy = RateLimitPolicy::new(3, Duration::from_secs(900))?;
    let app = app_with_policy(policy)?;

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(login_request("198.51.100.7", "wrong")?)
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // The right password does not bypass the limiter.
    let response = app
        .clone()
        .oneshot(login_request("198.51.100.7", PASSWORD)?)
        .await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Another client is unaffected.
    let response = app
        .clone()
        .oneshot(login_request("198.51.100.8", PASSWORD)?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn forwarded_header_ignored_without_trusted_proxy() -> Result<()> {
    let policy = RateLimitPolicy::new(3, Duration::from_secs(900))?;
    let app = app_with_policy(policy)?;

    let mut statuses = Vec::new();
    for i in 0..5 {
        let request = forwarded_login("203.0.113.66", &format!("10.9.9.{i}"), "wrong")?;
        statuses.push(app.clone().oneshot(request).await?.status());
    }
    assert_eq!(
        statuses,
        vec![
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::UNAUTHORIZED,
            StatusCode::TOO_MANY_REQUESTS,
            StatusCode::TOO_MANY_REQUESTS,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn rotating_leftmost_forwarded_hop_still_rate_limited() -> Result<()> {
    let policy = RateLimitPolicy::new(3, Duration::from_secs(900))?;
    let app = app_with(policy, 1)?;

    // The trusted proxy appends the real client; the client controls the rest.
    let mut statuses = Vec::new();
    for i in 0..5 {
        let request = forwarded_login(
            "10.0.0.2",
            &format!("10.9.9.{i}, 203.0.113.66"),
            "wrong",
        )?;
        statuses.push(app.clone().oneshot(request).await?.status());
    }
    assert_eq!(statuses[..3], [StatusCode::UNAUTHORIZED; 3]);
    assert_eq!(statuses[3..], [StatusCode::TOO_MANY_REQUESTS; 2]);

    // A different client behind the same proxy keeps its own budget.
    let request = forwarded_login("10.0.0.2", "10.9.9.0, 198.51.100.9", PASSWORD)?;
    assert_eq!(app.clone().oneshot(request).await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn protected_route_requires_session() -> Result<()> {
    let app = app()?;

    let response = app.clone().oneshot(get("/v1/admin/me")).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let mut forged = get("/v1/admin/me");
    forged
        .headers_mut()
        .insert(AUTHORIZATION, format!("Bearer {}", "ab".repeat(32)).parse()?);
    let response = app.clone().oneshot(forged).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = login_token(&app, "203.0.113.10").await?;

    let mut by_bearer = get("/v1/admin/me");
    by_bearer
        .headers_mut()
        .insert(AUTHORIZATION, format!("Bearer {token}").parse()?);
    let response = app.clone().oneshot(by_bearer).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["subject"], "admin");

    let mut by_cookie = get("/v1/admin/me");
    by_cookie
        .headers_mut()
        .insert(COOKIE, format!("theme=dark; folio_session={token}").parse()?);
    let response = app.clone().oneshot(by_cookie).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn session_probe_and_logout() -> Result<()> {
    let app = app()?;

    let response = app.clone().oneshot(get("/v1/auth/session")).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let token = login_token(&app, "203.0.113.20").await?;
    let with_cookie = |uri: &str, method: Method| -> Result<Request<Body>> {
        Ok(Request::builder()
            .method(method)
            .uri(uri)
            .header(COOKIE, format!("folio_session={token}"))
            .body(Body::empty())?)
    };

    let response = app
        .clone()
        .oneshot(with_cookie("/v1/auth/session", Method::GET)?)
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert!(body["expires_at"].is_string());
    assert!(body.get("token").is_none());

    let response = app
        .clone()
        .oneshot(with_cookie("/v1/auth/logout", Method::POST)?)
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = response
        .headers()
        .get(SET_COOKIE)
        .context("logout must clear the cookie")?
        .to_str()?;
    assert!(cleared.contains("Max-Age=0"));

    let response = app
        .clone()
        .oneshot(with_cookie("/v1/admin/me", Method::GET)?)
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(with_cookie("/v1/auth/session", Method::GET)?)
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn health_reports_cache_and_request_id() -> Result<()> {
    let response = app()?.oneshot(get("/health")).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("X-App"));
    let body = json_body(response).await?;
    assert_eq!(body["cache"], "ok");
    Ok(())
}
