//! HTTP client used by `folio login`.

pub mod lockout;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::{APP_USER_AGENT, api::handlers::auth::types::LoginResponse};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("rate limited by server")]
    RateLimited,
    #[error("server unavailable")]
    Unavailable,
    #[error("unexpected response {status}: {body}")]
    Unexpected { status: StatusCode, body: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// # Errors
/// Returns an error if the TLS backend cannot be initialised.
pub fn http_client() -> anyhow::Result<Client> {
    Ok(Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()?)
}

#[must_use]
pub fn login_url(server_url: &str) -> String {
    format!("{}/v1/auth/login", server_url.trim_end_matches('/'))
}

/// POST the password to `/v1/auth/login`.
///
/// # Errors
/// Returns a [`ClientError`] for every non-200 outcome.
pub async fn login(
    http: &Client,
    server_url: &str,
    password: &SecretString,
) -> Result<LoginResponse, ClientError> {
    let response = http
        .post(login_url(server_url))
        .json(&serde_json::json!({ "password": password.expose_secret() }))
        .send()
        .await?;

    match response.status() {
        StatusCode::OK => Ok(response.json::<LoginResponse>().await?),
        StatusCode::UNAUTHORIZED => Err(ClientError::InvalidCredentials),
        StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited),
        StatusCode::SERVICE_UNAVAILABLE => Err(ClientError::Unavailable),
        status => Err(ClientError::Unexpected {
            status,
            body: response.text().await.unwrap_or_default(),
        }),
    }
}
