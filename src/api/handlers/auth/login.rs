//! Password login endpoint.

use axum::{
    Json,
    extract::{ConnectInfo, Extension},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
};
use secrecy::SecretString;
use std::{net::SocketAddr, sync::Arc};
use tracing::error;

use super::{
    session::session_cookie,
    state::AuthState,
    types::{LoginRequest, LoginResponse},
    utils::client_key,
};
use crate::auth::login::LoginError;

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Missing payload", body = String),
        (status = 401, description = "Invalid credentials", body = String),
        (status = 429, description = "Rate limited", body = String),
        (status = 503, description = "Session store unavailable", body = String)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };
    // The configured salt is authoritative; request.salt is ignored.
    let password = SecretString::from(request.password);
    let client = client_key(
        &headers,
        connect_info.as_ref(),
        auth_state.config().trusted_proxy_hops(),
    );

    let session = match auth_state.login().login(&client, password).await {
        Ok(session) => session,
        Err(err) => {
            let (status, message) = login_error_response(&err);
            return (status, message.to_string()).into_response();
        }
    };

    let mut response_headers = HeaderMap::new();
    match session_cookie(auth_state.config(), session.token()) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    (
        StatusCode::OK,
        response_headers,
        Json(LoginResponse::from(&session)),
    )
        .into_response()
}

fn login_error_response(err: &LoginError) -> (StatusCode, &'static str) {
    match err {
        LoginError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Too many attempts"),
        LoginError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
        LoginError::LimiterUnavailable(inner) => {
            error!("Rate limiter unavailable: {inner}");
            (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
        }
        LoginError::SessionUnavailable(inner) => {
            error!("Session store unavailable: {inner}");
            (StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
        }
        LoginError::Verification(inner) => {
            error!("Credential verification failed: {inner}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::session::SessionError, cache::CacheError};

    #[test]
    fn login_errors_map_to_generic_responses() {
        assert_eq!(
            login_error_response(&LoginError::RateLimited).0,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            login_error_response(&LoginError::InvalidCredentials),
            (StatusCode::UNAUTHORIZED, "Invalid credentials")
        );

        let unavailable = LoginError::SessionUnavailable(SessionError::Cache(
            CacheError::Unavailable("connection refused to 10.1.2.3".to_string()),
        ));
        let (status, message) = login_error_response(&unavailable);
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!message.contains("10.1.2.3"));
    }
}
