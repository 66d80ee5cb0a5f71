//! Authenticated principal extraction for protected routes.
//!
//! Flow Overview: [`require_session`] reads the session token, asks the
//! authorizer for a verdict, and either short-circuits with 401 or stores a
//! [`Principal`] in the request extensions for the handler.

use axum::{
    extract::{Extension, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use super::{session::extract_session_token, state::AuthState};
use crate::auth::{authorize::Verdict, session::Session};

/// The administrator, as seen by a protected handler.
#[derive(Clone, Debug)]
pub struct Principal {
    pub session: Session,
}

/// Middleware guarding every protected route.
///
/// Missing, malformed, unknown and expired tokens all get the same 401 body.
pub async fn require_session(
    Extension(auth_state): Extension<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_session_token(
        request.headers(),
        auth_state.config().session_cookie_name(),
    );
    match auth_state.authorizer().authorize(token.as_deref()).await {
        Verdict::Authorized(session) => {
            request.extensions_mut().insert(Principal { session });
            next.run(request).await
        }
        Verdict::Unauthorized(reason) => {
            debug!(?reason, "Rejected protected request");
            (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()).into_response()
        }
    }
}
