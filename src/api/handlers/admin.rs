//! Protected admin routes. Everything here sits behind `require_session`.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use super::auth::Principal;

const ADMIN_SUBJECT: &str = "admin";

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AdminIdentity {
    pub subject: String,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

#[utoipa::path(
    get,
    path = "/v1/admin/me",
    responses(
        (status = 200, description = "Current admin session", body = AdminIdentity),
        (status = 401, description = "Missing, invalid or expired session", body = String)
    ),
    security(
        ("session_cookie" = []),
        ("bearer" = [])
    ),
    tag = "admin"
)]
pub async fn me(Extension(principal): Extension<Principal>) -> impl IntoResponse {
    let identity = AdminIdentity {
        subject: ADMIN_SUBJECT.to_string(),
        issued_at: principal.session.issued_at(),
        expires_at: principal.session.expires_at(),
    };
    (StatusCode::OK, Json(identity))
}
