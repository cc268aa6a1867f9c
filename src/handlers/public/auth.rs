// handlers/public/auth.rs - Admin login and logout
//
// Customer sessions are minted by the identity provider that shares the JWT
// secret; only the admin panel signs in here.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{verify_admin_credentials, Role};
use crate::error::ApiError;
use crate::middleware::auth::{clear_cookie, session_cookie};
use crate::middleware::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLoginResponse {
    pub token: String,
    pub expires_in: i64,
}

/// POST /auth/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    payload: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    if !verify_admin_credentials(&state.config.security, &body.email, &body.password) {
        tracing::warn!("Failed admin login for '{}'", body.email);
        return Err(ApiError::authentication_required("Invalid email or password"));
    }

    let email = body.email.trim().to_ascii_lowercase();
    let token = state.tokens.issue(&email, &email, Role::Admin).map_err(|e| {
        tracing::error!("Failed to issue admin token: {}", e);
        ApiError::internal_server_error("Failed to create session")
    })?;

    let expires_in = state.tokens.ttl().num_seconds();
    let cookie = session_cookie(
        &state.config.security.admin_cookie,
        &token,
        expires_in,
        state.config.security.require_https,
    );

    tracing::info!("Admin '{}' signed in", email);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        ApiResponse::success(AdminLoginResponse { token, expires_in }),
    ))
}

/// POST /auth/logout - clears both session cookies
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let security = &state.config.security;
    (
        AppendHeaders([
            (SET_COOKIE, clear_cookie(&security.customer_cookie)),
            (SET_COOKIE, clear_cookie(&security.admin_cookie)),
        ]),
        ApiResponse::success(serde_json::json!({ "loggedOut": true })),
    )
}
