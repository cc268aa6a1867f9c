use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{Claims, Role};
use crate::entitlement::Entitlement;
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated customer context injected by [`customer_auth_middleware`]
#[derive(Clone, Debug)]
pub struct AuthCustomer {
    pub id: Uuid,
    pub email: String,
}

/// Authenticated admin context injected by [`admin_auth_middleware`]
#[derive(Clone, Debug)]
pub struct AuthAdmin {
    pub email: String,
}

/// Validates the customer token, loads the customer row and injects both the
/// caller identity and a fresh [`Entitlement`] snapshot into the request.
pub async fn customer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, request.headers(), &state.config.security.customer_cookie)?;
    if claims.role != Role::Customer {
        return Err(ApiError::authentication_required("Customer session required"));
    }

    let customer_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| ApiError::authentication_required("Invalid session subject"))?;

    // One store read per request; the snapshot is never reused across requests.
    let customer = state.store.find_customer(customer_id).await?.ok_or_else(|| {
        tracing::warn!("Customer {} from a valid token no longer exists", customer_id);
        ApiError::authentication_required("Authentication required")
    })?;

    let snapshot = Entitlement::from_customer(&customer);
    tracing::debug!(
        "Customer {} authenticated (plan={}, status={})",
        customer.id,
        snapshot.plan,
        snapshot.status
    );

    request.extensions_mut().insert(AuthCustomer {
        id: customer.id,
        email: customer.email,
    });
    request.extensions_mut().insert(snapshot);

    Ok(next.run(request).await)
}

/// Validates an admin token; customer tokens are refused with 403.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(&state, request.headers(), &state.config.security.admin_cookie)?;
    if claims.role != Role::Admin {
        tracing::warn!("Non-admin principal '{}' attempted an admin route", claims.sub);
        return Err(ApiError::forbidden("Admin access required"));
    }

    request.extensions_mut().insert(AuthAdmin { email: claims.email });
    Ok(next.run(request).await)
}

fn authenticate(state: &AppState, headers: &HeaderMap, cookie_name: &str) -> Result<Claims, ApiError> {
    let token = extract_token(headers, cookie_name)
        .ok_or_else(|| ApiError::authentication_required("Authentication required"))?;

    state.tokens.verify(&token).map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        ApiError::authentication_required("Invalid or expired session")
    })
}

/// Session cookie first, then `Authorization: Bearer`.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    cookie_value(headers, cookie_name).or_else(|| bearer_token(headers))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_str = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// `Set-Cookie` value for a session token.
pub fn session_cookie(name: &str, token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that expires the named cookie immediately.
pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}
