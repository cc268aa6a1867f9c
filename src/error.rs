// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::database::DatabaseError;
use crate::entitlement::{AccessError, Denial, QuotaIncreaseError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized - no authenticated customer or admin
    AuthenticationRequired(String),

    // 403 Forbidden - authenticated, but the wrong kind of principal
    Forbidden(String),

    // 403 Forbidden - entitlement policy said no
    Entitlement(Denial),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::AuthenticationRequired(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::Entitlement(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::AuthenticationRequired(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::Entitlement(denial) => &denial.message,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::AuthenticationRequired(_) => "AUTHENTICATION_REQUIRED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::Entitlement(denial) => denial.code.as_str(),
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Entitlement(denial) => {
                // Denial already carries code, message and remediation fields.
                let mut response = serde_json::to_value(denial).unwrap_or_else(|_| json!({}));
                response["success"] = json!(false);
                response["message"] = json!(denial.message);
                response["code"] = json!(denial.code.as_str());
                response
            }
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "success": false,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["fieldErrors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "success": false,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, field_errors: Option<HashMap<String, String>>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Single-field validation failure
    pub fn field_error(field: &str, reason: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), reason.into());
        ApiError::validation_error("Invalid request body", Some(field_errors))
    }

    pub fn authentication_required(message: impl Into<String>) -> Self {
        ApiError::AuthenticationRequired(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<Denial> for ApiError {
    fn from(denial: Denial) -> Self {
        ApiError::Entitlement(denial)
    }
}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::AuthenticationRequired => ApiError::authentication_required("Authentication required"),
            AccessError::Denied(denial) => ApiError::Entitlement(denial),
        }
    }
}

impl From<QuotaIncreaseError> for ApiError {
    fn from(err: QuotaIncreaseError) -> Self {
        ApiError::field_error("increment", err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::Conflict(msg) => ApiError::conflict(msg),
            DatabaseError::ConfigMissing(key) => {
                tracing::error!("Database not configured: {} is missing", key);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Unavailable(msg) => {
                tracing::error!("Database unavailable: {}", msg);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::denial::test_links;
    use crate::entitlement::Plan;

    #[test]
    fn entitlement_denials_render_the_remediation_body() {
        let err = ApiError::from(Denial::plan_upgrade_required(&Plan::Basic, &Plan::Pro, &test_links()));
        assert_eq!(err.status_code(), 403);

        let body = err.to_json();
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["code"], json!("PLAN_UPGRADE_REQUIRED"));
        assert_eq!(body["currentPlan"], json!("basic"));
        assert_eq!(body["requiredPlan"], json!("pro"));
        assert!(body["upgradeUrl"].is_string());
    }

    #[test]
    fn missing_snapshot_maps_to_401_with_its_own_code() {
        let err = ApiError::from(AccessError::AuthenticationRequired);
        assert_eq!(err.status_code(), 401);
        assert_eq!(err.error_code(), "AUTHENTICATION_REQUIRED");
    }

    #[test]
    fn database_failures_hide_internals() {
        let err = ApiError::from(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Database error occurred");

        let err = ApiError::from(DatabaseError::Unavailable("connection refused".into()));
        assert_eq!(err.status_code(), 503);
    }

    #[test]
    fn quota_validation_names_the_field() {
        let err = ApiError::from(QuotaIncreaseError::NotPositive(0));
        assert_eq!(err.status_code(), 400);
        assert!(err.to_json()["fieldErrors"]["increment"].is_string());
    }
}
