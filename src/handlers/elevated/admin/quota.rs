// handlers/elevated/admin/quota.rs - POST /api/admin/customers/:id/subaccounts/increase

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use super::parse_customer_id;
use crate::entitlement::validate_quota_increase;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAdmin};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuotaIncreaseRequest {
    pub increment: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaIncreaseResponse {
    pub customer_id: String,
    pub previous_max_subaccounts: i32,
    pub max_subaccounts: i32,
    pub total_subaccounts: i32,
}

pub async fn customer_quota_increase(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Path(id): Path<String>,
    payload: Result<Json<QuotaIncreaseRequest>, JsonRejection>,
) -> ApiResult<QuotaIncreaseResponse> {
    let id = parse_customer_id(&id)?;
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let current = state
        .store
        .find_customer(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Customer {} not found", id)))?;
    let increment = validate_quota_increase(current.max_subaccounts, request.increment)?;

    let updated = state.store.increase_max_subaccounts(id, increment).await?;
    tracing::info!(
        "Admin {} raised customer {} subaccount limit {} -> {}",
        admin.email,
        id,
        current.max_subaccounts,
        updated.max_subaccounts
    );

    Ok(ApiResponse::success(QuotaIncreaseResponse {
        customer_id: updated.id.to_string(),
        previous_max_subaccounts: current.max_subaccounts,
        max_subaccounts: updated.max_subaccounts,
        total_subaccounts: updated.total_subaccounts,
    }))
}
