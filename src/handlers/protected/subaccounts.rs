// handlers/protected/subaccounts.rs - GHL location links
//
// GET  /api/subaccounts  list linked locations
// POST /api/subaccounts  link a new location, counted against the quota

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::database::models::Subaccount;
use crate::database::{LinkOutcome, NewSubaccount};
use crate::entitlement::{check_subaccount_quota, Denial, Entitlement};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthCustomer};
use crate::state::AppState;

const MAX_LOCATION_ID_LEN: usize = 128;
const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSubaccountRequest {
    pub location_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl LinkSubaccountRequest {
    fn into_new_subaccount(self) -> Result<NewSubaccount, ApiError> {
        let location_id = self.location_id.trim().to_string();
        if location_id.is_empty() {
            return Err(ApiError::field_error("locationId", "must not be empty"));
        }
        if location_id.len() > MAX_LOCATION_ID_LEN {
            return Err(ApiError::field_error(
                "locationId",
                format!("must be at most {} characters", MAX_LOCATION_ID_LEN),
            ));
        }

        let name = self.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if name.as_ref().is_some_and(|n| n.len() > MAX_NAME_LEN) {
            return Err(ApiError::field_error(
                "name",
                format!("must be at most {} characters", MAX_NAME_LEN),
            ));
        }

        Ok(NewSubaccount { location_id, name })
    }
}

pub async fn subaccounts_get(
    State(state): State<AppState>,
    Extension(customer): Extension<AuthCustomer>,
) -> ApiResult<Vec<Subaccount>> {
    let subaccounts = state.store.list_subaccounts(customer.id).await?;
    Ok(ApiResponse::success(subaccounts))
}

pub async fn subaccounts_post(
    State(state): State<AppState>,
    Extension(customer): Extension<AuthCustomer>,
    Extension(snapshot): Extension<Entitlement>,
    payload: Result<Json<LinkSubaccountRequest>, JsonRejection>,
) -> ApiResult<Subaccount> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let link = body.into_new_subaccount()?;

    check_subaccount_quota(&snapshot, 1, &state.links).map_err(|denial| {
        tracing::warn!(
            "Customer {} at subaccount limit ({}/{})",
            customer.id,
            snapshot.total_subaccounts,
            snapshot.max_subaccounts
        );
        ApiError::from(denial)
    })?;

    match state.store.link_subaccount(customer.id, &link).await? {
        LinkOutcome::Linked(subaccount) => {
            tracing::info!("Customer {} linked location {}", customer.id, subaccount.location_id);
            Ok(ApiResponse::created(subaccount))
        }
        LinkOutcome::QuotaExhausted => {
            // Lost a race with a concurrent link; report the counts as they are now.
            let fresh = state
                .store
                .find_customer(customer.id)
                .await?
                .map(|c| Entitlement::from_customer(&c))
                .unwrap_or(snapshot);
            tracing::warn!("Customer {} quota exhausted at write time", customer.id);
            Err(Denial::subaccount_limit_reached(fresh.total_subaccounts, fresh.max_subaccounts, &state.links).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(location_id: &str, name: Option<&str>) -> LinkSubaccountRequest {
        LinkSubaccountRequest {
            location_id: location_id.to_string(),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn trims_and_drops_blank_names() {
        let link = request("  loc_123 ", Some("   ")).into_new_subaccount().unwrap();
        assert_eq!(link.location_id, "loc_123");
        assert_eq!(link.name, None);
    }

    #[test]
    fn rejects_blank_or_oversized_location() {
        let err = request("   ", None).into_new_subaccount().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");

        let long = "x".repeat(MAX_LOCATION_ID_LEN + 1);
        assert!(request(&long, None).into_new_subaccount().is_err());
    }
}
