// handlers/protected/entitlement.rs - GET /api/entitlement
//
// Ungated: an expired customer still needs to see why they are locked out.

use axum::{extract::State, Extension};
use serde::Serialize;

use crate::entitlement::{classify, describe_entitlement, Entitlement, EntitlementSummary, ExpiryState};
use crate::middleware::{ApiResponse, ApiResult, AuthCustomer};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementView {
    pub customer_id: String,
    pub email: String,
    #[serde(flatten)]
    pub summary: EntitlementSummary,
    pub state: ExpiryState,
    pub max_subaccounts: u32,
    pub total_subaccounts: u32,
    pub remaining_subaccounts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub renew_url: Option<String>,
}

pub async fn entitlement_get(
    State(state): State<AppState>,
    Extension(customer): Extension<AuthCustomer>,
    Extension(snapshot): Extension<Entitlement>,
) -> ApiResult<EntitlementView> {
    let now = state.clock.now();
    let expiry_state = classify(&snapshot, now);

    // Remediation links are offered up front so the dashboard can render them.
    let (upgrade_url, renew_url) = match expiry_state {
        ExpiryState::TrialActive | ExpiryState::TrialExpired => (Some(state.links.upgrade_url()), None),
        ExpiryState::SubscriptionExpired => (None, Some(state.links.renew_url())),
        ExpiryState::SubscriptionActive | ExpiryState::InvalidPlan => (None, None),
    };

    Ok(ApiResponse::success(EntitlementView {
        customer_id: customer.id.to_string(),
        email: customer.email,
        summary: describe_entitlement(&snapshot, now),
        state: expiry_state,
        max_subaccounts: snapshot.max_subaccounts,
        total_subaccounts: snapshot.total_subaccounts,
        remaining_subaccounts: snapshot.remaining_subaccounts(),
        upgrade_url,
        renew_url,
    }))
}
