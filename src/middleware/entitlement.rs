use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::auth::AuthCustomer;
use crate::entitlement::{authorize, AccessError, DenialCode, Entitlement, Gate};
use crate::error::ApiError;
use crate::state::AppState;

/// Runs `gate` against the snapshot injected by `customer_auth_middleware`.
///
/// Mounted per route group with
/// `middleware::from_fn_with_state((state, gate), entitlement_gate)`.
pub async fn entitlement_gate(
    State((state, gate)): State<(AppState, Gate)>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let now = state.clock.now();
    let snapshot = request.extensions().get::<Entitlement>();

    if let Err(err) = authorize(snapshot, &gate, now, &state.links) {
        let customer = request
            .extensions()
            .get::<AuthCustomer>()
            .map(|c| c.id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        match &err {
            AccessError::AuthenticationRequired => {
                tracing::debug!("Gate {} reached without a customer snapshot", gate.name());
            }
            AccessError::Denied(denial) if denial.code == DenialCode::InvalidPlan => {
                // Not a user state: the stored plan value is corrupt or unknown.
                tracing::error!(
                    "Customer {} has unrecognized plan {:?} (gate {})",
                    customer,
                    denial.current_plan,
                    gate.name()
                );
            }
            AccessError::Denied(denial) => {
                tracing::warn!("Customer {} denied by gate {}: {}", customer, gate.name(), denial.code);
            }
        }
        return Err(err.into());
    }

    Ok(next.run(request).await)
}
