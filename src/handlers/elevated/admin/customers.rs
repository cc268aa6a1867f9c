// handlers/elevated/admin/customers.rs - Customer listing and plan changes

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::parse_customer_id;
use crate::database::models::{Customer, Subaccount};
use crate::database::{CustomerFilter, PlanChange};
use crate::entitlement::{classify, describe_entitlement, Entitlement, EntitlementSummary, ExpiryState, Plan, PlanStatus};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthAdmin};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    pub plan: Option<String>,
    pub status: Option<String>,
}

impl CustomerListQuery {
    fn into_filter(self) -> Result<CustomerFilter, ApiError> {
        let plan = match self.plan.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(raw) => {
                let plan = Plan::parse(raw);
                if !plan.is_recognized() {
                    return Err(ApiError::bad_request(format!("Unknown plan filter '{}'", raw)));
                }
                Some(plan)
            }
            None => None,
        };
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => {
                let status = PlanStatus::parse(raw);
                if !status.is_recognized() {
                    return Err(ApiError::bad_request(format!("Unknown status filter '{}'", raw)));
                }
                Some(status)
            }
            None => None,
        };
        Ok(CustomerFilter { plan, status })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOverview {
    #[serde(flatten)]
    pub customer: Customer,
    pub entitlement: EntitlementSummary,
    pub state: ExpiryState,
}

impl CustomerOverview {
    fn new(customer: Customer, now: DateTime<Utc>) -> Self {
        let snapshot = Entitlement::from_customer(&customer);
        Self {
            entitlement: describe_entitlement(&snapshot, now),
            state: classify(&snapshot, now),
            customer,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetail {
    #[serde(flatten)]
    pub overview: CustomerOverview,
    pub subaccounts: Vec<Subaccount>,
}

pub async fn customer_list(
    State(state): State<AppState>,
    Query(query): Query<CustomerListQuery>,
) -> ApiResult<Vec<CustomerOverview>> {
    let filter = query.into_filter()?;
    let now = state.clock.now();
    let customers = state.store.list_customers(&filter).await?;

    let overviews = customers.into_iter().map(|c| CustomerOverview::new(c, now)).collect();
    Ok(ApiResponse::success(overviews))
}

pub async fn customer_show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CustomerDetail> {
    let id = parse_customer_id(&id)?;
    let customer = state
        .store
        .find_customer(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Customer {} not found", id)))?;
    let subaccounts = state.store.list_subaccounts(id).await?;

    Ok(ApiResponse::success(CustomerDetail {
        overview: CustomerOverview::new(customer, state.clock.now()),
        subaccounts,
    }))
}

// Distinguishes an absent field (keep) from an explicit null (clear).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlanUpdateRequest {
    pub plan: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub trial_ends_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "double_option")]
    pub subscription_ends_at: Option<Option<DateTime<Utc>>>,
}

/// Merge an admin plan update onto the current row.
///
/// The target plan must be recognized. Only the expiry governing that plan
/// survives; the other one is cleared. Switching plan without an explicit
/// status resets the status to the plan's natural one.
pub fn resolve_plan_change(current: &Customer, request: &PlanUpdateRequest) -> Result<PlanChange, ApiError> {
    let current_plan = Plan::parse(&current.plan);
    let plan = match request.plan.as_deref() {
        Some(raw) => Plan::parse(raw),
        None => current_plan.clone(),
    };
    if !plan.is_recognized() {
        return Err(ApiError::field_error(
            "plan",
            format!(
                "must be one of: {}",
                Plan::RECOGNIZED.iter().map(Plan::as_str).collect::<Vec<_>>().join(", ")
            ),
        ));
    }

    let status = match request.status.as_deref() {
        Some(raw) => {
            let status = PlanStatus::parse(raw);
            if !status.is_recognized() {
                return Err(ApiError::field_error("status", format!("unknown status '{}'", raw)));
            }
            status
        }
        None if plan != current_plan => {
            if plan.is_trial() {
                PlanStatus::Trial
            } else {
                PlanStatus::Active
            }
        }
        None => PlanStatus::parse(&current.status),
    };

    let (trial_ends_at, subscription_ends_at) = if plan.is_trial() {
        if matches!(request.subscription_ends_at, Some(Some(_))) {
            return Err(ApiError::field_error("subscriptionEndsAt", "does not apply to the trial plan"));
        }
        (request.trial_ends_at.unwrap_or(current.trial_ends_at), None)
    } else {
        if matches!(request.trial_ends_at, Some(Some(_))) {
            return Err(ApiError::field_error("trialEndsAt", "only applies to the trial plan"));
        }
        (None, request.subscription_ends_at.unwrap_or(current.subscription_ends_at))
    };

    Ok(PlanChange {
        plan,
        status,
        trial_ends_at,
        subscription_ends_at,
    })
}

pub async fn customer_plan_update(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthAdmin>,
    Path(id): Path<String>,
    payload: Result<Json<PlanUpdateRequest>, JsonRejection>,
) -> ApiResult<CustomerOverview> {
    let id = parse_customer_id(&id)?;
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let current = state
        .store
        .find_customer(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Customer {} not found", id)))?;
    let change = resolve_plan_change(&current, &request)?;

    let updated = state.store.update_plan(id, &change).await?;
    tracing::info!(
        "Admin {} changed customer {} plan {} -> {} (status {})",
        admin.email,
        id,
        current.plan,
        updated.plan,
        updated.status
    );

    Ok(ApiResponse::success(CustomerOverview::new(updated, state.clock.now())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn trial_customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            email: "owner@example.com".to_string(),
            name: None,
            plan: "trial".to_string(),
            status: "trial".to_string(),
            trial_ends_at: Some(ts(2024, 1, 15)),
            subscription_ends_at: None,
            max_subaccounts: 1,
            total_subaccounts: 0,
            created_at: ts(2024, 1, 1),
            updated_at: ts(2024, 1, 1),
        }
    }

    #[test]
    fn upgrade_clears_trial_expiry_and_activates() {
        let request = PlanUpdateRequest {
            plan: Some("pro".to_string()),
            subscription_ends_at: Some(Some(ts(2025, 1, 1))),
            ..Default::default()
        };
        let change = resolve_plan_change(&trial_customer(), &request).unwrap();
        assert_eq!(change.plan, Plan::Pro);
        assert_eq!(change.status, PlanStatus::Active);
        assert_eq!(change.trial_ends_at, None);
        assert_eq!(change.subscription_ends_at, Some(ts(2025, 1, 1)));
    }

    #[test]
    fn unknown_plan_is_rejected() {
        let request = PlanUpdateRequest {
            plan: Some("platinum".to_string()),
            ..Default::default()
        };
        let err = resolve_plan_change(&trial_customer(), &request).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }

    #[test]
    fn absent_and_null_expiry_differ() {
        let keep = resolve_plan_change(&trial_customer(), &PlanUpdateRequest::default()).unwrap();
        assert_eq!(keep.trial_ends_at, Some(ts(2024, 1, 15)));
        assert_eq!(keep.status, PlanStatus::Trial);

        let request: PlanUpdateRequest = serde_json::from_str(r#"{"trialEndsAt": null}"#).unwrap();
        let cleared = resolve_plan_change(&trial_customer(), &request).unwrap();
        assert_eq!(cleared.trial_ends_at, None);
    }

    #[test]
    fn mismatched_expiry_is_rejected() {
        let request = PlanUpdateRequest {
            trial_ends_at: Some(Some(ts(2024, 2, 1))),
            plan: Some("basic".to_string()),
            ..Default::default()
        };
        assert!(resolve_plan_change(&trial_customer(), &request).is_err());
    }

    #[test]
    fn list_query_rejects_unknown_filters() {
        let query = CustomerListQuery {
            plan: Some("gold".to_string()),
            status: None,
        };
        assert!(query.into_filter().is_err());

        let query = CustomerListQuery {
            plan: Some("Professional".to_string()),
            status: Some("canceled".to_string()),
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.plan, Some(Plan::Pro));
        assert_eq!(filter.status, Some(PlanStatus::Cancelled));
    }
}
