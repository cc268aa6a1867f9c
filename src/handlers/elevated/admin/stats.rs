// handlers/elevated/admin/stats.rs - GET /api/admin/stats

use std::collections::BTreeMap;

use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::models::Customer;
use crate::database::CustomerFilter;
use crate::entitlement::{classify, Entitlement, ExpiryState, Plan, PlanStatus};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_customers: u64,
    /// Keyed by canonical plan name; unknown values keep their raw spelling.
    pub by_plan: BTreeMap<String, u64>,
    pub by_status: BTreeMap<String, u64>,
    pub active_customers: u64,
    pub expired_customers: u64,
    pub invalid_plan_customers: u64,
    pub total_subaccounts: u64,
    pub total_max_subaccounts: u64,
}

pub fn compute_admin_stats(customers: &[Customer], now: DateTime<Utc>) -> AdminStats {
    let mut stats = AdminStats::default();

    for customer in customers {
        let snapshot = Entitlement::from_customer(customer);
        stats.total_customers += 1;
        *stats.by_plan.entry(Plan::parse(&customer.plan).to_string()).or_default() += 1;
        *stats.by_status.entry(PlanStatus::parse(&customer.status).to_string()).or_default() += 1;

        match classify(&snapshot, now) {
            state if state.is_active() => stats.active_customers += 1,
            state if state.is_expired() => stats.expired_customers += 1,
            ExpiryState::InvalidPlan => stats.invalid_plan_customers += 1,
            _ => {}
        }

        stats.total_subaccounts += u64::from(snapshot.total_subaccounts);
        stats.total_max_subaccounts += u64::from(snapshot.max_subaccounts);
    }

    stats
}

pub async fn admin_stats(State(state): State<AppState>) -> ApiResult<AdminStats> {
    let customers = state.store.list_customers(&CustomerFilter::default()).await?;
    Ok(ApiResponse::success(compute_admin_stats(&customers, state.clock.now())))
}
