// handlers/protected/dashboard.rs - GET /api/dashboard/stats

use axum::{extract::State, Extension};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::models::Subaccount;
use crate::entitlement::{describe_entitlement, Entitlement, EntitlementSummary};
use crate::middleware::{ApiResponse, ApiResult, AuthCustomer};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_subaccounts: u32,
    pub connected_subaccounts: u32,
    pub disconnected_subaccounts: u32,
    pub max_subaccounts: u32,
    pub remaining_subaccounts: u32,
    /// Share of the quota in use, 0-100. A zero quota reads as fully used.
    pub usage_percent: u32,
    pub entitlement: EntitlementSummary,
}

pub fn compute_dashboard_stats(snapshot: &Entitlement, subaccounts: &[Subaccount], now: DateTime<Utc>) -> DashboardStats {
    let connected = subaccounts.iter().filter(|s| s.connected).count() as u32;
    let linked = subaccounts.len() as u32;

    let usage_percent = if snapshot.max_subaccounts == 0 {
        100
    } else {
        let used = u64::from(snapshot.total_subaccounts) * 100 / u64::from(snapshot.max_subaccounts);
        used.min(100) as u32
    };

    DashboardStats {
        total_subaccounts: snapshot.total_subaccounts,
        connected_subaccounts: connected,
        disconnected_subaccounts: linked.saturating_sub(connected),
        max_subaccounts: snapshot.max_subaccounts,
        remaining_subaccounts: snapshot.remaining_subaccounts(),
        usage_percent,
        entitlement: describe_entitlement(snapshot, now),
    }
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    Extension(customer): Extension<AuthCustomer>,
    Extension(snapshot): Extension<Entitlement>,
) -> ApiResult<DashboardStats> {
    let subaccounts = state.store.list_subaccounts(customer.id).await?;
    let stats = compute_dashboard_stats(&snapshot, &subaccounts, state.clock.now());
    Ok(ApiResponse::success(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::{Plan, PlanStatus};
    use chrono::TimeZone;
    use uuid::Uuid;

    fn subaccount(connected: bool) -> Subaccount {
        Subaccount {
            id: Uuid::new_v4(),
            customer_id: Uuid::nil(),
            location_id: Uuid::new_v4().to_string(),
            name: None,
            connected,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn snapshot(max: u32, total: u32) -> Entitlement {
        Entitlement {
            plan: Plan::Basic,
            status: PlanStatus::Active,
            trial_ends_at: None,
            subscription_ends_at: None,
            max_subaccounts: max,
            total_subaccounts: total,
        }
    }

    #[test]
    fn counts_connection_state_and_usage() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let subs = vec![subaccount(true), subaccount(false), subaccount(true)];
        let stats = compute_dashboard_stats(&snapshot(4, 3), &subs, now);

        assert_eq!(stats.connected_subaccounts, 2);
        assert_eq!(stats.disconnected_subaccounts, 1);
        assert_eq!(stats.remaining_subaccounts, 1);
        assert_eq!(stats.usage_percent, 75);
        assert!(stats.entitlement.is_active);
    }

    #[test]
    fn usage_is_capped_and_zero_quota_is_full() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(compute_dashboard_stats(&snapshot(2, 5), &[], now).usage_percent, 100);
        assert_eq!(compute_dashboard_stats(&snapshot(0, 0), &[], now).usage_percent, 100);
        assert_eq!(compute_dashboard_stats(&snapshot(10, 0), &[], now).usage_percent, 0);
    }
}
