// handlers/protected/features.rs - Tier-gated feature endpoints
//
// GET /api/analytics             pro and above
// GET /api/onboarding/trial      active trials only
// GET /api/billing/subscription  paid tiers with a live subscription
//
// Each route is mounted behind its gate; the handlers assume it passed.

use axum::{extract::State, Extension};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::database::models::Subaccount;
use crate::entitlement::{days_until, Entitlement};
use crate::middleware::{ApiResponse, ApiResult, AuthCustomer};
use crate::state::AppState;

const ANALYTICS_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub window_days: i64,
    pub total_subaccounts: u32,
    pub connected_subaccounts: u32,
    pub linked_in_window: u32,
    /// Connected share of linked locations, 0-100.
    pub connection_rate: u32,
}

pub fn compute_analytics(subaccounts: &[Subaccount], now: DateTime<Utc>) -> AnalyticsReport {
    let since = now - Duration::days(ANALYTICS_WINDOW_DAYS);
    let total = subaccounts.len() as u32;
    let connected = subaccounts.iter().filter(|s| s.connected).count() as u32;
    let recent = subaccounts.iter().filter(|s| s.created_at >= since).count() as u32;

    AnalyticsReport {
        window_days: ANALYTICS_WINDOW_DAYS,
        total_subaccounts: total,
        connected_subaccounts: connected,
        linked_in_window: recent,
        connection_rate: if total == 0 { 0 } else { connected * 100 / total },
    }
}

pub async fn analytics_get(
    State(state): State<AppState>,
    Extension(customer): Extension<AuthCustomer>,
) -> ApiResult<AnalyticsReport> {
    let subaccounts = state.store.list_subaccounts(customer.id).await?;
    Ok(ApiResponse::success(compute_analytics(&subaccounts, state.clock.now())))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingStep {
    pub key: &'static str,
    pub title: &'static str,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialOnboarding {
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub steps: Vec<OnboardingStep>,
    pub completed_steps: usize,
    pub upgrade_url: String,
}

pub fn onboarding_steps(subaccounts: &[Subaccount]) -> Vec<OnboardingStep> {
    let linked = !subaccounts.is_empty();
    let connected = subaccounts.iter().any(|s| s.connected);

    vec![
        OnboardingStep {
            key: "link_ghl_location",
            title: "Link your first GHL location",
            completed: linked,
        },
        OnboardingStep {
            key: "connect_whatsapp",
            title: "Connect a WhatsApp number",
            completed: connected,
        },
        OnboardingStep {
            key: "send_test_message",
            title: "Send a test message",
            // Tracked by the bridge; a live connection is the closest signal here.
            completed: connected,
        },
    ]
}

pub async fn trial_onboarding_get(
    State(state): State<AppState>,
    Extension(customer): Extension<AuthCustomer>,
    Extension(snapshot): Extension<Entitlement>,
) -> ApiResult<TrialOnboarding> {
    let now = state.clock.now();
    let subaccounts = state.store.list_subaccounts(customer.id).await?;
    let steps = onboarding_steps(&subaccounts);

    Ok(ApiResponse::success(TrialOnboarding {
        trial_ends_at: snapshot.trial_ends_at,
        days_remaining: snapshot.trial_ends_at.map(|at| days_until(at, now)),
        completed_steps: steps.iter().filter(|s| s.completed).count(),
        steps,
        upgrade_url: state.links.upgrade_url(),
    }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetails {
    pub plan: String,
    pub status: String,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub days_remaining: Option<i64>,
    pub max_subaccounts: u32,
    pub renew_url: String,
}

pub async fn billing_subscription_get(
    State(state): State<AppState>,
    Extension(snapshot): Extension<Entitlement>,
) -> ApiResult<SubscriptionDetails> {
    let now = state.clock.now();
    Ok(ApiResponse::success(SubscriptionDetails {
        plan: snapshot.plan.to_string(),
        status: snapshot.status.to_string(),
        subscription_ends_at: snapshot.subscription_ends_at,
        days_remaining: snapshot.subscription_ends_at.map(|at| days_until(at, now)),
        max_subaccounts: snapshot.max_subaccounts,
        renew_url: state.links.renew_url(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn linked(created_at: DateTime<Utc>, connected: bool) -> Subaccount {
        Subaccount {
            id: Uuid::new_v4(),
            customer_id: Uuid::nil(),
            location_id: Uuid::new_v4().to_string(),
            name: None,
            connected,
            created_at,
        }
    }

    #[test]
    fn analytics_counts_recent_links() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let subs = vec![
            linked(now - Duration::days(2), true),
            linked(now - Duration::days(30), false),
            linked(now - Duration::days(31), true),
            linked(now - Duration::days(90), false),
        ];
        let report = compute_analytics(&subs, now);
        assert_eq!(report.total_subaccounts, 4);
        assert_eq!(report.connected_subaccounts, 2);
        assert_eq!(report.linked_in_window, 2);
        assert_eq!(report.connection_rate, 50);
        assert_eq!(compute_analytics(&[], now).connection_rate, 0);
    }

    #[test]
    fn onboarding_tracks_progress() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        assert!(onboarding_steps(&[]).iter().all(|s| !s.completed));

        let steps = onboarding_steps(&[linked(now, false)]);
        assert!(steps[0].completed);
        assert!(!steps[1].completed);

        assert!(onboarding_steps(&[linked(now, true)]).iter().all(|s| s.completed));
    }
}
