use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::denial::{Denial, RemediationLinks};
use super::evaluator::{self, classify, ExpiryState};
use super::plan::Plan;
use super::snapshot::Entitlement;

/// Requires `required` or a higher tier. Plan rank alone decides; expiry is
/// enforced separately by [`evaluator::require_active`].
pub fn require_minimum_plan(snapshot: &Entitlement, required: &Plan, links: &RemediationLinks) -> Result<(), Denial> {
    if !snapshot.plan.is_recognized() {
        return Err(Denial::invalid_plan(&snapshot.plan, links));
    }
    if snapshot.plan.meets_minimum(required) {
        Ok(())
    } else {
        Err(Denial::plan_upgrade_required(&snapshot.plan, required, links))
    }
}

/// Requires a trial that has not lapsed.
///
/// Unrecognized plans get `INVALID_PLAN` like every other gate. Other
/// non-trial plans get `TRIAL_ONLY_FEATURE`; lapsed trials get
/// `TRIAL_EXPIRED`.
pub fn require_active_trial(snapshot: &Entitlement, now: DateTime<Utc>, links: &RemediationLinks) -> Result<(), Denial> {
    if !snapshot.plan.is_recognized() {
        return Err(Denial::invalid_plan(&snapshot.plan, links));
    }
    if !snapshot.plan.is_trial() {
        return Err(Denial::trial_only_feature(&snapshot.plan));
    }
    match classify(snapshot, now) {
        ExpiryState::TrialActive => Ok(()),
        _ => Err(Denial::trial_expired(links)),
    }
}

/// Requires a paid tier with a live subscription.
pub fn require_paid_subscription(
    snapshot: &Entitlement,
    now: DateTime<Utc>,
    links: &RemediationLinks,
) -> Result<(), Denial> {
    match classify(snapshot, now) {
        ExpiryState::SubscriptionActive => Ok(()),
        ExpiryState::SubscriptionExpired => Err(Denial::subscription_expired(links)),
        ExpiryState::TrialActive | ExpiryState::TrialExpired => {
            Err(Denial::paid_subscription_required(&snapshot.plan, links))
        }
        ExpiryState::InvalidPlan => Err(Denial::invalid_plan(&snapshot.plan, links)),
    }
}

/// Read-only entitlement summary for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementSummary {
    pub plan: String,
    pub status: String,
    pub is_active: bool,
    pub days_remaining: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_expired: bool,
}

pub fn describe_entitlement(snapshot: &Entitlement, now: DateTime<Utc>) -> EntitlementSummary {
    let state = classify(snapshot, now);
    let expires_at = snapshot.active_expiry();

    EntitlementSummary {
        plan: snapshot.plan.to_string(),
        status: snapshot.status.to_string(),
        is_active: state.is_active(),
        days_remaining: expires_at.map(|at| days_until(at, now)),
        expires_at,
        is_expired: state.is_expired(),
    }
}

/// Whole days from `now` until `at`, rounded up. Negative once `at` has
/// passed (`-1.5` days reads as `-1`).
pub fn days_until(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let delta = at - now;
    // num_days truncates toward zero, which is already the ceiling when negative.
    let whole = delta.num_days();
    if delta > Duration::days(whole) {
        whole + 1
    } else {
        whole
    }
}

/// The checks a route can demand of its caller's entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gate {
    /// Recognized plan whose governing expiry has not passed.
    Active,
    MinimumPlan(Plan),
    ActiveTrial,
    PaidSubscription,
}

/// Why [`authorize`] refused a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// No snapshot: nobody is signed in. Never an entitlement failure.
    AuthenticationRequired,
    Denied(Denial),
}

impl From<Denial> for AccessError {
    fn from(denial: Denial) -> Self {
        AccessError::Denied(denial)
    }
}

impl Gate {
    pub fn check(&self, snapshot: &Entitlement, now: DateTime<Utc>, links: &RemediationLinks) -> Result<(), Denial> {
        match self {
            Gate::Active => evaluator::require_active(snapshot, now, links),
            Gate::MinimumPlan(required) => require_minimum_plan(snapshot, required, links),
            Gate::ActiveTrial => require_active_trial(snapshot, now, links),
            Gate::PaidSubscription => require_paid_subscription(snapshot, now, links),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Gate::Active => "active".to_string(),
            Gate::MinimumPlan(plan) => format!("minimum_plan:{}", plan),
            Gate::ActiveTrial => "active_trial".to_string(),
            Gate::PaidSubscription => "paid_subscription".to_string(),
        }
    }
}

/// Entry point used by the HTTP layer. The missing-snapshot case is
/// answered before any entitlement logic runs.
pub fn authorize(
    snapshot: Option<&Entitlement>,
    gate: &Gate,
    now: DateTime<Utc>,
    links: &RemediationLinks,
) -> Result<(), AccessError> {
    let snapshot = snapshot.ok_or(AccessError::AuthenticationRequired)?;
    gate.check(snapshot, now, links)?;
    Ok(())
}
