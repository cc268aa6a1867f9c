use chrono::{DateTime, Utc};
use serde::Serialize;

use super::denial::{Denial, RemediationLinks};
use super::snapshot::Entitlement;

/// Classification of a snapshot against the current time.
///
/// Recomputed from scratch on every evaluation; nothing about previous
/// states is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpiryState {
    TrialActive,
    TrialExpired,
    SubscriptionActive,
    SubscriptionExpired,
    InvalidPlan,
}

impl ExpiryState {
    pub fn is_active(&self) -> bool {
        matches!(self, ExpiryState::TrialActive | ExpiryState::SubscriptionActive)
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, ExpiryState::TrialExpired | ExpiryState::SubscriptionExpired)
    }
}

/// Classify `snapshot` at `now`.
///
/// An expiry equal to `now` is still active; only a strictly earlier expiry
/// counts as lapsed. A missing expiry never lapses.
pub fn classify(snapshot: &Entitlement, now: DateTime<Utc>) -> ExpiryState {
    let lapsed = |ends_at: Option<DateTime<Utc>>| ends_at.is_some_and(|at| at < now);

    if snapshot.plan.is_trial() {
        if lapsed(snapshot.trial_ends_at) {
            ExpiryState::TrialExpired
        } else {
            ExpiryState::TrialActive
        }
    } else if snapshot.plan.is_paid() {
        if lapsed(snapshot.subscription_ends_at) {
            ExpiryState::SubscriptionExpired
        } else {
            ExpiryState::SubscriptionActive
        }
    } else {
        ExpiryState::InvalidPlan
    }
}

/// Map a classification onto an access verdict.
pub fn verdict(state: ExpiryState, snapshot: &Entitlement, links: &RemediationLinks) -> Result<(), Denial> {
    match state {
        ExpiryState::TrialActive | ExpiryState::SubscriptionActive => Ok(()),
        ExpiryState::TrialExpired => Err(Denial::trial_expired(links)),
        ExpiryState::SubscriptionExpired => Err(Denial::subscription_expired(links)),
        ExpiryState::InvalidPlan => Err(Denial::invalid_plan(&snapshot.plan, links)),
    }
}

/// Base gate applied to every entitled route: the plan must be recognized
/// and its governing expiry must not have passed.
pub fn require_active(snapshot: &Entitlement, now: DateTime<Utc>, links: &RemediationLinks) -> Result<(), Denial> {
    verdict(classify(snapshot, now), snapshot, links)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entitlement::denial::{test_links, DenialCode};
    use crate::entitlement::plan::{Plan, PlanStatus};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn snapshot(plan: &str, trial: Option<DateTime<Utc>>, sub: Option<DateTime<Utc>>) -> Entitlement {
        Entitlement {
            plan: Plan::parse(plan),
            status: PlanStatus::Active,
            trial_ends_at: trial,
            subscription_ends_at: sub,
            max_subaccounts: 1,
            total_subaccounts: 0,
        }
    }

    #[test]
    fn trial_expiry_is_strictly_before_now() {
        let past = snapshot("trial", Some(now() - Duration::seconds(1)), None);
        let future = snapshot("trial", Some(now() + Duration::days(3)), None);
        let boundary = snapshot("trial", Some(now()), None);

        assert_eq!(classify(&past, now()), ExpiryState::TrialExpired);
        assert_eq!(classify(&future, now()), ExpiryState::TrialActive);
        assert_eq!(classify(&boundary, now()), ExpiryState::TrialActive);
    }

    #[test]
    fn trial_without_expiry_never_lapses() {
        let open_ended = snapshot("trial", None, None);
        assert_eq!(classify(&open_ended, now() + Duration::days(10_000)), ExpiryState::TrialActive);
    }

    #[test]
    fn paid_tiers_follow_subscription_expiry_only() {
        // A stale trial date on a paid plan is ignored.
        let pro = snapshot("pro", Some(now() - Duration::days(30)), None);
        assert_eq!(classify(&pro, now()), ExpiryState::SubscriptionActive);

        let lapsed = snapshot("enterprise", None, Some(now() - Duration::hours(1)));
        assert_eq!(classify(&lapsed, now()), ExpiryState::SubscriptionExpired);

        let admin = snapshot("admin", None, None);
        assert_eq!(classify(&admin, now()), ExpiryState::SubscriptionActive);
    }

    #[test]
    fn unknown_plan_is_invalid() {
        let bogus = snapshot("unknown_tier", None, None);
        assert_eq!(classify(&bogus, now()), ExpiryState::InvalidPlan);
    }

    #[test]
    fn verdicts_carry_the_matching_remediation() {
        let links = test_links();

        let trial = snapshot("trial", Some(now() - Duration::days(1)), None);
        let denial = require_active(&trial, now(), &links).unwrap_err();
        assert_eq!(denial.code, DenialCode::TrialExpired);
        assert!(denial.upgrade_url.is_some());

        let paid = snapshot("basic", None, Some(now() - Duration::days(1)));
        let denial = require_active(&paid, now(), &links).unwrap_err();
        assert_eq!(denial.code, DenialCode::SubscriptionExpired);
        assert!(denial.renew_url.is_some());
        assert!(denial.upgrade_url.is_none());

        let bogus = snapshot("unknown_tier", None, None);
        let denial = require_active(&bogus, now(), &links).unwrap_err();
        assert_eq!(denial.code, DenialCode::InvalidPlan);
        assert!(denial.upgrade_url.is_none() && denial.renew_url.is_none());

        assert!(require_active(&snapshot("pro", None, None), now(), &links).is_ok());
    }
}
