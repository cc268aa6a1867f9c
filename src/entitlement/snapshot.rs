use chrono::{DateTime, Utc};
use serde::Serialize;

use super::plan::{Plan, PlanStatus};
use crate::database::models::Customer;

/// Per-request view of what a customer is entitled to.
///
/// Derived fresh from the customer row on every request and never cached or
/// mutated afterwards; evaluators only ever borrow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub plan: Plan,
    pub status: PlanStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
    pub max_subaccounts: u32,
    pub total_subaccounts: u32,
}

impl Entitlement {
    pub fn from_customer(customer: &Customer) -> Self {
        Self {
            plan: Plan::parse(&customer.plan),
            status: PlanStatus::parse(&customer.status),
            trial_ends_at: customer.trial_ends_at,
            subscription_ends_at: customer.subscription_ends_at,
            max_subaccounts: counter(customer.max_subaccounts),
            total_subaccounts: counter(customer.total_subaccounts),
        }
    }

    /// The expiry that governs this plan: `trial_ends_at` for trials,
    /// `subscription_ends_at` for paid tiers, nothing for unrecognized plans.
    pub fn active_expiry(&self) -> Option<DateTime<Utc>> {
        if self.plan.is_trial() {
            self.trial_ends_at
        } else if self.plan.is_paid() {
            self.subscription_ends_at
        } else {
            None
        }
    }

    pub fn remaining_subaccounts(&self) -> u32 {
        self.max_subaccounts.saturating_sub(self.total_subaccounts)
    }
}

// Negative counters only come from corrupt rows; they grant nothing.
fn counter(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn customer(plan: &str) -> Customer {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Customer {
            id: Uuid::new_v4(),
            email: "owner@example.com".into(),
            name: None,
            plan: plan.into(),
            status: "active".into(),
            trial_ends_at: Some(at),
            subscription_ends_at: None,
            max_subaccounts: 3,
            total_subaccounts: -1,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn plan_selects_the_active_expiry() {
        let trial = Entitlement::from_customer(&customer("trial"));
        assert_eq!(trial.active_expiry(), trial.trial_ends_at);

        let pro = Entitlement::from_customer(&customer("professional"));
        assert_eq!(pro.plan, Plan::Pro);
        assert_eq!(pro.active_expiry(), None);

        let bogus = Entitlement::from_customer(&customer("platinum"));
        assert_eq!(bogus.active_expiry(), None);
    }

    #[test]
    fn negative_counters_read_as_zero() {
        let snapshot = Entitlement::from_customer(&customer("basic"));
        assert_eq!(snapshot.total_subaccounts, 0);
        assert_eq!(snapshot.remaining_subaccounts(), 3);
    }
}
