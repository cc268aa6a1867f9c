//! Subscription and plan entitlement policy.
//!
//! Everything in here is a pure function of an [`Entitlement`] snapshot and an
//! injected `now`. Loading the snapshot and turning denials into responses is
//! left to the middleware layer.

pub mod denial;
pub mod evaluator;
pub mod gates;
pub mod plan;
pub mod quota;
pub mod snapshot;

pub use denial::{Denial, DenialCode, RemediationLinks};
pub use evaluator::{classify, require_active, ExpiryState};
pub use gates::{
    authorize, days_until, describe_entitlement, require_active_trial, require_minimum_plan, require_paid_subscription,
    AccessError, EntitlementSummary, Gate,
};
pub use plan::{meets_minimum, Plan, PlanStatus};
pub use quota::{check_subaccount_quota, validate_quota_increase, QuotaIncreaseError};
pub use snapshot::Entitlement;
