// handlers/protected/mod.rs - Customer handlers
//
// Security Level: customer session (customer_auth_middleware), plus the
// entitlement gate each route group is mounted behind.
// Route Prefix: /api/*

pub mod dashboard;
pub mod entitlement;
pub mod features;
pub mod subaccounts;

pub use dashboard::dashboard_stats;
pub use entitlement::entitlement_get;
pub use features::{analytics_get, billing_subscription_get, trial_onboarding_get};
pub use subaccounts::{subaccounts_get, subaccounts_post};
