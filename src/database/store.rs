use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Customer, Subaccount};
use crate::entitlement::{Plan, PlanStatus};

/// Admin list filter. Matching is done on parsed values so legacy aliases
/// (`starter`, `professional`) match their canonical tier.
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub plan: Option<Plan>,
    pub status: Option<PlanStatus>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &Customer) -> bool {
        let plan_ok = self.plan.as_ref().map_or(true, |p| *p == Plan::parse(&customer.plan));
        let status_ok = self.status.as_ref().map_or(true, |s| *s == PlanStatus::parse(&customer.status));
        plan_ok && status_ok
    }
}

/// Full replacement of the plan-related columns, as resolved by the admin
/// handler. Only the expiry selected by `plan` is expected to be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanChange {
    pub plan: Plan,
    pub status: PlanStatus,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub subscription_ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewSubaccount {
    pub location_id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub enum LinkOutcome {
    Linked(Subaccount),
    /// The quota was used up between the entitlement check and the write.
    QuotaExhausted,
}

/// Data access for customers and their linked GHL locations.
///
/// Handlers only see this trait; the Postgres and in-memory stores are
/// chosen at startup and injected through `AppState`.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError>;

    async fn list_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, DatabaseError>;

    async fn update_plan(&self, id: Uuid, change: &PlanChange) -> Result<Customer, DatabaseError>;

    /// Raise `max_subaccounts` by `increment`. Usage is left untouched.
    async fn increase_max_subaccounts(&self, id: Uuid, increment: i32) -> Result<Customer, DatabaseError>;

    async fn list_subaccounts(&self, customer_id: Uuid) -> Result<Vec<Subaccount>, DatabaseError>;

    /// Link a location and bump usage atomically. Implementations must
    /// re-check the quota at write time and report [`LinkOutcome::QuotaExhausted`]
    /// instead of exceeding it.
    async fn link_subaccount(&self, customer_id: Uuid, link: &NewSubaccount) -> Result<LinkOutcome, DatabaseError>;
}
