use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::manager::DatabaseError;
use super::models::{Customer, Subaccount};
use super::store::{CustomerFilter, CustomerStore, LinkOutcome, NewSubaccount, PlanChange};
use crate::clock::{Clock, SystemClock};

#[derive(Default)]
struct MemoryState {
    customers: HashMap<Uuid, Customer>,
    subaccounts: Vec<Subaccount>,
}

/// In-process store used for local development without Postgres and by the
/// integration tests. Every mutation runs under a single write lock, so the
/// quota check and the usage increment cannot interleave.
///
/// Write timestamps come from the same [`Clock`] the handlers use.
pub struct MemoryCustomerStore {
    state: RwLock<MemoryState>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryCustomerStore {
    fn default() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }
}

impl MemoryCustomerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            clock,
        }
    }

    pub async fn insert_customer(&self, customer: Customer) {
        self.state.write().await.customers.insert(customer.id, customer);
    }

    /// Seed an existing link without touching the customer's counters.
    pub async fn insert_subaccount(&self, subaccount: Subaccount) {
        self.state.write().await.subaccounts.push(subaccount);
    }

    /// One customer per entitlement state, for local development without
    /// Postgres. Returns `(email, id)` pairs so tokens can be minted for them.
    pub async fn seed_demo(&self, now: DateTime<Utc>) -> Vec<(String, Uuid)> {
        let day = Duration::days(1);
        let demo = [
            ("trial@demo.local", "trial", "trial", Some(now + day * 7), None, 1),
            ("lapsed-trial@demo.local", "trial", "expired", Some(now - day), None, 1),
            ("basic@demo.local", "basic", "active", None, Some(now + day * 30), 3),
            ("pro@demo.local", "pro", "active", None, Some(now + day * 365), 10),
            ("lapsed-pro@demo.local", "pro", "expired", None, Some(now - day * 2), 10),
        ];

        let mut seeded = Vec::with_capacity(demo.len());
        let mut state = self.state.write().await;
        for (email, plan, status, trial_ends_at, subscription_ends_at, max) in demo {
            let customer = Customer {
                id: Uuid::new_v4(),
                email: email.to_string(),
                name: None,
                plan: plan.to_string(),
                status: status.to_string(),
                trial_ends_at,
                subscription_ends_at,
                max_subaccounts: max,
                total_subaccounts: 0,
                created_at: now,
                updated_at: now,
            };
            seeded.push((customer.email.clone(), customer.id));
            state.customers.insert(customer.id, customer);
        }
        seeded
    }

    fn not_found(id: Uuid) -> DatabaseError {
        DatabaseError::NotFound(format!("Customer {} not found", id))
    }
}

#[async_trait]
impl CustomerStore for MemoryCustomerStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        Ok(self.state.read().await.customers.get(&id).cloned())
    }

    async fn list_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, DatabaseError> {
        let state = self.state.read().await;
        let mut customers: Vec<Customer> = state.customers.values().filter(|c| filter.matches(c)).cloned().collect();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(customers)
    }

    async fn update_plan(&self, id: Uuid, change: &PlanChange) -> Result<Customer, DatabaseError> {
        let mut state = self.state.write().await;
        let customer = state.customers.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        customer.plan = change.plan.to_string();
        customer.status = change.status.to_string();
        customer.trial_ends_at = change.trial_ends_at;
        customer.subscription_ends_at = change.subscription_ends_at;
        customer.updated_at = self.clock.now();
        Ok(customer.clone())
    }

    async fn increase_max_subaccounts(&self, id: Uuid, increment: i32) -> Result<Customer, DatabaseError> {
        let mut state = self.state.write().await;
        let customer = state.customers.get_mut(&id).ok_or_else(|| Self::not_found(id))?;
        customer.max_subaccounts = customer.max_subaccounts.saturating_add(increment);
        customer.updated_at = self.clock.now();
        Ok(customer.clone())
    }

    async fn list_subaccounts(&self, customer_id: Uuid) -> Result<Vec<Subaccount>, DatabaseError> {
        let state = self.state.read().await;
        Ok(state
            .subaccounts
            .iter()
            .filter(|s| s.customer_id == customer_id)
            .cloned()
            .collect())
    }

    async fn link_subaccount(&self, customer_id: Uuid, link: &NewSubaccount) -> Result<LinkOutcome, DatabaseError> {
        let now = self.clock.now();
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if state.subaccounts.iter().any(|s| s.location_id == link.location_id) {
            return Err(DatabaseError::Conflict(format!(
                "Location '{}' is already linked",
                link.location_id
            )));
        }

        let customer = state
            .customers
            .get_mut(&customer_id)
            .ok_or_else(|| Self::not_found(customer_id))?;
        if customer.total_subaccounts >= customer.max_subaccounts {
            return Ok(LinkOutcome::QuotaExhausted);
        }
        customer.total_subaccounts += 1;
        customer.updated_at = self.clock.now();

        let subaccount = Subaccount {
            id: Uuid::new_v4(),
            customer_id,
            location_id: link.location_id.clone(),
            name: link.name.clone(),
            connected: false,
            created_at: now,
        };
        state.subaccounts.push(subaccount.clone());
        Ok(LinkOutcome::Linked(subaccount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::entitlement::{Plan, PlanStatus};
    use chrono::TimeZone;

    fn customer(plan: &str, total: i32, max: i32) -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", plan),
            name: None,
            plan: plan.into(),
            status: "active".into(),
            trial_ends_at: None,
            subscription_ends_at: None,
            max_subaccounts: max,
            total_subaccounts: total,
            created_at: now,
            updated_at: now,
        }
    }

    fn link(location: &str) -> NewSubaccount {
        NewSubaccount {
            location_id: location.into(),
            name: None,
        }
    }

    #[tokio::test]
    async fn link_respects_quota_at_write_time() {
        let store = MemoryCustomerStore::new();
        let c = customer("basic", 0, 1);
        store.insert_customer(c.clone()).await;

        assert!(matches!(store.link_subaccount(c.id, &link("loc-1")).await.unwrap(), LinkOutcome::Linked(_)));
        assert!(matches!(store.link_subaccount(c.id, &link("loc-2")).await.unwrap(), LinkOutcome::QuotaExhausted));

        let after = store.find_customer(c.id).await.unwrap().unwrap();
        assert_eq!(after.total_subaccounts, 1);
        assert_eq!(store.list_subaccounts(c.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_links_never_exceed_quota() {
        let store = Arc::new(MemoryCustomerStore::new());
        let c = customer("pro", 0, 3);
        store.insert_customer(c.clone()).await;
        let id = c.id;

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.link_subaccount(id, &link(&format!("loc-{}", i))).await
            }));
        }
        let mut linked = 0;
        for handle in handles {
            if let LinkOutcome::Linked(_) = handle.await.unwrap().unwrap() {
                linked += 1;
            }
        }
        assert_eq!(linked, 3);
        assert_eq!(store.find_customer(id).await.unwrap().unwrap().total_subaccounts, 3);
    }

    #[tokio::test]
    async fn writes_are_stamped_by_the_injected_clock() {
        let fixed = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let store = MemoryCustomerStore::with_clock(Arc::new(FixedClock(fixed)));
        let c = customer("pro", 0, 2);
        store.insert_customer(c.clone()).await;

        let LinkOutcome::Linked(sub) = store.link_subaccount(c.id, &link("loc-1")).await.unwrap() else {
            panic!("expected a link");
        };
        assert_eq!(sub.created_at, fixed);
        assert_eq!(store.find_customer(c.id).await.unwrap().unwrap().updated_at, fixed);

        let bumped = store.increase_max_subaccounts(c.id, 1).await.unwrap();
        assert_eq!(bumped.updated_at, fixed);
    }

    #[tokio::test]
    async fn duplicate_location_is_a_conflict() {
        let store = MemoryCustomerStore::new();
        let c = customer("pro", 0, 5);
        store.insert_customer(c.clone()).await;
        store.link_subaccount(c.id, &link("loc-1")).await.unwrap();

        let err = store.link_subaccount(c.id, &link("loc-1")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Conflict(_)));
    }

    #[tokio::test]
    async fn filters_match_aliases_and_quota_increase_keeps_usage() {
        let store = MemoryCustomerStore::new();
        let starter = customer("starter", 2, 2);
        store.insert_customer(starter.clone()).await;
        store.insert_customer(customer("enterprise", 0, 10)).await;

        let filter = CustomerFilter {
            plan: Some(Plan::Basic),
            status: Some(PlanStatus::Active),
        };
        let found = store.list_customers(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, starter.id);

        let bumped = store.increase_max_subaccounts(starter.id, 3).await.unwrap();
        assert_eq!(bumped.max_subaccounts, 5);
        assert_eq!(bumped.total_subaccounts, 2);

        let err = store.increase_max_subaccounts(Uuid::new_v4(), 1).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }
}
