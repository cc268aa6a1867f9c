use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::manager::{DatabaseError, DatabaseManager};
use super::models::{Customer, Subaccount};
use super::store::{CustomerFilter, CustomerStore, LinkOutcome, NewSubaccount, PlanChange};

const CUSTOMER_COLUMNS: &str = r#"
    id, email, name, plan, status, trial_ends_at, subscription_ends_at,
    max_subaccounts, total_subaccounts, created_at, updated_at
"#;

/// Postgres-backed store over the `customers` and `subaccounts` tables.
///
/// Expects a unique index on `subaccounts.location_id`.
#[derive(Clone)]
pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, DatabaseError> {
        let query = format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS);
        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(customer)
    }

    async fn list_customers(&self, filter: &CustomerFilter) -> Result<Vec<Customer>, DatabaseError> {
        // Plans are filtered after parsing so stored aliases still match.
        let query = format!("SELECT {} FROM customers ORDER BY created_at DESC", CUSTOMER_COLUMNS);
        let customers = sqlx::query_as::<_, Customer>(&query)
            .fetch_all(&self.pool)
            .await?;
        Ok(customers.into_iter().filter(|c| filter.matches(c)).collect())
    }

    async fn update_plan(&self, id: Uuid, change: &PlanChange) -> Result<Customer, DatabaseError> {
        let query = format!(
            r#"
            UPDATE customers
            SET plan = $2, status = $3, trial_ends_at = $4, subscription_ends_at = $5, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(change.plan.as_str())
            .bind(change.status.as_str())
            .bind(change.trial_ends_at)
            .bind(change.subscription_ends_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Customer {} not found", id)))
    }

    async fn increase_max_subaccounts(&self, id: Uuid, increment: i32) -> Result<Customer, DatabaseError> {
        let query = format!(
            r#"
            UPDATE customers
            SET max_subaccounts = max_subaccounts + $2, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        );
        sqlx::query_as::<_, Customer>(&query)
            .bind(id)
            .bind(increment)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Customer {} not found", id)))
    }

    async fn list_subaccounts(&self, customer_id: Uuid) -> Result<Vec<Subaccount>, DatabaseError> {
        let subaccounts = sqlx::query_as::<_, Subaccount>(
            r#"
            SELECT id, customer_id, location_id, name, connected, created_at
            FROM subaccounts
            WHERE customer_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(subaccounts)
    }

    async fn link_subaccount(&self, customer_id: Uuid, link: &NewSubaccount) -> Result<LinkOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // Conditional increment: concurrent links cannot both pass the quota.
        let bumped = sqlx::query(
            r#"
            UPDATE customers
            SET total_subaccounts = total_subaccounts + 1, updated_at = now()
            WHERE id = $1 AND total_subaccounts + 1 <= max_subaccounts
            "#,
        )
        .bind(customer_id)
        .execute(&mut *tx)
        .await?;

        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            debug!("Subaccount link for customer {} lost the quota race", customer_id);
            return Ok(LinkOutcome::QuotaExhausted);
        }

        let subaccount = sqlx::query_as::<_, Subaccount>(
            r#"
            INSERT INTO subaccounts (id, customer_id, location_id, name, connected, created_at)
            VALUES ($1, $2, $3, $4, false, now())
            RETURNING id, customer_id, location_id, name, connected, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(&link.location_id)
        .bind(&link.name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            DatabaseError::from_sqlx(e, || format!("Location '{}' is already linked", link.location_id))
        })?;

        tx.commit().await?;
        Ok(LinkOutcome::Linked(subaccount))
    }
}
