use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A GHL location linked to a customer, counted against `max_subaccounts`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subaccount {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub location_id: String,
    pub name: Option<String>,
    /// WhatsApp session state as last reported by the bridge.
    pub connected: bool,
    pub created_at: DateTime<Utc>,
}
