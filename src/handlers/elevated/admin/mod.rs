// handlers/elevated/admin/mod.rs - Customer administration
//
// GET   /api/admin/customers                          list, filterable by plan/status
// GET   /api/admin/customers/:id                      row + entitlement summary
// PATCH /api/admin/customers/:id/plan                 change plan, status, expiries
// POST  /api/admin/customers/:id/subaccounts/increase raise the location quota
// GET   /api/admin/stats                              platform-wide counts

pub mod customers;
pub mod quota;
pub mod stats;

pub use customers::{customer_list, customer_plan_update, customer_show};
pub use quota::customer_quota_increase;
pub use stats::admin_stats;

use uuid::Uuid;

use crate::error::ApiError;

fn parse_customer_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid customer id '{}'", raw)))
}
