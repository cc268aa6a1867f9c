pub mod auth;
pub mod entitlement;
pub mod response;

pub use auth::{admin_auth_middleware, customer_auth_middleware, AuthAdmin, AuthCustomer};
pub use entitlement::entitlement_gate;
pub use response::{ApiResponse, ApiResult};
