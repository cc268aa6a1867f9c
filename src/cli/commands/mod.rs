pub mod customer;
pub mod entitlement;
pub mod token;
