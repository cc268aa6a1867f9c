pub mod customer;
pub mod subaccount;

pub use customer::Customer;
pub use subaccount::Subaccount;
