pub mod manager;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryCustomerStore;
pub use postgres::PgCustomerStore;
pub use store::{CustomerFilter, CustomerStore, LinkOutcome, NewSubaccount, PlanChange};
