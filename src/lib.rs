pub mod auth;
pub mod cli;
pub mod clock;
pub mod config;
pub mod database;
pub mod entitlement;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod state;
