// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Route Prefix: /, /health, /auth/*

pub mod auth;
pub mod status;

pub use auth::{admin_login, logout};
pub use status::{health, root};
