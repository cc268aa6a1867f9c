// handlers/elevated/mod.rs - Elevated handlers (admin session required)
//
// Security Level: admin JWT (admin_auth_middleware)
// Route Prefix: /api/admin/*
//
// Every mutation here is audit-logged with the acting admin's email.

pub mod admin;

pub use admin::*;
