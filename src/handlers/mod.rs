// handlers/mod.rs - Three-tier handler layout
//
// Public (no session) -> Protected (customer session + entitlement gates)
// -> Elevated (admin session).
pub mod elevated;
pub mod protected;
pub mod public;
