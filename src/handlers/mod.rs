// handlers/mod.rs - Handlers grouped by security tier
//
// Public (no auth) -> Protected (token auth via `middleware::require_auth`)
pub mod public;
pub mod protected;
