// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Account signup and token issuance. Route prefix: /api/users/*
pub mod users;

pub use users::{create_token, create_user};
