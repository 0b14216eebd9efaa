// handlers/protected/mod.rs - Protected handlers (token authentication required)
//
// Every handler here receives the caller as `Extension<AuthUser>` and only
// ever touches rows owned by that caller.
pub mod attributes;
pub mod recipes;
pub mod users;
