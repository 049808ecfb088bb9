//! API middleware.

mod auth;

pub use auth::{auth_middleware, read_bearer_token, require_role, CurrentAccount};
