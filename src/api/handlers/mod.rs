//! HTTP request handlers.

pub mod account_handler;
pub mod auth_handler;
pub mod bid_handler;
pub mod payment_handler;

pub use account_handler::account_routes;
pub use auth_handler::auth_routes;
pub use bid_handler::bid_routes;
pub use payment_handler::{payment_callback_routes, payment_routes};
