//! HTTP surface.
//!
//! Handlers stay thin: validate, call a service, map the result. Bearer
//! authentication is a route layer applied in [`routes`]; everything
//! behind it reads the caller from a `CurrentAccount` extension.

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
