//! Diamond Shop backend.
//!
//! Customers register, bid on diamonds and top up a wallet through VNPay;
//! orders are paid from that wallet. Persistence goes through one
//! [`GenericRepository`](infra::GenericRepository) per entity. Repositories
//! stage writes on a shared [`DbContext`](infra::DbContext) and a
//! [`UnitOfWork`](infra::UnitOfWork) commits them in a single transaction.
//!
//! Layers, outermost first:
//!
//! - `cli`, `commands`: `serve` and `migrate`
//! - `api`: axum routes, bearer middleware, OpenAPI
//! - `services`: authentication, bidding, payments
//! - `infra`: database, migrations, repositories, VNPay client
//! - `domain`, `types`: roles, statuses, payloads, paging
//! - `config`, `errors`: environment settings and `AppError`
//!
//! ```bash
//! diamond-shop migrate up
//! diamond-shop serve --port 8080
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;
pub mod types;

pub use api::AppState;
pub use config::Config;
pub use domain::{Password, Role};
pub use errors::{AppError, AppResult};
