//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connection, migrations and the persistence context
//! - Repositories and the Unit of Work that groups them
//! - The VNPay payment gateway client

pub mod context;
pub mod db;
pub mod repositories;
pub mod unit_of_work;
pub mod vnpay;

pub use context::DbContext;
pub use db::{Database, Migrator};
pub use repositories::{GenericRepository, QuerySpec};
pub use unit_of_work::UnitOfWork;
pub use vnpay::{PaymentRequest, VnPayClient};
