//! Repository layer - Data access abstraction
//!
//! One generic repository serves every entity; the named repositories
//! below are plain specializations of it.

mod base;
pub mod entities;
pub mod query;

pub use base::{GenericRepository, OrderTransform};
pub use query::{Navigation, QuerySpec, SoftDelete};

pub type AccountRepository = GenericRepository<entities::account::Entity>;
pub type AccountTokenRepository = GenericRepository<entities::account_token::Entity>;
pub type BidRepository = GenericRepository<entities::bid::Entity>;
pub type OrderRepository = GenericRepository<entities::order::Entity>;
pub type TransactionRepository = GenericRepository<entities::transaction::Entity>;
