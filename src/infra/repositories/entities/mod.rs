//! SeaORM entity definitions
//!
//! These are database-specific entities separate from domain types.

pub mod account;
pub mod account_token;
pub mod bid;
pub mod order;
pub mod transaction;

pub use account::{Entity as AccountEntity, Model as AccountModel};
pub use account_token::{Entity as AccountTokenEntity, Model as AccountTokenModel};
pub use bid::{Entity as BidEntity, Model as BidModel};
pub use order::{Entity as OrderEntity, Model as OrderModel};
pub use transaction::{Entity as TransactionEntity, Model as TransactionModel};
