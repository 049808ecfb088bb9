//! Domain layer - Core business types
//!
//! Roles, statuses, the password value object and the payloads the API
//! returns. Independent of the persistence layer.

pub mod account;
pub mod bid;
pub mod password;
pub mod payment;

pub use account::{AccountResponse, LoginResponse, Role, TokenPair};
pub use bid::{BidResponse, BidStatus};
pub use password::Password;
pub use payment::{
    OrderStatus, PaymentUrlResponse, TransactionKind, TransactionResponse, TransactionStatus,
    VnPaymentResponse,
};
