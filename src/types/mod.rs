//! Shared request and response types.

mod pagination;
mod response;

pub use pagination::{BidPage, ListQuery, Paginated, PaginationMeta, TransactionPage};
pub use response::NoContent;
