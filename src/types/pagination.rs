//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::{DEFAULT_PAGE_INDEX, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::domain::{BidResponse, TransactionResponse};

/// Paging and ordering query parameters shared by list endpoints
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Zero-based page index
    #[serde(default = "default_page_index")]
    pub page_index: u64,
    /// Page size, capped at 100
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Field to order by, e.g. `amount` or `created_at`
    pub order_by: Option<String>,
    /// Defaults to ascending
    pub is_ascending: Option<bool>,
}

fn default_page_index() -> u64 {
    DEFAULT_PAGE_INDEX
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl ListQuery {
    /// Page size within `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> u64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            page_index: DEFAULT_PAGE_INDEX,
            page_size: DEFAULT_PAGE_SIZE,
            order_by: None,
            is_ascending: None,
        }
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[aliases(BidPage = Paginated<BidResponse>, TransactionPage = Paginated<TransactionResponse>)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    pub page_index: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, page_index: u64, page_size: u64, total: u64) -> Self {
        let total_pages = if page_size > 0 {
            total.div_ceil(page_size)
        } else {
            0
        };

        Self {
            data,
            meta: PaginationMeta {
                page_index,
                page_size,
                total,
                total_pages,
            },
        }
    }
}
