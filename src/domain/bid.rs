//! Bids placed by customers on auctioned diamonds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Bid lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidStatus {
    Active,
    Withdrawn,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Active => "active",
            BidStatus::Withdrawn => "withdrawn",
        }
    }
}

/// Bid returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BidResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    #[schema(example = "GIA-2141438167")]
    pub diamond_code: String,
    /// Offered amount in VND
    #[schema(example = 250000000)]
    pub amount: i64,
    #[schema(example = "active")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}
