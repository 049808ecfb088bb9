//! Orders, wallet transactions and VNPay payment payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Order payment state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// What moved money in or out of a wallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionKind {
    /// Top-up through VNPay
    Deposit,
    /// Order paid from the wallet balance
    Payment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Payment => "payment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

/// Wallet transaction returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub account_id: Uuid,
    pub order_id: Option<Uuid>,
    #[schema(example = "deposit")]
    pub kind: String,
    /// Amount in VND
    #[schema(example = 500000)]
    pub amount: i64,
    #[schema(example = "completed")]
    pub status: String,
    /// VNPay transaction number, when the gateway was involved
    #[schema(example = "14226112")]
    pub gateway_reference: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Signed VNPay checkout link
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentUrlResponse {
    /// Pending deposit this payment will complete
    pub transaction_id: Uuid,
    #[schema(example = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html?vnp_Amount=...")]
    pub payment_url: String,
}

/// Parsed, signature-checked VNPay callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VnPaymentResponse {
    /// `vnp_ResponseCode == "00"`
    pub success: bool,
    #[schema(example = "VnPay")]
    pub payment_method: String,
    pub order_description: String,
    /// `vnp_TxnRef`: the id of the pending deposit transaction
    pub transaction_ref: String,
    /// `vnp_TransactionNo`
    pub gateway_transaction_no: String,
    #[schema(example = "00")]
    pub response_code: String,
    /// Amount in VND (already divided by the gateway multiplier)
    pub amount: i64,
}
