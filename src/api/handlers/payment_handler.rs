//! Payment handlers: VNPay deposits and wallet payments.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_role, CurrentAccount};
use crate::api::AppState;
use crate::config::FALLBACK_CLIENT_IP;
use crate::domain::{PaymentUrlResponse, Role, TransactionResponse};
use crate::errors::AppResult;
use crate::types::{ListQuery, Paginated, TransactionPage};

/// Wallet top-up request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DepositRequest {
    /// Amount in VND
    #[validate(range(
        min = 5000,
        max = 10000000000i64,
        message = "Amount must be between 5000 and 10000000000 VND"
    ))]
    #[schema(example = 500000)]
    pub amount: i64,
    #[validate(length(min = 1, max = 255, message = "Description is required"))]
    #[schema(example = "Nap tien vao vi")]
    pub description: String,
}

/// Routes that need a signed-in account
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/vnpay", post(create_payment_url))
        .route("/orders/:id/wallet", post(pay_order_with_wallet))
        .route("/transactions", get(list_transactions))
}

/// Gateway return route; trusted through its signature, not a token
pub fn payment_callback_routes() -> Router<AppState> {
    Router::new().route("/vnpay/callback", get(vnpay_callback))
}

/// First address in `X-Forwarded-For`, then `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .unwrap_or(FALLBACK_CLIENT_IP)
        .to_string()
}

/// Start a VNPay wallet deposit
#[utoipa::path(
    post,
    path = "/payments/vnpay",
    tag = "Payments",
    security(("bearer_auth" = [])),
    request_body = DepositRequest,
    responses(
        (status = 200, description = "Signed checkout URL", body = PaymentUrlResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_payment_url(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<DepositRequest>,
) -> AppResult<Json<PaymentUrlResponse>> {
    require_role(&current, Role::Customer)?;

    let response = state
        .payment_service
        .create_payment_url(
            current.id,
            payload.amount,
            payload.description,
            client_ip(&headers),
        )
        .await?;

    Ok(Json(response))
}

/// VNPay return URL: verify the callback and settle the deposit
#[utoipa::path(
    get,
    path = "/payments/vnpay/callback",
    tag = "Payments",
    responses(
        (status = 200, description = "Deposit settled (completed or failed)", body = TransactionResponse),
        (status = 400, description = "Bad signature or already processed"),
        (status = 404, description = "Unknown transaction")
    )
)]
pub async fn vnpay_callback(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<TransactionResponse>> {
    let response = state.payment_service.payment_execute(&params)?;
    let transaction = state.payment_service.deposit_payment(response).await?;
    Ok(Json(transaction))
}

/// Pay a pending order from the wallet balance
#[utoipa::path(
    post,
    path = "/payments/orders/{id}/wallet",
    tag = "Payments",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order paid", body = TransactionResponse),
        (status = 400, description = "Order not pending or balance too low"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the order owner"),
        (status = 404, description = "Order not found")
    )
)]
pub async fn pay_order_with_wallet(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TransactionResponse>> {
    require_role(&current, Role::Customer)?;

    let transaction = state
        .payment_service
        .pay_order_with_wallet_balance(id, current.id)
        .await?;

    Ok(Json(transaction))
}

/// The signed-in account's transactions
#[utoipa::path(
    get,
    path = "/payments/transactions",
    tag = "Payments",
    security(("bearer_auth" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "A page of transactions", body = TransactionPage),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Paginated<TransactionResponse>>> {
    let page = state
        .payment_service
        .list_transactions(current.id, query)
        .await?;
    Ok(Json(page))
}
