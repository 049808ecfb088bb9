//! Bid handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_role, CurrentAccount};
use crate::api::AppState;
use crate::domain::{BidResponse, Role};
use crate::errors::AppResult;
use crate::services::BidFilter;
use crate::types::{BidPage, ListQuery, NoContent, Paginated};

/// Optional bid filters
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BidFilterParams {
    /// Only bids on this diamond
    pub diamond_code: Option<String>,
    /// Only bids by this account
    pub account_id: Option<Uuid>,
}

/// Bid placement request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlaceBidRequest {
    #[validate(length(min = 1, max = 64, message = "Diamond code is required"))]
    #[schema(example = "GIA-2141438167")]
    pub diamond_code: String,
    /// Offered amount in VND
    #[validate(range(min = 1, message = "Amount must be positive"))]
    #[schema(example = 250000000)]
    pub amount: i64,
}

pub fn bid_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_bids).post(place_bid))
        .route("/:id", get(get_bid).delete(withdraw_bid))
}

/// List live bids
#[utoipa::path(
    get,
    path = "/bids",
    tag = "Bids",
    security(("bearer_auth" = [])),
    params(ListQuery, BidFilterParams),
    responses(
        (status = 200, description = "A page of bids", body = BidPage),
        (status = 400, description = "Unknown order field"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_bids(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    Query(filter): Query<BidFilterParams>,
) -> AppResult<Json<Paginated<BidResponse>>> {
    let page = state
        .bid_service
        .list(
            BidFilter {
                diamond_code: filter.diamond_code,
                account_id: filter.account_id,
            },
            query,
        )
        .await?;

    Ok(Json(page))
}

/// Get a bid by ID
#[utoipa::path(
    get,
    path = "/bids/{id}",
    tag = "Bids",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Bid ID")),
    responses(
        (status = 200, description = "Bid found", body = BidResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bid not found")
    )
)]
pub async fn get_bid(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BidResponse>> {
    Ok(Json(state.bid_service.get(id).await?))
}

/// Place a bid (customers)
#[utoipa::path(
    post,
    path = "/bids",
    tag = "Bids",
    security(("bearer_auth" = [])),
    request_body = PlaceBidRequest,
    responses(
        (status = 201, description = "Bid placed", body = BidResponse),
        (status = 400, description = "Validation error or bid too low"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Customers only")
    )
)]
pub async fn place_bid(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    ValidatedJson(payload): ValidatedJson<PlaceBidRequest>,
) -> AppResult<(StatusCode, Json<BidResponse>)> {
    require_role(&current, Role::Customer)?;

    let bid = state
        .bid_service
        .place(current.id, payload.diamond_code, payload.amount)
        .await?;

    Ok((StatusCode::CREATED, Json(bid)))
}

/// Withdraw a bid (owner or admin)
#[utoipa::path(
    delete,
    path = "/bids/{id}",
    tag = "Bids",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Bid ID")),
    responses(
        (status = 204, description = "Bid withdrawn"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the bid owner"),
        (status = 404, description = "Bid not found")
    )
)]
pub async fn withdraw_bid(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
    Path(id): Path<Uuid>,
) -> AppResult<NoContent> {
    state
        .bid_service
        .withdraw(id, current.id, current.role)
        .await?;
    Ok(NoContent)
}
