//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{account_handler, auth_handler, bid_handler, payment_handler};
use crate::domain::{
    AccountResponse, BidResponse, LoginResponse, PaymentUrlResponse, Role, TokenPair,
    TransactionResponse,
};
use crate::types::{BidPage, PaginationMeta, TransactionPage};

/// OpenAPI documentation for the Diamond Shop API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Diamond Shop API",
        version = "0.1.0",
        description = "Accounts, diamond bids and VNPay wallet payments"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Authentication endpoints
        auth_handler::register,
        auth_handler::login,
        auth_handler::regenerate_tokens,
        // Account endpoints
        account_handler::get_current_account,
        // Bid endpoints
        bid_handler::list_bids,
        bid_handler::get_bid,
        bid_handler::place_bid,
        bid_handler::withdraw_bid,
        // Payment endpoints
        payment_handler::create_payment_url,
        payment_handler::vnpay_callback,
        payment_handler::pay_order_with_wallet,
        payment_handler::list_transactions,
    ),
    components(
        schemas(
            Role,
            AccountResponse,
            LoginResponse,
            TokenPair,
            BidResponse,
            TransactionResponse,
            PaymentUrlResponse,
            PaginationMeta,
            BidPage,
            TransactionPage,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            auth_handler::RegenerateTokensRequest,
            bid_handler::PlaceBidRequest,
            payment_handler::DepositRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login and token rotation"),
        (name = "Accounts", description = "The signed-in account"),
        (name = "Bids", description = "Bidding on diamonds"),
        (name = "Payments", description = "VNPay deposits and wallet payments")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}
