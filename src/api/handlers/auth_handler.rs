//! Authentication handlers.

use axum::{extract::State, http::StatusCode, response::Json, routing::post, Router};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{AccountResponse, LoginResponse, TokenPair};
use crate::errors::AppResult;

/// Account registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "User name is required"))]
    #[schema(example = "abc")]
    pub user_name: String,
    #[validate(
        email(message = "Invalid email format"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    #[schema(example = "abc@gmail.com")]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(example = "SecurePass123!", min_length = 8)]
    pub password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        email(message = "Invalid email format"),
        length(max = 50, message = "Email must be at most 50 characters")
    )]
    #[schema(example = "abc@gmail.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

/// Token pair to rotate
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegenerateTokensRequest {
    #[validate(length(min = 1, message = "Access token is required"))]
    pub access_token: String,
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/regeneration-tokens", post(regenerate_tokens))
}

/// Register a customer account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account registered", body = AccountResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AccountResponse>)> {
    let account = state
        .auth_service
        .register(payload.user_name, payload.email, payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(account)))
}

/// Login and get a token pair
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let response = state
        .auth_service
        .login(payload.email, payload.password)
        .await?;

    Ok(Json(response))
}

/// Exchange an expired access token and its refresh token for a new pair
#[utoipa::path(
    post,
    path = "/auth/regeneration-tokens",
    tag = "Authentication",
    request_body = RegenerateTokensRequest,
    responses(
        (status = 200, description = "Tokens regenerated", body = TokenPair),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Token pair rejected")
    )
)]
pub async fn regenerate_tokens(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegenerateTokensRequest>,
) -> AppResult<Json<TokenPair>> {
    let tokens = state
        .auth_service
        .regenerate_tokens(payload.access_token, payload.refresh_token)
        .await?;

    Ok(Json(tokens))
}
