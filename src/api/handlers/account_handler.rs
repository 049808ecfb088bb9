//! Account handlers.

use axum::{extract::State, response::Json, routing::get, Extension, Router};

use crate::api::middleware::CurrentAccount;
use crate::api::AppState;
use crate::domain::AccountResponse;
use crate::errors::AppResult;

pub fn account_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_current_account))
}

/// Get the signed-in account, wallet balance included
#[utoipa::path(
    get,
    path = "/accounts/me",
    tag = "Accounts",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_account(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentAccount>,
) -> AppResult<Json<AccountResponse>> {
    let account = state.auth_service.get_account(current.id).await?;
    Ok(Json(account))
}
