//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::config::BEARER_TOKEN_PREFIX;
use crate::domain::Role;
use crate::errors::AppError;

/// Authenticated account extracted from the access token
#[derive(Clone, Debug)]
pub struct CurrentAccount {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Token from an `Authorization: Bearer <token>` header.
///
/// `None` when the header is absent, blank, not valid UTF-8 or not a
/// bearer credential.
pub fn read_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .and_then(|h| h.strip_prefix(BEARER_TOKEN_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// JWT authentication middleware.
///
/// Validates the bearer token, then loads the account it names so a
/// deleted account loses access at once and role changes apply to the
/// next request. Injects [`CurrentAccount`] into the request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = read_bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;

    let claims = state
        .auth_service
        .verify_token(token)
        .map_err(|_| AppError::Unauthorized)?;

    let account = match state.auth_service.get_account(claims.sub).await {
        Ok(account) => account,
        Err(AppError::NotFound) => {
            tracing::warn!(account_id = %claims.sub, "Token for a missing or deleted account");
            return Err(AppError::Unauthorized);
        }
        Err(e) => return Err(e),
    };

    request.extensions_mut().insert(CurrentAccount {
        id: account.id,
        email: account.email,
        role: account.role,
    });

    Ok(next.run(request).await)
}

/// Forbidden unless the account holds `required` (admins always pass).
pub fn require_role(account: &CurrentAccount, required: Role) -> Result<(), AppError> {
    if account.role.can_access(required) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
