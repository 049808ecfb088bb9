//! Application route configuration.

use axum::{extract::State, http::StatusCode, middleware, response::Json, routing::get, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    account_routes, auth_routes, bid_routes, payment_callback_routes, payment_routes,
};
use super::middleware::auth_middleware;
use super::openapi::ApiDoc;
use super::AppState;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let protected = |routes: Router<AppState>| {
        routes.route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public; token regeneration takes an already expired access token
        .nest("/auth", auth_routes())
        .nest("/accounts", protected(account_routes()))
        .nest("/bids", protected(bid_routes()))
        .nest(
            "/payments",
            protected(payment_routes()).merge(payment_callback_routes()),
        )
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Diamond Shop API"
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: ServiceStatus,
}

/// Service status
#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint with a database round trip
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status_code, database) = match state.database.ping().await {
        Ok(_) => (
            StatusCode::OK,
            ServiceStatus {
                status: "healthy",
                error: None,
            },
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ServiceStatus {
                status: "unhealthy",
                error: Some(e.to_string()),
            },
        ),
    };

    let response = HealthResponse {
        status: if status_code == StatusCode::OK {
            "healthy"
        } else {
            "degraded"
        },
        database,
    };

    (status_code, Json(response))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header::AUTHORIZATION, Request},
    };
    use chrono::Utc;
    use sea_orm::DatabaseConnection;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::config::VnPaySettings;
    use crate::domain::{AccountResponse, Role};
    use crate::errors::AppError;
    use crate::infra::{Database, VnPayClient};
    use crate::services::{BidManager, Claims, MockAuthService, PaymentProcessor};

    fn state(auth: MockAuthService) -> AppState {
        let db = DatabaseConnection::Disconnected;
        AppState::new(
            Arc::new(auth),
            Arc::new(BidManager::new(db.clone())),
            Arc::new(PaymentProcessor::new(
                db.clone(),
                VnPayClient::new(VnPaySettings::new("T", "S", "http://pay", "http://back")),
            )),
            Arc::new(Database::from_connection(db)),
        )
    }

    fn me(token: &str) -> Request<Body> {
        Request::get("/accounts/me")
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn verified_token_reaches_the_handler() {
        let id = Uuid::new_v4();
        let mut auth = MockAuthService::new();
        auth.expect_verify_token().returning(move |_| {
            Ok(Claims {
                sub: id,
                email: "abc@gmail.com".into(),
                role: "customer".into(),
                jti: "jti".into(),
                iat: 0,
                exp: i64::MAX,
            })
        });
        auth.expect_get_account()
            .withf(move |requested| *requested == id)
            .returning(|id| {
                Ok(AccountResponse {
                    id,
                    email: "abc@gmail.com".into(),
                    user_name: "abc".into(),
                    role: Role::Customer,
                    wallet_balance: 42,
                    created_at: Utc::now(),
                })
            });

        let response = create_router(state(auth)).oneshot(me("good")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let account: AccountResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(account.id, id);
        assert_eq!(account.wallet_balance, 42);
    }

    #[tokio::test]
    async fn token_of_deleted_account_is_unauthorized() {
        let mut auth = MockAuthService::new();
        auth.expect_verify_token().returning(|_| {
            Ok(Claims {
                sub: Uuid::new_v4(),
                email: "gone@gmail.com".into(),
                role: "customer".into(),
                jti: "jti".into(),
                iat: 0,
                exp: i64::MAX,
            })
        });
        auth.expect_get_account()
            .times(1)
            .returning(|_| Err(AppError::NotFound));

        let response = create_router(state(auth)).oneshot(me("good")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejected_token_is_unauthorized() {
        let mut auth = MockAuthService::new();
        auth.expect_verify_token()
            .returning(|_| Err(AppError::bad_request("expired")));
        auth.expect_get_account().never();

        let response = create_router(state(auth)).oneshot(me("stale")).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
