//! Response wrappers shared by handlers.

use axum::{http::StatusCode, response::IntoResponse};

/// 204 for deletes
pub struct NoContent;

impl IntoResponse for NoContent {
    fn into_response(self) -> axum::response::Response {
        StatusCode::NO_CONTENT.into_response()
    }
}
