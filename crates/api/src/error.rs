//! JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde_json::json;
use tracing::error;

use wirewon_core::idempotency::IdempotencyError;
use wirewon_shared::AppError;

/// Wrapper turning [`AppError`] into an HTTP response.
///
/// Every failure leaves the API as
/// `{ "error": CODE, "message": text, "timestamp": RFC3339 }` with the
/// status and code the shared taxonomy assigns to the variant.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<IdempotencyError> for ApiError {
    fn from(err: IdempotencyError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %err, "Request failed");
        }
        let body = Json(json!({
            "error": err.error_code(),
            "message": err.to_string(),
            "timestamp": Utc::now().to_rfc3339(),
        }));
        (status, body).into_response()
    }
}
