//! Replay decorator for idempotency-keyed endpoints.
//!
//! A keyed command executes at most once per live key: the first
//! execution's serialized response is recorded after the business
//! transaction committed, and a repeat of the same key and body gets
//! that recording back verbatim. Endpoints opt in per route and choose
//! whether the key is mandatory.

use std::future::Future;

use axum::Json;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, warn};

use wirewon_core::idempotency::{self, Decision};
use wirewon_db::IdempotencyRepository;
use wirewon_shared::AppError;

use crate::AppState;
use crate::error::ApiError;

/// Header carrying the client's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

fn header_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// Runs `execute` under the replay protocol.
///
/// Without a key on an optional endpoint the call passes straight
/// through with no bookkeeping. With a key, a live record for the same
/// body short-circuits to the recorded response, a live record for a
/// different body is a conflict, and a fresh execution records its
/// response fire-and-forget so a recording failure can never undo the
/// committed command.
///
/// # Errors
///
/// Returns the missing-key or reused-key violation, or whatever
/// `execute` itself fails with.
pub async fn run_idempotent<F, Fut, T>(
    state: &AppState,
    headers: &HeaderMap,
    path: &str,
    body: &[u8],
    required: bool,
    execute: F,
) -> Result<Response, ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(StatusCode, T), ApiError>>,
    T: Serialize,
{
    let Some(key) = idempotency::require_key(required, header_key(headers))? else {
        let (status, payload) = execute().await?;
        return Ok((status, Json(payload)).into_response());
    };

    let repo = IdempotencyRepository::new((*state.db).clone());
    let body_hash = idempotency::hash_body(body);
    let stored = repo.find_live(key).await?;

    match idempotency::decide(key, stored, &body_hash)? {
        Decision::Replay { status, body } => {
            debug!(key, "replaying recorded response");
            Ok(recorded_response(status, body))
        }
        Decision::Execute => {
            let (status, payload) = execute().await?;
            let serialized = serde_json::to_string(&payload)
                .map_err(|e| ApiError(AppError::Internal(e.to_string())))?;

            // The command already committed; the replay record is
            // best-effort and must never fail it.
            let key = key.to_string();
            let path = path.to_string();
            let response_body = serialized.clone();
            tokio::spawn(async move {
                if let Err(e) = repo
                    .save(&key, &path, Some(&body_hash), status.as_u16(), &response_body)
                    .await
                {
                    warn!(error = %e, key, "failed to record idempotency response");
                }
            });

            Ok(recorded_response(status.as_u16(), serialized))
        }
    }
}

/// Builds a response from a pre-serialized JSON body so the replay is
/// byte-identical to what the first execution returned.
fn recorded_response(status: u16, body: String) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::OK);
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(IDEMPOTENCY_KEY_HEADER, key.parse().unwrap());
        headers
    }

    #[test]
    fn test_header_key_extraction() {
        assert_eq!(header_key(&headers_with("abc-123")), Some("abc-123"));
        assert_eq!(header_key(&HeaderMap::new()), None);
    }

    #[test]
    fn test_recorded_response_carries_status_and_body() {
        let response = recorded_response(200, r#"{"ok":true}"#.to_string());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
