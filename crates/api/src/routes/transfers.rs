//! Transfer routes.
//!
//! v1 moves money between same-currency accounts. v2 and v3 are the
//! cross-currency (global) variants; both honor an Idempotency-Key,
//! v3 refuses to run without one.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wirewon_db::TransferOutcome;
use wirewon_shared::{AppError, Currency};

use crate::AppState;
use crate::error::ApiError;
use crate::idempotency::run_idempotent;

/// Creates the v1 transfer route.
pub fn v1_routes() -> Router<AppState> {
    Router::new().route("/transfers", post(transfer))
}

/// Creates the v2 global transfer route (optional idempotency key).
pub fn v2_routes() -> Router<AppState> {
    Router::new().route("/global-transfers", post(global_transfer_v2))
}

/// Creates the v3 global transfer route (mandatory idempotency key).
pub fn v3_routes() -> Router<AppState> {
    Router::new().route("/global-transfers", post(global_transfer_v3))
}

/// Request body shared by both transfer variants.
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    /// Sender account ID.
    pub from_account_id: Uuid,
    /// Receiver account ID.
    pub to_account_id: Uuid,
    /// Principal in the sender's currency; must be present and > 0.
    pub amount: Option<Decimal>,
}

/// Response for a completed transfer.
#[derive(Debug, Serialize)]
pub struct TransferResponse {
    /// Sender account ID.
    pub from_account_id: Uuid,
    /// Receiver account ID.
    pub to_account_id: Uuid,
    /// Principal in the sender's currency.
    pub original_amount: Decimal,
    /// Sender currency.
    pub from_currency: Currency,
    /// Amount credited to the receiver, in the receiver's currency.
    pub converted_amount: Decimal,
    /// Receiver currency.
    pub to_currency: Currency,
    /// Exchange rate applied; 1 for same-currency transfers.
    pub exchange_rate: Decimal,
    /// Transfer fee charged to the sender.
    pub fee: Decimal,
    /// Sender balance after the transfer.
    pub from_balance: Decimal,
    /// Receiver balance after the transfer.
    pub to_balance: Decimal,
}

impl From<TransferOutcome> for TransferResponse {
    fn from(outcome: TransferOutcome) -> Self {
        Self {
            from_account_id: outcome.from.id,
            to_account_id: outcome.to.id,
            original_amount: outcome.amount,
            from_currency: outcome.from.currency,
            converted_amount: outcome.converted,
            to_currency: outcome.to.currency,
            exchange_rate: outcome.exchange_rate,
            fee: outcome.fee,
            from_balance: outcome.from.balance,
            to_balance: outcome.to.balance,
        }
    }
}

/// POST `/api/v1/transfers` - Same-currency transfer.
async fn transfer(
    State(state): State<AppState>,
    Json(payload): Json<TransferRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .ledger
        .transfer(payload.from_account_id, payload.to_account_id, payload.amount)
        .await?;
    Ok((StatusCode::OK, Json(TransferResponse::from(outcome))))
}

/// POST `/api/v2/global-transfers` - Cross-currency transfer.
async fn global_transfer_v2(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    global_transfer(&state, &headers, &body, "/api/v2/global-transfers", false).await
}

/// POST `/api/v3/global-transfers` - Cross-currency transfer, replay-guarded.
async fn global_transfer_v3(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    global_transfer(&state, &headers, &body, "/api/v3/global-transfers", true).await
}

async fn global_transfer(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    path: &str,
    key_required: bool,
) -> Result<Response, ApiError> {
    // Parsed by hand because the replay hash needs the raw bytes
    let payload: TransferRequest = serde_json::from_slice(body)
        .map_err(|e| ApiError(AppError::Validation(format!("malformed request body: {e}"))))?;

    let ledger = state.ledger.clone();
    run_idempotent(state, headers, path, body, key_required, move || async move {
        let outcome = ledger
            .transfer_global(payload.from_account_id, payload.to_account_id, payload.amount)
            .await?;
        Ok((StatusCode::OK, TransferResponse::from(outcome)))
    })
    .await
}
