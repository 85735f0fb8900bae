//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod accounts;
pub mod health;
pub mod transfers;

/// Routes under `/api/v1`: KRW accounts and same-currency transfers.
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .merge(accounts::v1_routes())
        .merge(transfers::v1_routes())
}

/// Routes under `/api/v2`: multi-currency accounts and global transfers.
pub fn v2_routes() -> Router<AppState> {
    Router::new()
        .merge(accounts::v2_routes())
        .merge(transfers::v2_routes())
}

/// Routes under `/api/v3`: global transfers with a mandatory idempotency key.
pub fn v3_routes() -> Router<AppState> {
    transfers::v3_routes()
}
