//! HTTP API layer with Axum routes and the idempotency decorator.
//!
//! This crate provides:
//! - Versioned REST routes (v1 KRW accounts, v2 multi-currency,
//!   v3 mandatory idempotency)
//! - JSON error responses built from the shared error taxonomy
//! - The replay decorator for idempotency-keyed transfers

pub mod error;
pub mod idempotency;
pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wirewon_db::LedgerService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Money-movement command handlers.
    pub ledger: LedgerService,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .nest("/api/v1", routes::v1_routes())
        .nest("/api/v2", routes::v2_routes())
        .nest("/api/v3", routes::v3_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
