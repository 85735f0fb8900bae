//! Wirewon API Server
//!
//! Main entry point for the Wirewon ledger service.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wirewon_api::{AppState, create_router};
use wirewon_core::rates::{HttpRateProvider, RateProvider, RateResolver};
use wirewon_db::{ExchangeRateRepository, IdempotencyRepository, LedgerService, connect};
use wirewon_shared::AppConfig;

/// How often expired idempotency records are purged.
const IDEMPOTENCY_SWEEP_SECS: u64 = 600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wirewon=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Build the exchange rate pipeline: store first, then external providers
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.rates.http_timeout_secs))
        .build()?;
    let providers: Vec<Arc<dyn RateProvider>> = vec![
        Arc::new(HttpRateProvider::new(
            "primary",
            config.rates.primary_url.clone(),
            http_client.clone(),
        )),
        Arc::new(HttpRateProvider::new(
            "secondary",
            config.rates.secondary_url.clone(),
            http_client,
        )),
    ];
    let rates = RateResolver::with_cache_ttl(
        Arc::new(ExchangeRateRepository::new(db.clone())),
        providers,
        Duration::from_secs(config.rates.cache_ttl_secs),
    );
    info!(
        primary = %config.rates.primary_url,
        secondary = %config.rates.secondary_url,
        "Exchange rate providers configured"
    );

    let ledger = LedgerService::new(db.clone(), rates);

    // Replay records outlive their TTL in the table; sweep them in the background
    let sweeper = IdempotencyRepository::new(db.clone());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(IDEMPOTENCY_SWEEP_SECS));
        loop {
            ticker.tick().await;
            match sweeper.cleanup_expired().await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "Expired idempotency records removed"),
                Err(e) => warn!(error = %e, "Idempotency sweep failed"),
            }
        }
    });

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        ledger,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
