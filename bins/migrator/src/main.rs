//! Database migration runner for Wirewon.
//!
//! Applies the ledger schema (accounts, transactions, exchange_rates,
//! idempotency_records) to the database named by `DATABASE_URL`.
//!
//! Usage:
//!   migrator up      - Run all pending migrations
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use sea_orm_migration::prelude::*;
use wirewon_db::migration::Migrator;

#[tokio::main]
async fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Fail early with a message naming what to set; the CLI's own error
    // for a missing URL surfaces deep inside the connector
    if std::env::var_os("DATABASE_URL").is_none() {
        eprintln!("DATABASE_URL must point at the Wirewon ledger database");
        std::process::exit(1);
    }

    // Run the migrator CLI (it sets up its own tracing)
    cli::run_cli(Migrator).await;
}
