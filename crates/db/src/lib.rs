//! Database layer with `SeaORM` entities, repositories, and the
//! ledger service.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions for data access
//! - The [`LedgerService`] money-movement command handlers
//! - Database migrations

pub mod entities;
pub mod ledger;
pub mod migration;
pub mod repositories;

pub use ledger::{LedgerService, TransferOutcome};
pub use repositories::{
    AccountRepository, ExchangeRateRepository, IdempotencyRepository, TransactionRepository,
};

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
