//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the
//! application. Balance-mutating flows receive a
//! [`sea_orm::DatabaseTransaction`] from the ledger service so that
//! locks, balance writes, and history rows share one transaction.

pub mod account;
pub mod exchange_rate;
pub mod idempotency;
pub mod transaction;

pub use account::{AccountRepository, LockedPair};
pub use exchange_rate::ExchangeRateRepository;
pub use idempotency::IdempotencyRepository;
pub use transaction::TransactionRepository;

use sea_orm::{DbErr, SqlErr};
use wirewon_shared::AppError;

/// Maps a database error onto the application taxonomy.
///
/// Constraint violations become integrity conflicts; lock and
/// serialization failures become retryable conflicts; everything else
/// stays a plain database error.
pub(crate) fn map_db_err(err: DbErr) -> AppError {
    if let Some(SqlErr::UniqueConstraintViolation(msg) | SqlErr::ForeignKeyConstraintViolation(msg)) =
        err.sql_err()
    {
        return AppError::DataIntegrityViolation(msg);
    }
    let msg = err.to_string();
    if msg.contains("55P03") || msg.contains("lock timeout") || msg.contains("could not obtain lock")
    {
        AppError::ResourceLocked(msg)
    } else if msg.contains("40001") || msg.contains("40P01") || msg.contains("deadlock") {
        AppError::ConcurrentModification(msg)
    } else {
        AppError::Database(msg)
    }
}
