//! `SeaORM` entities mirroring the migration schema.

pub mod accounts;
pub mod exchange_rates;
pub mod idempotency_records;
pub mod transactions;
