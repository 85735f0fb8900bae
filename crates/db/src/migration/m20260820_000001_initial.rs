//! Initial database migration.
//!
//! Creates the accounts, transactions, exchange_rates, and
//! idempotency_records tables with their constraints and indexes.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ACCOUNTS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;

        // ============================================================
        // PART 2: TRANSACTION HISTORY
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 3: EXCHANGE RATES
        // ============================================================
        db.execute_unprepared(EXCHANGE_RATES_SQL).await?;

        // ============================================================
        // PART 4: IDEMPOTENCY RECORDS
        // ============================================================
        db.execute_unprepared(IDEMPOTENCY_RECORDS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ACCOUNTS_SQL: &str = r"
-- Money accounts. Deleted accounts stay as rows with deleted_at set;
-- their account_number is rewritten so the original number frees up.
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_number VARCHAR(100) NOT NULL UNIQUE,
    owner_name VARCHAR(100) NOT NULL,
    currency CHAR(3) NOT NULL,
    balance NUMERIC(19, 2) NOT NULL DEFAULT 0,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,
    CONSTRAINT chk_accounts_currency CHECK (currency ~ '^[A-Z]{3}$'),
    CONSTRAINT chk_accounts_balance_non_negative CHECK (balance >= 0)
);

-- Lookup of live accounts by number
CREATE INDEX idx_accounts_live ON accounts(account_number) WHERE deleted_at IS NULL;
";

const TRANSACTIONS_SQL: &str = r"
-- Append-only transaction history; one row per balance mutation
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id UUID NOT NULL REFERENCES accounts(id),
    kind VARCHAR(20) NOT NULL,
    amount NUMERIC(19, 2) NOT NULL,
    fee NUMERIC(19, 2) NOT NULL DEFAULT 0,
    currency CHAR(3) NOT NULL,
    balance_after NUMERIC(19, 2) NOT NULL,
    related_account_id UUID REFERENCES accounts(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_transactions_kind CHECK (kind IN ('DEPOSIT', 'WITHDRAW', 'TRANSFER_IN', 'TRANSFER_OUT')),
    CONSTRAINT chk_transactions_amount_positive CHECK (amount > 0),
    CONSTRAINT chk_transactions_fee_non_negative CHECK (fee >= 0)
);

-- History listing, newest first
CREATE INDEX idx_transactions_account_created ON transactions(account_id, created_at DESC);

-- Daily limit sums scan by account, kind, and window start
CREATE INDEX idx_transactions_daily_window ON transactions(account_id, kind, created_at);
";

const EXCHANGE_RATES_SQL: &str = r"
-- Fetched spot rates; each fetch inserts a new row, latest wins
CREATE TABLE exchange_rates (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    from_currency CHAR(3) NOT NULL,
    to_currency CHAR(3) NOT NULL,
    rate NUMERIC(19, 6) NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_exchange_rates_positive CHECK (rate > 0),
    CONSTRAINT chk_exchange_rates_distinct CHECK (from_currency <> to_currency)
);

-- Latest-rate lookup per pair
CREATE INDEX idx_exchange_rates_pair ON exchange_rates(from_currency, to_currency, updated_at DESC);
";

const IDEMPOTENCY_RECORDS_SQL: &str = r"
-- Replay records for idempotent commands; rows expire logically via
-- expires_at and are purged by a background sweep
CREATE TABLE idempotency_records (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    idempotency_key VARCHAR(255) NOT NULL UNIQUE,
    request_path VARCHAR(500) NOT NULL,
    request_body_hash VARCHAR(64),
    response_status INTEGER NOT NULL,
    response_body TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    expires_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_idempotency_expires CHECK (expires_at > created_at)
);

-- Expired-record sweep
CREATE INDEX idx_idempotency_expires ON idempotency_records(expires_at);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS idempotency_records CASCADE;
DROP TABLE IF EXISTS exchange_rates CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
";
