//! Ledger service: the money-movement command handlers.
//!
//! Each command runs as one storage transaction: lock the account rows,
//! price the operation, enforce daily ceilings, mutate balances, append
//! history rows, commit. Locks are acquired through the account
//! repository's `FOR UPDATE` accessors and held to commit, so limit
//! sums and balance writes cannot interleave with a concurrent command
//! on the same account.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use wirewon_core::account::{
    Account, validate_amount, validate_distinct_accounts, validate_same_currency,
};
use wirewon_core::ledger::NewEntry;
use wirewon_core::limits::{self, LimitKind};
use wirewon_core::money;
use wirewon_core::rates::RateResolver;
use wirewon_shared::{AppResult, Currency};

use crate::repositories::{AccountRepository, TransactionRepository, map_db_err};

/// Result of a completed transfer, same-currency or cross-currency.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Debited account, post-mutation.
    pub from: Account,
    /// Credited account, post-mutation.
    pub to: Account,
    /// Principal in the source currency.
    pub amount: Decimal,
    /// Amount credited to the destination, net of the exchange fee.
    pub converted: Decimal,
    /// Spot rate applied; 1 for same-currency transfers.
    pub exchange_rate: Decimal,
    /// Transfer fee charged on top of the principal.
    pub fee: Decimal,
}

/// Money-movement command handlers.
#[derive(Clone)]
pub struct LedgerService {
    db: DatabaseConnection,
    accounts: AccountRepository,
    transactions: TransactionRepository,
    rates: RateResolver,
}

impl LedgerService {
    /// Creates the service over a shared connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection, rates: RateResolver) -> Self {
        let accounts = AccountRepository::new(db.clone());
        let transactions = TransactionRepository::new(db.clone());
        Self {
            db,
            accounts,
            transactions,
            rates,
        }
    }

    /// Credits `amount` to an account.
    ///
    /// Deposits have no daily ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`wirewon_shared::AppError::InvalidAmount`] for a
    /// missing or non-positive amount and
    /// [`wirewon_shared::AppError::AccountNotFound`] for an unknown or
    /// deleted account.
    pub async fn deposit(&self, id: Uuid, amount: Option<Decimal>) -> AppResult<Account> {
        let amount = validate_amount(amount)?;

        let txn = self.db.begin().await.map_err(map_db_err)?;
        let mut account = self.accounts.find_for_update(&txn, id).await?;

        account.deposit(amount);
        self.accounts.save_balance(&txn, &mut account).await?;
        self.transactions
            .record(&txn, &NewEntry::deposit(&account, amount))
            .await?;
        txn.commit().await.map_err(map_db_err)?;

        info!(account_id = %id, %amount, balance = %account.balance, "deposit completed");
        Ok(account)
    }

    /// Debits `amount` from an account.
    ///
    /// # Errors
    ///
    /// Returns [`wirewon_shared::AppError::LimitExceeded`] when the
    /// KRW-normalized daily withdrawal total would pass 1,000,000 and
    /// [`wirewon_shared::AppError::InsufficientBalance`] when the
    /// balance cannot cover the amount. The limit check runs first.
    pub async fn withdraw(&self, id: Uuid, amount: Option<Decimal>) -> AppResult<Account> {
        let amount = validate_amount(amount)?;

        let txn = self.db.begin().await.map_err(map_db_err)?;
        let mut account = self.accounts.find_for_update(&txn, id).await?;

        self.enforce_ceiling(&txn, LimitKind::Withdraw, &account, amount)
            .await?;
        account.withdraw(amount)?;

        self.accounts.save_balance(&txn, &mut account).await?;
        self.transactions
            .record(&txn, &NewEntry::withdraw(&account, amount))
            .await?;
        txn.commit().await.map_err(map_db_err)?;

        info!(account_id = %id, %amount, balance = %account.balance, "withdrawal completed");
        Ok(account)
    }

    /// Moves `amount` between two same-currency accounts.
    ///
    /// The sender pays a 1% transfer fee on top of the principal; the
    /// receiver is credited the principal unchanged.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing amount, identical
    /// accounts, or a currency mismatch; a limit error when the daily
    /// transfer ceiling would pass; an insufficient-balance error when
    /// principal plus fee exceeds the sender's balance.
    pub async fn transfer(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        amount: Option<Decimal>,
    ) -> AppResult<TransferOutcome> {
        let amount = validate_amount(amount)?;
        validate_distinct_accounts(from_id, to_id)?;

        let txn = self.db.begin().await.map_err(map_db_err)?;
        let pair = self.accounts.find_pair_for_update(&txn, from_id, to_id).await?;
        let (mut from, mut to) = (pair.from, pair.to);
        validate_same_currency(&from, &to)?;

        self.enforce_ceiling(&txn, LimitKind::Transfer, &from, amount)
            .await?;

        let fee = money::transfer_fee(amount, from.currency);
        let total = money::add(amount, fee, from.currency);
        from.withdraw(total)?;
        to.deposit(amount);

        self.accounts.save_balance(&txn, &mut from).await?;
        self.accounts.save_balance(&txn, &mut to).await?;
        self.transactions
            .record(&txn, &NewEntry::transfer_out(&from, amount, fee, to.id))
            .await?;
        self.transactions
            .record(&txn, &NewEntry::transfer_in(&to, amount, from.id))
            .await?;
        txn.commit().await.map_err(map_db_err)?;

        info!(
            from_id = %from.id,
            to_id = %to.id,
            %amount,
            %fee,
            "transfer completed"
        );
        Ok(TransferOutcome {
            from,
            to,
            amount,
            converted: amount,
            exchange_rate: Decimal::ONE,
            fee,
        })
    }

    /// Moves `amount` between accounts, converting currency as needed.
    ///
    /// The sender pays the 1% transfer fee in the source currency; the
    /// receiver is credited the converted amount minus a 0.5% exchange
    /// fee (zero when the currencies match). Both the transfer ceiling
    /// (on the principal) and the withdrawal ceiling (on the total
    /// debit) apply to the sender.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`LedgerService::transfer`], without the
    /// currency-mismatch case.
    pub async fn transfer_global(
        &self,
        from_id: Uuid,
        to_id: Uuid,
        amount: Option<Decimal>,
    ) -> AppResult<TransferOutcome> {
        let amount = validate_amount(amount)?;
        validate_distinct_accounts(from_id, to_id)?;

        let txn = self.db.begin().await.map_err(map_db_err)?;
        let pair = self.accounts.find_pair_for_update(&txn, from_id, to_id).await?;
        let (mut from, mut to) = (pair.from, pair.to);

        let rate = self.rates.get_rate(from.currency, to.currency).await;
        let quote = money::quote_transfer(amount, rate, from.currency, to.currency);

        self.enforce_ceiling(&txn, LimitKind::Transfer, &from, amount)
            .await?;
        self.enforce_ceiling(&txn, LimitKind::Withdraw, &from, quote.total_debit)
            .await?;

        from.withdraw(quote.total_debit)?;
        to.deposit(quote.credited);

        self.accounts.save_balance(&txn, &mut from).await?;
        self.accounts.save_balance(&txn, &mut to).await?;
        self.transactions
            .record(
                &txn,
                &NewEntry::transfer_out(&from, amount, quote.transfer_fee, to.id),
            )
            .await?;
        self.transactions
            .record(&txn, &NewEntry::transfer_in(&to, quote.credited, from.id))
            .await?;
        txn.commit().await.map_err(map_db_err)?;

        info!(
            from_id = %from.id,
            to_id = %to.id,
            %amount,
            %rate,
            credited = %quote.credited,
            "global transfer completed"
        );
        Ok(TransferOutcome {
            from,
            to,
            amount,
            converted: quote.credited,
            exchange_rate: rate,
            fee: quote.transfer_fee,
        })
    }

    /// Checks one daily ceiling for the locked account.
    ///
    /// Sums the account's same-kind history rows since the Seoul
    /// midnight window start, adds the in-flight amount, normalizes to
    /// KRW, and compares against the ceiling. Must run on the locking
    /// transaction: the sum is only race-free under the account's
    /// exclusive lock.
    async fn enforce_ceiling(
        &self,
        txn: &DatabaseTransaction,
        kind: LimitKind,
        account: &Account,
        in_flight: Decimal,
    ) -> AppResult<()> {
        let since = limits::window_start_utc(Utc::now());
        let window_total = self
            .transactions
            .daily_total(txn, account.id, kind.entry_kind(), since)
            .await?;

        // Resolves to 1 without I/O when the account is already KRW.
        let rate = self.rates.get_rate(account.currency, Currency::Krw).await;
        limits::check_ceiling(kind, window_total, in_flight, account.currency, |total| {
            money::convert(total, rate, Currency::Krw)
        })?;
        Ok(())
    }
}
