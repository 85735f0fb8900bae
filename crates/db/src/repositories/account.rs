//! Account repository: lookups, exclusive locking, and balance writes.
//!
//! Every balance mutation goes through [`AccountRepository::find_for_update`]
//! or [`AccountRepository::find_pair_for_update`], which take the row
//! lock for the rest of the enclosing transaction. The plain
//! [`AccountRepository::get`] is read-only and must never feed a write.

use std::str::FromStr;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use wirewon_core::account::{Account, lock_order};
use wirewon_shared::{AppError, AppResult, Currency};

use super::map_db_err;
use crate::entities::accounts;

/// A transfer's two accounts, locked in canonical order but returned
/// by semantic role.
#[derive(Debug, Clone)]
pub struct LockedPair {
    /// The debited account.
    pub from: Account,
    /// The credited account.
    pub to: Account,
}

/// Account repository for account lifecycle and locking.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account with a zero balance.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DuplicateAccount`] if the account number is
    /// already taken by a live account.
    pub async fn create(
        &self,
        account_number: &str,
        owner_name: &str,
        currency: Currency,
    ) -> AppResult<Account> {
        let existing = accounts::Entity::find()
            .filter(accounts::Column::AccountNumber.eq(account_number))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;
        if existing.is_some() {
            return Err(AppError::DuplicateAccount(account_number.to_string()));
        }

        let now = Utc::now();
        let model = accounts::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_number: Set(account_number.to_string()),
            owner_name: Set(owner_name.to_string()),
            currency: Set(currency.as_str().to_string()),
            balance: Set(rust_decimal::Decimal::ZERO),
            version: Set(0),
            created_at: Set(now.into()),
            deleted_at: Set(None),
        };

        // Two requests can race past the pre-check; the unique
        // constraint is the arbiter.
        let inserted = match model.insert(&self.db).await {
            Ok(m) => m,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(AppError::DuplicateAccount(account_number.to_string()));
            }
            Err(e) => return Err(map_db_err(e)),
        };

        to_domain(inserted)
    }

    /// Fetches a live account without locking it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AccountNotFound`] if no live account with
    /// that id exists.
    pub async fn get(&self, id: Uuid) -> AppResult<Account> {
        let model = accounts::Entity::find_by_id(id)
            .filter(accounts::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))?;

        to_domain(model)
    }

    /// Fetches a live account under `SELECT ... FOR UPDATE`.
    ///
    /// The row lock is held until the transaction commits or rolls
    /// back; all mutations must start here.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AccountNotFound`] if no live account with
    /// that id exists.
    pub async fn find_for_update(&self, txn: &DatabaseTransaction, id: Uuid) -> AppResult<Account> {
        let model = accounts::Entity::find_by_id(id)
            .filter(accounts::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::AccountNotFound(id.to_string()))?;

        to_domain(model)
    }

    /// Locks both accounts of a transfer in ascending-id order.
    ///
    /// The fixed acquisition order holds regardless of transfer
    /// direction, so two opposing transfers over the same pair
    /// serialize instead of deadlocking. The rows come back mapped to
    /// their from/to roles.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AccountNotFound`] if either account is
    /// missing or deleted.
    pub async fn find_pair_for_update(
        &self,
        txn: &DatabaseTransaction,
        from_id: Uuid,
        to_id: Uuid,
    ) -> AppResult<LockedPair> {
        let (first_id, second_id) = lock_order(from_id, to_id);
        let first = self.find_for_update(txn, first_id).await?;
        let second = self.find_for_update(txn, second_id).await?;

        let (from, to) = if first.id == from_id {
            (first, second)
        } else {
            (second, first)
        };
        Ok(LockedPair { from, to })
    }

    /// Writes a mutated balance back, bumping the version counter.
    ///
    /// The filter on the old version is a secondary integrity check;
    /// with the row lock held it can only miss if something bypassed
    /// the locking accessor.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ConcurrentModification`] if the version
    /// changed underneath us.
    pub async fn save_balance(
        &self,
        txn: &DatabaseTransaction,
        account: &mut Account,
    ) -> AppResult<()> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                sea_orm::sea_query::Expr::value(account.balance),
            )
            .col_expr(
                accounts::Column::Version,
                sea_orm::sea_query::Expr::value(account.version + 1),
            )
            .filter(accounts::Column::Id.eq(account.id))
            .filter(accounts::Column::Version.eq(account.version))
            .exec(txn)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::ConcurrentModification(format!(
                "account {} version {} was stale",
                account.id, account.version
            )));
        }

        account.version += 1;
        Ok(())
    }

    /// Soft-deletes an account.
    ///
    /// The row survives with `deleted_at` set and a rewritten account
    /// number, so history rows keep their referent while the original
    /// number frees up for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::AccountNotFound`] if the account is missing
    /// or already deleted.
    pub async fn soft_delete(&self, id: Uuid) -> AppResult<()> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let mut account = self.find_for_update(&txn, id).await?;
        account.mark_deleted(Utc::now());

        let update = accounts::ActiveModel {
            id: Set(account.id),
            account_number: Set(account.account_number.clone()),
            deleted_at: Set(account.deleted_at.map(Into::into)),
            version: Set(account.version + 1),
            ..Default::default()
        };
        update.update(&txn).await.map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(())
    }
}

/// Converts a storage row into the domain account.
fn to_domain(model: accounts::Model) -> AppResult<Account> {
    let currency = Currency::from_str(&model.currency).map_err(AppError::DataIntegrityViolation)?;
    Ok(Account {
        id: model.id,
        account_number: model.account_number,
        owner_name: model.owner_name,
        currency,
        balance: model.balance,
        version: model.version,
        created_at: model.created_at.with_timezone(&Utc),
        deleted_at: model.deleted_at.map(|t| t.with_timezone(&Utc)),
    })
}
