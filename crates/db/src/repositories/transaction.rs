//! Transaction history repository.
//!
//! The single writer of history rows. Writes happen inside the same
//! transaction as the balance mutation they describe, so a row and its
//! balance change commit or roll back together.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use wirewon_core::ledger::{EntryKind, NewEntry};
use wirewon_shared::{AppResult, PageRequest, PageResponse};

use super::map_db_err;
use crate::entities::transactions;

/// Transaction history repository.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends one history row inside the caller's transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record(&self, txn: &DatabaseTransaction, entry: &NewEntry) -> AppResult<()> {
        let row = transactions::ActiveModel {
            id: Set(Uuid::new_v4()),
            account_id: Set(entry.account_id),
            kind: Set(entry.kind.as_str().to_string()),
            amount: Set(entry.amount),
            fee: Set(entry.fee),
            currency: Set(entry.currency.as_str().to_string()),
            balance_after: Set(entry.balance_after),
            related_account_id: Set(entry.related_account_id),
            created_at: Set(Utc::now().into()),
        };
        row.insert(txn).await.map_err(map_db_err)?;
        Ok(())
    }

    /// Lists an account's history, newest first.
    ///
    /// History is queryable by account id even after the account is
    /// soft-deleted; the existence check is the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn list_for_account(
        &self,
        account_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<transactions::Model>> {
        let total = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .count(&self.db)
            .await
            .map_err(map_db_err)?;

        // Secondary order on id keeps pagination stable when rows
        // share a timestamp.
        let items = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(PageResponse::new(items, page.page, page.size, total))
    }

    /// Sum of one entry kind for an account since `since`.
    ///
    /// Runs on the caller's transaction so the sum is read under the
    /// account's exclusive lock; this is what makes the daily limit
    /// check race-free.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn daily_total(
        &self,
        txn: &DatabaseTransaction,
        account_id: Uuid,
        kind: EntryKind,
        since: DateTime<Utc>,
    ) -> AppResult<Decimal> {
        #[derive(FromQueryResult)]
        struct SumRow {
            total: Option<Decimal>,
        }

        let row = transactions::Entity::find()
            .select_only()
            .column_as(transactions::Column::Amount.sum(), "total")
            .filter(transactions::Column::AccountId.eq(account_id))
            .filter(transactions::Column::Kind.eq(kind.as_str()))
            .filter(transactions::Column::CreatedAt.gte(since))
            .into_model::<SumRow>()
            .one(txn)
            .await
            .map_err(map_db_err)?;

        Ok(row.and_then(|r| r.total).unwrap_or(Decimal::ZERO))
    }
}
