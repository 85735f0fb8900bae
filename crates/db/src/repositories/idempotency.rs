//! Idempotency record repository.
//!
//! Persists replay records after a command commits and serves them
//! back to the guard. Expiry is logical: a record past `expires_at` is
//! invisible to [`IdempotencyRepository::find_live`] even before the
//! sweep deletes it.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};
use uuid::Uuid;

use wirewon_core::idempotency::{self, StoredResponse};
use wirewon_shared::AppResult;

use super::map_db_err;
use crate::entities::idempotency_records;

/// Idempotency record repository.
#[derive(Debug, Clone)]
pub struct IdempotencyRepository {
    db: DatabaseConnection,
}

impl IdempotencyRepository {
    /// Creates a new idempotency repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Looks up a non-expired record for a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_live(&self, key: &str) -> AppResult<Option<StoredResponse>> {
        let row = idempotency_records::Entity::find()
            .filter(idempotency_records::Column::IdempotencyKey.eq(key))
            .filter(idempotency_records::Column::ExpiresAt.gt(Utc::now()))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(row.map(|r| StoredResponse {
            request_body_hash: r.request_body_hash,
            response_body: r.response_body,
            response_status: u16::try_from(r.response_status).unwrap_or(500),
        }))
    }

    /// Persists a replay record.
    ///
    /// A concurrent first writer for the same key wins silently; the
    /// loser's record would carry the same response anyway.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails for any other reason.
    pub async fn save(
        &self,
        key: &str,
        request_path: &str,
        body_hash: Option<&str>,
        status: u16,
        body: &str,
    ) -> AppResult<()> {
        let now = Utc::now();
        let row = idempotency_records::ActiveModel {
            id: Set(Uuid::new_v4()),
            idempotency_key: Set(key.to_string()),
            request_path: Set(request_path.to_string()),
            request_body_hash: Set(body_hash.map(ToString::to_string)),
            response_status: Set(i32::from(status)),
            response_body: Set(body.to_string()),
            created_at: Set(now.into()),
            expires_at: Set(idempotency::expires_at(now).into()),
        };

        match row.insert(&self.db).await {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(()),
            Err(e) => Err(map_db_err(e)),
        }
    }

    /// Deletes expired records, returning how many went away.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn cleanup_expired(&self) -> AppResult<u64> {
        let result = idempotency_records::Entity::delete_many()
            .filter(idempotency_records::Column::ExpiresAt.lt(Utc::now()))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}
