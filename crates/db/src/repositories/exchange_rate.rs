//! Exchange rate persistence backing the resolver's fallback chain.
//!
//! Implements the [`RateStore`] seam: reads return the most recently
//! updated row per pair, writes append a new row per fetch.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use wirewon_core::rates::{RateStore, StoreError};
use wirewon_shared::Currency;

use crate::entities::exchange_rates;

/// Exchange rate repository.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RateStore for ExchangeRateRepository {
    async fn latest_rate(
        &self,
        from: Currency,
        to: Currency,
    ) -> Result<Option<Decimal>, StoreError> {
        let row = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::FromCurrency.eq(from.as_str()))
            .filter(exchange_rates::Column::ToCurrency.eq(to.as_str()))
            .order_by_desc(exchange_rates::Column::UpdatedAt)
            .one(&self.db)
            .await
            .map_err(|e| StoreError(e.to_string()))?;

        Ok(row.map(|r| r.rate))
    }

    async fn record_rate(
        &self,
        from: Currency,
        to: Currency,
        rate: Decimal,
    ) -> Result<(), StoreError> {
        let row = exchange_rates::ActiveModel {
            id: Set(Uuid::new_v4()),
            from_currency: Set(from.as_str().to_string()),
            to_currency: Set(to.as_str().to_string()),
            rate: Set(rate),
            updated_at: Set(Utc::now().into()),
        };
        row.insert(&self.db)
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        Ok(())
    }
}
