//! Spot-rate resolution with a layered fallback chain.
//!
//! Lookup order, first hit wins:
//! 1. short-TTL in-memory cache (single-flight per pair)
//! 2. most recently persisted rate
//! 3. each provider in configured order, persisting on success
//! 4. persisted rate again (may have appeared concurrently)
//! 5. constant 1 - resolution never fails outward

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::warn;

use wirewon_shared::Currency;

use super::provider::RateProvider;

/// Default TTL for cached rates (10 minutes).
pub const RATE_CACHE_TTL_SECS: u64 = 600;

/// Cache capacity; there are only a handful of currency pairs.
const RATE_CACHE_CAPACITY: u64 = 64;

/// Storage-layer failure while reading or writing rates.
///
/// The resolver treats these as "no rate available" and keeps going.
#[derive(Debug, Error)]
#[error("rate store error: {0}")]
pub struct StoreError(pub String);

/// Persistent store of fetched rates.
///
/// Multiple rows may exist per pair; the most recently updated one is
/// authoritative.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Most recently updated rate for the pair, if any.
    async fn latest_rate(&self, from: Currency, to: Currency)
    -> Result<Option<Decimal>, StoreError>;

    /// Records a freshly fetched rate as a new row.
    async fn record_rate(
        &self,
        from: Currency,
        to: Currency,
        rate: Decimal,
    ) -> Result<(), StoreError>;
}

/// Resolves spot rates between supported currencies.
#[derive(Clone)]
pub struct RateResolver {
    cache: Cache<(Currency, Currency), Decimal>,
    store: Arc<dyn RateStore>,
    providers: Vec<Arc<dyn RateProvider>>,
}

impl RateResolver {
    /// Creates a resolver with the default 10-minute cache TTL.
    #[must_use]
    pub fn new(store: Arc<dyn RateStore>, providers: Vec<Arc<dyn RateProvider>>) -> Self {
        Self::with_cache_ttl(store, providers, Duration::from_secs(RATE_CACHE_TTL_SECS))
    }

    /// Creates a resolver with a custom cache TTL.
    #[must_use]
    pub fn with_cache_ttl(
        store: Arc<dyn RateStore>,
        providers: Vec<Arc<dyn RateProvider>>,
        ttl: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(RATE_CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self {
            cache,
            store,
            providers,
        }
    }

    /// Resolves the spot rate from `from` to `to`.
    ///
    /// Identical currencies resolve to 1 without touching the chain.
    /// Concurrent misses for the same pair coalesce into a single
    /// chain walk; the rest await the shared result.
    pub async fn get_rate(&self, from: Currency, to: Currency) -> Decimal {
        if from == to {
            return Decimal::ONE;
        }
        self.cache
            .get_with((from, to), self.resolve_uncached(from, to))
            .await
    }

    /// Converts `amount` at the resolved spot rate, unscaled.
    ///
    /// Rounding to the destination scale is the caller's concern.
    pub async fn convert_amount(&self, amount: Decimal, from: Currency, to: Currency) -> Decimal {
        amount * self.get_rate(from, to).await
    }

    async fn resolve_uncached(&self, from: Currency, to: Currency) -> Decimal {
        match self.store.latest_rate(from, to).await {
            Ok(Some(rate)) => return rate,
            Ok(None) => {}
            Err(e) => warn!(error = %e, %from, %to, "rate store lookup failed"),
        }

        for provider in &self.providers {
            match provider.fetch_rate(from, to).await {
                Ok(rate) => {
                    if let Err(e) = self.store.record_rate(from, to, rate).await {
                        warn!(error = %e, provider = provider.name(), "failed to persist fetched rate");
                    }
                    return rate;
                }
                Err(e) => {
                    warn!(error = %e, provider = provider.name(), %from, %to, "rate fetch failed");
                }
            }
        }

        // A rate persisted by a concurrent request beats the constant.
        match self.store.latest_rate(from, to).await {
            Ok(Some(rate)) => rate,
            Ok(None) | Err(_) => {
                warn!(%from, %to, "no rate available anywhere, falling back to 1");
                Decimal::ONE
            }
        }
    }
}
