//! Exchange-rate resolution: provider clients, persistence seam, and
//! the fallback chain.

pub mod provider;
pub mod resolver;

pub use provider::{HttpRateProvider, ProviderError, RateProvider};
pub use resolver::{RATE_CACHE_TTL_SECS, RateResolver, RateStore, StoreError};
