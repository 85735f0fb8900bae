//! External rate provider clients.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use wirewon_shared::Currency;

/// Failures of a single provider call.
///
/// These never leave the resolver; they only advance the fallback chain.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport or HTTP-status failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered but did not quote the target currency.
    #[error("rate for {0} missing from provider response")]
    MissingRate(Currency),
}

/// A single external source of spot rates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Fetches the spot rate from `from` to `to`.
    async fn fetch_rate(&self, from: Currency, to: Currency) -> Result<Decimal, ProviderError>;
}

/// Response payload shared by both public providers:
/// `{ "base": "KRW", "rates": { "USD": 0.00075, ... } }`.
#[derive(Debug, Deserialize)]
struct RatesPayload {
    rates: HashMap<String, Decimal>,
}

/// Provider speaking the `GET {base_url}/{from}` convention.
pub struct HttpRateProvider {
    name: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpRateProvider {
    /// Creates a provider client.
    ///
    /// The `client` carries the per-call timeout; both providers can
    /// share one.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            client,
        }
    }
}

fn endpoint_url(base_url: &str, from: Currency) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), from)
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rate(&self, from: Currency, to: Currency) -> Result<Decimal, ProviderError> {
        let url = endpoint_url(&self.base_url, from);
        let payload: RatesPayload = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        payload
            .rates
            .get(to.as_str())
            .copied()
            .ok_or(ProviderError::MissingRate(to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_endpoint_url_appends_base_currency() {
        assert_eq!(
            endpoint_url("https://api.exchangerate-api.com/v4/latest", Currency::Krw),
            "https://api.exchangerate-api.com/v4/latest/KRW"
        );
        assert_eq!(
            endpoint_url("https://open.er-api.com/v6/latest/", Currency::Usd),
            "https://open.er-api.com/v6/latest/USD"
        );
    }

    #[test]
    fn test_payload_decodes_numeric_rates() {
        let raw = r#"{"base":"KRW","rates":{"USD":0.00075,"JPY":0.11,"EUR":0.00065}}"#;
        let payload: RatesPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(
            payload.rates.get(Currency::Usd.as_str()).copied(),
            Some(dec!(0.00075))
        );
        assert_eq!(payload.rates.get("GBP"), None);
    }
}
