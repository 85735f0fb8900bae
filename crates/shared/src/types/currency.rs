//! Supported currencies and their decimal scales.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`, rounded to the scale
//! defined here.

use serde::{Deserialize, Serialize};

/// ISO 4217 currency codes supported by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// South Korean Won
    Krw,
    /// US Dollar
    Usd,
    /// Japanese Yen
    Jpy,
    /// Euro
    Eur,
}

impl Currency {
    /// Number of decimal places amounts in this currency carry.
    ///
    /// KRW has no minor unit; everything else uses two places.
    #[must_use]
    pub const fn scale(self) -> u32 {
        match self {
            Self::Krw => 0,
            Self::Usd | Self::Jpy | Self::Eur => 2,
        }
    }

    /// The uppercase ISO code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Krw => "KRW",
            Self::Usd => "USD",
            Self::Jpy => "JPY",
            Self::Eur => "EUR",
        }
    }

    /// All supported currencies.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Krw, Self::Usd, Self::Jpy, Self::Eur]
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "KRW" => Ok(Self::Krw),
            "USD" => Ok(Self::Usd),
            "JPY" => Ok(Self::Jpy),
            "EUR" => Ok(Self::Eur),
            _ => Err(format!("Unknown currency: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(Currency::Krw, 0)]
    #[case(Currency::Usd, 2)]
    #[case(Currency::Jpy, 2)]
    #[case(Currency::Eur, 2)]
    fn test_currency_scale(#[case] currency: Currency, #[case] expected: u32) {
        assert_eq!(currency.scale(), expected);
    }

    #[test]
    fn test_currency_display() {
        assert_eq!(Currency::Krw.to_string(), "KRW");
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(Currency::Jpy.to_string(), "JPY");
        assert_eq!(Currency::Eur.to_string(), "EUR");
    }

    #[rstest]
    #[case("KRW", Currency::Krw)]
    #[case("krw", Currency::Krw)]
    #[case("USD", Currency::Usd)]
    #[case("usd", Currency::Usd)]
    #[case("JPY", Currency::Jpy)]
    #[case("EUR", Currency::Eur)]
    fn test_currency_from_str(#[case] input: &str, #[case] expected: Currency) {
        assert_eq!(Currency::from_str(input).unwrap(), expected);
    }

    #[test]
    fn test_currency_from_str_rejects_unknown() {
        assert!(Currency::from_str("XXX").is_err());
        assert!(Currency::from_str("").is_err());
        assert!(Currency::from_str("WON").is_err());
    }

    #[test]
    fn test_currency_serde_uppercase() {
        let json = serde_json::to_string(&Currency::Krw).unwrap();
        assert_eq!(json, "\"KRW\"");
        let back: Currency = serde_json::from_str("\"USD\"").unwrap();
        assert_eq!(back, Currency::Usd);
    }
}
