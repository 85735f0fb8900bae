//! Deterministic money arithmetic.
//!
//! CRITICAL: The rounding policy is asymmetric and must not be "fixed":
//! - Addition/subtraction round half-up to the currency scale
//! - Fee multiplication rounds up, so fees never round in the payer's favor
//! - Conversion rounds half-up to the destination currency scale

use rust_decimal::{Decimal, RoundingStrategy};
use wirewon_shared::Currency;

/// Fee rate applied to the principal of every transfer (1%).
pub const TRANSFER_FEE_RATE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Fee rate applied to the converted amount of a cross-currency
/// transfer (0.5%).
pub const EXCHANGE_FEE_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 3);

/// Rounds an amount half-up to the currency's scale.
#[must_use]
pub fn scale(amount: Decimal, currency: Currency) -> Decimal {
    amount.round_dp_with_strategy(currency.scale(), RoundingStrategy::MidpointAwayFromZero)
}

/// Adds two amounts of the same currency, rounding half-up to scale.
#[must_use]
pub fn add(a: Decimal, b: Decimal, currency: Currency) -> Decimal {
    scale(a + b, currency)
}

/// Subtracts `b` from `a`, rounding half-up to scale.
#[must_use]
pub fn subtract(a: Decimal, b: Decimal, currency: Currency) -> Decimal {
    scale(a - b, currency)
}

/// Applies a percentage rate to a principal, rounding up to scale.
///
/// Used for fees only: rounding up means the computed fee is never
/// smaller than the exact product.
#[must_use]
pub fn fee_amount(principal: Decimal, rate: Decimal, currency: Currency) -> Decimal {
    (principal * rate).round_dp_with_strategy(currency.scale(), RoundingStrategy::AwayFromZero)
}

/// Converts an amount at the given spot rate, rounding half-up to the
/// destination currency's scale.
#[must_use]
pub fn convert(amount: Decimal, rate: Decimal, to: Currency) -> Decimal {
    scale(amount * rate, to)
}

/// The 1% transfer fee on a principal, in the source currency.
#[must_use]
pub fn transfer_fee(principal: Decimal, currency: Currency) -> Decimal {
    fee_amount(principal, TRANSFER_FEE_RATE, currency)
}

/// The 0.5% exchange fee on a converted amount, in the destination
/// currency. Zero when no conversion happened.
#[must_use]
pub fn exchange_fee(converted: Decimal, from: Currency, to: Currency) -> Decimal {
    if from == to {
        Decimal::ZERO
    } else {
        fee_amount(converted, EXCHANGE_FEE_RATE, to)
    }
}

/// Full arithmetic breakdown of a transfer at a known spot rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferQuote {
    /// Spot rate used for the conversion.
    pub exchange_rate: Decimal,
    /// Principal converted to the destination currency, scaled.
    pub converted: Decimal,
    /// Exchange fee in the destination currency (zero if same currency).
    pub exchange_fee: Decimal,
    /// Amount credited to the destination account.
    pub credited: Decimal,
    /// Transfer fee in the source currency.
    pub transfer_fee: Decimal,
    /// Total amount debited from the source account.
    pub total_debit: Decimal,
}

/// Prices a transfer of `principal` from `from` to `to` at `rate`.
///
/// The order of operations mirrors the settlement sequence: convert,
/// charge the exchange fee on the converted amount, then charge the
/// transfer fee on the source principal.
#[must_use]
pub fn quote_transfer(
    principal: Decimal,
    rate: Decimal,
    from: Currency,
    to: Currency,
) -> TransferQuote {
    let converted = convert(principal, rate, to);
    let exchange_fee = exchange_fee(converted, from, to);
    let credited = subtract(converted, exchange_fee, to);
    let transfer_fee = transfer_fee(principal, from);
    let total_debit = add(principal, transfer_fee, from);
    TransferQuote {
        exchange_rate: rate,
        converted,
        exchange_fee,
        credited,
        transfer_fee,
        total_debit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fee_rate_constants() {
        assert_eq!(TRANSFER_FEE_RATE, dec!(0.01));
        assert_eq!(EXCHANGE_FEE_RATE, dec!(0.005));
    }

    #[test]
    fn test_scale_krw_drops_decimals_half_up() {
        assert_eq!(scale(dec!(1000.4), Currency::Krw), dec!(1000));
        assert_eq!(scale(dec!(1000.5), Currency::Krw), dec!(1001));
        assert_eq!(scale(dec!(1000), Currency::Krw), dec!(1000));
    }

    #[test]
    fn test_scale_usd_two_places_half_up() {
        assert_eq!(scale(dec!(10.004), Currency::Usd), dec!(10.00));
        assert_eq!(scale(dec!(10.005), Currency::Usd), dec!(10.01));
        assert_eq!(scale(dec!(10.1), Currency::Usd), dec!(10.10));
    }

    #[test]
    fn test_fee_rounds_up_never_down() {
        // 0.5% of 75.00 USD = 0.375, rounds UP to 0.38
        assert_eq!(
            fee_amount(dec!(75.00), EXCHANGE_FEE_RATE, Currency::Usd),
            dec!(0.38)
        );
        // 1% of 100.001 USD = 1.00001, rounds UP to 1.01
        assert_eq!(
            fee_amount(dec!(100.001), TRANSFER_FEE_RATE, Currency::Usd),
            dec!(1.01)
        );
        // Exact products stay exact
        assert_eq!(
            fee_amount(dec!(100000), TRANSFER_FEE_RATE, Currency::Krw),
            dec!(1000)
        );
    }

    #[test]
    fn test_transfer_fee_one_percent() {
        assert_eq!(transfer_fee(dec!(100000), Currency::Krw), dec!(1000));
        assert_eq!(transfer_fee(dec!(50.00), Currency::Usd), dec!(0.50));
        // 1% of 99.99 = 0.9999 -> 1.00
        assert_eq!(transfer_fee(dec!(99.99), Currency::Usd), dec!(1.00));
    }

    #[test]
    fn test_exchange_fee_zero_for_same_currency() {
        assert_eq!(
            exchange_fee(dec!(100), Currency::Krw, Currency::Krw),
            Decimal::ZERO
        );
        assert_eq!(
            exchange_fee(dec!(75.00), Currency::Krw, Currency::Usd),
            dec!(0.38)
        );
    }

    #[test]
    fn test_convert_scales_to_destination() {
        // 100,000 KRW at 0.00075 -> 75.00 USD
        assert_eq!(
            convert(dec!(100000), dec!(0.00075), Currency::Usd),
            dec!(75.00)
        );
        // 10 USD at 1305.5 -> 13055 KRW
        assert_eq!(convert(dec!(10), dec!(1305.5), Currency::Krw), dec!(13055));
        // Half-up at the destination scale
        assert_eq!(
            convert(dec!(1), dec!(1305.505), Currency::Usd),
            dec!(1305.51)
        );
    }

    #[test]
    fn test_quote_krw_to_usd_reference_case() {
        let quote = quote_transfer(dec!(100000), dec!(0.00075), Currency::Krw, Currency::Usd);
        assert_eq!(quote.converted, dec!(75.00));
        assert_eq!(quote.exchange_fee, dec!(0.38));
        assert_eq!(quote.credited, dec!(74.62));
        assert_eq!(quote.transfer_fee, dec!(1000));
        assert_eq!(quote.total_debit, dec!(101000));
        assert_eq!(quote.exchange_rate, dec!(0.00075));
    }

    #[test]
    fn test_quote_same_currency_charges_no_exchange_fee() {
        let quote = quote_transfer(dec!(100000), Decimal::ONE, Currency::Krw, Currency::Krw);
        assert_eq!(quote.converted, dec!(100000));
        assert_eq!(quote.exchange_fee, Decimal::ZERO);
        assert_eq!(quote.credited, dec!(100000));
        assert_eq!(quote.transfer_fee, dec!(1000));
        assert_eq!(quote.total_debit, dec!(101000));
    }

    #[test]
    fn test_add_subtract_round_half_up() {
        assert_eq!(add(dec!(0.005), dec!(0.001), Currency::Usd), dec!(0.01));
        assert_eq!(subtract(dec!(10.00), dec!(0.005), Currency::Usd), dec!(10.00));
        assert_eq!(add(dec!(100.5), dec!(0), Currency::Krw), dec!(101));
    }

    proptest! {
        /// The rounded fee is never below the exact product.
        #[test]
        fn prop_fee_never_rounds_down(cents in 1u64..100_000_000u64) {
            let principal = Decimal::new(i64::try_from(cents).unwrap(), 2);
            let fee = fee_amount(principal, TRANSFER_FEE_RATE, Currency::Usd);
            prop_assert!(fee >= principal * TRANSFER_FEE_RATE);
        }

        /// Debiting principal + fee always costs at least the principal.
        #[test]
        fn prop_total_debit_covers_principal(won in 1u64..1_000_000_000u64) {
            let principal = Decimal::from(won);
            let quote = quote_transfer(principal, Decimal::ONE, Currency::Krw, Currency::Krw);
            prop_assert!(quote.total_debit >= principal);
            prop_assert_eq!(quote.total_debit, principal + quote.transfer_fee);
        }

        /// Scaled amounts carry at most the currency's decimal places.
        #[test]
        fn prop_scale_respects_currency(raw in -1_000_000_000i64..1_000_000_000i64, scale_in in 0u32..6u32) {
            let amount = Decimal::new(raw, scale_in);
            prop_assert_eq!(scale(amount, Currency::Krw).scale(), 0);
            prop_assert!(scale(amount, Currency::Usd).scale() <= 2);
        }
    }
}
