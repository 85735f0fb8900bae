//! Account aggregate and the business rules guarding its mutations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use wirewon_shared::{AppError, Currency};

/// Business rule violations raised by account operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    /// Amount is missing, zero, or negative.
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// Source and destination are the same account.
    #[error("Cannot transfer to the same account")]
    SameAccount,

    /// Same-currency endpoint called with mismatched currencies.
    #[error("Currency mismatch ({from} -> {to}): use the cross-currency transfer endpoint")]
    CurrencyMismatch {
        /// Source account currency.
        from: Currency,
        /// Destination account currency.
        to: Currency,
    },

    /// Balance is lower than the amount to be debited.
    #[error("Balance {balance} is less than requested {requested}")]
    InsufficientBalance {
        /// Current balance.
        balance: Decimal,
        /// Amount that was requested.
        requested: Decimal,
    },
}

impl From<AccountError> for AppError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::InvalidAmount | AccountError::SameAccount => {
                Self::InvalidAmount(err.to_string())
            }
            AccountError::CurrencyMismatch { .. } => Self::InvalidAmount(err.to_string()),
            AccountError::InsufficientBalance { .. } => Self::InsufficientBalance(err.to_string()),
        }
    }
}

/// A customer account holding a balance in one currency.
///
/// Instances are snapshots loaded from storage. Balance mutations go
/// through [`Account::deposit`] and [`Account::withdraw`] on a row that
/// was fetched under an exclusive lock; the repository writes the
/// mutated balance back together with a version bump.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Surrogate id.
    pub id: Uuid,
    /// Unique, immutable account number.
    pub account_number: String,
    /// Account holder's name.
    pub owner_name: String,
    /// Currency of the balance; immutable after creation.
    pub currency: Currency,
    /// Current balance, never negative.
    pub balance: Decimal,
    /// Optimistic version counter, bumped on every balance write.
    pub version: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Soft-delete timestamp; a deleted account is invisible to lookups.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Adds `amount` to the balance.
    ///
    /// The amount is validated positive by the caller before any lock is
    /// taken, so the addition itself is unconditional.
    pub fn deposit(&mut self, amount: Decimal) {
        self.balance += amount;
    }

    /// Subtracts `amount` from the balance.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InsufficientBalance`] when the balance is
    /// lower than `amount`; the balance is left untouched.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), AccountError> {
        if self.balance < amount {
            return Err(AccountError::InsufficientBalance {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        Ok(())
    }

    /// True once the account has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Soft-deletes the account.
    ///
    /// The account number is rewritten with a `deleted-` prefix so the
    /// unique constraint frees the original number for reuse.
    pub fn mark_deleted(&mut self, now: DateTime<Utc>) {
        self.account_number = deleted_account_number(self.id, &self.account_number);
        self.deleted_at = Some(now);
    }
}

/// The rewritten account number of a soft-deleted account.
#[must_use]
pub fn deleted_account_number(id: Uuid, number: &str) -> String {
    format!("deleted-{id}-{number}")
}

/// Validates that a request amount is present and strictly positive.
///
/// # Errors
///
/// Returns [`AccountError::InvalidAmount`] for `None`, zero, or
/// negative amounts.
pub fn validate_amount(amount: Option<Decimal>) -> Result<Decimal, AccountError> {
    match amount {
        Some(a) if a > Decimal::ZERO => Ok(a),
        _ => Err(AccountError::InvalidAmount),
    }
}

/// Validates that a transfer names two distinct accounts.
///
/// # Errors
///
/// Returns [`AccountError::SameAccount`] when both ids are equal.
pub const fn validate_distinct_accounts(from: Uuid, to: Uuid) -> Result<(), AccountError> {
    if from.as_u128() == to.as_u128() {
        return Err(AccountError::SameAccount);
    }
    Ok(())
}

/// Validates that both legs of a same-currency transfer match.
///
/// # Errors
///
/// Returns [`AccountError::CurrencyMismatch`] when the currencies
/// differ; cross-currency movement belongs to the global transfer flow.
pub fn validate_same_currency(from: &Account, to: &Account) -> Result<(), AccountError> {
    if from.currency != to.currency {
        return Err(AccountError::CurrencyMismatch {
            from: from.currency,
            to: to.currency,
        });
    }
    Ok(())
}

/// Returns the two ids in canonical lock-acquisition order.
///
/// Locks on account pairs are always taken in ascending id order, no
/// matter which side is the sender. Two transfers crossing the same
/// pair in opposite directions therefore serialize instead of
/// deadlocking.
#[must_use]
pub fn lock_order(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account(balance: Decimal, currency: Currency) -> Account {
        Account {
            id: Uuid::now_v7(),
            account_number: "110-2345-6789".to_string(),
            owner_name: "Hong Gildong".to_string(),
            currency,
            balance,
            version: 0,
            created_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_deposit_adds() {
        let mut acc = account(dec!(1000), Currency::Krw);
        acc.deposit(dec!(500));
        assert_eq!(acc.balance, dec!(1500));
    }

    #[test]
    fn test_withdraw_subtracts() {
        let mut acc = account(dec!(1000), Currency::Krw);
        acc.withdraw(dec!(400)).unwrap();
        assert_eq!(acc.balance, dec!(600));
    }

    #[test]
    fn test_withdraw_rejects_overdraft() {
        let mut acc = account(dec!(100), Currency::Usd);
        let err = acc.withdraw(dec!(100.01)).unwrap_err();
        assert_eq!(
            err,
            AccountError::InsufficientBalance {
                balance: dec!(100),
                requested: dec!(100.01),
            }
        );
        assert_eq!(acc.balance, dec!(100));
    }

    #[test]
    fn test_withdraw_exact_balance_allowed() {
        let mut acc = account(dec!(100), Currency::Usd);
        acc.withdraw(dec!(100)).unwrap();
        assert_eq!(acc.balance, Decimal::ZERO);
    }

    #[test]
    fn test_mark_deleted_rewrites_number() {
        let mut acc = account(dec!(0), Currency::Krw);
        let id = acc.id;
        let now = acc.created_at;
        acc.mark_deleted(now);
        assert!(acc.is_deleted());
        assert_eq!(acc.account_number, format!("deleted-{id}-110-2345-6789"));
        assert_eq!(acc.deleted_at, Some(now));
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(Some(dec!(0.01))).unwrap(), dec!(0.01));
        assert_eq!(
            validate_amount(Some(Decimal::ZERO)),
            Err(AccountError::InvalidAmount)
        );
        assert_eq!(
            validate_amount(Some(dec!(-5))),
            Err(AccountError::InvalidAmount)
        );
        assert_eq!(validate_amount(None), Err(AccountError::InvalidAmount));
    }

    #[test]
    fn test_validate_distinct_accounts() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert!(validate_distinct_accounts(a, b).is_ok());
        assert_eq!(
            validate_distinct_accounts(a, a),
            Err(AccountError::SameAccount)
        );
    }

    #[test]
    fn test_validate_same_currency() {
        let krw = account(dec!(0), Currency::Krw);
        let usd = account(dec!(0), Currency::Usd);
        let krw2 = account(dec!(0), Currency::Krw);
        assert!(validate_same_currency(&krw, &krw2).is_ok());
        assert_eq!(
            validate_same_currency(&krw, &usd),
            Err(AccountError::CurrencyMismatch {
                from: Currency::Krw,
                to: Currency::Usd,
            })
        );
    }

    #[test]
    fn test_lock_order_is_direction_independent() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert_eq!(lock_order(a, b), lock_order(b, a));
        let (first, second) = lock_order(a, b);
        assert!(first <= second);
    }

    #[test]
    fn test_error_mapping() {
        let app: AppError = AccountError::InvalidAmount.into();
        assert_eq!(app.error_code(), "INVALID_AMOUNT");
        assert_eq!(app.status_code(), 400);

        let app: AppError = AccountError::InsufficientBalance {
            balance: dec!(1),
            requested: dec!(2),
        }
        .into();
        assert_eq!(app.error_code(), "INSUFFICIENT_BALANCE");
        assert_eq!(app.status_code(), 409);

        let app: AppError = AccountError::CurrencyMismatch {
            from: Currency::Krw,
            to: Currency::Usd,
        }
        .into();
        assert_eq!(app.error_code(), "INVALID_AMOUNT");
    }
}
