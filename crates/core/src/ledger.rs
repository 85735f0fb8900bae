//! Immutable ledger entry types.
//!
//! One entry is appended per balance mutation, in the same storage
//! transaction as the mutation itself. Entries are never updated or
//! deleted; they are the audit trail and the input to the daily limit
//! sums.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use wirewon_shared::Currency;

use crate::account::Account;

/// The kind of balance-affecting event an entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    /// Funds added to an account.
    Deposit,
    /// Funds removed from an account.
    Withdraw,
    /// Credit leg of a transfer.
    TransferIn,
    /// Debit leg of a transfer.
    TransferOut,
}

impl EntryKind {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdraw => "WITHDRAW",
            Self::TransferIn => "TRANSFER_IN",
            Self::TransferOut => "TRANSFER_OUT",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAW" => Ok(Self::Withdraw),
            "TRANSFER_IN" => Ok(Self::TransferIn),
            "TRANSFER_OUT" => Ok(Self::TransferOut),
            _ => Err(format!("Unknown entry kind: {s}")),
        }
    }
}

/// A ledger entry about to be written.
///
/// `balance_after` snapshots the account balance as it stands once the
/// mutation has been applied, so the history reads without replaying.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    /// Account whose balance changed.
    pub account_id: Uuid,
    /// What happened.
    pub kind: EntryKind,
    /// Principal amount of the event, in `currency`.
    pub amount: Decimal,
    /// Fee charged alongside the event; zero for deposits and credits.
    pub fee: Decimal,
    /// Currency of the account at the time of the event.
    pub currency: Currency,
    /// Balance after the mutation was applied.
    pub balance_after: Decimal,
    /// The other account of a transfer pair, if any.
    pub related_account_id: Option<Uuid>,
}

impl NewEntry {
    /// Entry for a completed deposit.
    #[must_use]
    pub fn deposit(account: &Account, amount: Decimal) -> Self {
        Self {
            account_id: account.id,
            kind: EntryKind::Deposit,
            amount,
            fee: Decimal::ZERO,
            currency: account.currency,
            balance_after: account.balance,
            related_account_id: None,
        }
    }

    /// Entry for a completed withdrawal.
    #[must_use]
    pub fn withdraw(account: &Account, amount: Decimal) -> Self {
        Self {
            account_id: account.id,
            kind: EntryKind::Withdraw,
            amount,
            fee: Decimal::ZERO,
            currency: account.currency,
            balance_after: account.balance,
            related_account_id: None,
        }
    }

    /// Debit-leg entry of a transfer. `amount` is the principal and
    /// `fee` the transfer fee charged on top of it.
    #[must_use]
    pub fn transfer_out(account: &Account, amount: Decimal, fee: Decimal, to: Uuid) -> Self {
        Self {
            account_id: account.id,
            kind: EntryKind::TransferOut,
            amount,
            fee,
            currency: account.currency,
            balance_after: account.balance,
            related_account_id: Some(to),
        }
    }

    /// Credit-leg entry of a transfer. `amount` is what was actually
    /// credited after conversion and fees.
    #[must_use]
    pub fn transfer_in(account: &Account, amount: Decimal, from: Uuid) -> Self {
        Self {
            account_id: account.id,
            kind: EntryKind::TransferIn,
            amount,
            fee: Decimal::ZERO,
            currency: account.currency,
            balance_after: account.balance,
            related_account_id: Some(from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    fn account(balance: Decimal) -> Account {
        Account {
            id: Uuid::now_v7(),
            account_number: "301-111-222".to_string(),
            owner_name: "Kim Yuna".to_string(),
            currency: Currency::Krw,
            balance,
            version: 0,
            created_at: chrono::Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_entry_kind_round_trip() {
        for kind in [
            EntryKind::Deposit,
            EntryKind::Withdraw,
            EntryKind::TransferIn,
            EntryKind::TransferOut,
        ] {
            assert_eq!(EntryKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(EntryKind::from_str("REFUND").is_err());
    }

    #[test]
    fn test_entry_kind_serde_uses_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&EntryKind::TransferOut).unwrap(),
            "\"TRANSFER_OUT\""
        );
    }

    #[test]
    fn test_deposit_entry_snapshots_post_mutation_balance() {
        let mut acc = account(dec!(1000));
        acc.deposit(dec!(500));
        let entry = NewEntry::deposit(&acc, dec!(500));
        assert_eq!(entry.kind, EntryKind::Deposit);
        assert_eq!(entry.amount, dec!(500));
        assert_eq!(entry.fee, Decimal::ZERO);
        assert_eq!(entry.balance_after, dec!(1500));
        assert_eq!(entry.related_account_id, None);
    }

    #[test]
    fn test_transfer_entries_carry_related_account() {
        let mut from = account(dec!(200000));
        let to = account(dec!(0));
        from.withdraw(dec!(101000)).unwrap();
        let out = NewEntry::transfer_out(&from, dec!(100000), dec!(1000), to.id);
        assert_eq!(out.kind, EntryKind::TransferOut);
        assert_eq!(out.amount, dec!(100000));
        assert_eq!(out.fee, dec!(1000));
        assert_eq!(out.balance_after, dec!(99000));
        assert_eq!(out.related_account_id, Some(to.id));

        let entry = NewEntry::transfer_in(&to, dec!(100000), from.id);
        assert_eq!(entry.kind, EntryKind::TransferIn);
        assert_eq!(entry.fee, Decimal::ZERO);
        assert_eq!(entry.related_account_id, Some(from.id));
    }
}
