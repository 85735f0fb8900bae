//! Daily spending ceilings, KRW-normalized.
//!
//! Ceilings are fixed amounts of Korean won. A non-KRW account's daily
//! total is converted to KRW before the comparison. The window starts
//! at local midnight in Seoul regardless of where the server runs.

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Asia::Seoul;
use rust_decimal::Decimal;
use thiserror::Error;

use wirewon_shared::{AppError, Currency};

use crate::ledger::EntryKind;

/// Daily withdrawal ceiling: 1,000,000 KRW.
pub const DAILY_WITHDRAW_LIMIT_KRW: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Daily transfer ceiling (same- and cross-currency): 3,000,000 KRW.
pub const DAILY_TRANSFER_LIMIT_KRW: Decimal = Decimal::from_parts(3_000_000, 0, 0, false, 0);

/// Which daily ceiling applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    /// Withdrawals, including the debit leg's total of a global transfer.
    Withdraw,
    /// Outbound transfers.
    Transfer,
}

impl LimitKind {
    /// The ceiling in KRW.
    #[must_use]
    pub const fn ceiling_krw(self) -> Decimal {
        match self {
            Self::Withdraw => DAILY_WITHDRAW_LIMIT_KRW,
            Self::Transfer => DAILY_TRANSFER_LIMIT_KRW,
        }
    }

    /// The ledger entry kind whose same-day rows are summed.
    #[must_use]
    pub const fn entry_kind(self) -> EntryKind {
        match self {
            Self::Withdraw => EntryKind::Withdraw,
            Self::Transfer => EntryKind::TransferOut,
        }
    }
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Withdraw => write!(f, "withdrawal"),
            Self::Transfer => write!(f, "transfer"),
        }
    }
}

/// A daily ceiling was exceeded.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Daily {kind} limit exceeded: {total_krw} KRW exceeds the {ceiling_krw} KRW ceiling")]
pub struct LimitExceeded {
    /// Which ceiling was hit.
    pub kind: LimitKind,
    /// The KRW-normalized total including the in-flight amount.
    pub total_krw: Decimal,
    /// The ceiling that was exceeded.
    pub ceiling_krw: Decimal,
}

impl From<LimitExceeded> for AppError {
    fn from(err: LimitExceeded) -> Self {
        Self::LimitExceeded(err.to_string())
    }
}

/// Start of the current limit window: the most recent Seoul midnight.
///
/// The Seoul wall-clock midnight is translated back to UTC before it
/// is compared against `created_at` timestamps.
#[must_use]
pub fn window_start_utc(now: DateTime<Utc>) -> DateTime<Utc> {
    let seoul_date = now.with_timezone(&Seoul).date_naive();
    let midnight = seoul_date.and_time(NaiveTime::MIN);
    match Seoul.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
            dt.with_timezone(&Utc)
        }
        // KST has no DST gaps; midnight always exists
        chrono::LocalResult::None => midnight.and_utc(),
    }
}

/// Applies a KRW-normalized ceiling check.
///
/// `window_total` is the sum of same-kind ledger entries since
/// [`window_start_utc`] and `in_flight` the amount of the current
/// request, both in the account's `currency`. `to_krw` converts the
/// combined total to KRW and is only invoked for non-KRW accounts.
///
/// The comparison is strict: a total exactly on the ceiling passes.
///
/// # Errors
///
/// Returns [`LimitExceeded`] when the normalized total is above the
/// ceiling.
pub fn check_ceiling<F>(
    kind: LimitKind,
    window_total: Decimal,
    in_flight: Decimal,
    currency: Currency,
    to_krw: F,
) -> Result<(), LimitExceeded>
where
    F: FnOnce(Decimal) -> Decimal,
{
    let total = window_total + in_flight;
    let total_krw = if currency == Currency::Krw {
        total
    } else {
        to_krw(total)
    };
    if total_krw > kind.ceiling_krw() {
        return Err(LimitExceeded {
            kind,
            total_krw,
            ceiling_krw: kind.ceiling_krw(),
        });
    }
    Ok(())
}
