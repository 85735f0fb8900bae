//! Core ledger logic for WireWon.
//!
//! This crate contains the money-movement rules with no web or database
//! dependencies. Storage and HTTP layers call into it; the only I/O
//! seam is the exchange-rate provider/store pair behind traits.
//!
//! # Modules
//!
//! - `money` - deterministic fee and conversion arithmetic
//! - `account` - the account aggregate and its mutation rules
//! - `ledger` - immutable ledger entry types
//! - `limits` - daily KRW-normalized spending ceilings
//! - `idempotency` - at-most-once replay semantics per client key
//! - `rates` - spot-rate resolution with a layered fallback chain

pub mod account;
pub mod idempotency;
pub mod ledger;
pub mod limits;
pub mod money;
pub mod rates;
