//! Idempotency-key replay semantics.
//!
//! A keyed command executes its monetary effect at most once within the
//! record TTL. The decision logic here is pure; reading and persisting
//! records is the storage layer's job, and the persist step runs after
//! the business transaction committed.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use thiserror::Error;

use wirewon_shared::AppError;

/// How long a replay record stays authoritative.
pub const IDEMPOTENCY_TTL_MINUTES: i64 = 10;

/// Violations of the idempotency contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdempotencyError {
    /// The endpoint requires a key and none was sent.
    #[error("Idempotency-Key header is required")]
    MissingKey,

    /// The key was already used with a different request body.
    #[error("Idempotency key {key} was already used with a different request body")]
    PayloadMismatch {
        /// The offending key.
        key: String,
    },
}

impl From<IdempotencyError> for AppError {
    fn from(err: IdempotencyError) -> Self {
        match err {
            IdempotencyError::MissingKey => Self::MissingIdempotencyKey,
            IdempotencyError::PayloadMismatch { .. } => {
                Self::DuplicateIdempotencyKey(err.to_string())
            }
        }
    }
}

/// What the guard needs from a stored, non-expired replay record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    /// SHA-256 hex hash of the original request body, if recorded.
    pub request_body_hash: Option<String>,
    /// The serialized response body returned the first time.
    pub response_body: String,
    /// The HTTP status returned the first time.
    pub response_status: u16,
}

/// Outcome of the replay check for a supplied key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// No usable record: execute the command and record the outcome.
    Execute,
    /// A matching record exists: return it verbatim, do not execute.
    Replay {
        /// Status of the recorded response.
        status: u16,
        /// Body of the recorded response.
        body: String,
    },
}

/// Normalizes the supplied header value.
///
/// Blank keys count as missing, matching how clients that send an empty
/// header behave.
///
/// # Errors
///
/// Returns [`IdempotencyError::MissingKey`] when the endpoint requires
/// a key and none (or a blank one) was sent.
pub fn require_key(required: bool, key: Option<&str>) -> Result<Option<&str>, IdempotencyError> {
    let key = key.map(str::trim).filter(|k| !k.is_empty());
    match (key, required) {
        (Some(k), _) => Ok(Some(k)),
        (None, false) => Ok(None),
        (None, true) => Err(IdempotencyError::MissingKey),
    }
}

/// SHA-256 of a request body, as lowercase hex.
#[must_use]
pub fn hash_body(body: &[u8]) -> String {
    use std::fmt::Write;

    let digest = Sha256::digest(body);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        // writing to a String cannot fail
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Decides whether to execute or replay for a supplied key.
///
/// A stored record replays unless its recorded hash is present and
/// differs from the current body's hash; hash disagreement means the
/// key was reused for a different request, which is a conflict.
///
/// # Errors
///
/// Returns [`IdempotencyError::PayloadMismatch`] on hash disagreement.
pub fn decide(
    key: &str,
    stored: Option<StoredResponse>,
    body_hash: &str,
) -> Result<Decision, IdempotencyError> {
    match stored {
        None => Ok(Decision::Execute),
        Some(record) => {
            if let Some(stored_hash) = &record.request_body_hash
                && stored_hash != body_hash
            {
                return Err(IdempotencyError::PayloadMismatch {
                    key: key.to_string(),
                });
            }
            Ok(Decision::Replay {
                status: record.response_status,
                body: record.response_body,
            })
        }
    }
}

/// Expiry timestamp for a record created at `now`.
#[must_use]
pub fn expires_at(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::minutes(IDEMPOTENCY_TTL_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"from_account_id":"a","to_account_id":"b","amount":"100"}"#;

    fn record(hash: Option<&str>) -> StoredResponse {
        StoredResponse {
            request_body_hash: hash.map(String::from),
            response_body: r#"{"from_balance":"99000"}"#.to_string(),
            response_status: 200,
        }
    }

    #[test]
    fn test_hash_is_lowercase_hex_sha256() {
        let hash = hash_body(b"hello");
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_hash_differs_per_body() {
        assert_ne!(hash_body(BODY), hash_body(b"other"));
        assert_eq!(hash_body(BODY), hash_body(BODY));
    }

    #[test]
    fn test_require_key_passthrough() {
        assert_eq!(require_key(false, Some("abc")).unwrap(), Some("abc"));
        assert_eq!(require_key(true, Some("abc")).unwrap(), Some("abc"));
        assert_eq!(require_key(false, None).unwrap(), None);
    }

    #[test]
    fn test_require_key_blank_counts_as_missing() {
        assert_eq!(require_key(false, Some("   ")).unwrap(), None);
        assert_eq!(
            require_key(true, Some("  ")),
            Err(IdempotencyError::MissingKey)
        );
        assert_eq!(require_key(true, None), Err(IdempotencyError::MissingKey));
    }

    #[test]
    fn test_no_record_executes() {
        let decision = decide("key-1", None, &hash_body(BODY)).unwrap();
        assert_eq!(decision, Decision::Execute);
    }

    #[test]
    fn test_matching_hash_replays_without_executing() {
        let hash = hash_body(BODY);
        let decision = decide("key-1", Some(record(Some(&hash))), &hash).unwrap();
        assert_eq!(
            decision,
            Decision::Replay {
                status: 200,
                body: r#"{"from_balance":"99000"}"#.to_string(),
            }
        );
    }

    #[test]
    fn test_missing_stored_hash_still_replays() {
        let decision = decide("key-1", Some(record(None)), &hash_body(BODY)).unwrap();
        assert!(matches!(decision, Decision::Replay { .. }));
    }

    #[test]
    fn test_hash_mismatch_is_conflict() {
        let stored = record(Some(&hash_body(b"different body")));
        let err = decide("key-1", Some(stored), &hash_body(BODY)).unwrap_err();
        assert_eq!(
            err,
            IdempotencyError::PayloadMismatch {
                key: "key-1".to_string(),
            }
        );
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 409);
        assert_eq!(app.error_code(), "DUPLICATE_IDEMPOTENCY_KEY");
    }

    #[test]
    fn test_missing_key_maps_to_400() {
        let app: AppError = IdempotencyError::MissingKey.into();
        assert_eq!(app.status_code(), 400);
        assert_eq!(app.error_code(), "MISSING_IDEMPOTENCY_KEY");
    }

    #[test]
    fn test_expiry_is_ten_minutes_out() {
        let now = Utc::now();
        let expiry = expires_at(now);
        assert_eq!(expiry - now, Duration::minutes(10));
    }
}
