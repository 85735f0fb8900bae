//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Every business-rule violation the ledger can raise maps to exactly one
/// variant here, and every variant maps to one HTTP status and one wire
/// error code.
#[derive(Debug, Error)]
pub enum AppError {
    /// Account does not exist or is soft-deleted.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account number already taken.
    #[error("Account already exists: {0}")]
    DuplicateAccount(String),

    /// Amount is missing, zero, or negative, or the operation is
    /// malformed (same-account transfer, cross-currency on the
    /// same-currency endpoint).
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Unknown or unsupported currency code.
    #[error("Invalid currency: {0}")]
    InvalidCurrency(String),

    /// Balance is lower than the amount to be debited.
    #[error("Insufficient balance: {0}")]
    InsufficientBalance(String),

    /// A daily KRW-normalized spending ceiling would be exceeded.
    #[error("Daily limit exceeded: {0}")]
    LimitExceeded(String),

    /// The endpoint requires an Idempotency-Key header and none was sent.
    #[error("Idempotency-Key header is required")]
    MissingIdempotencyKey,

    /// Idempotency key reused with a different request body.
    #[error("Idempotency key reused with a different request: {0}")]
    DuplicateIdempotencyKey(String),

    /// Optimistic version check failed on a lock-free path.
    #[error("Concurrent modification detected: {0}")]
    ConcurrentModification(String),

    /// Row lock could not be acquired; the caller may retry.
    #[error("Resource is locked: {0}")]
    ResourceLocked(String),

    /// Storage-level constraint violation (unique key, foreign key).
    #[error("Data integrity violation: {0}")]
    DataIntegrityViolation(String),

    /// Request failed boundary validation.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// External service error.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::AccountNotFound(_) => 404,
            Self::InvalidAmount(_)
            | Self::InvalidCurrency(_)
            | Self::MissingIdempotencyKey
            | Self::Validation(_) => 400,
            Self::DuplicateAccount(_)
            | Self::InsufficientBalance(_)
            | Self::DuplicateIdempotencyKey(_)
            | Self::ConcurrentModification(_)
            | Self::ResourceLocked(_)
            | Self::DataIntegrityViolation(_) => 409,
            Self::LimitExceeded(_) => 422,
            Self::Database(_) | Self::ExternalService(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::DuplicateAccount(_) => "ALREADY_EXISTS",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::InsufficientBalance(_) => "INSUFFICIENT_BALANCE",
            Self::LimitExceeded(_) => "LIMIT_EXCEEDED",
            Self::MissingIdempotencyKey => "MISSING_IDEMPOTENCY_KEY",
            Self::DuplicateIdempotencyKey(_) => "DUPLICATE_IDEMPOTENCY_KEY",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::ResourceLocked(_) => "RESOURCE_LOCKED",
            Self::DataIntegrityViolation(_) => "DATA_INTEGRITY_VIOLATION",
            Self::Validation(_) => "INVALID_REQUEST",
            Self::Database(_) | Self::ExternalService(_) | Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may safely retry the whole command.
    ///
    /// Lock contention and optimistic-version conflicts are transient;
    /// everything else is deterministic and will fail again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConcurrentModification(_) | Self::ResourceLocked(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(AppError::AccountNotFound(String::new()).status_code(), 404);
        assert_eq!(AppError::DuplicateAccount(String::new()).status_code(), 409);
        assert_eq!(AppError::InvalidAmount(String::new()).status_code(), 400);
        assert_eq!(AppError::InvalidCurrency(String::new()).status_code(), 400);
        assert_eq!(
            AppError::InsufficientBalance(String::new()).status_code(),
            409
        );
        assert_eq!(AppError::LimitExceeded(String::new()).status_code(), 422);
        assert_eq!(AppError::MissingIdempotencyKey.status_code(), 400);
        assert_eq!(
            AppError::DuplicateIdempotencyKey(String::new()).status_code(),
            409
        );
        assert_eq!(
            AppError::ConcurrentModification(String::new()).status_code(),
            409
        );
        assert_eq!(AppError::ResourceLocked(String::new()).status_code(), 409);
        assert_eq!(
            AppError::DataIntegrityViolation(String::new()).status_code(),
            409
        );
        assert_eq!(AppError::Validation(String::new()).status_code(), 400);
        assert_eq!(AppError::Database(String::new()).status_code(), 500);
        assert_eq!(AppError::ExternalService(String::new()).status_code(), 500);
        assert_eq!(AppError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::AccountNotFound(String::new()).error_code(),
            "ACCOUNT_NOT_FOUND"
        );
        assert_eq!(
            AppError::DuplicateAccount(String::new()).error_code(),
            "ALREADY_EXISTS"
        );
        assert_eq!(
            AppError::InvalidAmount(String::new()).error_code(),
            "INVALID_AMOUNT"
        );
        assert_eq!(
            AppError::InsufficientBalance(String::new()).error_code(),
            "INSUFFICIENT_BALANCE"
        );
        assert_eq!(
            AppError::LimitExceeded(String::new()).error_code(),
            "LIMIT_EXCEEDED"
        );
        assert_eq!(
            AppError::MissingIdempotencyKey.error_code(),
            "MISSING_IDEMPOTENCY_KEY"
        );
        assert_eq!(
            AppError::DuplicateIdempotencyKey(String::new()).error_code(),
            "DUPLICATE_IDEMPOTENCY_KEY"
        );
        assert_eq!(
            AppError::ConcurrentModification(String::new()).error_code(),
            "CONCURRENT_MODIFICATION"
        );
        assert_eq!(
            AppError::ResourceLocked(String::new()).error_code(),
            "RESOURCE_LOCKED"
        );
        assert_eq!(
            AppError::DataIntegrityViolation(String::new()).error_code(),
            "DATA_INTEGRITY_VIOLATION"
        );
        assert_eq!(
            AppError::Validation(String::new()).error_code(),
            "INVALID_REQUEST"
        );
        assert_eq!(
            AppError::Database(String::new()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::AccountNotFound("msg".into()).to_string(),
            "Account not found: msg"
        );
        assert_eq!(
            AppError::InsufficientBalance("msg".into()).to_string(),
            "Insufficient balance: msg"
        );
        assert_eq!(
            AppError::MissingIdempotencyKey.to_string(),
            "Idempotency-Key header is required"
        );
        assert_eq!(
            AppError::LimitExceeded("msg".into()).to_string(),
            "Daily limit exceeded: msg"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(AppError::ResourceLocked(String::new()).is_retryable());
        assert!(AppError::ConcurrentModification(String::new()).is_retryable());
        assert!(!AppError::InsufficientBalance(String::new()).is_retryable());
        assert!(!AppError::AccountNotFound(String::new()).is_retryable());
    }
}
