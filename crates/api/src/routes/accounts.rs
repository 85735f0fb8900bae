//! Account management routes.
//!
//! v1 and v2 share every operation except creation: v1 accounts are
//! always KRW, v2 takes an explicit currency.

use std::str::FromStr;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use wirewon_core::account::Account;
use wirewon_db::{AccountRepository, TransactionRepository, entities::transactions};
use wirewon_shared::{AppError, Currency, PageRequest, PageResponse};

use crate::AppState;
use crate::error::ApiError;

/// Creates the v1 account routes.
pub fn v1_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account_v1))
        .merge(common_routes())
}

/// Creates the v2 account routes.
pub fn v2_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", post(create_account_v2))
        .merge(common_routes())
}

fn common_routes() -> Router<AppState> {
    Router::new()
        .route("/accounts/{id}", get(get_account))
        .route("/accounts/{id}", delete(delete_account))
        .route("/accounts/{id}/balance", get(get_balance))
        .route("/accounts/{id}/transactions", get(list_transactions))
        .route("/accounts/{id}/deposit", post(deposit))
        .route("/accounts/{id}/withdraw", post(withdraw))
}

/// Request body for creating a v1 (KRW) account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Account number (unique, immutable, at most 50 characters).
    #[serde(default)]
    pub account_number: Option<String>,
    /// Owner display name (at most 100 characters).
    #[serde(default)]
    pub owner_name: Option<String>,
}

/// Request body for creating a v2 account with an explicit currency.
#[derive(Debug, Deserialize)]
pub struct CreateAccountV2Request {
    /// Account number (unique, immutable, at most 50 characters).
    #[serde(default)]
    pub account_number: Option<String>,
    /// Owner display name (at most 100 characters).
    #[serde(default)]
    pub owner_name: Option<String>,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency: Option<String>,
}

/// Request body for deposits and withdrawals.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    /// Amount to move; must be present and strictly positive.
    pub amount: Option<Decimal>,
}

/// Response for an account.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// Account ID.
    pub id: Uuid,
    /// Account number.
    pub account_number: String,
    /// Owner display name.
    pub owner_name: String,
    /// Account currency.
    pub currency: Currency,
    /// Current balance.
    pub balance: Decimal,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            account_number: account.account_number,
            owner_name: account.owner_name,
            currency: account.currency,
            balance: account.balance,
            created_at: account.created_at,
        }
    }
}

/// Response for a balance lookup or a balance-changing command.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Account ID.
    pub account_id: Uuid,
    /// Current balance.
    pub balance: Decimal,
    /// Account currency.
    pub currency: Currency,
}

impl From<Account> for BalanceResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
            balance: account.balance,
            currency: account.currency,
        }
    }
}

/// Response for one ledger history row.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Entry type: DEPOSIT, WITHDRAW, TRANSFER_IN, TRANSFER_OUT.
    #[serde(rename = "type")]
    pub kind: String,
    /// Amount moved.
    pub amount: Decimal,
    /// Fee charged with this entry.
    pub fee: Decimal,
    /// Currency of the amount.
    pub currency: String,
    /// Balance after the mutation.
    pub balance_after: Decimal,
    /// Counterparty account for transfer legs.
    pub related_account_id: Option<Uuid>,
    /// Entry timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<transactions::Model> for TransactionResponse {
    fn from(row: transactions::Model) -> Self {
        Self {
            id: row.id,
            kind: row.kind,
            amount: row.amount,
            fee: row.fee,
            currency: row.currency,
            balance_after: row.balance_after,
            related_account_id: row.related_account_id,
            created_at: row.created_at.with_timezone(&Utc),
        }
    }
}

/// POST `/api/v1/accounts` - Create a KRW account.
async fn create_account_v1(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let number = bounded_field(payload.account_number.as_deref(), "account_number", 50)?;
    let owner = bounded_field(payload.owner_name.as_deref(), "owner_name", 100)?;
    create_account(&state, number, owner, Currency::Krw).await
}

/// POST `/api/v2/accounts` - Create an account in any supported currency.
async fn create_account_v2(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountV2Request>,
) -> Result<impl IntoResponse, ApiError> {
    let number = bounded_field(payload.account_number.as_deref(), "account_number", 50)?;
    let owner = bounded_field(payload.owner_name.as_deref(), "owner_name", 100)?;
    let code = required_field(payload.currency.as_deref(), "currency")?;
    let currency = Currency::from_str(code).map_err(AppError::InvalidCurrency)?;
    create_account(&state, number, owner, currency).await
}

/// Rejects a missing or blank request field.
fn required_field<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, AppError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

/// Rejects a missing, blank, or over-long request field.
fn bounded_field<'a>(value: Option<&'a str>, name: &str, max: usize) -> Result<&'a str, AppError> {
    let value = required_field(value, name)?;
    if value.len() > max {
        return Err(AppError::Validation(format!(
            "{name} must be at most {max} characters"
        )));
    }
    Ok(value)
}

// use<>: the response owns its data and must not capture the borrowed args
async fn create_account(
    state: &AppState,
    account_number: &str,
    owner_name: &str,
    currency: Currency,
) -> Result<impl IntoResponse + use<>, ApiError> {
    let repo = AccountRepository::new((*state.db).clone());
    let account = repo.create(account_number, owner_name, currency).await?;

    info!(
        account_id = %account.id,
        number = %account.account_number,
        %currency,
        "Account created"
    );

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// GET `/accounts/{id}` - Get account detail.
async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AccountRepository::new((*state.db).clone());
    let account = repo.get(id).await?;
    Ok((StatusCode::OK, Json(AccountResponse::from(account))))
}

/// DELETE `/accounts/{id}` - Soft-delete an account.
async fn delete_account(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AccountRepository::new((*state.db).clone());
    repo.soft_delete(id).await?;

    info!(account_id = %id, "Account deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// GET `/accounts/{id}/balance` - Get the current balance.
async fn get_balance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = AccountRepository::new((*state.db).clone());
    let account = repo.get(id).await?;
    Ok((StatusCode::OK, Json(BalanceResponse::from(account))))
}

/// GET `/accounts/{id}/transactions?page=&size=` - Ledger history, newest first.
async fn list_transactions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(page): Query<PageRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // 404 for unknown or deleted accounts even though rows would be empty
    AccountRepository::new((*state.db).clone()).get(id).await?;

    let repo = TransactionRepository::new((*state.db).clone());
    let history = repo.list_for_account(id, &page).await?;

    let response = PageResponse {
        items: history
            .items
            .into_iter()
            .map(TransactionResponse::from)
            .collect::<Vec<_>>(),
        page: history.page,
        size: history.size,
        total_elements: history.total_elements,
        total_pages: history.total_pages,
    };

    Ok((StatusCode::OK, Json(response)))
}

/// POST `/accounts/{id}/deposit` - Deposit into an account.
async fn deposit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AmountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.ledger.deposit(id, payload.amount).await?;
    Ok((StatusCode::OK, Json(BalanceResponse::from(account))))
}

/// POST `/accounts/{id}/withdraw` - Withdraw from an account.
async fn withdraw(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AmountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.ledger.withdraw(id, payload.amount).await?;
    Ok((StatusCode::OK, Json(BalanceResponse::from(account))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_field_rejects_blank_and_missing() {
        assert!(required_field(None, "currency").is_err());
        assert!(required_field(Some("   "), "currency").is_err());
        assert_eq!(required_field(Some(" USD "), "currency").unwrap(), "USD");
    }

    #[test]
    fn test_bounded_field_enforces_length() {
        let long = "1".repeat(51);
        let err = bounded_field(Some(&long), "account_number", 50).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(err.error_code(), "INVALID_REQUEST");
        assert!(bounded_field(Some("110-1234"), "account_number", 50).is_ok());
    }
}
