//! Account API handlers
//!
//! Handles endpoints related to the caller's cash accounts:
//! - List and create accounts
//! - Switch the default account
//! - Override a balance
//! - Delete an account

use std::sync::Arc;

use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    Json,
};
use common::decimal::Amount;
use common::model::account::Account;
use ledger_service::NewAccount;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::api::response::{ApiResponse, Empty};
use crate::auth::CallerIdentity;
use crate::error::ApiError;
use crate::AppState;

/// Create account request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Display name
    #[serde(alias = "account_name", alias = "name")]
    pub account_name: String,
    /// broker, bank, crypto, cash or other
    #[serde(alias = "account_type", alias = "type")]
    pub account_type: String,
    /// USD, EUR, RON, GBP or CHF
    pub currency: String,
    /// Opening balance; negative values are stored as zero
    #[serde(default, alias = "initial_balance")]
    #[schema(value_type = String)]
    pub initial_balance: Amount,
    /// Make this the default account
    #[serde(default, alias = "is_default")]
    pub is_default: bool,
}

/// Balance override request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustBalanceRequest {
    /// New balance, zero or greater
    #[serde(alias = "new_balance", alias = "newBalance")]
    #[schema(value_type = String)]
    pub balance: Amount,
}

/// A list of accounts
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountList {
    pub accounts: Vec<Account>,
}

/// A single account
#[derive(Debug, Serialize, ToSchema)]
pub struct AccountPayload {
    pub account: Account,
}

/// List the caller's accounts, oldest first
#[utoipa::path(
    get,
    path = "/accounts",
    responses(
        (status = 200, description = "Accounts of the caller", body = AccountList),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
) -> Result<ApiResponse<AccountList>, ApiError> {
    let accounts = state.ledger.list_accounts(caller.id).await?;
    Ok(ApiResponse::new(AccountList { accounts }))
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountPayload),
        (status = 400, description = "Invalid name, type or currency"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    payload: Result<Json<CreateAccountRequest>, JsonRejection>,
) -> Result<ApiResponse<AccountPayload>, ApiError> {
    let Json(request) = payload?;

    let account = state.ledger.create_account(caller.id, NewAccount {
        account_name: request.account_name,
        account_type: request.account_type,
        currency: request.currency,
        initial_balance: request.initial_balance,
        is_default: request.is_default,
    }).await?;

    info!("User {} created account {}", caller.username, account.id);
    Ok(ApiResponse::created(AccountPayload { account }).with_message("Account created"))
}

/// Make an account the caller's default
#[utoipa::path(
    patch,
    path = "/accounts/{id}/default",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Refreshed account list", body = AccountList),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn set_default_account(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<AccountList>, ApiError> {
    let Path(id) = id?;
    let accounts = state.ledger.set_default_account(caller.id, id).await?;
    Ok(ApiResponse::new(AccountList { accounts }).with_message("Default account updated"))
}

/// Override an account balance
#[utoipa::path(
    patch,
    path = "/accounts/{id}/balance",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    request_body = AdjustBalanceRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountPayload),
        (status = 400, description = "Negative balance"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn adjust_balance(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AdjustBalanceRequest>, JsonRejection>,
) -> Result<ApiResponse<AccountPayload>, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;

    let account = state.ledger.adjust_balance(caller.id, id, request.balance).await?;
    Ok(ApiResponse::new(AccountPayload { account }).with_message("Balance updated"))
}

/// Delete an account and its orders
#[utoipa::path(
    delete,
    path = "/accounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "account"
)]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<Empty>, ApiError> {
    let Path(id) = id?;
    state.ledger.delete_account(caller.id, id).await?;

    info!("User {} deleted account {}", caller.username, id);
    Ok(ApiResponse::message("Account deleted"))
}
