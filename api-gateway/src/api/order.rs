//! Order API handlers
//!
//! Handlers for the caller's simulated positions:
//! - List open orders and closed history
//! - Open a position
//! - Close a position at the latest market price

use std::sync::Arc;

use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    Json,
};
use common::decimal::{Price, Quantity};
use common::model::account::Account;
use common::model::order::Order;
use ledger_service::{ClosedPosition, OpenPosition};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::{IntoParams, ToSchema};

use crate::api::response::ApiResponse;
use crate::auth::CallerIdentity;
use crate::error::ApiError;
use crate::AppState;

/// Order list filter
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    /// Only orders backed by this account
    #[serde(default, alias = "account_id")]
    pub account_id: Option<String>,
}

impl OrdersQuery {
    /// The UI sends `accountId=` when no account is selected
    fn account_id(&self) -> Result<Option<Uuid>, ApiError> {
        match self.account_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => Uuid::parse_str(raw)
                .map(Some)
                .map_err(|_| ApiError::BadRequest(format!("Invalid accountId: {}", raw))),
        }
    }
}

/// Open position request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenPositionRequest {
    #[serde(alias = "account_id")]
    pub account_id: Uuid,
    /// Display symbol
    pub symbol: String,
    /// Symbol sent to the quote provider, if different
    #[serde(default, alias = "api_symbol")]
    pub api_symbol: Option<String>,
    /// Instrument name; defaults to the symbol
    #[serde(default)]
    pub name: Option<String>,
    /// crypto, forex or stocks; anything else is stored as stocks
    #[serde(default, alias = "instrument_type", alias = "type")]
    pub instrument_type: Option<String>,
    /// Defaults to the account currency
    #[serde(default)]
    pub currency: Option<String>,
    /// buy or sell
    pub side: String,
    #[schema(value_type = String)]
    pub quantity: Quantity,
    #[serde(alias = "entry_price")]
    #[schema(value_type = String)]
    pub entry_price: Price,
    #[serde(default, alias = "stop_loss")]
    #[schema(value_type = Option<String>)]
    pub stop_loss: Option<Price>,
    #[serde(default, alias = "take_profit")]
    #[schema(value_type = Option<String>)]
    pub take_profit: Option<Price>,
}

impl From<OpenPositionRequest> for OpenPosition {
    fn from(request: OpenPositionRequest) -> Self {
        OpenPosition {
            account_id: request.account_id,
            symbol: request.symbol,
            api_symbol: request.api_symbol,
            name: request.name,
            instrument_type: request.instrument_type,
            currency: request.currency,
            side: request.side,
            quantity: request.quantity,
            entry_price: request.entry_price,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
        }
    }
}

/// A list of orders
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

/// A single order
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderPayload {
    pub order: Order,
}

/// The closed order and the account it settled into
#[derive(Debug, Serialize, ToSchema)]
pub struct ClosePositionResult {
    pub order: Order,
    pub account: Account,
}

impl From<ClosedPosition> for ClosePositionResult {
    fn from(closed: ClosedPosition) -> Self {
        Self {
            order: closed.order,
            account: closed.account,
        }
    }
}

/// List the caller's open orders, newest first
#[utoipa::path(
    get,
    path = "/orders",
    params(OrdersQuery),
    responses(
        (status = 200, description = "Open orders", body = OrderList),
        (status = 400, description = "Invalid account filter"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn list_open_orders(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    query: Result<Query<OrdersQuery>, QueryRejection>,
) -> Result<ApiResponse<OrderList>, ApiError> {
    let Query(query) = query?;
    let orders = state.ledger.list_open_orders(caller.id, query.account_id()?).await?;
    Ok(ApiResponse::new(OrderList { orders }))
}

/// List the caller's closed orders, most recently closed first
#[utoipa::path(
    get,
    path = "/orders/history",
    params(OrdersQuery),
    responses(
        (status = 200, description = "Closed orders", body = OrderList),
        (status = 400, description = "Invalid account filter"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn list_closed_orders(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    query: Result<Query<OrdersQuery>, QueryRejection>,
) -> Result<ApiResponse<OrderList>, ApiError> {
    let Query(query) = query?;
    let orders = state.ledger.list_closed_orders(caller.id, query.account_id()?).await?;
    Ok(ApiResponse::new(OrderList { orders }))
}

/// Open a simulated position
#[utoipa::path(
    post,
    path = "/orders",
    request_body = OpenPositionRequest,
    responses(
        (status = 201, description = "Position opened", body = OrderPayload),
        (status = 400, description = "Invalid order request"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Account not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn open_position(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    payload: Result<Json<OpenPositionRequest>, JsonRejection>,
) -> Result<ApiResponse<OrderPayload>, ApiError> {
    let Json(request) = payload?;
    let order = state.ledger.open_position(caller.id, request.into()).await?;
    Ok(ApiResponse::created(OrderPayload { order }).with_message("Position opened"))
}

/// Close a position at the latest market price
#[utoipa::path(
    post,
    path = "/orders/{id}/close",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Position closed", body = ClosePositionResult),
        (status = 400, description = "Order already closed"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Order not found"),
        (status = 502, description = "Price quote unavailable"),
        (status = 500, description = "Internal server error")
    ),
    tag = "order"
)]
pub async fn close_position(
    State(state): State<Arc<AppState>>,
    caller: CallerIdentity,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<ApiResponse<ClosePositionResult>, ApiError> {
    let Path(id) = id?;
    let closed = state.ledger.close_position(caller.id, id).await?;
    Ok(ApiResponse::new(ClosePositionResult::from(closed)).with_message("Position closed"))
}
