//! HTTP ledger API for MoneyMind

pub mod api;
pub mod auth;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post},
    Json, Router,
};
use ledger_service::LedgerService;
use serde_json::{json, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::IdentityResolver;

/// App state shared across handlers
pub struct AppState {
    /// Ledger engine
    pub ledger: Arc<LedgerService>,
    /// Resolves the caller of each request
    pub identity: Arc<dyn IdentityResolver>,
}

impl AppState {
    pub fn new(ledger: Arc<LedgerService>, identity: Arc<dyn IdentityResolver>) -> Self {
        Self { ledger, identity }
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Account routes
        api::account::list_accounts,
        api::account::create_account,
        api::account::set_default_account,
        api::account::adjust_balance,
        api::account::delete_account,
        // Order routes
        api::order::list_open_orders,
        api::order::list_closed_orders,
        api::order::open_position,
        api::order::close_position,
    ),
    components(
        schemas(
            // Account API
            api::account::CreateAccountRequest,
            api::account::AdjustBalanceRequest,
            api::account::AccountList,
            api::account::AccountPayload,
            common::model::account::Account,
            common::model::account::AccountType,
            common::model::account::Currency,

            // Order API
            api::order::OpenPositionRequest,
            api::order::OrderList,
            api::order::OrderPayload,
            api::order::ClosePositionResult,
            common::model::order::Order,
            common::model::order::Side,
            common::model::order::InstrumentType,
            common::model::order::Status,
        )
    ),
    tags(
        (name = "account", description = "Cash account endpoints"),
        (name = "order", description = "Simulated position endpoints")
    ),
    info(
        title = "MoneyMind Ledger API",
        version = "1.0.0",
        description = "Cash accounts and simulated positions settled at live market prices"
    )
)]
pub struct ApiDoc;

/// Liveness probe
async fn health() -> Json<Value> {
    Json(json!({ "success": true, "status": "ok" }))
}

/// Build the ledger router. Tracing and CORS layers are added by the binary.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Account routes
        .route("/accounts", get(api::account::list_accounts).post(api::account::create_account))
        .route("/accounts/:id", delete(api::account::delete_account))
        .route("/accounts/:id/default", patch(api::account::set_default_account))
        .route("/accounts/:id/balance", patch(api::account::adjust_balance))

        // Order routes
        .route("/orders", get(api::order::list_open_orders).post(api::order::open_position))
        .route("/orders/history", get(api::order::list_closed_orders))
        .route("/orders/:id/close", post(api::order::close_position));

    // Set up Swagger UI
    let swagger_ui = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(api_routes)
        .route("/health", get(health))
        .merge(swagger_ui)
        .with_state(state)
}
