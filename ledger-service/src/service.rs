//! Ledger engine
//!
//! Owns the invariants that tie orders to accounts: an order is always backed
//! by an account of the same user, it closes at most once, and closing it
//! moves the account balance by exactly the realized P&L in the same
//! transaction. Opening a position never touches the balance.

use std::sync::Arc;

use chrono::Utc;
use common::decimal::{precision, Amount, Price, Quantity};
use common::error::{Error, ErrorExt, Result};
use common::model::account::{Account, AccountType, Currency};
use common::model::order::{InstrumentType, Order, Side, Status};
use common::db::DbPool;
use market_data::QuoteProvider;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::repository::{
    InMemoryLedgerRepository, LedgerRepository, LedgerTransaction, PostgresLedgerRepository,
};

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository on an existing pool
    Postgres(DbPool),
}

/// Input for creating an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub account_name: String,
    pub account_type: String,
    pub currency: String,
    pub initial_balance: Amount,
    pub is_default: bool,
}

/// Input for opening a position
#[derive(Debug, Clone)]
pub struct OpenPosition {
    pub account_id: Uuid,
    pub symbol: String,
    pub api_symbol: Option<String>,
    pub name: Option<String>,
    pub instrument_type: Option<String>,
    pub currency: Option<String>,
    pub side: String,
    pub quantity: Quantity,
    pub entry_price: Price,
    pub stop_loss: Option<Price>,
    pub take_profit: Option<Price>,
}

/// Committed result of closing a position
#[derive(Debug, Clone, Serialize)]
pub struct ClosedPosition {
    pub order: Order,
    pub account: Account,
}

/// Ledger service for accounts and simulated positions
pub struct LedgerService {
    /// Repository for account and order data
    repo: Arc<dyn LedgerRepository>,
    /// Latest-price source used when closing positions
    quotes: Arc<dyn QuoteProvider>,
    /// Log transaction boundaries
    transaction_logging: bool,
}

impl LedgerService {
    /// Create a new ledger service
    pub fn new(repo: Arc<dyn LedgerRepository>, quotes: Arc<dyn QuoteProvider>) -> Self {
        Self {
            repo,
            quotes,
            transaction_logging: false,
        }
    }

    /// Create a new ledger service with a specific repository type
    pub fn with_repository(repo_type: RepositoryType, quotes: Arc<dyn QuoteProvider>) -> Self {
        let repo: Arc<dyn LedgerRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryLedgerRepository::new()),
            RepositoryType::Postgres(pool) => Arc::new(PostgresLedgerRepository::new(pool)),
        };

        Self::new(repo, quotes)
    }

    /// Enable or disable transaction boundary logging
    pub fn with_transaction_logging(mut self, enabled: bool) -> Self {
        self.transaction_logging = enabled;
        self
    }

    // ----------------------------------------------------------------------
    // Accounts
    // ----------------------------------------------------------------------

    /// List a user's accounts, oldest first
    pub async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<Account>> {
        self.repo.list_accounts(user_id).await
    }

    /// Get one of the user's accounts
    pub async fn get_account(&self, user_id: Uuid, account_id: Uuid) -> Result<Account> {
        self.repo.get_account(user_id, account_id).await?
            .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))
    }

    /// Create an account. Requesting the default flag clears it on the
    /// user's other accounts in the same transaction.
    pub async fn create_account(&self, user_id: Uuid, request: NewAccount) -> Result<Account> {
        let account_name = request.account_name.trim();
        if account_name.is_empty() {
            return Err(Error::InvalidArgument("Account name is required".to_string()));
        }
        let account_type: AccountType = request.account_type.parse()?;
        let currency: Currency = request.currency.parse()?;
        ensure_storable("Initial balance", request.initial_balance)?;

        let account = Account::new(
            user_id,
            account_name.to_string(),
            account_type,
            currency,
            request.initial_balance,
            request.is_default,
        );

        info!("Creating {} account {} for user {}", account.account_type, account.id, user_id);

        let mut tx = self.begin("create_account").await?;
        let result = async {
            if account.is_default {
                tx.clear_default_accounts(user_id).await?;
            }
            tx.insert_account(&account).await
        }.await;
        self.finish("create_account", tx, result).await?;

        Ok(account)
    }

    /// Make `account_id` the user's only default account and return the
    /// refreshed account list
    pub async fn set_default_account(&self, user_id: Uuid, account_id: Uuid) -> Result<Vec<Account>> {
        info!("Setting default account {} for user {}", account_id, user_id);

        let mut tx = self.begin("set_default_account").await?;
        let result = async {
            // Clearing first takes the per-user default lock before any row lock
            tx.clear_default_accounts(user_id).await?;

            let mut account = tx.account_for_update(user_id, account_id).await?
                .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;

            account.is_default = true;
            account.updated_at = Utc::now();
            tx.update_account(&account).await
        }.await;
        self.finish("set_default_account", tx, result).await?;

        self.repo.list_accounts(user_id).await
    }

    /// Administrative balance override
    pub async fn adjust_balance(&self, user_id: Uuid, account_id: Uuid, new_balance: Amount) -> Result<Account> {
        if new_balance < Amount::ZERO {
            return Err(Error::InvalidArgument("Balance must be zero or greater".to_string()));
        }
        ensure_storable("Balance", new_balance)?;

        info!("Adjusting balance of account {} to {}", account_id, new_balance);

        let mut tx = self.begin("adjust_balance").await?;
        let result = async {
            let mut account = tx.account_for_update(user_id, account_id).await?
                .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;

            account.set_balance(new_balance);
            tx.update_account(&account).await?;
            Ok::<_, Error>(account)
        }.await;

        self.finish("adjust_balance", tx, result).await
    }

    /// Delete one of the user's accounts together with its orders
    pub async fn delete_account(&self, user_id: Uuid, account_id: Uuid) -> Result<()> {
        let deleted = self.repo.delete_account(user_id, account_id).await
            .with_context(|| format!("Failed to delete account {}", account_id))?;

        if !deleted {
            return Err(Error::AccountNotFound(account_id.to_string()));
        }

        info!("Deleted account {} for user {}", account_id, user_id);
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Orders
    // ----------------------------------------------------------------------

    /// Open orders of the user, newest first
    pub async fn list_open_orders(&self, user_id: Uuid, account_id: Option<Uuid>) -> Result<Vec<Order>> {
        self.repo.list_orders(user_id, Status::Open, account_id).await
    }

    /// Closed orders of the user, most recently closed first
    pub async fn list_closed_orders(&self, user_id: Uuid, account_id: Option<Uuid>) -> Result<Vec<Order>> {
        self.repo.list_orders(user_id, Status::Closed, account_id).await
    }

    /// Open a simulated position against one of the user's accounts.
    ///
    /// No funds are reserved and no balance check is made; the account
    /// balance only moves when the position closes.
    pub async fn open_position(&self, user_id: Uuid, request: OpenPosition) -> Result<Order> {
        let side: Side = request.side.parse()?;

        if request.quantity <= Quantity::ZERO {
            return Err(Error::InvalidArgument("Quantity must be greater than zero".to_string()));
        }
        if request.entry_price <= Price::ZERO {
            return Err(Error::InvalidArgument("Entry price must be greater than zero".to_string()));
        }
        ensure_storable("Quantity", request.quantity)?;
        ensure_storable("Entry price", request.entry_price)?;
        if let Some(stop_loss) = request.stop_loss {
            ensure_storable("Stop loss", stop_loss)?;
        }
        if let Some(take_profit) = request.take_profit {
            ensure_storable("Take profit", take_profit)?;
        }

        let symbol = request.symbol.trim().to_string();
        if symbol.is_empty() {
            return Err(Error::InvalidArgument("Symbol is required".to_string()));
        }

        let api_symbol = non_blank(request.api_symbol);
        let name = non_blank(request.name).unwrap_or_else(|| symbol.clone());
        let instrument_type = InstrumentType::normalize(request.instrument_type.as_deref());
        let requested_currency = non_blank(request.currency).map(|c| c.to_ascii_uppercase());
        let account_id = request.account_id;

        let mut tx = self.begin("open_position").await?;
        let result = async {
            let account = tx.account_for_update(user_id, account_id).await?
                .ok_or_else(|| Error::AccountNotFound(account_id.to_string()))?;

            let currency = requested_currency.clone()
                .unwrap_or_else(|| account.currency.to_string());

            let order = Order {
                id: Uuid::new_v4(),
                user_id,
                account_id: account.id,
                symbol: symbol.clone(),
                api_symbol: api_symbol.clone(),
                name: name.clone(),
                instrument_type,
                currency,
                side,
                quantity: request.quantity,
                entry_price: request.entry_price,
                stop_loss: request.stop_loss,
                take_profit: request.take_profit,
                status: Status::Open,
                opened_at: Utc::now(),
                closed_at: None,
                close_price: None,
                profit_loss: None,
            };

            tx.insert_order(&order).await?;
            Ok::<_, Error>(order)
        }.await;
        let order = self.finish("open_position", tx, result).await?;

        info!(
            "Opened {} {} {} @ {} on account {} (order {})",
            order.side, order.quantity, order.symbol, order.entry_price, order.account_id, order.id
        );
        Ok(order)
    }

    /// Close an open position at the latest market price.
    ///
    /// The order is checked, the quote is fetched with no lock held, and then
    /// a single transaction locks the order, re-checks that it is still open,
    /// locks the account and writes both rows. Concurrent closes of the same
    /// order therefore commit at most once, and closes of different orders on
    /// one account serialize on the account row.
    pub async fn close_position(&self, user_id: Uuid, order_id: Uuid) -> Result<ClosedPosition> {
        let order = self.repo.get_order(user_id, order_id).await?
            .ok_or_else(|| Error::OrderNotFound(order_id.to_string()))?;

        if !order.is_open() {
            return Err(Error::InvalidState(format!("Order {} is already closed", order_id)));
        }

        let close_price = self.quotes.latest_price(order.quote_symbol()).await
            .map_err(|e| {
                warn!("Quote lookup for {} failed while closing order {}: {}", order.quote_symbol(), order_id, e);
                Error::UpstreamUnavailable(e.to_string())
            })?;

        debug!("Closing order {} at {}", order_id, close_price);

        let mut tx = self.begin("close_position").await?;
        let result = async {
            let mut order = tx.order_for_update(user_id, order_id).await?
                .ok_or_else(|| Error::OrderNotFound(order_id.to_string()))?;

            let mut account = tx.account_for_update(user_id, order.account_id).await?
                .ok_or_else(|| Error::AccountNotFound(order.account_id.to_string()))?;

            let pnl = order.close(close_price, Utc::now())?;
            account.apply_pnl(pnl)?;

            tx.update_order(&order).await?;
            tx.update_account(&account).await?;
            Ok::<_, Error>(ClosedPosition { order, account })
        }.await;
        let closed = self.finish("close_position", tx, result).await?;

        info!(
            "Closed order {} at {}: P&L {}, account {} balance {}",
            order_id,
            close_price,
            closed.order.profit_loss.unwrap_or_default(),
            closed.account.id,
            closed.account.balance
        );
        Ok(closed)
    }

    // ----------------------------------------------------------------------
    // Transaction plumbing
    // ----------------------------------------------------------------------

    async fn begin(&self, operation: &str) -> Result<Box<dyn LedgerTransaction>> {
        let tx = self.repo.begin_transaction().await
            .with_context(|| format!("Failed to start transaction for {}", operation))?;

        if self.transaction_logging {
            info!("BEGIN {}", operation);
        }
        Ok(tx)
    }

    /// Commit on success, roll back on failure and return the original error
    async fn finish<T>(
        &self,
        operation: &str,
        tx: Box<dyn LedgerTransaction>,
        result: Result<T>,
    ) -> Result<T> {
        match result {
            Ok(value) => {
                tx.commit().await
                    .with_context(|| format!("Failed to commit transaction for {}", operation))?;

                if self.transaction_logging {
                    info!("COMMIT {}", operation);
                }
                Ok(value)
            },
            Err(e) => {
                if e.is_client_error() {
                    debug!("Rolling back {}: {}", operation, e);
                } else {
                    error!("Error in {}, rolling back: {}", operation, e);
                }

                if let Err(rollback_err) = tx.rollback().await {
                    // Log rollback failure but return the original error
                    error!("Failed to roll back transaction: {}", rollback_err);
                }

                if self.transaction_logging {
                    info!("ROLLBACK {}", operation);
                }
                Err(e)
            }
        }
    }
}

/// Rejects values too large for the ledger's `NUMERIC(28, 8)` columns
fn ensure_storable(label: &str, value: Amount) -> Result<()> {
    if precision::is_storable(value) {
        Ok(())
    } else {
        Err(Error::InvalidArgument(format!("{} {} is out of range", label, value)))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
