use async_trait::async_trait;
use common::db::{DbAccount, DbOrder, DbPool};
use common::error::{Error, Result};
use common::model::account::Account;
use common::model::order::{Order, Status};
use sqlx::{Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{LedgerRepository, LedgerTransaction};

const ACCOUNT_COLUMNS: &str = "id, user_id, account_name, account_type, currency, balance, \
    initial_balance, is_default, created_at, updated_at";

const ORDER_COLUMNS: &str = "id, user_id, account_id, symbol, api_symbol, name, instrument_type, \
    currency, side, quantity, entry_price, stop_loss, take_profit, status, opened_at, closed_at, \
    close_price, profit_loss";

/// PostgreSQL repository for ledger data
#[derive(Clone)]
pub struct PostgresLedgerRepository {
    /// Database connection pool
    pool: DbPool,
}

impl PostgresLedgerRepository {
    /// Create a new PostgreSQL ledger repository on an existing pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<Account>> {
        debug!("Listing accounts for user {}", user_id);

        let rows = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {} FROM accounts WHERE user_id = $1 ORDER BY created_at ASC, id ASC",
            ACCOUNT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn get_account(&self, user_id: Uuid, id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account {} for user {}", id, user_id);

        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {} FROM accounts WHERE id = $1 AND user_id = $2",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn delete_account(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        debug!("Deleting account {} for user {}", id, user_id);

        let mut tx = self.pool.begin().await?;

        // Lock the orders before the account row, the same order closing a
        // position takes them, so the cascade cannot deadlock against a close
        sqlx::query("SELECT id FROM orders WHERE account_id = $1 AND user_id = $2 ORDER BY id FOR UPDATE")
            .bind(id)
            .bind(user_id)
            .fetch_all(&mut *tx)
            .await?;

        // orders.account_id cascades
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_order(&self, user_id: Uuid, id: Uuid) -> Result<Option<Order>> {
        debug!("Getting order {} for user {}", id, user_id);

        let row = sqlx::query_as::<_, DbOrder>(&format!(
            "SELECT {} FROM orders WHERE id = $1 AND user_id = $2",
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn list_orders(
        &self,
        user_id: Uuid,
        status: Status,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Order>> {
        debug!("Listing {} orders for user {}", status.as_str(), user_id);

        let order_by = match status {
            Status::Open => "opened_at DESC, id DESC",
            Status::Closed => "closed_at DESC, opened_at DESC, id DESC",
        };

        let rows = sqlx::query_as::<_, DbOrder>(&format!(
            "SELECT {} FROM orders
             WHERE user_id = $1 AND status = $2 AND ($3::uuid IS NULL OR account_id = $3)
             ORDER BY {}",
            ORDER_COLUMNS, order_by
        ))
        .bind(user_id)
        .bind(status.as_str())
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn begin_transaction(&self) -> Result<Box<dyn LedgerTransaction>> {
        let tx = self.pool.begin().await.map_err(Error::Database)?;
        Ok(Box::new(PgLedgerTransaction { tx }))
    }
}

/// A PostgreSQL transaction; row reads take `FOR UPDATE` locks
pub struct PgLedgerTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn account_for_update(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {} FROM accounts WHERE id = $1 AND user_id = $2 FOR UPDATE",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn order_for_update(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Order>> {
        let row = sqlx::query_as::<_, DbOrder>(&format!(
            "SELECT {} FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE",
            ORDER_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn insert_account(&mut self, account: &Account) -> Result<()> {
        sqlx::query(
            "INSERT INTO accounts (id, user_id, account_name, account_type, currency, balance,
                                   initial_balance, is_default, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        )
        .bind(account.id)
        .bind(account.user_id)
        .bind(&account.account_name)
        .bind(account.account_type.as_str())
        .bind(account.currency.as_str())
        .bind(account.balance)
        .bind(account.initial_balance)
        .bind(account.is_default)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> Result<()> {
        let result = sqlx::query(
            "UPDATE accounts SET balance = $2, is_default = $3, updated_at = $4 WHERE id = $1"
        )
        .bind(account.id)
        .bind(account.balance)
        .bind(account.is_default)
        .bind(account.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Internal(format!("Failed to update account: {}", account.id)));
        }
        Ok(())
    }

    async fn clear_default_accounts(&mut self, user_id: Uuid) -> Result<()> {
        // Serializes default changes per user, including users with no rows yet
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;

        sqlx::query(
            "UPDATE accounts SET is_default = FALSE, updated_at = NOW()
             WHERE user_id = $1 AND is_default"
        )
        .bind(user_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(
            "INSERT INTO orders (id, user_id, account_id, symbol, api_symbol, name, instrument_type,
                                 currency, side, quantity, entry_price, stop_loss, take_profit,
                                 status, opened_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(order.account_id)
        .bind(&order.symbol)
        .bind(&order.api_symbol)
        .bind(&order.name)
        .bind(order.instrument_type.as_str())
        .bind(&order.currency)
        .bind(order.side.as_str())
        .bind(order.quantity)
        .bind(order.entry_price)
        .bind(order.stop_loss)
        .bind(order.take_profit)
        .bind(order.status.as_str())
        .bind(order.opened_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<()> {
        let result = sqlx::query(
            "UPDATE orders
             SET status = $2, closed_at = $3, close_price = $4, profit_loss = $5
             WHERE id = $1"
        )
        .bind(order.id)
        .bind(order.status.as_str())
        .bind(order.closed_at)
        .bind(order.close_price)
        .bind(order.profit_loss)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Internal(format!("Failed to update order: {}", order.id)));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await.map_err(Error::Database)
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await.map_err(Error::Database)
    }
}
