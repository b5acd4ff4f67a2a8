//! Account and order stores
//!
//! [`LedgerRepository`] is the plain data-access surface: user-scoped reads
//! and the few writes that need no coordination. Everything that must be
//! atomic goes through a [`LedgerTransaction`], whose `*_for_update` reads
//! lock the returned row until commit or rollback. Dropping a transaction
//! without committing discards its writes.

mod in_memory;
mod postgres;

use async_trait::async_trait;
use common::error::Result;
use common::model::account::Account;
use common::model::order::{Order, Status};
use uuid::Uuid;

pub use in_memory::{InMemoryLedgerRepository, InMemoryTransaction};
pub use postgres::{PgLedgerTransaction, PostgresLedgerRepository};

/// Ledger repository trait defining the interface for account and order storage
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// All accounts of a user, oldest first
    async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<Account>>;

    /// An account, only if it belongs to `user_id`
    async fn get_account(&self, user_id: Uuid, id: Uuid) -> Result<Option<Account>>;

    /// Delete an account and its orders; false when nothing owned by `user_id` matched
    async fn delete_account(&self, user_id: Uuid, id: Uuid) -> Result<bool>;

    /// An order, only if it belongs to `user_id`
    async fn get_order(&self, user_id: Uuid, id: Uuid) -> Result<Option<Order>>;

    /// Orders of a user in the given status, optionally restricted to one account.
    /// Open orders come newest-opened first, closed orders newest-closed first.
    async fn list_orders(
        &self,
        user_id: Uuid,
        status: Status,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Order>>;

    /// Begin a transaction
    async fn begin_transaction(&self) -> Result<Box<dyn LedgerTransaction>>;
}

/// Unit of atomic work against the stores
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Read and lock an account owned by `user_id`
    async fn account_for_update(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Account>>;

    /// Read and lock an order owned by `user_id`
    async fn order_for_update(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Order>>;

    async fn insert_account(&mut self, account: &Account) -> Result<()>;

    async fn update_account(&mut self, account: &Account) -> Result<()>;

    /// Set `is_default = false` on every account of the user. Serializes
    /// concurrent default changes for that user until the transaction ends.
    async fn clear_default_accounts(&mut self, user_id: Uuid) -> Result<()>;

    async fn insert_order(&mut self, order: &Order) -> Result<()>;

    async fn update_order(&mut self, order: &Order) -> Result<()>;

    /// Commit the transaction
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Rollback the transaction
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Sort key helpers shared by the store implementations
pub(crate) fn sort_orders(orders: &mut [Order], status: Status) {
    match status {
        Status::Open => orders.sort_by(|a, b| b.opened_at.cmp(&a.opened_at).then(b.id.cmp(&a.id))),
        Status::Closed => orders.sort_by(|a, b| {
            b.closed_at.cmp(&a.closed_at)
                .then(b.opened_at.cmp(&a.opened_at))
                .then(b.id.cmp(&a.id))
        }),
    }
}
