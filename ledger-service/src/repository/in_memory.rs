use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::error::{Error, Result};
use common::model::account::Account;
use common::model::order::{Order, Status};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use uuid::Uuid;

use super::{sort_orders, LedgerRepository, LedgerTransaction};

/// Rows held by the in-memory store
#[derive(Debug, Default)]
pub struct LedgerState {
    pub accounts: HashMap<Uuid, Account>,
    pub orders: HashMap<Uuid, Order>,
}

/// In-memory repository for ledger data.
///
/// One lock guards all rows. A transaction owns the write half for its whole
/// lifetime, so transactions are serialized and readers only ever see
/// committed state.
#[derive(Clone, Default)]
pub struct InMemoryLedgerRepository {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedgerRepository {
    /// Create a new in-memory ledger repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        let mut accounts: Vec<Account> = state.accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(accounts)
    }

    async fn get_account(&self, user_id: Uuid, id: Uuid) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(&id).filter(|a| a.user_id == user_id).cloned())
    }

    async fn delete_account(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let mut state = self.state.write().await;
        let owned = state.accounts.get(&id).map_or(false, |a| a.user_id == user_id);
        if !owned {
            return Ok(false);
        }

        state.accounts.remove(&id);
        state.orders.retain(|_, order| order.account_id != id);
        Ok(true)
    }

    async fn get_order(&self, user_id: Uuid, id: Uuid) -> Result<Option<Order>> {
        let state = self.state.read().await;
        Ok(state.orders.get(&id).filter(|o| o.user_id == user_id).cloned())
    }

    async fn list_orders(
        &self,
        user_id: Uuid,
        status: Status,
        account_id: Option<Uuid>,
    ) -> Result<Vec<Order>> {
        let state = self.state.read().await;
        let mut orders: Vec<Order> = state.orders
            .values()
            .filter(|o| o.user_id == user_id && o.status == status)
            .filter(|o| account_id.map_or(true, |id| o.account_id == id))
            .cloned()
            .collect();
        sort_orders(&mut orders, status);
        Ok(orders)
    }

    async fn begin_transaction(&self) -> Result<Box<dyn LedgerTransaction>> {
        let guard = self.state.clone().write_owned().await;
        Ok(Box::new(InMemoryTransaction::new(guard)))
    }
}

/// In-memory transaction: holds the store's write lock and stages writes
/// until commit
pub struct InMemoryTransaction {
    state: OwnedRwLockWriteGuard<LedgerState>,
    accounts: HashMap<Uuid, Account>,
    orders: HashMap<Uuid, Order>,
}

impl InMemoryTransaction {
    fn new(state: OwnedRwLockWriteGuard<LedgerState>) -> Self {
        Self {
            state,
            accounts: HashMap::new(),
            orders: HashMap::new(),
        }
    }

    fn current_account(&self, id: &Uuid) -> Option<&Account> {
        self.accounts.get(id).or_else(|| self.state.accounts.get(id))
    }

    fn current_order(&self, id: &Uuid) -> Option<&Order> {
        self.orders.get(id).or_else(|| self.state.orders.get(id))
    }
}

#[async_trait]
impl LedgerTransaction for InMemoryTransaction {
    async fn account_for_update(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Account>> {
        Ok(self.current_account(&id).filter(|a| a.user_id == user_id).cloned())
    }

    async fn order_for_update(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Order>> {
        Ok(self.current_order(&id).filter(|o| o.user_id == user_id).cloned())
    }

    async fn insert_account(&mut self, account: &Account) -> Result<()> {
        if self.current_account(&account.id).is_some() {
            return Err(Error::Internal(format!("Duplicate account id: {}", account.id)));
        }
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn update_account(&mut self, account: &Account) -> Result<()> {
        if self.current_account(&account.id).is_none() {
            return Err(Error::Internal(format!("Account vanished during update: {}", account.id)));
        }
        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn clear_default_accounts(&mut self, user_id: Uuid) -> Result<()> {
        let defaults: Vec<Account> = self.state.accounts
            .keys()
            .chain(self.accounts.keys())
            .filter_map(|id| self.current_account(id))
            .filter(|a| a.user_id == user_id && a.is_default)
            .cloned()
            .collect();

        for mut account in defaults {
            account.is_default = false;
            self.accounts.insert(account.id, account);
        }
        Ok(())
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        if self.current_order(&order.id).is_some() {
            return Err(Error::Internal(format!("Duplicate order id: {}", order.id)));
        }
        if self.current_account(&order.account_id).is_none() {
            return Err(Error::Internal(format!("Order references missing account: {}", order.account_id)));
        }
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update_order(&mut self, order: &Order) -> Result<()> {
        if self.current_order(&order.id).is_none() {
            return Err(Error::Internal(format!("Order vanished during update: {}", order.id)));
        }
        self.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction { mut state, accounts, orders } = *self;
        state.accounts.extend(accounts);
        state.orders.extend(orders);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
