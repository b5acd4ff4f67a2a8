use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::model::account::Account;
use crate::model::order::{InstrumentType, Order};

/// Database model for the accounts table
#[derive(Debug, Clone, FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_name: String,
    pub account_type: String,
    pub currency: String,
    pub balance: Decimal,
    pub initial_balance: Decimal,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<DbAccount> for Account {
    type Error = Error;

    fn try_from(row: DbAccount) -> Result<Self> {
        Ok(Account {
            id: row.id,
            user_id: row.user_id,
            account_name: row.account_name,
            account_type: row.account_type.parse()
                .map_err(|_| Error::Internal(format!("Invalid account_type in row {}", row.id)))?,
            currency: row.currency.parse()
                .map_err(|_| Error::Internal(format!("Invalid currency in row {}", row.id)))?,
            balance: row.balance,
            initial_balance: row.initial_balance,
            is_default: row.is_default,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Database model for the orders table
#[derive(Debug, Clone, FromRow)]
pub struct DbOrder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub account_id: Uuid,
    pub symbol: String,
    pub api_symbol: Option<String>,
    pub name: String,
    pub instrument_type: String,
    pub currency: String,
    pub side: String,
    pub quantity: Decimal,
    pub entry_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    pub status: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub close_price: Option<Decimal>,
    pub profit_loss: Option<Decimal>,
}

impl TryFrom<DbOrder> for Order {
    type Error = Error;

    fn try_from(row: DbOrder) -> Result<Self> {
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            account_id: row.account_id,
            symbol: row.symbol,
            api_symbol: row.api_symbol,
            name: row.name,
            instrument_type: InstrumentType::normalize(Some(&row.instrument_type)),
            currency: row.currency,
            side: row.side.parse()
                .map_err(|_| Error::Internal(format!("Invalid side in row {}", row.id)))?,
            quantity: row.quantity,
            entry_price: row.entry_price,
            stop_loss: row.stop_loss,
            take_profit: row.take_profit,
            status: row.status.parse()?,
            opened_at: row.opened_at,
            closed_at: row.closed_at,
            close_price: row.close_price,
            profit_loss: row.profit_loss,
        })
    }
}
