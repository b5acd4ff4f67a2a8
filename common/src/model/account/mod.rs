//! Account models and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{precision, Amount};
use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Kind of cash account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Broker,
    Bank,
    Crypto,
    Cash,
    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Broker => "broker",
            AccountType::Bank => "bank",
            AccountType::Crypto => "crypto",
            AccountType::Cash => "cash",
            AccountType::Other => "other",
        }
    }
}

impl FromStr for AccountType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broker" => Ok(AccountType::Broker),
            "bank" => Ok(AccountType::Bank),
            "crypto" => Ok(AccountType::Crypto),
            "cash" => Ok(AccountType::Cash),
            "other" => Ok(AccountType::Other),
            other => Err(Error::InvalidArgument(format!("Unsupported account type: {}", other))),
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported account currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Ron,
    Gbp,
    Chf,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Ron => "RON",
            Currency::Gbp => "GBP",
            Currency::Chf => "CHF",
        }
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "RON" => Ok(Currency::Ron),
            "GBP" => Ok(Currency::Gbp),
            "CHF" => Ok(Currency::Chf),
            other => Err(Error::InvalidArgument(format!("Unsupported currency: {}", other))),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's cash account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Display name
    pub account_name: String,
    /// Account type
    pub account_type: AccountType,
    /// Account currency
    pub currency: Currency,
    /// Current balance
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub balance: Amount,
    /// Balance at creation time
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub initial_balance: Amount,
    /// Whether this is the user's default account
    pub is_default: bool,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account. A negative initial balance is clamped to zero.
    pub fn new(
        user_id: Uuid,
        account_name: String,
        account_type: AccountType,
        currency: Currency,
        initial_balance: Amount,
        is_default: bool,
    ) -> Self {
        let now = Utc::now();
        let initial_balance = initial_balance.max(Amount::ZERO);
        Self {
            id: Uuid::new_v4(),
            user_id,
            account_name,
            account_type,
            currency,
            balance: initial_balance,
            initial_balance,
            is_default,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the balance
    pub fn set_balance(&mut self, balance: Amount) {
        self.balance = balance;
        self.updated_at = Utc::now();
    }

    /// Apply a realized profit or loss. The balance is left untouched when
    /// the result would not fit a stored amount.
    pub fn apply_pnl(&mut self, pnl: Amount) -> Result<(), Error> {
        let balance = self.balance
            .checked_add(pnl)
            .filter(|balance| precision::is_storable(*balance))
            .ok_or_else(|| Error::InvalidArgument(format!(
                "Balance of account {} would be out of range after applying {}",
                self.id, pnl
            )))?;

        self.set_balance(balance);
        Ok(())
    }
}
