//! Order (position) models and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{precision, Amount, Price, Quantity};
use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    /// Realized profit or loss of a position on this side
    pub fn pnl(&self, entry_price: Price, close_price: Price, quantity: Quantity) -> Result<Amount, Error> {
        let per_unit = match self {
            Side::Buy => close_price.checked_sub(entry_price),
            Side::Sell => entry_price.checked_sub(close_price),
        };

        per_unit
            .and_then(|diff| diff.checked_mul(quantity))
            .map(precision::round_amount)
            .filter(|pnl| precision::is_storable(*pnl))
            .ok_or_else(|| Error::InvalidArgument(format!(
                "Realized P&L for {} x ({} -> {}) is out of range",
                quantity, entry_price, close_price
            )))
    }
}

impl FromStr for Side {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Side::Buy),
            "sell" => Ok(Side::Sell),
            other => Err(Error::InvalidArgument(format!("Side must be buy or sell, got: {}", other))),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Instrument type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum InstrumentType {
    Crypto,
    Forex,
    #[default]
    Stocks,
}

impl InstrumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentType::Crypto => "crypto",
            InstrumentType::Forex => "forex",
            InstrumentType::Stocks => "stocks",
        }
    }

    /// Lenient parse: anything unknown (or missing) becomes `Stocks`
    pub fn normalize(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("crypto") => InstrumentType::Crypto,
            Some("forex") => InstrumentType::Forex,
            _ => InstrumentType::Stocks,
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Position is open
    Open,
    /// Position was closed and its P&L realized
    Closed,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::Closed => "closed",
        }
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Status::Open),
            "closed" => Ok(Status::Closed),
            other => Err(Error::Internal(format!("Unknown order status: {}", other))),
        }
    }
}

/// Simulated position backed by a cash account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Order {
    /// Unique order ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Backing account
    pub account_id: Uuid,
    /// Display symbol (e.g. "BTC/USD")
    pub symbol: String,
    /// Symbol used for quote lookups, when it differs from the display symbol
    pub api_symbol: Option<String>,
    /// Instrument name
    pub name: String,
    /// Instrument type
    pub instrument_type: InstrumentType,
    /// Instrument currency
    pub currency: String,
    /// Order side (buy or sell)
    pub side: Side,
    /// Position size
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub quantity: Quantity,
    /// Entry price
    #[cfg_attr(feature = "utoipa", schema(value_type = String))]
    pub entry_price: Price,
    /// Informational stop-loss
    #[cfg_attr(feature = "utoipa", schema(value_type = Option<String>))]
    pub stop_loss: Option<Price>,
    /// Informational take-profit
    #[cfg_attr(feature = "utoipa", schema(value_type = Option<String>))]
    pub take_profit: Option<Price>,
    /// Current status
    pub status: Status,
    /// Open timestamp
    pub opened_at: DateTime<Utc>,
    /// Close timestamp
    pub closed_at: Option<DateTime<Utc>>,
    /// Price the position was closed at
    #[cfg_attr(feature = "utoipa", schema(value_type = Option<String>))]
    pub close_price: Option<Price>,
    /// Realized profit or loss
    #[cfg_attr(feature = "utoipa", schema(value_type = Option<String>))]
    pub profit_loss: Option<Amount>,
}

impl Order {
    pub fn is_open(&self) -> bool {
        self.status == Status::Open
    }

    /// Symbol to send to the quote provider
    pub fn quote_symbol(&self) -> &str {
        match self.api_symbol.as_deref() {
            Some(api_symbol) if !api_symbol.trim().is_empty() => api_symbol,
            _ => &self.symbol,
        }
    }

    /// Transition `open -> closed` at the given price and return the realized P&L
    pub fn close(&mut self, close_price: Price, closed_at: DateTime<Utc>) -> Result<Amount, Error> {
        if !self.is_open() {
            return Err(Error::InvalidState(format!("Order {} is already closed", self.id)));
        }

        if !precision::is_storable(close_price) {
            return Err(Error::InvalidArgument(format!("Close price {} is out of range", close_price)));
        }

        let pnl = self.side.pnl(self.entry_price, close_price, self.quantity)?;
        self.status = Status::Closed;
        self.closed_at = Some(closed_at);
        self.close_price = Some(close_price);
        self.profit_loss = Some(pnl);
        Ok(pnl)
    }
}
