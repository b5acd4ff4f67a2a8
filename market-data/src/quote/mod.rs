//! Quote provider abstraction
//!
//! The ledger engine only needs one thing from market data: the latest price
//! of an instrument at the moment a position is closed. Providers make a
//! single attempt per call and surface failures immediately.

mod http;

use async_trait::async_trait;
use common::decimal::Price;
use thiserror::Error;

pub use http::HttpQuoteProvider;

/// Reasons a quote could not be obtained
#[derive(Debug, Error)]
pub enum QuoteError {
    /// No provider credential is configured
    #[error("quote provider credential is not configured")]
    MissingCredential,

    /// Empty or otherwise unusable symbol
    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),

    /// Transport failure (connect, timeout, body read)
    #[error("quote request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Upstream answered with a non-success status
    #[error("quote provider returned HTTP {0}")]
    Status(u16),

    /// Upstream reported an error in the payload
    #[error("quote provider rejected the request: {0}")]
    Rejected(String),

    /// Payload did not contain a price
    #[error("malformed quote payload: {0}")]
    Malformed(String),

    /// Price was present but not a positive number
    #[error("invalid price in quote: {0}")]
    InvalidPrice(String),
}

/// Source of latest prices
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Latest price for `api_symbol`; always finite and positive on success
    async fn latest_price(&self, api_symbol: &str) -> Result<Price, QuoteError>;
}
