use std::str::FromStr;

use async_trait::async_trait;
use common::decimal::{precision, Decimal, Price};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{QuoteError, QuoteProvider};
use crate::config::QuoteConfig;

/// Quote provider backed by a Twelve Data compatible REST API
/// (`GET {base_url}/price?symbol=..&apikey=..` returning `{"price": "..."}`)
#[derive(Clone)]
pub struct HttpQuoteProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpQuoteProvider {
    pub fn new(config: &QuoteConfig) -> Result<Self, QuoteError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()?;

        if config.api_key.is_none() {
            warn!("QUOTE_API_KEY is not set; closing positions will fail until it is configured");
        }

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl QuoteProvider for HttpQuoteProvider {
    async fn latest_price(&self, api_symbol: &str) -> Result<Price, QuoteError> {
        let api_key = self.api_key.as_deref().ok_or(QuoteError::MissingCredential)?;

        let symbol = api_symbol.trim();
        if symbol.is_empty() {
            return Err(QuoteError::InvalidSymbol(api_symbol.to_string()));
        }

        debug!("Fetching latest price for {}", symbol);

        let response = self.client
            .get(format!("{}/price", self.base_url))
            .query(&[("symbol", symbol), ("apikey", api_key)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuoteError::Status(response.status().as_u16()));
        }

        let payload: Value = response.json().await?;
        let price = parse_price(&payload)?;

        debug!("Latest price for {} is {}", symbol, price);
        Ok(price)
    }
}

/// Extract a positive price from a provider payload
fn parse_price(payload: &Value) -> Result<Price, QuoteError> {
    if payload.get("status").and_then(Value::as_str) == Some("error") {
        let message = payload.get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(QuoteError::Rejected(message.to_string()));
    }

    let raw = payload.get("price")
        .ok_or_else(|| QuoteError::Malformed("missing \"price\" field".to_string()))?;

    let price = match raw {
        Value::String(s) => Decimal::from_str(s.trim())
            .map_err(|_| QuoteError::InvalidPrice(s.clone()))?,
        Value::Number(n) => n.as_f64()
            .filter(|f| f.is_finite())
            .and_then(|f| Decimal::try_from(f).ok())
            .ok_or_else(|| QuoteError::InvalidPrice(n.to_string()))?,
        other => return Err(QuoteError::Malformed(format!("\"price\" is not numeric: {}", other))),
    };

    if price <= Decimal::ZERO {
        return Err(QuoteError::InvalidPrice(price.to_string()));
    }

    Ok(precision::round_price(price))
}
