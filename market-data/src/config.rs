//! Configuration for the quote gateway

use std::env;
use std::time::Duration;

/// Default upstream quote API
pub const DEFAULT_QUOTE_API_URL: &str = "https://api.twelvedata.com";

/// Configuration for the quote gateway
#[derive(Debug, Clone)]
pub struct QuoteConfig {
    /// Base URL of the quote provider
    pub base_url: String,
    /// Provider credential; lookups fail while it is unset
    pub api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("QUOTE_API_URL")
                .unwrap_or_else(|_| DEFAULT_QUOTE_API_URL.to_string()),
            api_key: env::var("QUOTE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            timeout_secs: env::var("QUOTE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        }
    }
}

impl QuoteConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a new configuration with custom values
    pub fn new(base_url: String, api_key: Option<String>, timeout_secs: u64) -> Self {
        Self {
            base_url,
            api_key,
            timeout_secs,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
