//! Application configuration

use std::env;

use ledger_service::LedgerServiceConfig;
use market_data::QuoteConfig;

/// Default listen address
pub const DEFAULT_ADDR: &str = "127.0.0.1:3001";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listen address
    pub addr: String,
    /// Store and transaction settings
    pub ledger: LedgerServiceConfig,
    /// Quote provider settings
    pub quotes: QuoteConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            addr: env::var("API_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string()),
            ledger: LedgerServiceConfig::from_env(),
            quotes: QuoteConfig::from_env(),
        }
    }
}

impl AppConfig {
    /// Create a new configuration from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Replace the listen address when one was given on the command line
    pub fn with_addr(mut self, addr: Option<String>) -> Self {
        if let Some(addr) = addr {
            self.addr = addr;
        }
        self
    }
}
