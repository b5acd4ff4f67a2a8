//! Configuration for the ledger service

use std::env;

/// Configuration for the ledger service
#[derive(Debug, Clone)]
pub struct LedgerServiceConfig {
    /// Database URL; without one the service runs on the in-memory store
    pub database_url: Option<String>,
    /// Database connection pool size
    pub db_pool_size: u32,
    /// Log transaction begin/commit/rollback
    pub transaction_logging: bool,
    /// Apply migrations on startup
    pub run_migrations: bool,
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

impl Default for LedgerServiceConfig {
    fn default() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            db_pool_size: env::var("DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            transaction_logging: env_flag("TRANSACTION_LOGGING", false),
            run_migrations: env_flag("RUN_MIGRATIONS", true),
        }
    }
}

impl LedgerServiceConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create a new configuration with custom values
    pub fn new(database_url: Option<String>, db_pool_size: u32, transaction_logging: bool) -> Self {
        Self {
            database_url,
            db_pool_size,
            transaction_logging,
            run_migrations: true,
        }
    }
}
