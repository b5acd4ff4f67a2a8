//! Error types for the ledger
//!
//! This module provides the unified error type shared by the stores, the
//! ledger engine and the HTTP layer. Client-facing kinds (invalid argument,
//! not found, invalid state, upstream unavailable) carry a human-readable
//! message; the remaining kinds are internal failures.

use std::fmt::Display;
use thiserror::Error;

/// Ledger error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing field, or an out-of-range value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Account does not exist or is not owned by the caller
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Order does not exist or is not owned by the caller
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Operation is not legal for the entity's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The quote provider failed
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Caller identity could not be resolved
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

impl Error {
    /// True for the not-found kinds, which must never leak whether another
    /// user's row exists
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::AccountNotFound(_) | Error::OrderNotFound(_))
    }

    /// True for failures caused by the request itself rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgument(_)
                | Error::AccountNotFound(_)
                | Error::OrderNotFound(_)
                | Error::InvalidState(_)
                | Error::Unauthorized(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::InvalidArgument(msg) => Error::InvalidArgument(format!("{}: {}", context, msg)),
                Error::AccountNotFound(msg) => Error::AccountNotFound(format!("{}: {}", context, msg)),
                Error::OrderNotFound(msg) => Error::OrderNotFound(format!("{}: {}", context, msg)),
                Error::InvalidState(msg) => Error::InvalidState(format!("{}: {}", context, msg)),
                Error::UpstreamUnavailable(msg) => Error::UpstreamUnavailable(format!("{}: {}", context, msg)),
                Error::Unauthorized(msg) => Error::Unauthorized(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

/// Convert string messages into an error
impl From<String> for Error {
    fn from(message: String) -> Self {
        Error::Internal(message)
    }
}

/// Convert static string references into an error
impl From<&str> for Error {
    fn from(message: &str) -> Self {
        Error::Internal(message.to_string())
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
