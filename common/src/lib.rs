//! Common types and utilities for the MoneyMind ledger
//!
//! This library contains the shared types used by every crate in the
//! workspace: the error taxonomy, decimal aliases for money, the Account and
//! Order domain models, and database pool/migration helpers.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, Result, ErrorExt, IntoError};
pub use decimal::*;

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
