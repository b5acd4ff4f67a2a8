//! API handlers
//!
//! Each handler resolves the caller, calls the ledger engine and wraps the
//! result in the `{success, message?, ...payload}` envelope.

pub mod account;
pub mod order;
pub mod response;

pub use response::ApiResponse;
