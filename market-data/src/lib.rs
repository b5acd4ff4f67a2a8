//! Price quote gateway: latest market prices from a third-party quote API

pub mod config;
pub mod quote;

pub use config::QuoteConfig;
pub use quote::{HttpQuoteProvider, QuoteError, QuoteProvider};
