//! Domain models for the ledger

pub mod account;
pub mod order;

pub use account::{Account, AccountType, Currency};
pub use order::{InstrumentType, Order, Side, Status};
