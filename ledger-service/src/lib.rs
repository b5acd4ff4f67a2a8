//! Ledger service: cash accounts, simulated positions and the engine that
//! settles them

pub mod service;
pub mod repository;
pub mod config;

pub use service::{ClosedPosition, LedgerService, NewAccount, OpenPosition, RepositoryType};
pub use repository::{
    InMemoryLedgerRepository, LedgerRepository, LedgerTransaction, PostgresLedgerRepository,
};
pub use config::LedgerServiceConfig;
