// This is a metapackage for tests
// It wires the ledger router to in-memory collaborators

// Test helpers and utilities
pub mod test_helpers {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use api_gateway::auth::{TrustedSessionResolver, SESSION_COOKIE};
    use api_gateway::{create_router, AppState};
    use async_trait::async_trait;
    use axum::Router;
    use common::decimal::Price;
    use ledger_service::{LedgerService, RepositoryType};
    use market_data::{QuoteError, QuoteProvider};
    use uuid::Uuid;

    /// Quote provider answering from a price table; unknown symbols fail with 503
    #[derive(Default)]
    pub struct ScriptedQuotes {
        prices: Mutex<HashMap<String, Price>>,
    }

    impl ScriptedQuotes {
        pub fn set(&self, symbol: &str, price: Price) {
            self.table().insert(symbol.to_string(), price);
        }

        pub fn remove(&self, symbol: &str) {
            self.table().remove(symbol);
        }

        fn table(&self) -> std::sync::MutexGuard<'_, HashMap<String, Price>> {
            self.prices.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }
    }

    #[async_trait]
    impl QuoteProvider for ScriptedQuotes {
        async fn latest_price(&self, api_symbol: &str) -> Result<Price, QuoteError> {
            self.table().get(api_symbol).copied().ok_or(QuoteError::Status(503))
        }
    }

    /// Router over an in-memory ledger and scripted quotes
    pub struct TestApp {
        pub router: Router,
        pub quotes: Arc<ScriptedQuotes>,
        pub ledger: Arc<LedgerService>,
    }

    impl TestApp {
        pub fn new() -> Self {
            let quotes = Arc::new(ScriptedQuotes::default());
            let ledger = Arc::new(LedgerService::with_repository(RepositoryType::InMemory, quotes.clone()));
            let state = Arc::new(AppState::new(ledger.clone(), Arc::new(TrustedSessionResolver)));

            Self {
                router: create_router(state),
                quotes,
                ledger,
            }
        }
    }

    impl Default for TestApp {
        fn default() -> Self {
            Self::new()
        }
    }

    /// `Cookie` header value authenticating as `user_id`
    pub fn session_cookie(user_id: Uuid) -> String {
        format!("{}={}", SESSION_COOKIE, user_id)
    }
}
