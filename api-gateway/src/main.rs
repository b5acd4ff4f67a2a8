//! API Gateway for the MoneyMind ledger

use std::sync::Arc;

use api_gateway::auth::{IdentityResolver, PgSessionResolver, TrustedSessionResolver};
use api_gateway::config::AppConfig;
use api_gateway::{create_router, AppState};
use clap::Parser;
use common::db::{init_db_pool, run_migrations};
use dotenv::dotenv;
use ledger_service::{LedgerService, RepositoryType};
use market_data::HttpQuoteProvider;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter, FmtSubscriber};

/// MoneyMind ledger API server
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Listening address (defaults to API_ADDR or 127.0.0.1:3001)
    #[clap(short, long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging with debug level when DEBUG=1 env var is set
    let env = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("tower_http=debug,api_gateway=debug,ledger_service=info,market_data=info")?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_span_events(FmtSpan::CLOSE)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    debug!("Debug logging enabled");

    let config = AppConfig::from_env().with_addr(args.addr);

    let quotes = Arc::new(HttpQuoteProvider::new(&config.quotes)?);

    // Pick the store: PostgreSQL when configured, otherwise in-memory
    let (repository, identity): (RepositoryType, Arc<dyn IdentityResolver>) = match &config.ledger.database_url {
        Some(url) => {
            let pool = init_db_pool(url, config.ledger.db_pool_size).await?;
            if config.ledger.run_migrations {
                run_migrations(&pool).await?;
            }
            info!("Using PostgreSQL ledger store");
            (RepositoryType::Postgres(pool.clone()), Arc::new(PgSessionResolver::new(pool)))
        },
        None => {
            warn!("DATABASE_URL not set; using the in-memory store with trusted session cookies");
            (RepositoryType::InMemory, Arc::new(TrustedSessionResolver))
        },
    };

    let ledger = LedgerService::with_repository(repository, quotes)
        .with_transaction_logging(config.ledger.transaction_logging);

    let state = Arc::new(AppState::new(Arc::new(ledger), identity));

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(log_level))
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level))
        );

    // Start the server
    let addr: std::net::SocketAddr = config.addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    // Run until interrupt signal
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
