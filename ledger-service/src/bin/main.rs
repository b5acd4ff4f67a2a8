use clap::{Parser, Subcommand};
use common::db::{init_db_pool, run_migrations};
use dotenv::dotenv;
use ledger_service::LedgerServiceConfig;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Ledger Service CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate {
        /// Database URL
        #[arg(short, long)]
        database_url: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("ledger_service={},common={}", cli.log_level, cli.log_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LedgerServiceConfig::from_env();

    match cli.command {
        Commands::Migrate { database_url } => {
            let Some(url) = database_url.or(config.database_url.clone()) else {
                error!("No database URL given; pass --database-url or set DATABASE_URL");
                std::process::exit(2);
            };

            let pool = init_db_pool(&url, config.db_pool_size).await?;
            run_migrations(&pool).await?;
            info!("Migrations complete");
        }
        Commands::Config => {
            // Never print the database URL, it may carry a password
            info!(
                "database: {}, pool size: {}, transaction logging: {}, run migrations: {}",
                if config.database_url.is_some() { "postgres" } else { "in-memory" },
                config.db_pool_size,
                config.transaction_logging,
                config.run_migrations
            );
        }
    }

    Ok(())
}
