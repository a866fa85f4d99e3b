//! elevAIte RBAC server
//!
//! Entry point that loads configuration, sets up logging and dispatches to
//! the requested subcommand.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use elevaite_auth::JwtEncoder;
use elevaite_core::config::AppConfig;
use elevaite_core::config::logging::LoggingConfig;
use elevaite_database::DatabasePool;
use elevaite_database::migration::run_migrations;
use elevaite_database::repositories::UserRepository;

/// elevAIte RBAC: role-based access control for accounts, projects and their resources
#[derive(Debug, Parser)]
#[command(name = "elevaite-server", version, about, long_about = None)]
struct Cli {
    /// Configuration environment (loads `config/default` then `config/{env}`)
    #[arg(short, long, env = "ELEVAITE_ENV", default_value = "development")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Apply pending database migrations
    Migrate,
    /// Mint an access token for an existing user
    IssueToken {
        /// Email of the user
        #[arg(long, conflicts_with = "user_id", required_unless_present = "user_id")]
        email: Option<String>,
        /// Id of the user
        #[arg(long)]
        user_id: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("Failed to load configuration for '{}'", cli.config))?;

    init_logging(&config.logging);

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Migrate => migrate(config).await,
        Commands::IssueToken { email, user_id } => issue_token(config, email, user_id).await,
    }
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    tracing::info!("Starting elevAIte RBAC v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database)
        .await
        .context("Database connection failed")?;

    if config.database.migrate_on_start {
        run_migrations(db.pool()).await.context("Migration failed")?;
    }

    elevaite_api::run_server(config, db).await?;
    Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let db = DatabasePool::connect(&config.database)
        .await
        .context("Database connection failed")?;

    run_migrations(db.pool()).await.context("Migration failed")?;
    db.close().await;
    println!("Migrations applied");
    Ok(())
}

async fn issue_token(
    config: AppConfig,
    email: Option<String>,
    user_id: Option<Uuid>,
) -> anyhow::Result<()> {
    let db = DatabasePool::connect(&config.database)
        .await
        .context("Database connection failed")?;
    let users = UserRepository::new(db.pool().clone());

    let user = match (email, user_id) {
        (Some(email), _) => users.find_by_email(&email).await?,
        (None, Some(id)) => users.find_by_id(id).await?,
        (None, None) => anyhow::bail!("either --email or --user-id is required"),
    }
    .context("User not found")?;

    let encoder = JwtEncoder::new(&config.auth);
    let (token, expires_at) = encoder.generate_access_token(&user)?;
    db.close().await;

    println!("{token}");
    eprintln!("expires at {}", expires_at.to_rfc3339());
    Ok(())
}
