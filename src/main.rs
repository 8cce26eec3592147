use clap::Parser;
use tracing_subscriber::EnvFilter;

use upms::cli::{self, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = upms::config::config();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Starting UPMS API in {:?} mode", config.environment);

    cli::run(Cli::parse(), config).await
}
