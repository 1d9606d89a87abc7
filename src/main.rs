//! Library catalog server
//!
//! Site pages, JSON API and admin endpoints for the library catalog.

use clap::Parser;

use library_catalog::{cli::Cli, config::AppConfig, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load()?;

    let _log_guard = logging::init(&config.logging)?;
    tracing::info!("Starting library catalog v{}", env!("CARGO_PKG_VERSION"));

    cli.run(config).await
}
