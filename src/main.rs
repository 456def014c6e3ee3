mod config;
mod dom;
mod error;
mod extractor;
mod images;
mod loader;
mod pipeline;
mod session;
mod store;

use clap::Parser;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ScrapeConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ScrapeConfig::parse();
    let summary = pipeline::run(&config).await?;

    info!(
        "✅ Scraping complete. {} products saved to {} ({} of {} cards skipped, images in {}).",
        summary.records,
        summary.csv_path.display(),
        summary.skipped,
        summary.cards_found,
        summary.image_dir.display()
    );
    Ok(())
}
