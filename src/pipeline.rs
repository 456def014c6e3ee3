use anyhow::{Context, Result};
use scraper::Html;
use std::path::PathBuf;
use tracing::info;

use crate::config::ScrapeConfig;
use crate::dom::parse_selector;
use crate::extractor::extract_all;
use crate::images::ImageFetcher;
use crate::loader::{self, LoadPlan};
use crate::session::BrowserSession;
use crate::store::RecordStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub cards_found: usize,
    pub records: usize,
    pub skipped: usize,
    pub csv_path: PathBuf,
    pub image_dir: PathBuf,
}

/// Load, extract, persist. Errors returned from here are fatal for the run;
/// per-card problems are absorbed inside extraction.
pub async fn run(config: &ScrapeConfig) -> Result<RunSummary> {
    tokio::fs::create_dir_all(&config.image_dir)
        .await
        .with_context(|| format!("Failed to create {}", config.image_dir.display()))?;

    let fetcher = ImageFetcher::new(reqwest::Client::new(), &config.image_dir);
    fetcher
        .clear_previous()
        .await
        .with_context(|| format!("Failed to clear old images in {}", config.image_dir.display()))?;
    let selectors = config.selectors();
    let mut store = RecordStore::new();

    let (cards_found, skipped) = match &config.snapshot {
        Some(path) => {
            info!("📄 Reading snapshot {}", path.display());
            let html = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            let document = Html::parse_document(&html);
            let card_selector = parse_selector(&config.card_selector)?;
            let cards: Vec<_> = document.select(&card_selector).collect();
            info!("Found {} cards.", cards.len());
            let skipped = extract_all(&cards, &selectors, &fetcher, &mut store).await;
            (cards.len(), skipped)
        }
        None => {
            tokio::fs::create_dir_all(&config.debug_dir)
                .await
                .with_context(|| format!("Failed to create {}", config.debug_dir.display()))?;

            let session = BrowserSession::launch(config)?;
            session.navigate(&config.url)?;
            session.screenshot(&config.debug_dir.join("before_scroll.png"));

            info!("Scrolling to load more products...");
            loader::load(
                &session,
                LoadPlan {
                    iterations: config.scrolls,
                    delta_y: config.scroll_delta,
                    settle: config.settle_delay(),
                },
            )
            .await?;

            session.screenshot(&config.debug_dir.join("after_scroll.png"));
            session.dump_html(&config.debug_dir.join("after_scroll.html"));

            let cards = session.cards(&config.card_selector)?;
            info!("Found {} cards.", cards.len());
            let skipped = extract_all(&cards, &selectors, &fetcher, &mut store).await;
            (cards.len(), skipped)
        }
    };

    store.write_csv(&config.output_csv)?;

    Ok(RunSummary {
        cards_found,
        records: store.len(),
        skipped,
        csv_path: config.output_csv.clone(),
        image_dir: config.image_dir.clone(),
    })
}
