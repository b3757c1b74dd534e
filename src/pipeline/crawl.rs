//! Pipeline entry points.
//!
//! - `run_urls`: dump discovered listing URLs to a text file
//! - `run_crawl`: sitemap → parse → dataset, no images
//! - `run_images`: mirror photos for an existing dataset
//! - `run_pipeline`: full run end to end

use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{Config, Dataset, ListingRecord, PropertyKind};
use crate::parser::parse_listing_url;
use crate::services::SitemapWalker;
use crate::storage::ListingStorage;
use crate::utils::http;

use super::download::DownloadCoordinator;

/// Walk the sitemap and parse every listing URL.
///
/// URLs that do not match the listing shape are skipped, not errors.
async fn discover_listings(
    config: &Config,
    client: &Client,
    sample: Option<usize>,
) -> Result<Vec<ListingRecord>> {
    let walker = SitemapWalker::new(client.clone(), &config.crawler);
    let urls = walker.discover().await?;

    let mut listings = Vec::with_capacity(urls.len());
    let mut skipped = 0usize;
    for url in &urls {
        match parse_listing_url(url) {
            Some(record) => listings.push(record),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        log::warn!("{skipped} sitemap URLs did not match the listing shape");
    }

    if let Some(limit) = sample {
        listings.truncate(limit);
        log::info!("Sampling first {} listings", listings.len());
    }

    Ok(listings)
}

/// Discover listing URLs and write them, one per line, to a text file.
pub async fn run_urls(config: &Config, output: &Path) -> Result<usize> {
    let client = http::create_client(&config.crawler)?;
    let walker = SitemapWalker::new(client, &config.crawler);
    let urls = walker.discover().await?;

    let mut body = urls.join("\n");
    body.push('\n');
    tokio::fs::write(output, body).await?;

    log::info!("{} URLs written to {}", urls.len(), output.display());
    Ok(urls.len())
}

/// Crawl the sitemap into a dataset without touching listing pages.
pub async fn run_crawl(
    config: &Config,
    storage: &dyn ListingStorage,
    sample: Option<usize>,
) -> Result<Dataset> {
    let started = Instant::now();
    let client = http::create_client(&config.crawler)?;

    let listings = discover_listings(config, &client, sample).await?;
    let dataset = Dataset::from_listings(listings, started.elapsed().as_secs_f64());

    log_distribution(&dataset);
    let summary = storage.write_dataset(&dataset).await?;
    log::info!(
        "Dataset with {} listings written to {} and {}",
        summary.listing_count,
        summary.json_path.display(),
        summary.csv_path.display()
    );

    Ok(dataset)
}

/// Mirror photos for a previously written dataset, then rewrite it with the
/// media summaries attached.
pub async fn run_images(
    config: &Config,
    storage: &dyn ListingStorage,
    sample: Option<usize>,
) -> Result<Dataset> {
    let mut dataset = storage
        .load_dataset()
        .await?
        .ok_or_else(|| AppError::dataset("no dataset found; run 'crawl' first"))?;

    let mut listings: Vec<ListingRecord> = dataset
        .properties
        .iter()
        .map(|entry| entry.listing.clone())
        .collect();
    if let Some(limit) = sample {
        listings.truncate(limit);
        log::info!("Sampling first {} listings for image download", listings.len());
    }

    let client = http::create_client(&config.crawler)?;
    let coordinator = DownloadCoordinator::new(client, config);
    let (reports, stats) = coordinator.run(&listings).await?;

    dataset.attach_media(reports, stats);
    storage.write_dataset(&dataset).await?;

    Ok(dataset)
}

/// Full pipeline: crawl, mirror images, publish once at the end.
pub async fn run_pipeline(
    config: &Config,
    storage: &dyn ListingStorage,
    sample: Option<usize>,
) -> Result<Dataset> {
    let started = Instant::now();
    let client = http::create_client(&config.crawler)?;

    log::info!("Step 1/3: Walking sitemap and parsing listings");
    let listings = discover_listings(config, &client, sample).await?;

    log::info!("Step 2/3: Mirroring listing photos");
    let coordinator = DownloadCoordinator::new(client, config);
    let (reports, stats) = coordinator.run(&listings).await?;

    log::info!("Step 3/3: Writing dataset");
    let mut dataset = Dataset::from_listings(listings, started.elapsed().as_secs_f64());
    dataset.attach_media(reports, stats);
    log_distribution(&dataset);

    let summary = storage.write_dataset(&dataset).await?;
    log::info!(
        "Pipeline complete: {} listings in {} and {}",
        summary.listing_count,
        summary.json_path.display(),
        summary.csv_path.display()
    );

    Ok(dataset)
}

/// Log kind and state distributions, the quick sanity check operators use to
/// spot a broken parse.
fn log_distribution(dataset: &Dataset) {
    let mut kinds: HashMap<PropertyKind, usize> = HashMap::new();
    let mut states: HashMap<&str, usize> = HashMap::new();
    let mut priced = 0usize;

    for entry in &dataset.properties {
        *kinds.entry(entry.listing.kind).or_default() += 1;
        if !entry.listing.state.is_empty() {
            *states.entry(entry.listing.state.as_str()).or_default() += 1;
        }
        if entry.listing.price.is_some() {
            priced += 1;
        }
    }

    let total = dataset.total_properties.max(1);
    let mut kinds: Vec<_> = kinds.into_iter().collect();
    kinds.sort_by(|a, b| b.1.cmp(&a.1));
    for (kind, count) in kinds {
        log::info!(
            "  {}: {count} ({:.1}%)",
            kind.label(),
            count as f64 / total as f64 * 100.0
        );
    }

    let mut states: Vec<_> = states.into_iter().collect();
    states.sort_by(|a, b| b.1.cmp(&a.1));
    for (state, count) in states.iter().take(10) {
        log::info!("  {state}: {count} listings");
    }

    log::info!(
        "  {priced}/{} listings have an advertised price",
        dataset.total_properties
    );
}
