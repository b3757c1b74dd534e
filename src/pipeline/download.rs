//! Image download coordinator.
//!
//! Drives a bounded pool of concurrent workers over the listing collection.
//! Each worker fetches the listing page, extracts candidate image URLs, and
//! mirrors them to `{images_root}/{listing-id}/image_NNN.ext`. Files already
//! on disk are never re-fetched, so re-runs are idempotent. A listing whose
//! page fetch fails yields an empty report; the pool never aborts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use reqwest::Client;
use url::Url;

use crate::error::Result;
use crate::models::{Config, ListingRecord, MediaAsset, MediaReport, RunStats};
use crate::services::{ImageExtractor, PageFetcher};

/// Completed-listing count between progress log lines.
const PROGRESS_INTERVAL: usize = 100;

/// Extension used when the image URL path has none.
const DEFAULT_EXTENSION: &str = ".jpg";

/// Shared run counters, safe under concurrent increment.
#[derive(Debug, Default)]
pub struct RunCounters {
    properties_processed: AtomicUsize,
    images_downloaded: AtomicUsize,
    images_skipped: AtomicUsize,
    errors: AtomicUsize,
}

impl RunCounters {
    pub fn snapshot(&self) -> RunStats {
        RunStats {
            properties_processed: self.properties_processed.load(Ordering::Relaxed),
            images_downloaded: self.images_downloaded.load(Ordering::Relaxed),
            images_skipped: self.images_skipped.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Bounded-concurrency image download pool.
pub struct DownloadCoordinator {
    client: Client,
    fetcher: PageFetcher,
    extractor: ImageExtractor,
    images_root: PathBuf,
    image_timeout: Duration,
    concurrency: usize,
    delay: Duration,
    counters: Arc<RunCounters>,
}

impl DownloadCoordinator {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            fetcher: PageFetcher::new(client.clone(), &config.crawler),
            extractor: ImageExtractor::new(&config.images),
            client,
            images_root: PathBuf::from(&config.images.root_dir),
            image_timeout: Duration::from_secs(config.images.download_timeout_secs),
            concurrency: config.crawler.max_concurrent.max(1),
            delay: Duration::from_millis(config.crawler.request_delay_ms),
            counters: Arc::new(RunCounters::default()),
        }
    }

    /// Override the image root, used by the `images` command and tests.
    pub fn with_images_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.images_root = root.into();
        self
    }

    /// Process every listing and return per-listing media reports plus the
    /// aggregate statistics.
    pub async fn run(
        &self,
        listings: &[ListingRecord],
    ) -> Result<(HashMap<String, MediaReport>, RunStats)> {
        let total = listings.len();
        let started = Instant::now();
        log::info!(
            "Downloading images for {total} listings with {} workers",
            self.concurrency
        );

        let mut reports = HashMap::with_capacity(total);
        let mut pool = stream::iter(listings)
            .map(|listing| async move {
                let report = self.process_listing(listing).await;
                (listing.id.clone(), report)
            })
            .buffer_unordered(self.concurrency);

        let mut completed = 0usize;
        while let Some((id, report)) = pool.next().await {
            reports.insert(id, report);
            completed += 1;

            if completed % PROGRESS_INTERVAL == 0 || completed == total {
                self.log_progress(completed, total, started.elapsed());
            }

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        let stats = self.counters.snapshot();
        log::info!(
            "Image run finished: {} listings, {} downloaded, {} skipped, {} errors",
            stats.properties_processed,
            stats.images_downloaded,
            stats.images_skipped,
            stats.errors
        );
        Ok((reports, stats))
    }

    /// Throughput and estimated remaining time from wall-clock elapsed.
    fn log_progress(&self, completed: usize, total: usize, elapsed: Duration) {
        let rate = completed as f64 / elapsed.as_secs_f64().max(f64::EPSILON);
        let remaining = (total - completed) as f64 / rate.max(f64::EPSILON);
        let stats = self.counters.snapshot();
        log::info!(
            "Progress: {completed}/{total} ({:.1}%) - {rate:.1} listings/s - ETA {:.1} min - {} images",
            completed as f64 / total.max(1) as f64 * 100.0,
            remaining / 60.0,
            stats.images_downloaded
        );
    }

    /// Fetch one listing's page and mirror its images.
    async fn process_listing(&self, listing: &ListingRecord) -> MediaReport {
        let page = match self.fetcher.fetch(&listing.url).await {
            Ok(page) => page,
            Err(e) => {
                log::warn!("Listing {} page fetch failed: {e}", listing.id);
                self.counters.errors.fetch_add(1, Ordering::Relaxed);
                self.counters
                    .properties_processed
                    .fetch_add(1, Ordering::Relaxed);
                return MediaReport::default();
            }
        };

        let image_urls = match Url::parse(&listing.url) {
            Ok(page_url) => self.extractor.extract(&page.body, &page_url),
            Err(_) => Vec::new(),
        };

        let mut assets = Vec::new();
        for (i, image_url) in image_urls.iter().enumerate() {
            let index = i + 1;
            let filename = format!("image_{index:03}{}", extension_for(image_url));
            let dest = self.images_root.join(&listing.id).join(&filename);

            let on_disk = match tokio::fs::try_exists(&dest).await {
                Ok(exists) => exists,
                Err(_) => false,
            };

            // Skip-if-exists keeps re-runs idempotent: no HTTP call is made
            // for a file already mirrored.
            if on_disk || self.download_image(image_url, &dest).await {
                assets.push(MediaAsset {
                    original_url: image_url.clone(),
                    local_path: format!("{}/{filename}", listing.id),
                    filename,
                    index,
                });
                self.counters
                    .images_downloaded
                    .fetch_add(1, Ordering::Relaxed);
            } else {
                self.counters.images_skipped.fetch_add(1, Ordering::Relaxed);
            }
        }

        self.counters
            .properties_processed
            .fetch_add(1, Ordering::Relaxed);
        MediaReport::from_assets(assets)
    }

    /// Download a single image to `dest`.
    ///
    /// The listing directory is created only once a response has passed the
    /// content-type check, so failed listings leave no empty directories.
    /// Returns false on any failure; image downloads are never retried here.
    async fn download_image(&self, image_url: &str, dest: &Path) -> bool {
        let response = match self
            .client
            .get(image_url)
            .timeout(self.image_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Image download failed for {image_url}: {e}");
                return false;
            }
        };

        if !response.status().is_success() {
            log::warn!(
                "Image download failed for {image_url}: HTTP {}",
                response.status()
            );
            return false;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.starts_with("image/") {
            log::warn!("Skipping {image_url}: content-type {content_type:?} is not an image");
            return false;
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Image body read failed for {image_url}: {e}");
                return false;
            }
        };

        if let Some(parent) = dest.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                log::warn!("Could not create {}: {e}", parent.display());
                return false;
            }
        }

        match tokio::fs::write(dest, &bytes).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Could not write {}: {e}", dest.display());
                false
            }
        }
    }
}

/// File extension from the URL path, defaulting to ".jpg".
fn extension_for(image_url: &str) -> String {
    Url::parse(image_url)
        .ok()
        .and_then(|url| {
            Path::new(url.path())
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
