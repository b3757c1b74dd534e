// src/storage/mod.rs

//! Dataset persistence.
//!
//! The dataset is published in two interchange formats: a JSON document
//! preserving nested media lists, and a flat CSV with one row per listing.
//! Both are written atomically (temp file + rename) so a crashed run never
//! leaves a truncated file that looks complete.

mod local;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Dataset;

pub use local::LocalStorage;

/// Where the published artifacts landed.
#[derive(Debug, Clone)]
pub struct WriteSummary {
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
    pub listing_count: usize,
}

/// Storage backend for the listing dataset.
#[async_trait]
pub trait ListingStorage: Send + Sync {
    /// Publish the dataset in both formats. All-or-nothing per format.
    async fn write_dataset(&self, dataset: &Dataset) -> Result<WriteSummary>;

    /// Load the most recently published dataset, if any.
    async fn load_dataset(&self) -> Result<Option<Dataset>>;
}
