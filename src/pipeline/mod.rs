// src/pipeline/mod.rs

//! Pipeline entry points for crawler operations.
//!
//! - `run_urls`: Dump discovered listing URLs
//! - `run_crawl`: Build the dataset from sitemap URLs alone
//! - `run_images`: Mirror photos for an existing dataset
//! - `run_pipeline`: Crawl, mirror, publish

pub mod crawl;
pub mod download;

pub use crawl::{run_crawl, run_images, run_pipeline, run_urls};
pub use download::{DownloadCoordinator, RunCounters};
