// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod dataset;
mod listing;

// Re-export all public types
pub use config::{Config, CrawlerConfig, ImageConfig, OutputConfig};
pub use dataset::{Dataset, DatasetEntry, RunStats};
pub use listing::{ListingRecord, MediaAsset, MediaReport, PropertyKind};
