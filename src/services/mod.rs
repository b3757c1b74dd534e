// src/services/mod.rs

//! Network-facing services: sitemap walking, page fetching, image extraction.

pub mod fetcher;
pub mod images;
pub mod sitemap;

pub use fetcher::{FetchError, FetchedPage, PageFetcher};
pub use images::ImageExtractor;
pub use sitemap::SitemapWalker;
