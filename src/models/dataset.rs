//! Dataset assembly and run statistics.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::listing::{ListingRecord, MediaReport};

/// One dataset row: a listing plus its media summary.
///
/// Every entry carries a media report; listings that were never processed by
/// the image pipeline get an explicit empty one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatasetEntry {
    #[serde(flatten)]
    pub listing: ListingRecord,

    #[serde(default)]
    pub images: MediaReport,
}

/// The full extraction result, written once at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Number of listings in the dataset
    pub total_properties: usize,

    /// When the extraction finished
    pub extraction_date: DateTime<Utc>,

    /// Wall-clock duration of the run in seconds
    pub extraction_time_seconds: f64,

    /// Image download statistics, present after an image run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_stats: Option<RunStats>,

    /// All listings, in sitemap discovery order
    pub properties: Vec<DatasetEntry>,
}

impl Dataset {
    /// Build a dataset from parsed listings, all with empty media reports.
    pub fn from_listings(listings: Vec<ListingRecord>, elapsed_seconds: f64) -> Self {
        let properties = listings
            .into_iter()
            .map(|listing| DatasetEntry {
                listing,
                images: MediaReport::default(),
            })
            .collect::<Vec<_>>();

        Self {
            total_properties: properties.len(),
            extraction_date: Utc::now(),
            extraction_time_seconds: elapsed_seconds,
            image_stats: None,
            properties,
        }
    }

    /// Merge per-listing media reports into the dataset, keyed by listing id.
    ///
    /// Listings without a report keep an explicit empty `MediaReport`.
    pub fn attach_media(&mut self, mut reports: HashMap<String, MediaReport>, stats: RunStats) {
        for entry in &mut self.properties {
            entry.images = reports.remove(&entry.listing.id).unwrap_or_default();
        }
        self.image_stats = Some(stats);
    }

    /// Listing ids in dataset order.
    pub fn ids(&self) -> Vec<&str> {
        self.properties
            .iter()
            .map(|e| e.listing.id.as_str())
            .collect()
    }
}

/// Aggregate counters for an image download run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStats {
    /// Listings the pool has finished with (success or failure)
    pub properties_processed: usize,

    /// Images written to disk or already present from a previous run
    pub images_downloaded: usize,

    /// Images skipped (failed download or non-image response)
    pub images_skipped: usize,

    /// Page-level failures
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaAsset, PropertyKind};

    fn sample_listing(id: &str) -> ListingRecord {
        ListingRecord {
            id: id.to_string(),
            title: "Fazenda Em Teste".to_string(),
            kind: PropertyKind::Farm,
            price: Some(1_000_000),
            price_formatted: "R$ 1.000.000".to_string(),
            area_hectares: Some(100.0),
            area_m2: None,
            area_alqueires: None,
            city: "Teste".to_string(),
            state: "Goiás".to_string(),
            state_code: "GO".to_string(),
            url: format!("https://chaozao.com.br/imovel/fazenda-em-teste/{id}"),
            slug: "fazenda-em-teste".to_string(),
        }
    }

    #[test]
    fn test_attach_media_fills_missing_with_empty() {
        let mut dataset =
            Dataset::from_listings(vec![sample_listing("AAA"), sample_listing("BBB")], 1.0);

        let mut reports = HashMap::new();
        reports.insert(
            "AAA".to_string(),
            MediaReport::from_assets(vec![MediaAsset {
                original_url: "https://cdn.example.com/1.jpg".to_string(),
                local_path: "AAA/image_001.jpg".to_string(),
                filename: "image_001.jpg".to_string(),
                index: 1,
            }]),
        );

        dataset.attach_media(reports, RunStats::default());

        assert_eq!(dataset.properties[0].images.total_count, 1);
        assert_eq!(dataset.properties[1].images.total_count, 0);
        assert!(dataset.properties[1].images.files.is_empty());
        assert!(dataset.image_stats.is_some());
    }

    #[test]
    fn test_dataset_counts_match() {
        let dataset = Dataset::from_listings(vec![sample_listing("AAA")], 0.5);
        assert_eq!(dataset.total_properties, dataset.properties.len());
        assert_eq!(dataset.ids(), vec!["AAA"]);
    }
}
