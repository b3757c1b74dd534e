//! Local filesystem storage implementation.
//!
//! ## Layout
//!
//! ```text
//! {dir}/
//! ├── {prefix}.json    # Nested dataset (listings + media summaries)
//! └── {prefix}.csv     # Flat table, one row per listing
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Dataset, DatasetEntry, OutputConfig};
use crate::storage::{ListingStorage, WriteSummary};

/// Delimiter joining list-valued fields into a single CSV cell.
const LIST_DELIMITER: &str = "; ";

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStorage {
    dir: PathBuf,
    prefix: String,
}

impl LocalStorage {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            prefix: config.prefix.clone(),
        }
    }

    /// Storage rooted at an explicit directory, used by tests.
    pub fn at(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    fn json_path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.prefix))
    }

    fn csv_path(&self) -> PathBuf {
        self.dir.join(format!("{}.csv", self.prefix))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp = path.with_extension(format!("{ext}.tmp"));

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Render the flat table. Row count always equals the listing count.
    fn to_csv(dataset: &Dataset) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record([
            "id",
            "title",
            "type",
            "price",
            "price_formatted",
            "area_hectares",
            "area_m2",
            "area_alqueires",
            "city",
            "state",
            "state_code",
            "url",
            "image_count",
            "image_files",
        ])?;

        for entry in &dataset.properties {
            writer.write_record(Self::csv_row(entry))?;
        }

        writer
            .into_inner()
            .map_err(|e| AppError::dataset(format!("CSV buffer error: {e}")))
    }

    fn csv_row(entry: &DatasetEntry) -> Vec<String> {
        let listing = &entry.listing;
        let files = entry
            .images
            .files
            .iter()
            .map(|asset| asset.local_path.as_str())
            .collect::<Vec<_>>()
            .join(LIST_DELIMITER);

        vec![
            listing.id.clone(),
            listing.title.clone(),
            listing.kind.as_str().to_string(),
            listing.price.map(|p| p.to_string()).unwrap_or_default(),
            listing.price_formatted.clone(),
            listing
                .area_hectares
                .map(|a| a.to_string())
                .unwrap_or_default(),
            listing.area_m2.map(|a| a.to_string()).unwrap_or_default(),
            listing
                .area_alqueires
                .map(|a| a.to_string())
                .unwrap_or_default(),
            listing.city.clone(),
            listing.state.clone(),
            listing.state_code.clone(),
            listing.url.clone(),
            entry.images.total_count.to_string(),
            files,
        ]
    }
}

#[async_trait]
impl ListingStorage for LocalStorage {
    async fn write_dataset(&self, dataset: &Dataset) -> Result<WriteSummary> {
        let json = serde_json::to_vec_pretty(dataset)?;
        let csv = Self::to_csv(dataset)?;

        let json_path = self.json_path();
        let csv_path = self.csv_path();

        self.write_bytes(&json_path, &json).await?;
        self.write_bytes(&csv_path, &csv).await?;

        Ok(WriteSummary {
            json_path,
            csv_path,
            listing_count: dataset.total_properties,
        })
    }

    async fn load_dataset(&self) -> Result<Option<Dataset>> {
        match tokio::fs::read(self.json_path()).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ListingRecord, MediaAsset, MediaReport, PropertyKind, RunStats};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn sample_listing(id: &str) -> ListingRecord {
        ListingRecord {
            id: id.to_string(),
            title: "Fazenda Em Cristalandia Tocantins".to_string(),
            kind: PropertyKind::Farm,
            price: Some(22_400_000),
            price_formatted: "R$ 22.400.000".to_string(),
            area_hectares: Some(803.0),
            area_m2: None,
            area_alqueires: None,
            city: "Cristalandia".to_string(),
            state: "Tocantins".to_string(),
            state_code: "TO".to_string(),
            url: format!("https://chaozao.com.br/imovel/fazenda/{id}"),
            slug: "fazenda-em-cristalandia-tocantins".to_string(),
        }
    }

    fn sample_dataset() -> Dataset {
        let mut dataset = Dataset::from_listings(
            vec![sample_listing("TN2W4S"), sample_listing("AB12CD")],
            1.5,
        );
        let mut reports = HashMap::new();
        reports.insert(
            "TN2W4S".to_string(),
            MediaReport::from_assets(vec![
                MediaAsset {
                    original_url: "https://cdn.chaozao.com.br/1.jpg".to_string(),
                    local_path: "TN2W4S/image_001.jpg".to_string(),
                    filename: "image_001.jpg".to_string(),
                    index: 1,
                },
                MediaAsset {
                    original_url: "https://cdn.chaozao.com.br/2.jpg".to_string(),
                    local_path: "TN2W4S/image_002.jpg".to_string(),
                    filename: "image_002.jpg".to_string(),
                    index: 2,
                },
            ]),
        );
        dataset.attach_media(reports, RunStats::default());
        dataset
    }

    #[tokio::test]
    async fn test_round_trip_preserves_ids_and_media_counts() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::at(tmp.path(), "dataset");

        let dataset = sample_dataset();
        storage.write_dataset(&dataset).await.unwrap();

        let loaded = storage.load_dataset().await.unwrap().unwrap();
        assert_eq!(loaded.ids(), dataset.ids());
        assert_eq!(loaded.properties[0].images.total_count, 2);
        assert_eq!(loaded.properties[1].images.total_count, 0);
    }

    #[tokio::test]
    async fn test_csv_row_count_matches_listing_count() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::at(tmp.path(), "dataset");

        let dataset = sample_dataset();
        let summary = storage.write_dataset(&dataset).await.unwrap();

        let content = std::fs::read_to_string(summary.csv_path).unwrap();
        let rows = content.lines().count();
        assert_eq!(rows, dataset.total_properties + 1); // header + one per listing
    }

    #[tokio::test]
    async fn test_csv_joins_media_files() {
        let dataset = sample_dataset();
        let csv = LocalStorage::to_csv(&dataset).unwrap();
        let content = String::from_utf8(csv).unwrap();
        assert!(content.contains("TN2W4S/image_001.jpg; TN2W4S/image_002.jpg"));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::at(tmp.path(), "dataset");

        storage.write_dataset(&sample_dataset()).await.unwrap();

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_dataset_is_none() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::at(tmp.path(), "dataset");
        assert!(storage.load_dataset().await.unwrap().is_none());
    }
}
