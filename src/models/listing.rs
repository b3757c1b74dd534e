//! Listing and media data structures.

use serde::{Deserialize, Serialize};

/// Property classification derived from the URL slug.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// "fazenda" - large working farm
    Farm,

    /// "rancho" / "haras" - ranch or stud farm
    Ranch,

    /// "sitio" / "chacara" - small rural holding
    SmallHolding,

    /// "terreno" - undeveloped plot
    Plot,

    /// "casa" - rural house
    RuralHouse,

    /// No recognized keyword in the slug
    #[default]
    Unclassified,
}

impl PropertyKind {
    /// Stable identifier, matching the JSON serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::Farm => "farm",
            PropertyKind::Ranch => "ranch",
            PropertyKind::SmallHolding => "small_holding",
            PropertyKind::Plot => "plot",
            PropertyKind::RuralHouse => "rural_house",
            PropertyKind::Unclassified => "unclassified",
        }
    }

    /// Human-readable label, matching the portal's own naming.
    pub fn label(&self) -> &'static str {
        match self {
            PropertyKind::Farm => "Fazenda",
            PropertyKind::Ranch => "Rancho",
            PropertyKind::SmallHolding => "Sítio/Chácara",
            PropertyKind::Plot => "Terreno",
            PropertyKind::RuralHouse => "Casa Rural",
            PropertyKind::Unclassified => "Não identificado",
        }
    }
}

/// A property listing parsed from a portal URL.
///
/// Immutable once parsed; identity is the listing code embedded in the URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingRecord {
    /// Listing code, unique per property (e.g. "TN2W4S")
    pub id: String,

    /// Title reconstructed from the slug
    pub title: String,

    /// Property classification
    #[serde(rename = "type")]
    pub kind: PropertyKind,

    /// Asking price in whole reais, if advertised
    pub price: Option<u64>,

    /// Display price ("R$ 22.400.000" or "Consulte")
    pub price_formatted: String,

    /// Area in hectares (at most one area field is set)
    pub area_hectares: Option<f64>,

    /// Area in square meters
    pub area_m2: Option<f64>,

    /// Area in alqueires (regional unit)
    pub area_alqueires: Option<f64>,

    /// City name
    pub city: String,

    /// Canonical state name (e.g. "Tocantins")
    pub state: String,

    /// Two-letter UF code (e.g. "TO"), empty when the state is unknown
    pub state_code: String,

    /// Full source URL
    pub url: String,

    /// Raw decoded slug the record was parsed from
    pub slug: String,
}

/// One image file associated with a listing, mirrored to local storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaAsset {
    /// Absolute source URL on the portal
    pub original_url: String,

    /// Path relative to the image root ({listing-id}/image_NNN.ext)
    pub local_path: String,

    /// File name within the listing directory
    pub filename: String,

    /// 1-based sequence index; determines the file name so re-runs
    /// are deterministic
    pub index: usize,
}

/// Media summary for a single listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaReport {
    /// Number of files recorded for the listing
    pub total_count: usize,

    /// Mirrored files, in sequence order
    pub files: Vec<MediaAsset>,
}

impl MediaReport {
    /// Build a report from a list of assets.
    pub fn from_assets(files: Vec<MediaAsset>) -> Self {
        Self {
            total_count: files.len(),
            files,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_default_is_unclassified() {
        assert_eq!(PropertyKind::default(), PropertyKind::Unclassified);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let json = serde_json::to_string(&PropertyKind::RuralHouse).unwrap();
        assert_eq!(json, "\"rural_house\"");
    }

    #[test]
    fn test_media_report_from_assets() {
        let report = MediaReport::from_assets(vec![MediaAsset {
            original_url: "https://cdn.example.com/a.jpg".to_string(),
            local_path: "AB12/image_001.jpg".to_string(),
            filename: "image_001.jpg".to_string(),
            index: 1,
        }]);
        assert_eq!(report.total_count, 1);
        assert_eq!(report.files[0].index, 1);
    }
}
