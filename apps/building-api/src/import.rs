//! GeoJSON ingestion for `building-api import`
//!
//! Reads the FeatureCollection produced by `osmium export` with the building
//! attribute mapping (`name`, `height`, `building_type`, `address`, `levels`)
//! and inserts one row per usable Polygon feature.

use std::path::Path;

use building_store::{BuildingStore, StoreError};
use serde::Deserialize;
use serde_json::{Map, Value};
use shared_types::{Geometry, NewBuilding};
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_HEIGHT: f64 = 10.0;
pub const METERS_PER_LEVEL: f64 = 3.0;
pub const METERS_PER_FOOT: f64 = 0.3048;
pub const DEFAULT_BUILDING_TYPE: &str = "unknown";
pub const DEFAULT_ADDRESS: &str = "Makkah, Saudi Arabia";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a FeatureCollection, found {0}")]
    NotFeatureCollection(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
    pub cleared: u64,
}

/// Height in meters from OSM `height` and `building:levels` tags.
///
/// `"25"`, `"25 m"` and `"82ft"` are understood; otherwise levels × 3 m,
/// otherwise 10 m.
pub fn parse_height(height: Option<&str>, levels: Option<&str>) -> f64 {
    if let Some(raw) = height {
        let lower = raw.trim().to_lowercase();
        let (number, factor) = match lower.strip_suffix("ft") {
            Some(feet) => (feet, METERS_PER_FOOT),
            None => (lower.strip_suffix('m').unwrap_or(&lower), 1.0),
        };
        if let Ok(value) = number.trim().parse::<f64>() {
            if value.is_finite() && value >= 0.0 {
                return value * factor;
            }
        }
    }

    if let Some(levels) = levels.and_then(|l| l.trim().parse::<u32>().ok()) {
        return f64::from(levels) * METERS_PER_LEVEL;
    }

    DEFAULT_HEIGHT
}

/// Property as text; osmium writes tags as strings but hand-made files use numbers
fn property(properties: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    match properties?.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Convert one feature; `ordinal` is the 1-based position among inserted buildings
pub fn feature_to_building(feature: &Feature, ordinal: usize) -> Result<NewBuilding, String> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| "feature has no geometry".to_string())?;
    let ring = geometry.outer_ring().map_err(|e| e.to_string())?;
    let props = feature.properties.as_ref();

    Ok(NewBuilding {
        name: property(props, "name").unwrap_or_else(|| format!("Building {}", ordinal)),
        height: parse_height(
            property(props, "height").as_deref(),
            property(props, "levels").as_deref(),
        ),
        building_type: property(props, "building_type")
            .unwrap_or_else(|| DEFAULT_BUILDING_TYPE.to_string()),
        address: Some(property(props, "address").unwrap_or_else(|| DEFAULT_ADDRESS.to_string())),
        ring,
    })
}

pub fn parse_features(text: &str) -> Result<Vec<Feature>, ImportError> {
    let collection: FeatureCollection = serde_json::from_str(text)?;
    if collection.kind != "FeatureCollection" {
        return Err(ImportError::NotFeatureCollection(collection.kind));
    }
    Ok(collection.features)
}

/// Insert every usable feature; bad features are logged and skipped
pub async fn import_geojson(
    store: &dyn BuildingStore,
    text: &str,
    replace: bool,
) -> Result<ImportSummary, ImportError> {
    let features = parse_features(text)?;
    let mut buildings = Vec::with_capacity(features.len());
    let mut unusable = 0;

    for (index, feature) in features.iter().enumerate() {
        match feature_to_building(feature, buildings.len() + 1) {
            Ok(building) => buildings.push(building),
            Err(reason) => {
                warn!("Skipping feature {}: {}", index, reason);
                unusable += 1;
            }
        }
    }

    let loaded = store.load(&buildings, replace).await?;
    if replace {
        info!("Removed {} existing buildings", loaded.cleared);
    }

    let summary = ImportSummary {
        imported: loaded.inserted,
        skipped: unusable + loaded.skipped,
        cleared: loaded.cleared,
    };
    info!(
        "Imported {} buildings ({} skipped)",
        summary.imported, summary.skipped
    );
    Ok(summary)
}

pub async fn import_file(
    store: &dyn BuildingStore,
    path: &Path,
    replace: bool,
) -> Result<ImportSummary, ImportError> {
    info!("Importing buildings from {}", path.display());
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ImportError::Read {
            path: path.display().to_string(),
            source,
        })?;
    import_geojson(store, &text, replace).await
}
