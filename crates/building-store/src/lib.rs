//! Building Store
//!
//! All access to building records goes through the [`BuildingStore`] trait.
//! Two implementations are provided:
//!
//! - [`PgBuildingStore`]: PostGIS table accessed with sqlx, one parameterized
//!   statement per operation
//! - [`MemoryStore`]: in-process store with the same ordering and filter
//!   semantics, used by tests and the `--memory` demo mode
//!
//! Aggregates (counts, averages, extremes) are always computed by the store.

pub mod memory;
pub mod postgres;
pub mod wkt;

use async_trait::async_trait;
use shared_types::{
    Building, BuildingTypeStatistics, GeometryError, HeightSummary, NearbyBuilding, NewBuilding,
};
use thiserror::Error;
use tracing::warn;

pub use memory::MemoryStore;
pub use postgres::{PgBuildingStore, PgStoreConfig};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Invalid building: {0}")]
    InvalidBuilding(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Largest height the `NUMERIC(8, 2)` column holds
pub const MAX_HEIGHT: f64 = 999_999.99;

impl StoreError {
    /// The record itself is unusable; other records may still load
    pub fn is_invalid_record(&self) -> bool {
        matches!(self, StoreError::InvalidBuilding(_) | StoreError::Geometry(_))
    }
}

/// Outcome of [`BuildingStore::load`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub inserted: usize,
    pub skipped: usize,
    pub cleared: u64,
}

/// Filter for [`BuildingStore::search`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    /// Any-of, case-insensitive substring match on `building_type`.
    /// Empty means no type restriction.
    pub building_types: Vec<String>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
    pub limit: i64,
}

impl SearchFilter {
    pub fn with_limit(limit: i64) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }
}

#[async_trait]
pub trait BuildingStore: Send + Sync {
    /// All buildings, tallest first
    async fn list(&self, limit: i64) -> StoreResult<Vec<Building>>;

    /// The `limit` tallest buildings
    async fn top_by_height(&self, limit: i64) -> StoreResult<Vec<Building>> {
        self.list(limit).await
    }

    async fn tallest(&self) -> StoreResult<Option<Building>>;

    async fn shortest(&self) -> StoreResult<Option<Building>>;

    async fn search(&self, filter: &SearchFilter) -> StoreResult<Vec<Building>>;

    /// Buildings within `radius_m` meters (geodesic), nearest first
    async fn nearby(&self, lat: f64, lng: f64, radius_m: f64)
        -> StoreResult<Vec<NearbyBuilding>>;

    /// Per-type aggregates, most common type first
    async fn statistics(&self) -> StoreResult<Vec<BuildingTypeStatistics>>;

    async fn summary(&self) -> StoreResult<HeightSummary>;

    async fn get(&self, id: i32) -> StoreResult<Option<Building>>;

    async fn random(&self, limit: i64) -> StoreResult<Vec<Building>>;

    /// Case-insensitive substring match on `building_type`, tallest first
    async fn by_type(&self, building_type: &str, limit: i64) -> StoreResult<Vec<Building>>;

    /// Tallest building whose name contains `name` (case-insensitive)
    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Building>>;

    /// Buildings whose name contains any of `names`, tallest first
    async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Building>>;

    /// Buildings with `min <= height <= max`, tallest first
    async fn in_height_range(&self, min: f64, max: f64, limit: i64)
        -> StoreResult<Vec<Building>>;

    /// Case-insensitive substring match on `address`, tallest first
    async fn search_address(&self, keyword: &str, limit: i64) -> StoreResult<Vec<Building>>;

    /// Number of buildings matching any of `building_types` (all when empty)
    async fn count(&self, building_types: &[String]) -> StoreResult<i64>;

    async fn insert(&self, building: &NewBuilding) -> StoreResult<i32>;

    /// Remove every building, returning how many were deleted
    async fn clear(&self) -> StoreResult<u64>;

    /// Bulk insert, optionally replacing the table first. Invalid records
    /// are skipped; any other error aborts the load.
    async fn load(&self, buildings: &[NewBuilding], replace: bool) -> StoreResult<LoadSummary> {
        let mut summary = LoadSummary::default();
        if replace {
            summary.cleared = self.clear().await?;
        }
        for building in buildings {
            match self.insert(building).await {
                Ok(_) => summary.inserted += 1,
                Err(e) if e.is_invalid_record() => {
                    warn!("Skipping building {}: {}", building.name, e);
                    summary.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(summary)
    }

    /// Release pooled resources. In-flight queries finish first.
    async fn close(&self);
}

/// Build an ILIKE pattern matching `text` anywhere, with LIKE wildcards escaped
pub fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Validate the parts of a new building that the database would otherwise reject
pub(crate) fn validate_new_building(building: &NewBuilding) -> StoreResult<()> {
    if !building.height.is_finite() || building.height < 0.0 {
        return Err(StoreError::InvalidBuilding(format!(
            "height must be a non-negative number (got {})",
            building.height
        )));
    }
    // Postgres rounds to two decimals before the precision check
    if (building.height * 100.0).round() / 100.0 > MAX_HEIGHT {
        return Err(StoreError::InvalidBuilding(format!(
            "height {} exceeds {} m",
            building.height, MAX_HEIGHT
        )));
    }
    shared_types::Geometry::polygon(&building.ring).outer_ring()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_wraps_text() {
        assert_eq!(contains_pattern("office"), "%office%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
    }

    #[test]
    fn test_validate_rejects_negative_height() {
        let building = NewBuilding {
            name: "Pit".to_string(),
            height: -1.0,
            building_type: "unknown".to_string(),
            address: None,
            ring: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
        };
        assert!(matches!(
            validate_new_building(&building),
            Err(StoreError::InvalidBuilding(_))
        ));
    }

    #[test]
    fn test_validate_rejects_height_beyond_column_precision() {
        let mut building = NewBuilding {
            name: "Needle".to_string(),
            height: 1_234_567.0,
            building_type: "unknown".to_string(),
            address: None,
            ring: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]],
        };
        assert!(matches!(
            validate_new_building(&building),
            Err(StoreError::InvalidBuilding(_))
        ));

        building.height = 999_999.996;
        assert!(validate_new_building(&building).is_err());

        building.height = MAX_HEIGHT;
        assert!(validate_new_building(&building).is_ok());
    }

    #[test]
    fn test_validate_rejects_open_ring() {
        let building = NewBuilding {
            name: "Open".to_string(),
            height: 10.0,
            building_type: "unknown".to_string(),
            address: None,
            ring: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        };
        assert!(matches!(
            validate_new_building(&building),
            Err(StoreError::Geometry(GeometryError::NotClosed))
        ));
    }
}
