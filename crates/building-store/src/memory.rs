//! In-process building store
//!
//! Mirrors the ordering and filter semantics of the PostGIS store so the API
//! and chat engine can run without a database. Distances are geodesic, taken
//! to the centroid of the footprint's ring vertices rather than to the
//! nearest edge.

use async_trait::async_trait;
use geo::{Distance, Geodesic, Point};
use rand::seq::SliceRandom;
use shared_types::{
    Building, BuildingTypeStatistics, Geometry, HeightSummary, NearbyBuilding, NewBuilding,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};
use tokio::sync::RwLock;

use crate::{validate_new_building, BuildingStore, SearchFilter, StoreResult};

pub struct MemoryStore {
    buildings: RwLock<Vec<Building>>,
    next_id: AtomicI32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            buildings: RwLock::new(Vec::new()),
            next_id: AtomicI32::new(1),
        }
    }

    /// Create a store holding `buildings` as-is (ids are kept)
    pub fn with_buildings(buildings: Vec<Building>) -> Self {
        let next_id = buildings.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        Self {
            buildings: RwLock::new(buildings),
            next_id: AtomicI32::new(next_id),
        }
    }

    /// Apply `keep` and return matches tallest first, capped at `limit`
    async fn select<F>(&self, limit: i64, keep: F) -> Vec<Building>
    where
        F: Fn(&Building) -> bool,
    {
        let buildings = self.buildings.read().await;
        let mut matched: Vec<Building> = buildings.iter().filter(|&b| keep(b)).cloned().collect();
        sort_tallest_first(&mut matched);
        matched.truncate(limit.max(0) as usize);
        matched
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_tallest_first(buildings: &mut [Building]) {
    buildings.sort_by(|a, b| b.height.total_cmp(&a.height).then(a.id.cmp(&b.id)));
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches_any_type(building: &Building, building_types: &[String]) -> bool {
    building_types.is_empty()
        || building_types
            .iter()
            .any(|t| contains_ci(&building.building_type, t))
}

/// Centroid of the unique ring vertices, as (lng, lat)
fn ring_centroid(geometry: &Geometry) -> Option<Point<f64>> {
    let ring = geometry.outer_ring().ok()?;
    let unique = &ring[..ring.len() - 1];
    let n = unique.len() as f64;
    let (lng, lat) = unique
        .iter()
        .fold((0.0, 0.0), |(x, y), [lng, lat]| (x + lng, y + lat));
    Some(Point::new(lng / n, lat / n))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl BuildingStore for MemoryStore {
    async fn list(&self, limit: i64) -> StoreResult<Vec<Building>> {
        Ok(self.select(limit, |_| true).await)
    }

    async fn tallest(&self) -> StoreResult<Option<Building>> {
        Ok(self.select(1, |_| true).await.into_iter().next())
    }

    async fn shortest(&self) -> StoreResult<Option<Building>> {
        let buildings = self.buildings.read().await;
        Ok(buildings
            .iter()
            .min_by(|a, b| a.height.total_cmp(&b.height).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn search(&self, filter: &SearchFilter) -> StoreResult<Vec<Building>> {
        Ok(self
            .select(filter.limit, |b| {
                matches_any_type(b, &filter.building_types)
                    && filter.min_height.map_or(true, |min| b.height >= min)
                    && filter.max_height.map_or(true, |max| b.height <= max)
            })
            .await)
    }

    async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_m: f64,
    ) -> StoreResult<Vec<NearbyBuilding>> {
        let origin = Point::new(lng, lat);
        let buildings = self.buildings.read().await;

        let mut found: Vec<NearbyBuilding> = buildings
            .iter()
            .filter_map(|b| {
                let distance = Geodesic::distance(origin, ring_centroid(&b.geometry)?);
                (distance <= radius_m).then(|| NearbyBuilding {
                    building: b.clone(),
                    distance,
                })
            })
            .collect();
        found.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        Ok(found)
    }

    async fn statistics(&self) -> StoreResult<Vec<BuildingTypeStatistics>> {
        let buildings = self.buildings.read().await;

        let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for b in buildings.iter() {
            groups.entry(b.building_type.as_str()).or_default().push(b.height);
        }

        let mut stats: Vec<BuildingTypeStatistics> = groups
            .into_iter()
            .map(|(building_type, heights)| {
                let count = heights.len();
                BuildingTypeStatistics {
                    building_type: building_type.to_string(),
                    count: count as i64,
                    avg_height: heights.iter().sum::<f64>() / count as f64,
                    max_height: heights.iter().copied().fold(f64::MIN, f64::max),
                    min_height: heights.iter().copied().fold(f64::MAX, f64::min),
                }
            })
            .collect();
        // BTreeMap order already sorts ties by type name
        stats.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(stats)
    }

    async fn summary(&self) -> StoreResult<HeightSummary> {
        let buildings = self.buildings.read().await;
        if buildings.is_empty() {
            return Ok(HeightSummary {
                total_buildings: 0,
                building_types: 0,
                avg_height: 0.0,
                max_height: 0.0,
                min_height: 0.0,
            });
        }

        let heights: Vec<f64> = buildings.iter().map(|b| b.height).collect();
        let mut types: Vec<&str> = buildings.iter().map(|b| b.building_type.as_str()).collect();
        types.sort_unstable();
        types.dedup();

        Ok(HeightSummary {
            total_buildings: buildings.len() as i64,
            building_types: types.len() as i64,
            avg_height: heights.iter().sum::<f64>() / heights.len() as f64,
            max_height: heights.iter().copied().fold(f64::MIN, f64::max),
            min_height: heights.iter().copied().fold(f64::MAX, f64::min),
        })
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Building>> {
        let buildings = self.buildings.read().await;
        Ok(buildings.iter().find(|b| b.id == id).cloned())
    }

    async fn random(&self, limit: i64) -> StoreResult<Vec<Building>> {
        let buildings = self.buildings.read().await;
        let sample: Vec<Building> = {
            let mut rng = rand::thread_rng();
            buildings
                .choose_multiple(&mut rng, limit.max(0) as usize)
                .cloned()
                .collect()
        };
        Ok(sample)
    }

    async fn by_type(&self, building_type: &str, limit: i64) -> StoreResult<Vec<Building>> {
        Ok(self
            .select(limit, |b| contains_ci(&b.building_type, building_type))
            .await)
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Building>> {
        Ok(self
            .select(1, |b| contains_ci(&b.name, name))
            .await
            .into_iter()
            .next())
    }

    async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Building>> {
        Ok(self
            .select(i64::MAX, |b| names.iter().any(|n| contains_ci(&b.name, n)))
            .await)
    }

    async fn in_height_range(
        &self,
        min: f64,
        max: f64,
        limit: i64,
    ) -> StoreResult<Vec<Building>> {
        Ok(self
            .select(limit, |b| b.height >= min && b.height <= max)
            .await)
    }

    async fn search_address(&self, keyword: &str, limit: i64) -> StoreResult<Vec<Building>> {
        Ok(self
            .select(limit, |b| {
                b.address
                    .as_deref()
                    .is_some_and(|address| contains_ci(address, keyword))
            })
            .await)
    }

    async fn count(&self, building_types: &[String]) -> StoreResult<i64> {
        let buildings = self.buildings.read().await;
        Ok(buildings
            .iter()
            .filter(|b| matches_any_type(b, building_types))
            .count() as i64)
    }

    async fn insert(&self, building: &NewBuilding) -> StoreResult<i32> {
        validate_new_building(building)?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut buildings = self.buildings.write().await;
        buildings.push(Building {
            id,
            name: building.name.clone(),
            // NUMERIC(8, 2) column
            height: round2(building.height),
            building_type: building.building_type.clone(),
            address: building.address.clone(),
            geometry: Geometry::polygon(&building.ring),
        });
        Ok(id)
    }

    async fn clear(&self) -> StoreResult<u64> {
        let mut buildings = self.buildings.write().await;
        let removed = buildings.len() as u64;
        buildings.clear();
        Ok(removed)
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square_at(lng: f64, lat: f64, size: f64) -> Vec<[f64; 2]> {
        vec![
            [lng, lat],
            [lng + size, lat],
            [lng + size, lat + size],
            [lng, lat + size],
            [lng, lat],
        ]
    }

    fn new_building(name: &str, height: f64, building_type: &str) -> NewBuilding {
        NewBuilding {
            name: name.to_string(),
            height,
            building_type: building_type.to_string(),
            address: Some(format!("{} Street", name)),
            ring: square_at(39.82, 21.42, 0.0005),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .insert(&new_building("Alpha", 100.0, "office"))
            .await
            .unwrap();
        store
            .insert(&new_building("Bravo", 500.0, "hotel"))
            .await
            .unwrap();
        store
            .insert(&new_building("Charlie", 40.0, "residential"))
            .await
            .unwrap();
        store
            .insert(&new_building("Delta", 250.0, "office"))
            .await
            .unwrap();
        store
    }

    fn names(buildings: &[Building]) -> Vec<&str> {
        buildings.iter().map(|b| b.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let a = store.insert(&new_building("A", 1.0, "x")).await.unwrap();
        let b = store.insert(&new_building("B", 1.0, "x")).await.unwrap();
        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn test_list_is_tallest_first_and_capped() {
        let store = seeded().await;
        let listed = store.list(3).await.unwrap();
        assert_eq!(names(&listed), vec!["Bravo", "Delta", "Alpha"]);
    }

    #[tokio::test]
    async fn test_tallest_and_shortest() {
        let store = seeded().await;
        assert_eq!(store.tallest().await.unwrap().unwrap().name, "Bravo");
        assert_eq!(store.shortest().await.unwrap().unwrap().name, "Charlie");
    }

    #[tokio::test]
    async fn test_empty_store_has_no_tallest() {
        let store = MemoryStore::new();
        assert!(store.tallest().await.unwrap().is_none());
        assert_eq!(store.summary().await.unwrap().total_buildings, 0);
    }

    #[tokio::test]
    async fn test_search_combines_filters() {
        let store = seeded().await;
        let filter = SearchFilter {
            building_types: vec!["OFF".to_string()],
            min_height: Some(150.0),
            max_height: None,
            limit: 10,
        };
        assert_eq!(names(&store.search(&filter).await.unwrap()), vec!["Delta"]);
    }

    #[tokio::test]
    async fn test_statistics_group_by_type() {
        let store = seeded().await;
        let stats = store.statistics().await.unwrap();
        assert_eq!(stats[0].building_type, "office");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].avg_height, 175.0);
        assert_eq!(stats[0].max_height, 250.0);
        assert_eq!(stats[0].min_height, 100.0);
        assert_eq!(stats.len(), 3);
    }

    #[tokio::test]
    async fn test_summary_aggregates() {
        let store = seeded().await;
        let summary = store.summary().await.unwrap();
        assert_eq!(summary.total_buildings, 4);
        assert_eq!(summary.building_types, 3);
        assert_eq!(summary.avg_height, 222.5);
        assert_eq!(summary.max_height, 500.0);
        assert_eq!(summary.min_height, 40.0);
    }

    #[tokio::test]
    async fn test_nearby_orders_by_distance() {
        let store = MemoryStore::new();
        let mut near = new_building("Near", 10.0, "x");
        near.ring = square_at(39.8200, 21.4200, 0.0001);
        let mut far = new_building("Far", 10.0, "x");
        far.ring = square_at(39.8250, 21.4200, 0.0001);
        let mut outside = new_building("Outside", 10.0, "x");
        outside.ring = square_at(39.9000, 21.4200, 0.0001);
        for b in [&far, &outside, &near] {
            store.insert(b).await.unwrap();
        }

        let found = store.nearby(21.4200, 39.8200, 1000.0).await.unwrap();
        let found_names: Vec<&str> = found.iter().map(|n| n.building.name.as_str()).collect();
        assert_eq!(found_names, vec!["Near", "Far"]);
        assert!(found[0].distance < found[1].distance);
    }

    #[tokio::test]
    async fn test_name_lookups_are_case_insensitive() {
        let store = seeded().await;
        assert_eq!(
            store.find_by_name("bRaV").await.unwrap().unwrap().name,
            "Bravo"
        );
        let both = store
            .find_by_names(&["alpha".to_string(), "charlie".to_string()])
            .await
            .unwrap();
        assert_eq!(names(&both), vec!["Alpha", "Charlie"]);
    }

    #[tokio::test]
    async fn test_height_range_is_inclusive() {
        let store = seeded().await;
        let found = store.in_height_range(100.0, 250.0, 10).await.unwrap();
        assert_eq!(names(&found), vec!["Delta", "Alpha"]);
    }

    #[tokio::test]
    async fn test_count_by_type() {
        let store = seeded().await;
        assert_eq!(store.count(&[]).await.unwrap(), 4);
        assert_eq!(store.count(&["office".to_string()]).await.unwrap(), 2);
        assert_eq!(
            store
                .count(&["hotel".to_string(), "residential".to_string()])
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_search_address() {
        let store = seeded().await;
        let found = store.search_address("delta street", 10).await.unwrap();
        assert_eq!(names(&found), vec!["Delta"]);
    }

    #[tokio::test]
    async fn test_random_respects_limit() {
        let store = seeded().await;
        assert_eq!(store.random(2).await.unwrap().len(), 2);
        assert_eq!(store.random(10).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let store = seeded().await;
        assert_eq!(store.clear().await.unwrap(), 4);
        assert!(store.list(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_skips_invalid_and_replaces() {
        let store = seeded().await;
        let buildings = vec![
            new_building("Kept", 40.0, "office"),
            new_building("Needle", 1_234_567.0, "tower"),
            new_building("Also Kept", 20.0, "hotel"),
        ];

        let summary = store.load(&buildings, true).await.unwrap();
        assert_eq!(
            summary,
            crate::LoadSummary {
                inserted: 2,
                skipped: 1,
                cleared: 4
            }
        );

        let names: Vec<String> = store.list(10).await.unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["Kept".to_string(), "Also Kept".to_string()]);
    }
}
