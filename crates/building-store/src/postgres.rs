//! PostGIS-backed building store
//!
//! Every operation is a single parameterized statement. User-supplied text
//! only ever reaches the database as a bind parameter.

use async_trait::async_trait;
use shared_types::{
    Building, BuildingTypeStatistics, Geometry, HeightSummary, NearbyBuilding, NewBuilding,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor};
use std::time::Duration;
use tracing::{info, warn};

use crate::{
    contains_pattern, validate_new_building, BuildingStore, LoadSummary, SearchFilter,
    StoreResult,
};

/// Columns selected for every building row
const BUILDING_COLUMNS: &str = "id, name, height::float8 AS height, building_type, address, \
     ST_AsGeoJSON(geometry)::json AS geometry";

const SCHEMA: &[&str] = &[
    "CREATE EXTENSION IF NOT EXISTS postgis",
    r#"
    CREATE TABLE IF NOT EXISTS buildings (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL DEFAULT 'Unnamed Building',
        height NUMERIC(8, 2) NOT NULL CHECK (height >= 0),
        building_type VARCHAR(100) NOT NULL DEFAULT 'unknown',
        address TEXT,
        geometry GEOMETRY(POLYGONZ, 4326) NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_buildings_geometry ON buildings USING GIST (geometry)",
    "CREATE INDEX IF NOT EXISTS idx_buildings_height ON buildings (height)",
    "CREATE INDEX IF NOT EXISTS idx_buildings_type ON buildings (building_type)",
    r#"
    CREATE OR REPLACE FUNCTION touch_buildings_updated_at() RETURNS TRIGGER AS $$
    BEGIN
        NEW.updated_at = NOW();
        RETURN NEW;
    END;
    $$ LANGUAGE plpgsql
    "#,
    "DROP TRIGGER IF EXISTS buildings_touch_updated_at ON buildings",
    r#"
    CREATE TRIGGER buildings_touch_updated_at
        BEFORE UPDATE ON buildings
        FOR EACH ROW EXECUTE FUNCTION touch_buildings_updated_at()
    "#,
];

/// Connection settings for [`PgBuildingStore`]
#[derive(Debug, Clone)]
pub struct PgStoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PgStoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, FromRow)]
struct BuildingRow {
    id: i32,
    name: String,
    height: f64,
    building_type: String,
    address: Option<String>,
    geometry: Json<Geometry>,
}

impl From<BuildingRow> for Building {
    fn from(row: BuildingRow) -> Self {
        Building {
            id: row.id,
            name: row.name,
            height: row.height,
            building_type: row.building_type,
            address: row.address,
            geometry: row.geometry.0,
        }
    }
}

#[derive(Debug, FromRow)]
struct NearbyRow {
    #[sqlx(flatten)]
    building: BuildingRow,
    distance: f64,
}

#[derive(Debug, FromRow)]
struct StatisticsRow {
    building_type: String,
    count: i64,
    avg_height: f64,
    max_height: f64,
    min_height: f64,
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    total_buildings: i64,
    building_types: i64,
    avg_height: f64,
    max_height: f64,
    min_height: f64,
}

pub struct PgBuildingStore {
    pool: PgPool,
}

impl PgBuildingStore {
    /// Open the connection pool
    pub async fn connect(config: &PgStoreConfig) -> StoreResult<Self> {
        info!(
            "Connecting to database (max {} connections)",
            config.max_connections
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the buildings table, its indexes and the `updated_at` trigger
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        info!("Ensuring buildings schema...");
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Schema ready");
        Ok(())
    }

    async fn fetch_buildings(&self, sql: &str, limit: i64) -> StoreResult<Vec<Building>> {
        let rows: Vec<BuildingRow> = sqlx::query_as(sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Building::from).collect())
    }

    async fn fetch_one_building(&self, sql: &str) -> StoreResult<Option<Building>> {
        let row: Option<BuildingRow> = sqlx::query_as(sql).fetch_optional(&self.pool).await?;
        Ok(row.map(Building::from))
    }
}

/// Patterns for an any-of ILIKE filter; `None` disables the filter
fn type_patterns(building_types: &[String]) -> Option<Vec<String>> {
    if building_types.is_empty() {
        None
    } else {
        Some(building_types.iter().map(|t| contains_pattern(t)).collect())
    }
}

#[async_trait]
impl BuildingStore for PgBuildingStore {
    async fn list(&self, limit: i64) -> StoreResult<Vec<Building>> {
        let sql = format!(
            "SELECT {} FROM buildings ORDER BY height DESC LIMIT $1",
            BUILDING_COLUMNS
        );
        self.fetch_buildings(&sql, limit).await
    }

    async fn tallest(&self) -> StoreResult<Option<Building>> {
        let sql = format!(
            "SELECT {} FROM buildings ORDER BY height DESC LIMIT 1",
            BUILDING_COLUMNS
        );
        self.fetch_one_building(&sql).await
    }

    async fn shortest(&self) -> StoreResult<Option<Building>> {
        let sql = format!(
            "SELECT {} FROM buildings ORDER BY height ASC LIMIT 1",
            BUILDING_COLUMNS
        );
        self.fetch_one_building(&sql).await
    }

    async fn search(&self, filter: &SearchFilter) -> StoreResult<Vec<Building>> {
        let sql = format!(
            r#"
            SELECT {} FROM buildings
            WHERE ($1::text[] IS NULL OR building_type ILIKE ANY($1))
              AND ($2::float8 IS NULL OR height >= $2)
              AND ($3::float8 IS NULL OR height <= $3)
            ORDER BY height DESC
            LIMIT $4
            "#,
            BUILDING_COLUMNS
        );
        let rows: Vec<BuildingRow> = sqlx::query_as(&sql)
            .bind(type_patterns(&filter.building_types))
            .bind(filter.min_height)
            .bind(filter.max_height)
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Building::from).collect())
    }

    async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        radius_m: f64,
    ) -> StoreResult<Vec<NearbyBuilding>> {
        let sql = format!(
            r#"
            SELECT {},
                   ST_Distance(
                       ST_Force2D(geometry)::geography,
                       ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography
                   ) AS distance
            FROM buildings
            WHERE ST_DWithin(
                ST_Force2D(geometry)::geography,
                ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                $3
            )
            ORDER BY distance ASC
            "#,
            BUILDING_COLUMNS
        );
        let rows: Vec<NearbyRow> = sqlx::query_as(&sql)
            .bind(lng)
            .bind(lat)
            .bind(radius_m)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| NearbyBuilding {
                building: row.building.into(),
                distance: row.distance,
            })
            .collect())
    }

    async fn statistics(&self) -> StoreResult<Vec<BuildingTypeStatistics>> {
        let rows: Vec<StatisticsRow> = sqlx::query_as(
            r#"
            SELECT building_type,
                   COUNT(*)::bigint AS count,
                   AVG(height)::float8 AS avg_height,
                   MAX(height)::float8 AS max_height,
                   MIN(height)::float8 AS min_height
            FROM buildings
            GROUP BY building_type
            ORDER BY count DESC, building_type ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| BuildingTypeStatistics {
                building_type: row.building_type,
                count: row.count,
                avg_height: row.avg_height,
                max_height: row.max_height,
                min_height: row.min_height,
            })
            .collect())
    }

    async fn summary(&self) -> StoreResult<HeightSummary> {
        let row: SummaryRow = sqlx::query_as(
            r#"
            SELECT COUNT(*)::bigint AS total_buildings,
                   COUNT(DISTINCT building_type)::bigint AS building_types,
                   COALESCE(AVG(height), 0)::float8 AS avg_height,
                   COALESCE(MAX(height), 0)::float8 AS max_height,
                   COALESCE(MIN(height), 0)::float8 AS min_height
            FROM buildings
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(HeightSummary {
            total_buildings: row.total_buildings,
            building_types: row.building_types,
            avg_height: row.avg_height,
            max_height: row.max_height,
            min_height: row.min_height,
        })
    }

    async fn get(&self, id: i32) -> StoreResult<Option<Building>> {
        let sql = format!("SELECT {} FROM buildings WHERE id = $1", BUILDING_COLUMNS);
        let row: Option<BuildingRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Building::from))
    }

    async fn random(&self, limit: i64) -> StoreResult<Vec<Building>> {
        let sql = format!(
            "SELECT {} FROM buildings ORDER BY RANDOM() LIMIT $1",
            BUILDING_COLUMNS
        );
        self.fetch_buildings(&sql, limit).await
    }

    async fn by_type(&self, building_type: &str, limit: i64) -> StoreResult<Vec<Building>> {
        let sql = format!(
            "SELECT {} FROM buildings WHERE building_type ILIKE $1 ORDER BY height DESC LIMIT $2",
            BUILDING_COLUMNS
        );
        let rows: Vec<BuildingRow> = sqlx::query_as(&sql)
            .bind(contains_pattern(building_type))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Building::from).collect())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Building>> {
        let sql = format!(
            "SELECT {} FROM buildings WHERE name ILIKE $1 ORDER BY height DESC LIMIT 1",
            BUILDING_COLUMNS
        );
        let row: Option<BuildingRow> = sqlx::query_as(&sql)
            .bind(contains_pattern(name))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Building::from))
    }

    async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Building>> {
        let patterns: Vec<String> = names.iter().map(|n| contains_pattern(n)).collect();
        let sql = format!(
            "SELECT {} FROM buildings WHERE name ILIKE ANY($1) ORDER BY height DESC",
            BUILDING_COLUMNS
        );
        let rows: Vec<BuildingRow> = sqlx::query_as(&sql)
            .bind(patterns)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Building::from).collect())
    }

    async fn in_height_range(
        &self,
        min: f64,
        max: f64,
        limit: i64,
    ) -> StoreResult<Vec<Building>> {
        let sql = format!(
            "SELECT {} FROM buildings WHERE height BETWEEN $1 AND $2 ORDER BY height DESC LIMIT $3",
            BUILDING_COLUMNS
        );
        let rows: Vec<BuildingRow> = sqlx::query_as(&sql)
            .bind(min)
            .bind(max)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Building::from).collect())
    }

    async fn search_address(&self, keyword: &str, limit: i64) -> StoreResult<Vec<Building>> {
        let sql = format!(
            "SELECT {} FROM buildings WHERE address ILIKE $1 ORDER BY height DESC LIMIT $2",
            BUILDING_COLUMNS
        );
        let rows: Vec<BuildingRow> = sqlx::query_as(&sql)
            .bind(contains_pattern(keyword))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Building::from).collect())
    }

    async fn count(&self, building_types: &[String]) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::bigint FROM buildings \
             WHERE ($1::text[] IS NULL OR building_type ILIKE ANY($1))",
        )
        .bind(type_patterns(building_types))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn insert(&self, building: &NewBuilding) -> StoreResult<i32> {
        validate_new_building(building)?;
        insert_row(&self.pool, building).await
    }

    async fn clear(&self) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM buildings")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Runs in one transaction, so a database error leaves the table untouched
    async fn load(&self, buildings: &[NewBuilding], replace: bool) -> StoreResult<LoadSummary> {
        let mut summary = LoadSummary::default();
        let mut tx = self.pool.begin().await?;

        if replace {
            summary.cleared = sqlx::query("DELETE FROM buildings")
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        for building in buildings {
            if let Err(e) = validate_new_building(building) {
                warn!("Skipping building {}: {}", building.name, e);
                summary.skipped += 1;
                continue;
            }
            insert_row(&mut *tx, building).await?;
            summary.inserted += 1;
        }

        tx.commit().await?;
        Ok(summary)
    }

    async fn close(&self) {
        info!("Closing database pool...");
        self.pool.close().await;
        info!("Database pool closed");
    }
}

async fn insert_row<'e, E>(executor: E, building: &NewBuilding) -> StoreResult<i32>
where
    E: PgExecutor<'e>,
{
    let id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO buildings (name, height, building_type, address, geometry)
        VALUES ($1, $2, $3, $4, ST_GeomFromText($5, 4326))
        RETURNING id
        "#,
    )
    .bind(&building.name)
    .bind(building.height)
    .bind(&building.building_type)
    .bind(&building.address)
    .bind(crate::wkt::polygonz(&building.ring))
    .fetch_one(executor)
    .await?;

    Ok(id)
}
