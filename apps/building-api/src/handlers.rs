//! HTTP handlers for the building API

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use building_store::SearchFilter;
use chat_engine::SUGGESTIONS;
use serde_json::Value;
use shared_types::{Building, BuildingTypeStatistics, ChatResponse, NearbyBuilding};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "building-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(p)| p)
        .map_err(|e| ApiError::InvalidRequest(e.body_text()))
}

/// All buildings, tallest first
pub async fn list_buildings(State(state): State<AppState>) -> Result<Json<Vec<Building>>, ApiError> {
    Ok(Json(state.store.list(MAX_LIMIT).await?))
}

pub async fn tallest_building(
    State(state): State<AppState>,
) -> Result<Json<Option<Building>>, ApiError> {
    Ok(Json(state.store.tallest().await?))
}

pub async fn search_buildings(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<Building>>, ApiError> {
    let params = query(params)?;
    for (label, value) in [("minHeight", params.min_height), ("maxHeight", params.max_height)] {
        if value.is_some_and(|h| !h.is_finite() || h < 0.0) {
            return Err(ApiError::InvalidRequest(format!(
                "{} must be a non-negative number",
                label
            )));
        }
    }
    if let (Some(min), Some(max)) = (params.min_height, params.max_height) {
        if min > max {
            return Err(ApiError::InvalidRequest(
                "minHeight must not exceed maxHeight".to_string(),
            ));
        }
    }

    let filter = SearchFilter {
        building_types: params
            .building_type
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .into_iter()
            .collect(),
        min_height: params.min_height,
        max_height: params.max_height,
        limit: resolve_limit(params.limit, DEFAULT_SEARCH_LIMIT)?,
    };
    tracing::debug!("Search filter: {:?}", filter);
    Ok(Json(state.store.search(&filter).await?))
}

pub async fn nearby_buildings(
    State(state): State<AppState>,
    params: Result<Query<NearbyParams>, QueryRejection>,
) -> Result<Json<Vec<NearbyBuilding>>, ApiError> {
    let params = query(params)?;
    if !(-90.0..=90.0).contains(&params.lat) || !(-180.0..=180.0).contains(&params.lng) {
        return Err(ApiError::InvalidRequest(
            "lat must be within [-90, 90] and lng within [-180, 180]".to_string(),
        ));
    }
    let radius = params.radius.unwrap_or(DEFAULT_NEARBY_RADIUS);
    if !radius.is_finite() || radius <= 0.0 {
        return Err(ApiError::InvalidRequest(
            "radius must be a positive number of meters".to_string(),
        ));
    }
    Ok(Json(
        state.store.nearby(params.lat, params.lng, radius).await?,
    ))
}

pub async fn building_statistics(
    State(state): State<AppState>,
) -> Result<Json<Vec<BuildingTypeStatistics>>, ApiError> {
    Ok(Json(state.store.statistics().await?))
}

pub async fn get_building(
    State(state): State<AppState>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Building>, ApiError> {
    let Path(id) = id.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

pub async fn random_buildings(
    State(state): State<AppState>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<Vec<Building>>, ApiError> {
    let limit = resolve_limit(query(params)?.limit, DEFAULT_RANDOM_LIMIT)?;
    Ok(Json(state.store.random(limit).await?))
}

pub async fn buildings_by_type(
    State(state): State<AppState>,
    Path(building_type): Path<String>,
    params: Result<Query<LimitParams>, QueryRejection>,
) -> Result<Json<Vec<Building>>, ApiError> {
    let limit = resolve_limit(query(params)?.limit, DEFAULT_TYPE_LIMIT)?;
    Ok(Json(state.store.by_type(&building_type, limit).await?))
}

/// Answer a free-text question about the buildings
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let message = match body.get("message") {
        Some(Value::String(m)) if !m.trim().is_empty() => m.trim().to_string(),
        Some(Value::String(_)) => {
            return Err(ApiError::InvalidRequest(
                "message must not be empty".to_string(),
            ))
        }
        Some(_) => {
            return Err(ApiError::InvalidRequest(
                "message must be a string".to_string(),
            ))
        }
        None => return Err(ApiError::InvalidRequest("message is required".to_string())),
    };

    tracing::info!("Chat message: {}", message);
    Ok(Json(state.chat.respond(&message).await))
}

pub async fn chat_suggestions() -> Json<SuggestionsResponse> {
    Json(SuggestionsResponse {
        suggestions: SUGGESTIONS,
    })
}
