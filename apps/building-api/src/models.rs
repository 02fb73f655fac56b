//! Request and response bodies

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Hard cap on any list endpoint
pub const MAX_LIMIT: i64 = 1000;
pub const DEFAULT_SEARCH_LIMIT: i64 = 100;
pub const DEFAULT_RANDOM_LIMIT: i64 = 10;
pub const DEFAULT_TYPE_LIMIT: i64 = 100;
/// Meters
pub const DEFAULT_NEARBY_RADIUS: f64 = 1000.0;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: &'static [&'static str],
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    #[serde(rename = "type")]
    pub building_type: Option<String>,
    pub min_height: Option<f64>,
    pub max_height: Option<f64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

/// Apply the default and cap; zero or negative limits are rejected
pub fn resolve_limit(limit: Option<i64>, default: i64) -> Result<i64, ApiError> {
    match limit {
        None => Ok(default),
        Some(n) if n < 1 => Err(ApiError::InvalidRequest(format!(
            "limit must be a positive integer, got {}",
            n
        ))),
        Some(n) => Ok(n.min(MAX_LIMIT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_limit() {
        assert_eq!(resolve_limit(None, 100).unwrap(), 100);
        assert_eq!(resolve_limit(Some(5), 100).unwrap(), 5);
        assert_eq!(resolve_limit(Some(5000), 100).unwrap(), MAX_LIMIT);
        assert!(resolve_limit(Some(0), 100).is_err());
        assert!(resolve_limit(Some(-3), 100).is_err());
    }
}
