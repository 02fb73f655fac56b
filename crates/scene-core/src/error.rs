use shared_types::GeometryError;
use thiserror::Error;

/// Why a building could not be placed in the scene
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SceneError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("height {0} is not a finite non-negative number")]
    InvalidHeight(f64),

    #[error("footprint has no area")]
    Degenerate,

    #[error("triangulation failed: {0}")]
    Triangulation(String),
}
