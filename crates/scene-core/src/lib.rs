//! Browser-independent scene model for the 3D building viewer
//!
//! Turns building records into extruded meshes on a local Y-up plane and
//! decides where the camera goes when the building list, the highlight set or
//! a chat answer changes. The wasm session in `apps/building-viewer` is a thin
//! wrapper over [`Scene`].

pub mod camera;
pub mod error;
pub mod extrude;
pub mod height;
pub mod picking;
pub mod projection;
pub mod scene;
pub mod scene_building;

pub use camera::{CameraPose, FitParams, FramingConfig};
pub use error::SceneError;
pub use extrude::{extrude, Mesh};
pub use height::HeightScale;
pub use picking::{Lens, Ray};
pub use projection::{project, GeoBounds, Projection, ScenePoint, SCENE_SPAN};
pub use scene::{Scene, SceneEntry, SceneSettings, SkippedBuilding};
pub use scene_building::{FootprintBounds, SceneBuilding};
pub use shared_types::GeometryError;
