pub mod building;
pub mod chat;

pub use building::{
    Building, BuildingTypeStatistics, Geometry, GeometryError, HeightSummary, NearbyBuilding,
    NewBuilding,
};
pub use chat::ChatResponse;
