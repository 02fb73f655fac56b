//! Application state for the building API

use std::sync::Arc;

use anyhow::Result;
use building_store::{BuildingStore, MemoryStore, PgBuildingStore, PgStoreConfig};
use chat_engine::ChatEngine;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BuildingStore>,
    pub chat: ChatEngine,
}

impl AppState {
    pub fn new(store: Arc<dyn BuildingStore>) -> Self {
        let chat = ChatEngine::new(store.clone());
        Self { store, chat }
    }

    /// Connect to PostgreSQL and make sure the schema exists
    pub async fn connect(config: &PgStoreConfig) -> Result<Self> {
        let store = PgBuildingStore::connect(config).await?;
        store.ensure_schema().await?;
        Ok(Self::new(Arc::new(store)))
    }

    pub fn in_memory(store: MemoryStore) -> Self {
        Self::new(Arc::new(store))
    }
}
