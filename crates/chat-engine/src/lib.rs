pub mod executor;
pub mod extractors;
pub mod intent;
pub mod patterns;
pub mod suggestions;

use std::sync::Arc;

use building_store::BuildingStore;
use shared_types::ChatResponse;

pub use intent::{classify, Intent, IntentKind, SearchCriteria};
pub use suggestions::SUGGESTIONS;

/// ChatEngine entry point: classify a message, run it, format the answer
#[derive(Clone)]
pub struct ChatEngine {
    store: Arc<dyn BuildingStore>,
}

impl ChatEngine {
    pub fn new(store: Arc<dyn BuildingStore>) -> Self {
        Self { store }
    }

    pub async fn respond(&self, message: &str) -> ChatResponse {
        let intent = classify(message);
        tracing::info!("Chat intent: {:?}", intent.kind());
        executor::execute(self.store.as_ref(), &intent).await
    }
}
