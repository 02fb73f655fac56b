//! Chat responses returned by `POST /api/chat`

use serde::{Deserialize, Serialize};

use crate::building::Building;

/// Answer to a chat message.
///
/// The `type` tag tells the viewer how to frame the camera: a single
/// highlighted building is flown to, a result set is fitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatResponse {
    Text {
        content: String,
    },
    BuildingHighlight {
        content: String,
        building: Building,
    },
    SearchResults {
        content: String,
        buildings: Vec<Building>,
    },
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        ChatResponse::Text {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            ChatResponse::Text { content }
            | ChatResponse::BuildingHighlight { content, .. }
            | ChatResponse::SearchResults { content, .. } => content,
        }
    }

    /// Buildings referenced by the response, in response order
    pub fn buildings(&self) -> Vec<&Building> {
        match self {
            ChatResponse::Text { .. } => Vec::new(),
            ChatResponse::BuildingHighlight { building, .. } => vec![building],
            ChatResponse::SearchResults { buildings, .. } => buildings.iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::building::Geometry;

    #[test]
    fn test_text_serializes_with_type_tag() {
        let value = serde_json::to_value(ChatResponse::text("hello")).unwrap();
        assert_eq!(value["type"], "text");
        assert_eq!(value["content"], "hello");
        assert!(value.get("building").is_none());
    }

    #[test]
    fn test_highlight_serializes_building() {
        let building = Building {
            id: 1,
            name: "Clock Tower".to_string(),
            height: 601.0,
            building_type: "hotel".to_string(),
            address: None,
            geometry: Geometry::polygon(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]),
        };
        let response = ChatResponse::BuildingHighlight {
            content: "found".to_string(),
            building,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["type"], "building_highlight");
        assert_eq!(value["building"]["name"], "Clock Tower");
        assert_eq!(response.buildings().len(), 1);
    }

    #[test]
    fn test_search_results_deserialize() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"type":"search_results","content":"none","buildings":[]}"#,
        )
        .unwrap();
        assert_eq!(response.content(), "none");
        assert!(response.buildings().is_empty());
    }
}
