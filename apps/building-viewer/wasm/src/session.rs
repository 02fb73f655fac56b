//! Stateful viewer session
//!
//! Holds the scene in Rust memory. Every mutating call rebuilds the scene
//! and re-batches the meshes so the host can re-upload buffers afterwards.

use scene_core::{
    CameraPose, GeoBounds, Lens, Mesh, Projection, Ray, Scene, SceneSettings, SkippedBuilding,
};
use serde::Serialize;
use serde_json::Value;
use shared_types::{Building, ChatResponse};
use wasm_bindgen::prelude::*;

/// Stateful 3D scene that holds buildings and camera in Rust memory
#[wasm_bindgen]
pub struct ViewerSession {
    scene: Scene,
    lens: Lens,
    /// (normal, highlighted) mesh batches from the last rebuild
    batches: (Mesh, Mesh),
    /// Records that were not valid building JSON at all
    rejected: usize,
}

impl Default for ViewerSession {
    fn default() -> Self {
        Self::new()
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
impl ViewerSession {
    /// Create a session over the default Makkah extent
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::with_settings(SceneSettings::default())
    }

    /// Create a session over a custom geographic extent
    #[wasm_bindgen(js_name = withBounds)]
    pub fn with_bounds(min_lng: f64, max_lng: f64, min_lat: f64, max_lat: f64) -> Result<ViewerSession, JsValue> {
        let bounds = GeoBounds {
            min_lng,
            max_lng,
            min_lat,
            max_lat,
        };
        validate_bounds(&bounds).map_err(|e| JsValue::from_str(&e))?;
        Ok(Self::with_settings(SceneSettings {
            projection: Projection::new(bounds),
            ..SceneSettings::default()
        }))
    }

    /// Replace the building list with the JSON array returned by the API.
    /// Returns the fit-all camera pose.
    #[wasm_bindgen(js_name = setBuildings)]
    pub fn set_buildings(&mut self, json: &str) -> Result<JsValue, JsValue> {
        let pose = self
            .set_buildings_internal(json)
            .map_err(|e| JsValue::from_str(&e))?;
        to_js(&pose)
    }

    /// Highlight exactly these building ids
    #[wasm_bindgen(js_name = setHighlighted)]
    pub fn set_highlighted(&mut self, ids: &[i32]) {
        self.scene.set_highlighted(ids.iter().copied());
        self.refresh();
    }

    #[wasm_bindgen(js_name = clearHighlight)]
    pub fn clear_highlight(&mut self) {
        self.scene.clear_highlight();
        self.refresh();
    }

    /// Apply a `POST /api/chat` response (JSON text).
    /// Returns the new camera pose, or `null` when the camera should not move.
    #[wasm_bindgen(js_name = applyChatResponse)]
    pub fn apply_chat_response(&mut self, json: &str) -> Result<JsValue, JsValue> {
        match self
            .apply_chat_response_internal(json)
            .map_err(|e| JsValue::from_str(&e))?
        {
            Some(pose) => to_js(&pose),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = fitAll)]
    pub fn fit_all(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.scene.fit_all())
    }

    #[wasm_bindgen(js_name = fitHighlighted)]
    pub fn fit_highlighted(&mut self) -> Result<JsValue, JsValue> {
        to_js(&self.scene.fit_highlighted())
    }

    #[wasm_bindgen(js_name = flyTo)]
    pub fn fly_to(&mut self, id: i32) -> Result<JsValue, JsValue> {
        match self.scene.fly_to(id) {
            Some(pose) => to_js(&pose),
            None => Err(JsValue::from_str(&format!("Building {} is not in the scene", id))),
        }
    }

    /// Current camera pose `{position, target}`
    #[wasm_bindgen]
    pub fn camera(&self) -> Result<JsValue, JsValue> {
        to_js(&self.scene.camera())
    }

    /// Canvas width / height, used to unproject clicks
    #[wasm_bindgen(js_name = setAspect)]
    pub fn set_aspect(&mut self, aspect: f64) -> Result<(), JsValue> {
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(JsValue::from_str("Aspect ratio must be a positive number"));
        }
        self.lens.aspect = aspect;
        Ok(())
    }

    /// Building id under a click in normalized device coordinates, if any
    #[wasm_bindgen]
    pub fn pick(&self, ndc_x: f64, ndc_y: f64) -> Option<i32> {
        self.pick_internal(ndc_x, ndc_y)
    }

    /// Scene data for one building (record, center, scaled height, ...)
    #[wasm_bindgen(js_name = buildingInfo)]
    pub fn building_info(&self, id: i32) -> Result<JsValue, JsValue> {
        match self.scene.get(id) {
            Some(entry) => to_js(&entry.building),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(getter, js_name = buildingCount)]
    pub fn building_count(&self) -> usize {
        self.scene.entries().len()
    }

    /// Buildings left out because of bad geometry or unreadable records
    #[wasm_bindgen(getter, js_name = skippedCount)]
    pub fn skipped_count(&self) -> usize {
        self.scene.skipped().len() + self.rejected
    }

    /// `[{id, name, reason}]` for buildings with unusable geometry
    #[wasm_bindgen]
    pub fn skipped(&self) -> Result<JsValue, JsValue> {
        to_js(&self.scene.skipped())
    }

    #[wasm_bindgen(js_name = highlightedIds)]
    pub fn highlighted_ids(&self) -> Vec<i32> {
        self.scene.highlighted_ids()
    }

    /// Vertex positions (xyz) of the highlighted or the normal batch
    #[wasm_bindgen]
    pub fn positions(&self, highlighted: bool) -> Vec<f32> {
        self.batch(highlighted).positions.clone()
    }

    #[wasm_bindgen]
    pub fn normals(&self, highlighted: bool) -> Vec<f32> {
        self.batch(highlighted).normals.clone()
    }

    #[wasm_bindgen]
    pub fn indices(&self, highlighted: bool) -> Vec<u32> {
        self.batch(highlighted).indices.clone()
    }
}

impl ViewerSession {
    pub fn with_settings(settings: SceneSettings) -> Self {
        Self {
            scene: Scene::new(settings),
            lens: Lens::default(),
            batches: (Mesh::default(), Mesh::default()),
            rejected: 0,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Internal method to load buildings (testable without JsValue)
    fn set_buildings_internal(&mut self, json: &str) -> Result<CameraPose, String> {
        let records: Vec<Value> =
            serde_json::from_str(json).map_err(|e| format!("Invalid buildings JSON: {}", e))?;

        let mut buildings = Vec::with_capacity(records.len());
        self.rejected = 0;
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Building>(record) {
                Ok(building) => buildings.push(building),
                Err(e) => {
                    console_log!("Ignoring building record {}: {}", index, e);
                    self.rejected += 1;
                }
            }
        }

        let pose = self.scene.set_buildings(buildings);
        self.report_skipped();
        self.refresh();
        Ok(pose)
    }

    /// Internal method to apply a chat answer (testable without JsValue)
    fn apply_chat_response_internal(&mut self, json: &str) -> Result<Option<CameraPose>, String> {
        let response: ChatResponse =
            serde_json::from_str(json).map_err(|e| format!("Invalid chat response: {}", e))?;
        let pose = self.scene.apply_chat_response(&response);
        if pose.is_some() {
            self.report_skipped();
            self.refresh();
        }
        Ok(pose)
    }

    fn pick_internal(&self, ndc_x: f64, ndc_y: f64) -> Option<i32> {
        let ray = Ray::from_screen(ndc_x, ndc_y, &self.scene.camera(), &self.lens)?;
        self.scene.pick(&ray)
    }

    fn batch(&self, highlighted: bool) -> &Mesh {
        if highlighted {
            &self.batches.1
        } else {
            &self.batches.0
        }
    }

    fn refresh(&mut self) {
        self.batches = self.scene.batched_meshes();
    }

    fn report_skipped(&self) {
        let skipped: &[SkippedBuilding] = self.scene.skipped();
        for s in skipped {
            console_log!("Skipping building {} ({}): {}", s.id, s.name, s.reason);
        }
    }
}

fn validate_bounds(bounds: &GeoBounds) -> Result<(), String> {
    let finite = [bounds.min_lng, bounds.max_lng, bounds.min_lat, bounds.max_lat]
        .iter()
        .all(|v| v.is_finite());
    if !finite || bounds.min_lng >= bounds.max_lng || bounds.min_lat >= bounds.max_lat {
        return Err("Bounds must be finite with min < max".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn building(id: i32, name: &str, lng: f64, lat: f64, height: f64) -> Value {
        json!({
            "id": id,
            "name": name,
            "height": height,
            "building_type": "office",
            "address": null,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [lng, lat, 0.0],
                    [lng + 0.01, lat, 0.0],
                    [lng + 0.01, lat + 0.01, 0.0],
                    [lng, lat + 0.01, 0.0],
                    [lng, lat, 0.0]
                ]]
            }
        })
    }

    fn loaded_session() -> ViewerSession {
        let mut session = ViewerSession::new();
        let list = json!([
            building(1, "A", 39.80, 21.40, 100.0),
            building(2, "B", 39.84, 21.40, 500.0),
        ]);
        session.set_buildings_internal(&list.to_string()).unwrap();
        session
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = ViewerSession::new();
        assert_eq!(session.building_count(), 0);
        assert!(session.positions(false).is_empty());
        assert_eq!(session.scene().camera(), CameraPose::OVERVIEW);
    }

    #[test]
    fn test_set_buildings_builds_meshes() {
        let session = loaded_session();
        assert_eq!(session.building_count(), 2);
        // Each square prism: 24 vertices, 12 triangles
        assert_eq!(session.positions(false).len(), 2 * 24 * 3);
        assert_eq!(session.indices(false).len(), 2 * 12 * 3);
        assert!(session.positions(true).is_empty());
    }

    #[test]
    fn test_bad_records_are_counted() {
        let mut session = ViewerSession::new();
        let list = json!([
            building(1, "A", 39.80, 21.40, 100.0),
            {"id": "two", "name": 5},
            {"id": 3, "name": "Point", "height": 5.0, "building_type": "kiosk",
             "geometry": {"type": "Point", "coordinates": [39.8, 21.4]}},
        ]);
        session.set_buildings_internal(&list.to_string()).unwrap();
        assert_eq!(session.building_count(), 1);
        assert_eq!(session.skipped_count(), 2);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let mut session = ViewerSession::new();
        assert!(session.set_buildings_internal("not json").is_err());
        assert!(session.apply_chat_response_internal("{}").is_err());
    }

    #[test]
    fn test_highlight_moves_mesh_between_batches() {
        let mut session = loaded_session();
        session.set_highlighted(&[2]);
        assert_eq!(session.positions(true).len(), 24 * 3);
        assert_eq!(session.positions(false).len(), 24 * 3);
        assert_eq!(session.highlighted_ids(), vec![2]);

        session.clear_highlight();
        assert!(session.positions(true).is_empty());
    }

    #[test]
    fn test_chat_highlight_flies_to_building() {
        let mut session = loaded_session();
        let answer = json!({
            "type": "building_highlight",
            "content": "The tallest building is B",
            "building": building(2, "B", 39.84, 21.40, 500.0)
        });
        let pose = session
            .apply_chat_response_internal(&answer.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(session.highlighted_ids(), vec![2]);
        // Target sits halfway up the 500 m building
        assert!((pose.target[1] - 250.0).abs() < 1e-6);
        assert_eq!(session.positions(true).len(), 24 * 3);
    }

    #[test]
    fn test_chat_text_keeps_camera() {
        let mut session = loaded_session();
        let before = session.scene().camera();
        let pose = session
            .apply_chat_response_internal(r#"{"type": "text", "content": "Hello"}"#)
            .unwrap();
        assert_eq!(pose, None);
        assert_eq!(session.scene().camera(), before);
    }

    #[test]
    fn test_pick_center_of_fly_to() {
        let mut session = loaded_session();
        session.scene.fly_to(1).unwrap();
        assert_eq!(session.pick_internal(0.0, 0.0), Some(1));
    }

    #[test]
    fn test_validate_bounds() {
        assert!(validate_bounds(&GeoBounds::MAKKAH).is_ok());
        let inverted = GeoBounds {
            min_lng: 40.0,
            ..GeoBounds::MAKKAH
        };
        assert!(validate_bounds(&inverted).is_err());
    }
}
