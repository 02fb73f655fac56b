//! Scene state
//!
//! Owns the building list, the highlight set and the current camera pose.
//! Any change to the list or the highlight set rebuilds every
//! `SceneBuilding` and mesh from scratch.

use std::collections::HashSet;

use serde::Serialize;
use shared_types::{Building, ChatResponse};
use tracing::{debug, warn};

use crate::camera::{self, CameraPose, FramingConfig};
use crate::error::SceneError;
use crate::extrude::{extrude, Mesh};
use crate::height::HeightScale;
use crate::picking::{self, Ray};
use crate::projection::Projection;
use crate::scene_building::SceneBuilding;

/// A building that is rendered, with its mesh
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEntry {
    pub building: SceneBuilding,
    pub mesh: Mesh,
}

/// A building left out of the scene and why
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedBuilding {
    pub id: i32,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct SceneSettings {
    pub projection: Projection,
    pub height_scale: HeightScale,
    pub framing: FramingConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    settings: SceneSettings,
    source: Vec<Building>,
    highlighted: HashSet<i32>,
    entries: Vec<SceneEntry>,
    skipped: Vec<SkippedBuilding>,
    camera: CameraPose,
}

impl Scene {
    pub fn new(settings: SceneSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Replace the building list and frame all of it
    pub fn set_buildings(&mut self, buildings: Vec<Building>) -> CameraPose {
        self.source = buildings;
        self.rebuild();
        self.fit_all()
    }

    pub fn set_highlighted<I: IntoIterator<Item = i32>>(&mut self, ids: I) {
        self.highlighted = ids.into_iter().collect();
        self.rebuild();
    }

    pub fn clear_highlight(&mut self) {
        self.set_highlighted(std::iter::empty());
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn skipped(&self) -> &[SkippedBuilding] {
        &self.skipped
    }

    pub fn get(&self, id: i32) -> Option<&SceneEntry> {
        self.entries.iter().find(|e| e.building.id() == id)
    }

    pub fn highlighted_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.highlighted.iter().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn camera(&self) -> CameraPose {
        self.camera
    }

    pub fn settings(&self) -> &SceneSettings {
        &self.settings
    }

    /// All rendered meshes merged into two batches: (normal, highlighted)
    pub fn batched_meshes(&self) -> (Mesh, Mesh) {
        let mut normal = Mesh::default();
        let mut highlighted = Mesh::default();
        for entry in &self.entries {
            if entry.building.highlighted {
                highlighted.append(&entry.mesh);
            } else {
                normal.append(&entry.mesh);
            }
        }
        (normal, highlighted)
    }

    pub fn fit_all(&mut self) -> CameraPose {
        self.camera = camera::fit(
            self.entries.iter().map(|e| &e.building),
            &self.settings.framing.fit_all,
        )
        .unwrap_or_default();
        self.camera
    }

    /// Frame the highlighted buildings, or everything when none are rendered
    pub fn fit_highlighted(&mut self) -> CameraPose {
        let highlighted = self
            .entries
            .iter()
            .map(|e| &e.building)
            .filter(|b| b.highlighted);
        match camera::fit(highlighted, &self.settings.framing.fit_highlighted) {
            Some(pose) => {
                self.camera = pose;
                pose
            }
            None => self.fit_all(),
        }
    }

    pub fn fly_to(&mut self, id: i32) -> Option<CameraPose> {
        let pose = camera::fly_to(&self.get(id)?.building, &self.settings.framing);
        self.camera = pose;
        Some(pose)
    }

    pub fn pick(&self, ray: &Ray) -> Option<i32> {
        picking::pick(ray, self.entries.iter().map(|e| &e.building))
    }

    /// Update highlight and camera for a chat answer.
    ///
    /// Buildings in the response that are not loaded yet are added to the
    /// scene. Returns the new camera pose, or `None` when the camera stays put.
    pub fn apply_chat_response(&mut self, response: &ChatResponse) -> Option<CameraPose> {
        match response {
            ChatResponse::Text { .. } => None,
            ChatResponse::BuildingHighlight { building, .. } => {
                self.merge(std::slice::from_ref(building));
                self.set_highlighted([building.id]);
                self.fly_to(building.id)
            }
            ChatResponse::SearchResults { buildings, .. } => {
                self.merge(buildings);
                self.set_highlighted(buildings.iter().map(|b| b.id));
                Some(self.fit_highlighted())
            }
        }
    }

    fn merge(&mut self, buildings: &[Building]) {
        for building in buildings {
            if !self.source.iter().any(|b| b.id == building.id) {
                self.source.push(building.clone());
            }
        }
    }

    fn rebuild(&mut self) {
        self.entries.clear();
        self.skipped.clear();
        for building in &self.source {
            match self.place(building) {
                Ok(entry) => self.entries.push(entry),
                Err(e) => {
                    warn!(id = building.id, "Skipping building {}: {}", building.name, e);
                    self.skipped.push(SkippedBuilding {
                        id: building.id,
                        name: building.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        debug!(
            "Scene rebuilt: {} rendered, {} skipped, {} highlighted",
            self.entries.len(),
            self.skipped.len(),
            self.highlighted.len()
        );
    }

    fn place(&self, building: &Building) -> Result<SceneEntry, SceneError> {
        let placed = SceneBuilding::new(
            building.clone(),
            &self.settings.projection,
            &self.settings.height_scale,
            self.highlighted.contains(&building.id),
        )?;
        let mesh = extrude(&placed)?;
        Ok(SceneEntry {
            building: placed,
            mesh,
        })
    }
}
