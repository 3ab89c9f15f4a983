// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Serializable scene descriptions.
//!
//! A description names meshes instead of holding them; a [`MeshLibrary`]
//! resolves the names when the description is applied.

use crate::error::SceneFormatError;
use crate::filter::{FilterStack, PostProcessFilter};
use crate::light_registry::LightRegistry;
use crate::objects::{SceneObject, SceneObjects};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use umbra_core::math::Transform;
use umbra_core::renderer::{Light, MeshProvider};
use umbra_core::Camera;

/// Meshes available to scene descriptions, by name.
pub type MeshLibrary = HashMap<String, Arc<dyn MeshProvider>>;

fn default_true() -> bool {
    true
}

/// One object of a scene description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDescription {
    /// Name of the mesh in the [`MeshLibrary`].
    pub mesh: String,
    /// World placement.
    #[serde(default)]
    pub transform: Transform,
    /// Rendered into shadow maps.
    #[serde(default = "default_true")]
    pub casts_shadows: bool,
    /// Left out of the post-process depth pass.
    #[serde(default)]
    pub translucent: bool,
    /// Captures a reflection probe.
    #[serde(default)]
    pub reflection_probe: bool,
    /// Drawn at all.
    #[serde(default = "default_true")]
    pub visible: bool,
}

/// Camera, lights, objects and filters of a scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// The main camera.
    pub camera: Camera,
    /// Lights, in registration order.
    pub lights: Vec<Light>,
    /// Objects, in draw order.
    pub objects: Vec<ObjectDescription>,
    /// Post-processing filters, in execution order.
    pub filters: Vec<PostProcessFilter>,
}

impl SceneDescription {
    /// Parses a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self, SceneFormatError> {
        ron::from_str(text).map_err(|e| SceneFormatError::Parse(e.to_string()))
    }

    /// Serializes to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, SceneFormatError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneFormatError::Serialize(e.to_string()))
    }

    /// Reads a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneFormatError> {
        Self::from_ron_str(&std::fs::read_to_string(path)?)
    }

    /// Writes a RON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneFormatError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }

    /// Adds the described camera, lights, objects and filters to the scene.
    ///
    /// Every mesh name is resolved before anything is added, so an unknown
    /// mesh leaves the scene untouched.
    pub fn populate(
        &self,
        meshes: &MeshLibrary,
        lights: &mut LightRegistry,
        objects: &mut SceneObjects,
        filters: &mut FilterStack,
    ) -> Result<(), SceneFormatError> {
        let resolved = self
            .objects
            .iter()
            .map(|desc| {
                meshes
                    .get(&desc.mesh)
                    .cloned()
                    .map(|mesh| (desc, mesh))
                    .ok_or_else(|| SceneFormatError::UnknownMesh(desc.mesh.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        lights.set_camera(self.camera);
        for light in &self.lights {
            lights.add(*light)?;
        }
        for (desc, mesh) in resolved {
            objects.add(SceneObject {
                mesh,
                transform: desc.transform,
                casts_shadows: desc.casts_shadows,
                translucent: desc.translucent,
                reflection_probe: desc.reflection_probe,
                visible: desc.visible,
            })?;
        }
        for filter in &self.filters {
            filters.push(*filter);
        }
        log::info!(
            "SceneDescription: populated {} lights, {} objects, {} filters",
            self.lights.len(),
            self.objects.len(),
            self.filters.len()
        );
        Ok(())
    }

    /// Describes the current state of a scene.
    pub fn capture(lights: &LightRegistry, objects: &SceneObjects, filters: &FilterStack) -> Self {
        Self {
            camera: *lights.camera(),
            lights: lights
                .handles()
                .into_iter()
                .filter_map(|h| lights.light(h))
                .collect(),
            objects: objects
                .iter()
                .map(|(_, o)| ObjectDescription {
                    mesh: o.mesh.name().to_owned(),
                    transform: o.transform,
                    casts_shadows: o.casts_shadows,
                    translucent: o.translucent,
                    reflection_probe: o.reflection_probe,
                    visible: o.visible,
                })
                .collect(),
            filters: filters.as_slice().to_vec(),
        }
    }
}
