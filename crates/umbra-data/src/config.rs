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

//! Renderer configuration, loadable from RON.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use umbra_core::math::{Extent2D, LinearRgba};
use umbra_core::renderer::light::DEFAULT_SHADOW_RESOLUTION;

/// Optional image files for the post-processing inputs.
///
/// A `None` entry selects a deterministic procedural image instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostProcessAssets {
    /// Grey-noise grain.
    pub noise: Option<PathBuf>,
    /// Burn height ramp.
    pub burn_ramp: Option<PathBuf>,
    /// Distortion vectors.
    pub distortion: Option<PathBuf>,
    /// SSAO random vectors.
    pub random_vectors: Option<PathBuf>,
}

/// Startup parameters of the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Initial render target size.
    pub viewport: Extent2D,
    /// Shadow resolution given to lights created without one.
    pub shadow_resolution: u32,
    /// Registry capacity per light kind.
    pub max_lights_per_kind: usize,
    /// GPU light record capacity per kind.
    pub light_buffer_capacity: usize,
    /// Scene object capacity.
    pub max_objects: usize,
    /// Anisotropic filtering of the main pass.
    pub anisotropy: u16,
    /// Edge length of reflection probe captures.
    pub reflection_probe_resolution: u32,
    /// Scene clear color.
    pub clear_color: LinearRgba,
    /// Post-processing input images.
    pub post_process_assets: PostProcessAssets,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            viewport: Extent2D::new(1280, 720),
            shadow_resolution: DEFAULT_SHADOW_RESOLUTION,
            max_lights_per_kind: 100,
            light_buffer_capacity: 64,
            max_objects: 4096,
            anisotropy: 16,
            reflection_probe_resolution: 256,
            clear_color: LinearRgba::BLACK,
            post_process_assets: PostProcessAssets::default(),
        }
    }
}

impl RendererConfig {
    /// Rejects zero sizes and a light buffer larger than the registry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return invalid(format!(
                "viewport {}x{} has a zero dimension",
                self.viewport.width, self.viewport.height
            ));
        }
        if self.shadow_resolution == 0 {
            return invalid("shadow_resolution must be positive".into());
        }
        if self.reflection_probe_resolution == 0 {
            return invalid("reflection_probe_resolution must be positive".into());
        }
        if self.max_lights_per_kind == 0 || self.light_buffer_capacity == 0 {
            return invalid("light capacities must be positive".into());
        }
        if self.light_buffer_capacity > self.max_lights_per_kind {
            return invalid(format!(
                "light_buffer_capacity ({}) exceeds max_lights_per_kind ({})",
                self.light_buffer_capacity, self.max_lights_per_kind
            ));
        }
        if self.max_objects == 0 {
            return invalid("max_objects must be positive".into());
        }
        if self.anisotropy == 0 {
            return invalid("anisotropy must be at least 1".into());
        }
        Ok(())
    }

    /// Parses and validates a RON document.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Loads and validates a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Writes the configuration as RON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RendererConfig::default();
        config.validate().unwrap();
        assert_eq!(config.shadow_resolution, 1024);
        assert_eq!(config.max_lights_per_kind, 100);
        assert_eq!(config.light_buffer_capacity, 64);
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config = RendererConfig::from_ron_str("(shadow_resolution: 512)").unwrap();
        assert_eq!(config.shadow_resolution, 512);
        assert_eq!(config.viewport, Extent2D::new(1280, 720));
    }

    #[test]
    fn oversized_light_buffer_is_rejected() {
        let config = RendererConfig {
            light_buffer_capacity: 200,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_viewport_is_rejected() {
        let err = RendererConfig::from_ron_str("(viewport: (width: 0, height: 10))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
