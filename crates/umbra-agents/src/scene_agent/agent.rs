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

//! Defines the [`SceneRenderer`], the per-frame orchestrator of the renderer.

use super::FrameStats;
use crate::error::AgentError;
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use umbra_core::camera::Camera;
use umbra_core::lane::Lane;
use umbra_core::math::Extent2D;
use umbra_core::renderer::bindings::SHADOW_TEXTURE_BASE_SLOT;
use umbra_core::renderer::{GraphicsDevice, Light, RenderError, ResourceError, TextureViewId};
use umbra_data::{
    FilterStack, LightHandle, LightRegistry, MeshLibrary, ObjectKey, RegistryError, RendererConfig,
    SceneDescription, SceneFormatError, SceneObject, SceneObjects,
};
use umbra_lanes::{
    LightConstantLane, PassStats, PostProcessLane, RenderTargets, ScenePassLane, ScenePassSettings,
    ShadowPassLane, TransformBuffers,
};

/// Owns the scene state and all rendering lanes, and renders frames.
///
/// Every frame runs the same fixed sequence:
///
/// 1. Apply queued light and object removals and pending shadow resolution
///    changes.
/// 2. Pack the active lights into the light blocks and upload them.
/// 3. Render the shadow map of every active shadow-casting light (spot,
///    then directional, then point) and bind the resulting views from
///    [`SHADOW_TEXTURE_BASE_SLOT`] on.
/// 4. Capture the reflection probes.
/// 5. Render the main camera view into the scene target.
/// 6. Render the post-process depth pass.
/// 7. Run the post-processing filter stack.
/// 8. Unbind the shadow views and submit.
pub struct SceneRenderer {
    device: Arc<dyn GraphicsDevice>,
    config: RendererConfig,
    lights: LightRegistry,
    objects: SceneObjects,
    filters: FilterStack,
    targets: RenderTargets,
    transforms: TransformBuffers,
    light_lane: LightConstantLane,
    shadow_lane: ShadowPassLane,
    scene_lane: ScenePassLane,
    post_lane: PostProcessLane,
    last_stats: FrameStats,
    frame_count: u64,
}

impl SceneRenderer {
    /// Creates an empty scene and initializes every lane.
    ///
    /// Fails if the configuration is invalid, if a render target or buffer
    /// cannot be allocated, or if a built-in shader or post-processing image
    /// cannot be loaded.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        config: RendererConfig,
    ) -> Result<Self, AgentError> {
        config.validate()?;

        let mut lights = LightRegistry::new(device.clone(), config.max_lights_per_kind);
        lights.camera_mut().set_viewport(config.viewport);
        let targets = RenderTargets::new(device.clone(), config.viewport)?;
        let transforms = TransformBuffers::new(&device)?;

        let mut light_lane = LightConstantLane::new(config.light_buffer_capacity);
        let mut shadow_lane = ShadowPassLane::new();
        let mut scene_lane = ScenePassLane::new(ScenePassSettings::from(&config));
        let mut post_lane = PostProcessLane::new(config.post_process_assets.clone());
        {
            let lanes: [&mut dyn Lane; 4] = [
                &mut light_lane,
                &mut shadow_lane,
                &mut scene_lane,
                &mut post_lane,
            ];
            for lane in lanes {
                lane.on_initialize(&device).map_err(|e| {
                    log::error!(
                        "SceneRenderer: failed to initialize lane {} ({}): {}",
                        lane.strategy_name(),
                        lane.lane_kind(),
                        e
                    );
                    RenderError::from(e)
                })?;
            }
        }

        log::info!(
            "SceneRenderer: ready ({}x{}, {} lights per kind, {} light records)",
            config.viewport.width,
            config.viewport.height,
            config.max_lights_per_kind,
            config.light_buffer_capacity
        );

        Ok(Self {
            device,
            objects: SceneObjects::new(config.max_objects),
            filters: FilterStack::new(),
            config,
            lights,
            targets,
            transforms,
            light_lane,
            shadow_lane,
            scene_lane,
            post_lane,
            last_stats: FrameStats::default(),
            frame_count: 0,
        })
    }

    /// Creates a renderer and populates it from a scene description.
    ///
    /// Lights whose shadow resolution is zero get the configured default.
    pub fn from_description(
        device: Arc<dyn GraphicsDevice>,
        config: RendererConfig,
        description: &SceneDescription,
        meshes: &MeshLibrary,
    ) -> Result<Self, AgentError> {
        let mut renderer = Self::new(device, config)?;
        let mut description = description.clone();
        for light in &mut description.lights {
            *light = with_default_resolution(*light, renderer.config.shadow_resolution);
        }
        description.populate(
            meshes,
            &mut renderer.lights,
            &mut renderer.objects,
            &mut renderer.filters,
        )?;
        renderer
            .lights
            .camera_mut()
            .set_viewport(renderer.config.viewport);
        Ok(renderer)
    }

    /// Loads a RON configuration and a RON scene from disk.
    pub fn load(
        device: Arc<dyn GraphicsDevice>,
        config_path: Option<&Path>,
        scene_path: &Path,
        meshes: &MeshLibrary,
    ) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => RendererConfig::load(path)
                .with_context(|| format!("Failed to load renderer config {}", path.display()))?,
            None => RendererConfig::default(),
        };
        let description = SceneDescription::load(scene_path)
            .with_context(|| format!("Failed to load scene {}", scene_path.display()))?;
        Self::from_description(device, config, &description, meshes)
            .context("Failed to build the scene renderer")
    }

    // --- Frame ---

    /// Renders one frame and returns the shader-readable view of the final
    /// image.
    ///
    /// `time` is the elapsed time in seconds; animated effects read it. Any
    /// error aborts the frame without submitting it.
    pub fn render_frame(&mut self, time: f32) -> Result<TextureViewId, RenderError> {
        let start = Instant::now();

        self.lights.flush_pending().map_err(registry_failure)?;
        let removed_objects = self.objects.flush_pending();
        if removed_objects > 0 {
            log::debug!("SceneRenderer: removed {removed_objects} queued objects");
        }

        self.light_lane.update(&self.lights);
        self.light_lane.upload()?;

        let limit = self.light_lane.capacity();
        let mut encoder = self.device.create_command_encoder(Some("scene frame"));

        let shadows = self.shadow_lane.execute(
            encoder.as_mut(),
            &self.lights,
            &self.objects,
            &self.transforms,
            limit,
            time,
        )?;
        for (slot, view) in (SHADOW_TEXTURE_BASE_SLOT..).zip(&shadows.views) {
            encoder.set_texture(slot, Some(*view));
        }

        let probes = self.scene_lane.render_probes(
            encoder.as_mut(),
            &self.lights,
            &self.objects,
            &self.light_lane,
            &self.transforms,
            time,
        )?;
        let main = self.scene_lane.render_main(
            encoder.as_mut(),
            &self.lights,
            &self.objects,
            &self.light_lane,
            &self.targets,
            &self.transforms,
            time,
        )?;
        let depth = self.scene_lane.render_depth(
            encoder.as_mut(),
            &self.lights,
            &self.objects,
            &self.targets,
            &self.transforms,
            time,
        )?;
        let post = self.post_lane.execute(
            encoder.as_mut(),
            &self.filters,
            &self.lights,
            &self.targets,
            time,
        )?;

        // Next frame renders into these maps again.
        let shadow_end = SHADOW_TEXTURE_BASE_SLOT + shadows.views.len() as u32;
        encoder.unbind_textures(SHADOW_TEXTURE_BASE_SLOT..shadow_end);
        self.device.submit_command_buffer(encoder.finish());

        let mut totals = PassStats {
            passes: shadows.passes,
            draws: shadows.draws,
        };
        totals += probes;
        totals += main;
        totals += depth;
        totals += post.stats;

        self.frame_count += 1;
        self.last_stats = FrameStats {
            frame: self.frame_count,
            passes: totals.passes,
            draws: totals.draws,
            shadow_views: shadows.views.len(),
            probe_faces: probes.passes,
            filters_applied: post.applied,
            filters_skipped: post.skipped,
            cpu_time: start.elapsed(),
        };
        log::trace!("SceneRenderer: {}", self.last_stats);
        Ok(post.view)
    }

    /// Updates the camera aspect ratio and the stored viewport, then recreates
    /// every render target at the new size.
    ///
    /// A zero width or height fails before anything changes.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        let extent = Extent2D::new(width, height);
        if width == 0 || height == 0 {
            let msg = format!("cannot resize to {width}x{height}");
            let err = RenderError::from(ResourceError::InvalidDescriptor(msg));
            return Err(err.in_stage("resize"));
        }
        if extent == self.targets.extent() {
            return Ok(());
        }
        self.lights.camera_mut().set_viewport(extent);
        self.config.viewport = extent;
        self.targets.resize(extent)?;
        log::info!("SceneRenderer: resized to {width}x{height}");
        Ok(())
    }

    // --- Scene editing ---

    /// Registers a light. A zero shadow resolution selects the configured default.
    pub fn add_light(&mut self, light: impl Into<Light>) -> Result<LightHandle, RegistryError> {
        let light = with_default_resolution(light.into(), self.config.shadow_resolution);
        self.lights.add(light)
    }

    /// Adds an object to the scene.
    pub fn add_object(&mut self, object: SceneObject) -> Result<ObjectKey, RegistryError> {
        self.objects.add(object)
    }

    /// Sets the environment cube sampled by objects without a reflection probe.
    pub fn set_sky(&mut self, sky: Option<TextureViewId>) {
        self.lights.set_sky(sky);
    }

    // --- Accessors ---

    /// The scene camera.
    pub fn camera(&self) -> &Camera {
        self.lights.camera()
    }

    /// The scene camera, mutably.
    pub fn camera_mut(&mut self) -> &mut Camera {
        self.lights.camera_mut()
    }

    /// The light registry.
    pub fn lights(&self) -> &LightRegistry {
        &self.lights
    }

    /// The light registry, mutably.
    pub fn lights_mut(&mut self) -> &mut LightRegistry {
        &mut self.lights
    }

    /// The scene objects.
    pub fn objects(&self) -> &SceneObjects {
        &self.objects
    }

    /// The scene objects, mutably.
    pub fn objects_mut(&mut self) -> &mut SceneObjects {
        &mut self.objects
    }

    /// The post-processing filters in execution order.
    pub fn filters(&self) -> &FilterStack {
        &self.filters
    }

    /// The post-processing filters, for reordering and editing.
    pub fn filters_mut(&mut self) -> &mut FilterStack {
        &mut self.filters
    }

    /// The shadow map views a frame binds, in binding order.
    pub fn shadow_maps(&self) -> Vec<TextureViewId> {
        self.lights.shadow_map_views(self.light_lane.capacity())
    }

    /// The render target chain.
    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    /// The light constant lane, holding the last packed light blocks.
    pub fn light_constants(&self) -> &LightConstantLane {
        &self.light_lane
    }

    /// The configuration, with the viewport kept up to date by [`resize`](Self::resize).
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Counters of the last rendered frame.
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Number of frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    // --- Saving ---

    /// Captures the camera, lights, objects and filters.
    pub fn snapshot(&self) -> SceneDescription {
        SceneDescription::capture(&self.lights, &self.objects, &self.filters)
    }

    /// Writes [`snapshot`](Self::snapshot) to a RON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SceneFormatError> {
        self.snapshot().save(path)
    }
}

fn with_default_resolution(light: Light, resolution: u32) -> Light {
    let fill = |current: u32| if current == 0 { resolution } else { current };
    match light {
        Light::Ambient(_) => light,
        Light::Spot(mut l) => {
            l.shadow_resolution = fill(l.shadow_resolution);
            Light::Spot(l)
        }
        Light::Directional(mut l) => {
            l.shadow_resolution = fill(l.shadow_resolution);
            Light::Directional(l)
        }
        Light::Point(mut l) => {
            l.shadow_resolution = fill(l.shadow_resolution);
            Light::Point(l)
        }
    }
}

fn registry_failure(err: RegistryError) -> RenderError {
    match err {
        RegistryError::Resource(render) => render.in_stage("shadow resources"),
        other => RenderError::Internal(other.to_string()),
    }
}
