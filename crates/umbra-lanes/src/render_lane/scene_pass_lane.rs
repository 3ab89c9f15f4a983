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

//! Scene pass lane: reflection probe captures, the main camera pass and the
//! depth-only pass feeding screen-space effects.

use super::{
    create_builtin_shader, create_depth_pipeline, RenderTargetSlot, RenderTargets, TransformBuffers,
};
use crate::light_lane::LightConstantLane;
use crate::shaders::{DEPTH_WGSL, SCENE_WGSL};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use umbra_core::lane::{Lane, LaneError, LaneKind};
use umbra_core::math::{LinearRgba, Mat4, FRAC_PI_2};
use umbra_core::renderer::bindings::{
    ENVIRONMENT_TEXTURE_SLOT, MATERIAL_SAMPLER_SLOT, MATERIAL_TEXTURE_COUNT, MATERIAL_TEXTURE_SLOT,
    SHADOW_SAMPLER_SLOT,
};
use umbra_core::renderer::light::{cube_face_views, SHADOW_NEAR_PLANE};
use umbra_core::renderer::traits::CommandEncoder;
use umbra_core::renderer::uniforms::FrameUniforms;
use umbra_core::renderer::{
    AddressMode, ColorTargetState, CullMode, DepthStencilState, FilterMode, GraphicsDevice, Owned,
    PrimitiveState, PrimitiveTopology, RenderError, RenderPass, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, RenderPipelineDescriptor,
    RenderPipelineId, ResourceError, SamplerBorderColor, SamplerDescriptor, SamplerId,
    ShaderModuleId, TextureDescriptor, TextureId, TextureUsage, TextureViewDescriptor,
    TextureViewDimension, TextureViewId, Viewport,
};
use umbra_data::{LightRegistry, ObjectKey, RendererConfig, SceneObjects, Vertex};

const STAGE: &str = "scene pass";

/// Startup parameters of the scene passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenePassSettings {
    /// Anisotropic filtering of material textures.
    pub anisotropy: u16,
    /// Clear color of the scene target and probe faces.
    pub clear_color: LinearRgba,
    /// Edge length of reflection probe faces.
    pub probe_resolution: u32,
}

impl From<&RendererConfig> for ScenePassSettings {
    fn from(config: &RendererConfig) -> Self {
        Self {
            anisotropy: config.anisotropy,
            clear_color: config.clear_color,
            probe_resolution: config.reflection_probe_resolution,
        }
    }
}

/// Counters of the passes recorded by one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Render passes recorded.
    pub passes: usize,
    /// Draw calls recorded.
    pub draws: usize,
}

impl std::ops::AddAssign for PassStats {
    fn add_assign(&mut self, other: Self) {
        self.passes += other.passes;
        self.draws += other.draws;
    }
}

/// The cube a reflection probe captures into.
struct ProbeTargets {
    face_views: Vec<Owned<TextureViewId>>,
    cube_view: Owned<TextureViewId>,
    depth_view: Owned<TextureViewId>,
    _color: Owned<TextureId>,
    _depth: Owned<TextureId>,
}

impl ProbeTargets {
    fn create(
        device: &Arc<dyn GraphicsDevice>,
        resolution: u32,
    ) -> Result<Self, RenderError> {
        let stage = |e: ResourceError| RenderError::from(e).in_stage("reflection probe");

        let mut color_desc = TextureDescriptor::d2(
            "reflection probe cube",
            resolution,
            resolution,
            RenderTargetSlot::COLOR_FORMAT,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        );
        color_desc.size.depth_or_array_layers = 6;
        let color = device.create_texture(&color_desc).map_err(stage)?;
        let color = Owned::new(device.clone(), color);

        let depth = device
            .create_texture(&TextureDescriptor::d2(
                "reflection probe depth",
                resolution,
                resolution,
                RenderTargetSlot::DEPTH_FORMAT,
                TextureUsage::DEPTH_STENCIL_ATTACHMENT,
            ))
            .map_err(stage)?;
        let depth = Owned::new(device.clone(), depth);

        let mut face_views = Vec::with_capacity(6);
        for layer in 0..6 {
            let view = device
                .create_texture_view(
                    color.id(),
                    &TextureViewDescriptor {
                        label: Some(format!("reflection probe face {layer}").into()),
                        dimension: Some(TextureViewDimension::D2),
                        base_array_layer: layer,
                        array_layer_count: Some(1),
                        ..Default::default()
                    },
                )
                .map_err(stage)?;
            face_views.push(Owned::new(device.clone(), view));
        }

        let cube_view = device
            .create_texture_view(
                color.id(),
                &TextureViewDescriptor {
                    label: Some("reflection probe cube view".into()),
                    dimension: Some(TextureViewDimension::Cube),
                    array_layer_count: Some(6),
                    ..Default::default()
                },
            )
            .map_err(stage)?;
        let cube_view = Owned::new(device.clone(), cube_view);

        let depth_view = device
            .create_texture_view(depth.id(), &TextureViewDescriptor::default())
            .map_err(stage)?;
        let depth_view = Owned::new(device.clone(), depth_view);

        Ok(Self {
            face_views,
            cube_view,
            depth_view,
            _color: color,
            _depth: depth,
        })
    }
}

/// GPU objects created on initialization.
struct SceneResources {
    device: Arc<dyn GraphicsDevice>,
    scene_pipeline: Owned<RenderPipelineId>,
    depth_pipeline: Owned<RenderPipelineId>,
    material_sampler: Owned<SamplerId>,
    shadow_sampler: Owned<SamplerId>,
    _scene_shader: Owned<ShaderModuleId>,
    _depth_shader: Owned<ShaderModuleId>,
}

/// Records the camera-facing geometry passes of a frame.
///
/// Objects flagged as reflection probes get a color cube captured from
/// their position each frame, which then replaces the sky as their
/// environment in the main pass.
pub struct ScenePassLane {
    settings: ScenePassSettings,
    resources: Option<SceneResources>,
    probes: HashMap<ObjectKey, ProbeTargets>,
}

impl ScenePassLane {
    /// Creates an uninitialized lane.
    pub fn new(settings: ScenePassSettings) -> Self {
        Self {
            settings,
            resources: None,
            probes: HashMap::new(),
        }
    }

    fn resources(&self) -> Result<&SceneResources, RenderError> {
        self.resources
            .as_ref()
            .ok_or(RenderError::NotInitialized("ScenePassLane"))
    }

    /// The main pass pipeline.
    pub fn scene_pipeline(&self) -> Option<RenderPipelineId> {
        self.resources.as_ref().map(|r| r.scene_pipeline.id())
    }

    /// The post-process depth pipeline.
    pub fn depth_pipeline(&self) -> Option<RenderPipelineId> {
        self.resources.as_ref().map(|r| r.depth_pipeline.id())
    }

    /// The main pass material and shadow samplers.
    pub fn samplers(&self) -> Option<(SamplerId, SamplerId)> {
        self.resources
            .as_ref()
            .map(|r| (r.material_sampler.id(), r.shadow_sampler.id()))
    }

    /// The captured cube of a probe object.
    pub fn probe_view(&self, key: ObjectKey) -> Option<TextureViewId> {
        self.probes.get(&key).map(|p| p.cube_view.id())
    }

    /// Number of probes with live captures.
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    fn bind_shading(
        &self,
        resources: &SceneResources,
        pass: &mut dyn RenderPass,
        transforms: &TransformBuffers,
        light_lane: &LightConstantLane,
    ) -> Result<(), RenderError> {
        pass.set_pipeline(resources.scene_pipeline.id());
        transforms.bind(pass);
        light_lane.bind(pass)?;
        pass.set_sampler(MATERIAL_SAMPLER_SLOT, resources.material_sampler.id());
        pass.set_sampler(SHADOW_SAMPLER_SLOT, resources.shadow_sampler.id());
        Ok(())
    }

    /// Captures the environment cube of every visible probe object.
    ///
    /// Each face renders every other visible object with full materials from
    /// the probe's position. Captures of objects that are no longer probes
    /// are released.
    #[allow(clippy::too_many_arguments)]
    pub fn render_probes(
        &mut self,
        encoder: &mut dyn CommandEncoder,
        lights: &LightRegistry,
        objects: &SceneObjects,
        light_lane: &LightConstantLane,
        transforms: &TransformBuffers,
        time: f32,
    ) -> Result<PassStats, RenderError> {
        let device = self.resources()?.device.clone();
        let probe_keys: Vec<ObjectKey> = objects.probes().map(|(key, _)| key).collect();
        self.probes.retain(|key, _| probe_keys.contains(key));
        for key in &probe_keys {
            if !self.probes.contains_key(key) {
                let targets = ProbeTargets::create(&device, self.settings.probe_resolution)?;
                log::debug!("ScenePassLane: created reflection probe for {key:?}");
                self.probes.insert(*key, targets);
            }
        }

        let resources = self.resources()?;
        let resolution = self.settings.probe_resolution;
        let projection =
            Mat4::perspective_rh(FRAC_PI_2, 1.0, SHADOW_NEAR_PLANE, lights.camera().far);
        let clear_color = self.settings.clear_color;
        let mut stats = PassStats::default();

        for (key, probe) in objects.probes() {
            let Some(targets) = self.probes.get(&key) else {
                continue;
            };
            let eye = probe.transform.position;
            for (face, view) in targets.face_views.iter().zip(cube_face_views(eye)) {
                let color = [RenderPassColorAttachment::clear(face.id(), clear_color)];
                let depth = RenderPassDepthStencilAttachment::clear(targets.depth_view.id(), 1.0);
                let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("reflection probe face"),
                    color_attachments: &color,
                    depth_stencil_attachment: Some(depth),
                });
                self.bind_shading(resources, pass.as_mut(), transforms, light_lane)?;
                pass.set_viewport(Viewport::square(resolution));
                pass.set_texture(ENVIRONMENT_TEXTURE_SLOT, lights.sky());
                transforms.write_frame(
                    pass.as_mut(),
                    &FrameUniforms::new(view, projection, eye, resolution, resolution, time),
                );
                for (other_key, object) in objects.visible() {
                    if other_key == key {
                        continue;
                    }
                    transforms.write_model(pass.as_mut(), object.transform.to_matrix());
                    object
                        .mesh
                        .render(pass.as_mut(), false)
                        .map_err(|e| e.in_stage("reflection probe"))?;
                    stats.draws += 1;
                }
                stats.passes += 1;
            }
        }

        unbind_material_inputs(encoder);
        Ok(stats)
    }

    /// Renders every visible object from the scene camera into the scene target.
    #[allow(clippy::too_many_arguments)]
    pub fn render_main(
        &self,
        encoder: &mut dyn CommandEncoder,
        lights: &LightRegistry,
        objects: &SceneObjects,
        light_lane: &LightConstantLane,
        targets: &RenderTargets,
        transforms: &TransformBuffers,
        time: f32,
    ) -> Result<PassStats, RenderError> {
        let resources = self.resources()?;
        let (scene_view, _) = targets.views(RenderTargetSlot::Scene)?;
        let (depth_view, _) = targets.views(RenderTargetSlot::MainDepth)?;
        let extent = targets.extent();
        let camera = lights.camera();
        let mut stats = PassStats::default();

        {
            let clear = RenderPassColorAttachment::clear(scene_view, self.settings.clear_color);
            let color = [clear];
            let depth = RenderPassDepthStencilAttachment::clear(depth_view, 1.0);
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("main pass"),
                color_attachments: &color,
                depth_stencil_attachment: Some(depth),
            });
            self.bind_shading(resources, pass.as_mut(), transforms, light_lane)?;
            pass.set_viewport(Viewport::from_extent(extent));
            transforms.write_frame(
                pass.as_mut(),
                &FrameUniforms::new(
                    camera.view_matrix(),
                    camera.projection_matrix(),
                    camera.position(),
                    extent.width,
                    extent.height,
                    time,
                ),
            );

            for (key, object) in objects.visible() {
                let environment = self.probe_view(key).or(lights.sky());
                pass.set_texture(ENVIRONMENT_TEXTURE_SLOT, environment);
                transforms.write_model(pass.as_mut(), object.transform.to_matrix());
                object
                    .mesh
                    .render(pass.as_mut(), false)
                    .map_err(|e| e.in_stage(STAGE))?;
                stats.draws += 1;
            }
            stats.passes += 1;
        }

        unbind_material_inputs(encoder);
        Ok(stats)
    }

    /// Renders the depth of opaque objects into the post-process depth target.
    ///
    /// Translucent objects are left out: their opacity maps are not
    /// evaluated by a depth-only pass.
    pub fn render_depth(
        &self,
        encoder: &mut dyn CommandEncoder,
        lights: &LightRegistry,
        objects: &SceneObjects,
        targets: &RenderTargets,
        transforms: &TransformBuffers,
        time: f32,
    ) -> Result<PassStats, RenderError> {
        let resources = self.resources()?;
        let (depth_view, _) = targets.views(RenderTargetSlot::PostDepth)?;
        let extent = targets.extent();
        let camera = lights.camera();
        let mut stats = PassStats::default();

        let depth = RenderPassDepthStencilAttachment::clear(depth_view, 1.0);
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("post-process depth pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(depth),
        });
        pass.set_pipeline(resources.depth_pipeline.id());
        pass.set_viewport(Viewport::from_extent(extent));
        transforms.bind(pass.as_mut());
        transforms.write_frame(
            pass.as_mut(),
            &FrameUniforms::new(
                camera.view_matrix(),
                camera.projection_matrix(),
                camera.position(),
                extent.width,
                extent.height,
                time,
            ),
        );
        for object in objects.opaque() {
            transforms.write_model(pass.as_mut(), object.transform.to_matrix());
            object
                .mesh
                .render(pass.as_mut(), true)
                .map_err(|e| e.in_stage("depth pass"))?;
            stats.draws += 1;
        }
        stats.passes += 1;
        Ok(stats)
    }
}

/// Clears the material and environment slots so no image stays bound as a
/// shader input when a later pass renders into it.
fn unbind_material_inputs(encoder: &mut dyn CommandEncoder) {
    encoder.unbind_textures(MATERIAL_TEXTURE_SLOT..MATERIAL_TEXTURE_SLOT + MATERIAL_TEXTURE_COUNT);
    encoder.set_texture(ENVIRONMENT_TEXTURE_SLOT, None);
}

impl Lane for ScenePassLane {
    fn strategy_name(&self) -> &'static str {
        "ScenePass"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Render
    }

    fn on_initialize(&mut self, device: &Arc<dyn GraphicsDevice>) -> Result<(), LaneError> {
        let scene_shader =
            create_builtin_shader(device, "scene shader", SCENE_WGSL).map_err(LaneError::init)?;
        let depth_shader =
            create_builtin_shader(device, "depth shader", DEPTH_WGSL).map_err(LaneError::init)?;

        let color_targets = [ColorTargetState {
            format: RenderTargetSlot::COLOR_FORMAT,
            blend: None,
        }];
        let scene_pipeline = device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some("scene pipeline".into()),
                vertex_shader: scene_shader.id(),
                vertex_entry_point: "vs_main",
                fragment_shader: Some(scene_shader.id()),
                fragment_entry_point: "fs_main",
                vertex_layout: Some(Vertex::layout()),
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleList,
                    cull_mode: Some(CullMode::Back),
                },
                depth_stencil: Some(DepthStencilState::standard(RenderTargetSlot::DEPTH_FORMAT)),
                color_targets: Cow::Borrowed(&color_targets),
            })
            .map_err(|e| LaneError::init(RenderError::from(e).in_stage(STAGE)))?;
        let scene_pipeline = Owned::new(device.clone(), scene_pipeline);

        let depth_pipeline = create_depth_pipeline(
            device,
            depth_shader.id(),
            "post-process depth pipeline",
            RenderTargetSlot::DEPTH_FORMAT,
        )
        .map_err(LaneError::init)?;

        let sampler = |descriptor: SamplerDescriptor| {
            device
                .create_sampler(&descriptor)
                .map(|id| Owned::new(device.clone(), id))
                .map_err(|e| LaneError::init(RenderError::from(e).in_stage(STAGE)))
        };
        let material_sampler = sampler(SamplerDescriptor {
            label: Some("material sampler".into()),
            address_mode: AddressMode::Repeat,
            anisotropy_clamp: self.settings.anisotropy.max(1),
            ..Default::default()
        })?;
        // Reads outside the map resolve to "lit".
        let shadow_sampler = sampler(SamplerDescriptor {
            label: Some("shadow sampler".into()),
            address_mode: AddressMode::ClampToBorder,
            mag_filter: FilterMode::Nearest,
            min_filter: FilterMode::Nearest,
            border_color: Some(SamplerBorderColor::OpaqueWhite),
            ..Default::default()
        })?;

        self.resources = Some(SceneResources {
            device: device.clone(),
            scene_pipeline,
            depth_pipeline,
            material_sampler,
            shadow_sampler,
            _scene_shader: scene_shader,
            _depth_shader: depth_shader,
        });
        log::info!(
            "ScenePassLane: initialized (anisotropy {}, probe resolution {})",
            self.settings.anisotropy,
            self.settings.probe_resolution
        );
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::math::{Extent2D, Transform, Vec3};
    use umbra_core::renderer::bindings::SHADOW_TEXTURE_BASE_SLOT;
    use umbra_core::renderer::MeshProvider;
    use umbra_data::{MeshMaterial, SceneObject, StaticMesh};
    use umbra_infra::HeadlessDevice;

    struct Fixture {
        headless: HeadlessDevice,
        device: Arc<dyn GraphicsDevice>,
        lights: LightRegistry,
        objects: SceneObjects,
        light_lane: LightConstantLane,
        transforms: TransformBuffers,
        targets: RenderTargets,
        lane: ScenePassLane,
        cube: Arc<dyn MeshProvider>,
    }

    fn fixture() -> Fixture {
        let headless = HeadlessDevice::new();
        let device: Arc<dyn GraphicsDevice> = Arc::new(headless.clone());
        let mut light_lane = LightConstantLane::new(4);
        light_lane.on_initialize(&device).unwrap();
        let mut lane = ScenePassLane::new(ScenePassSettings {
            anisotropy: 16,
            clear_color: LinearRgba::BLACK,
            probe_resolution: 8,
        });
        lane.on_initialize(&device).unwrap();
        let cube: Arc<dyn MeshProvider> =
            Arc::new(StaticMesh::cube(&device, "cube", 1.0, MeshMaterial::default()).unwrap());
        Fixture {
            headless,
            lights: LightRegistry::new(device.clone(), 4),
            objects: SceneObjects::new(8),
            light_lane,
            transforms: TransformBuffers::new(&device).unwrap(),
            targets: RenderTargets::new(device.clone(), Extent2D::new(32, 16)).unwrap(),
            device,
            lane,
            cube,
        }
    }

    fn submit<T>(f: &Fixture, record: impl FnOnce(&mut dyn CommandEncoder) -> T) -> T {
        let mut encoder = f.device.create_command_encoder(None);
        let out = record(encoder.as_mut());
        f.device.submit_command_buffer(encoder.finish());
        out
    }

    fn render_probes(f: &mut Fixture, encoder: &mut dyn CommandEncoder) -> PassStats {
        let stats = f.lane.render_probes(
            encoder,
            &f.lights,
            &f.objects,
            &f.light_lane,
            &f.transforms,
            0.0,
        );
        stats.unwrap()
    }

    #[test]
    fn samplers_match_their_roles() {
        let f = fixture();
        let (material, shadow) = f.lane.samplers().unwrap();
        let material = f.headless.sampler_info(material).unwrap();
        assert_eq!(material.anisotropy_clamp, 16);
        assert_eq!(material.address_mode, AddressMode::Repeat);
        let shadow = f.headless.sampler_info(shadow).unwrap();
        assert_eq!(shadow.address_mode, AddressMode::ClampToBorder);
        assert_eq!(shadow.border_color, Some(SamplerBorderColor::OpaqueWhite));
    }

    #[test]
    fn scene_pipeline_culls_back_faces_with_depth_test() {
        let f = fixture();
        let scene = f.lane.scene_pipeline().unwrap();
        let info = f.headless.pipeline_info(scene).unwrap();
        assert_eq!(
            info.depth_stencil,
            Some(DepthStencilState::standard(RenderTargetSlot::DEPTH_FORMAT))
        );
        assert!(info.has_fragment);
        let depth = f.lane.depth_pipeline().unwrap();
        let depth = f.headless.pipeline_info(depth).unwrap();
        assert!(!depth.has_fragment);
    }

    #[test]
    fn main_pass_clears_scene_and_leaves_no_material_bound() {
        let mut f = fixture();
        f.objects.add(SceneObject::new(f.cube.clone())).unwrap();
        let stats = submit(&f, |encoder| {
            f.lane.render_main(
                encoder,
                &f.lights,
                &f.objects,
                &f.light_lane,
                &f.targets,
                &f.transforms,
                0.0,
            )
        })
        .unwrap();
        let expected = PassStats {
            passes: 1,
            draws: 1,
        };
        assert_eq!(stats, expected);

        let pass = &f.headless.submitted_passes()[0];
        let scene_target = f.targets.view(RenderTargetSlot::Scene).unwrap();
        assert_eq!(pass.color_attachments, vec![scene_target]);
        assert_eq!(pass.depth_clear, Some(1.0));
        assert!(f
            .headless
            .bound_textures()
            .range(..SHADOW_TEXTURE_BASE_SLOT)
            .next()
            .is_none());
    }

    #[test]
    fn depth_pass_skips_translucent_objects() {
        let mut f = fixture();
        f.objects.add(SceneObject::new(f.cube.clone())).unwrap();
        let translucent = SceneObject::new(f.cube.clone()).translucent();
        f.objects.add(translucent).unwrap();
        let stats = submit(&f, |encoder| {
            f.lane.render_depth(
                encoder,
                &f.lights,
                &f.objects,
                &f.targets,
                &f.transforms,
                0.0,
            )
        })
        .unwrap();
        assert_eq!(stats.draws, 1);
        let pass = &f.headless.submitted_passes()[0];
        assert_eq!(
            pass.depth_attachment,
            f.targets.view(RenderTargetSlot::PostDepth)
        );
        assert!(pass.color_attachments.is_empty());
    }

    #[test]
    fn probes_capture_six_faces_of_the_other_objects() {
        let mut f = fixture();
        let probe = f
            .objects
            .add(
                SceneObject::new(f.cube.clone())
                    .with_transform(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
                    .with_reflection_probe(),
            )
            .unwrap();
        f.objects.add(SceneObject::new(f.cube.clone())).unwrap();
        f.objects.add(SceneObject::new(f.cube.clone())).unwrap();

        let mut encoder = f.device.create_command_encoder(None);
        let stats = render_probes(&mut f, encoder.as_mut());
        f.device.submit_command_buffer(encoder.finish());

        let expected = PassStats {
            passes: 6,
            draws: 12,
        };
        assert_eq!(stats, expected);
        assert_eq!(f.lane.probe_count(), 1);
        assert!(f.lane.probe_view(probe).is_some());
        assert!(f.headless.hazards().is_empty());
    }

    #[test]
    fn probe_capture_is_released_with_the_flag() {
        let mut f = fixture();
        let probe = f
            .objects
            .add(SceneObject::new(f.cube.clone()).with_reflection_probe())
            .unwrap();
        let before = f.headless.live_texture_count();
        let mut encoder = f.device.create_command_encoder(None);
        render_probes(&mut f, encoder.as_mut());
        assert_eq!(f.headless.live_texture_count(), before + 2);

        f.objects.get_mut(probe).unwrap().reflection_probe = false;
        render_probes(&mut f, encoder.as_mut());
        assert_eq!(f.headless.live_texture_count(), before);
        assert_eq!(f.lane.probe_count(), 0);
    }
}
