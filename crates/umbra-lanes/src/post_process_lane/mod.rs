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

//! Post-processing lane: runs the ordered filter stack over the render targets.
//!
//! Every filter reads the scene target and composites into the final target,
//! which is then copied back into the scene target so the next filter sees
//! the result. Area and polygon filters first seed the final target with a
//! copy of the scene and blend their quad over it.

mod images;
mod region;

pub use images::DefaultImages;
pub use region::{area_region, polygon_corners, ScreenRegion};

use crate::render_lane::{create_builtin_shader, PassStats, RenderTargetSlot, RenderTargets};
use crate::shaders::POST_PROCESS_WGSL;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use umbra_core::camera::Camera;
use umbra_core::lane::{Lane, LaneError, LaneKind};
use umbra_core::math::{Extent2D, Vec3, Vec4};
use umbra_core::renderer::bindings::{
    AUX_TEXTURE_SLOT_1, POST_PROCESS_UNIFORM_SLOT, POST_SAMPLER_SLOT, SOURCE_TEXTURE_SLOT,
};
use umbra_core::renderer::traits::CommandEncoder;
use umbra_core::renderer::uniforms::PostProcessUniforms;
use umbra_core::renderer::{
    BlendState, BufferDescriptor, BufferId, BufferUsage, ColorTargetState, CompareFunction,
    DepthStencilState, GraphicsDevice, LightBase, Owned, PrimitiveState, PrimitiveTopology,
    RenderError, RenderPassColorAttachment, RenderPassDepthStencilAttachment, RenderPassDescriptor,
    RenderPipelineDescriptor, RenderPipelineId, ResourceError, SamplerDescriptor, SamplerId,
    ShaderModuleId, TextureFormat, TextureViewId, Viewport,
};
use umbra_data::{
    FilterStack, LightRegistry, PostProcessAssets, PostProcessEffect, PostProcessRegion,
};

const STAGE: &str = "post-process";
const NOISE_SEED: u64 = 0x6e01_5e;

/// One shader pass of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PostPass {
    Copy,
    Tint,
    GreyNoise,
    Burn,
    Distort,
    Spiral,
    HeatHaze,
    ChromaticAberration,
    GaussianBlur,
    Ssao,
    SsaoBlur,
    SsaoComposite,
    BloomExtract,
    BloomBlur,
    BloomComposite,
    GodRays,
}

impl PostPass {
    fn entry_point(self) -> &'static str {
        match self {
            PostPass::Copy => "fs_copy",
            PostPass::Tint => "fs_tint",
            PostPass::GreyNoise => "fs_grey_noise",
            PostPass::Burn => "fs_burn",
            PostPass::Distort => "fs_distort",
            PostPass::Spiral => "fs_spiral",
            PostPass::HeatHaze => "fs_heat_haze",
            PostPass::ChromaticAberration => "fs_chromatic_aberration",
            PostPass::GaussianBlur => "fs_gaussian_blur",
            PostPass::Ssao => "fs_ssao",
            PostPass::SsaoBlur => "fs_ssao_blur",
            PostPass::SsaoComposite => "fs_ssao_composite",
            PostPass::BloomExtract => "fs_bloom_extract",
            PostPass::BloomBlur => "fs_bloom_blur",
            PostPass::BloomComposite => "fs_bloom_composite",
            PostPass::GodRays => "fs_god_rays",
        }
    }
}

/// How the four vertices of a post-processing draw are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum QuadKind {
    /// The normalized `region` rectangle.
    Rect,
    /// Clip-space corners.
    Polygon,
}

impl QuadKind {
    fn entry_point(self) -> &'static str {
        match self {
            QuadKind::Rect => "vs_fullscreen",
            QuadKind::Polygon => "vs_polygon",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    pass: PostPass,
    quad: QuadKind,
    format: TextureFormat,
    blend: Option<BlendState>,
    depth: Option<CompareFunction>,
}

/// Where one filter lands on screen this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Placement {
    FullScreen,
    Area(ScreenRegion),
    Polygon([Vec4; 4]),
}

impl Placement {
    /// `None` when the region cannot be seen from the camera.
    fn resolve(region: &PostProcessRegion, camera: &Camera, viewport: Extent2D) -> Option<Self> {
        match *region {
            PostProcessRegion::FullScreen => Some(Placement::FullScreen),
            PostProcessRegion::Area { center, size } => {
                area_region(camera, center, size, viewport).map(Placement::Area)
            }
            PostProcessRegion::Polygon { points, world } => {
                polygon_corners(camera, &points, world).map(Placement::Polygon)
            }
        }
    }

    fn is_full_screen(&self) -> bool {
        matches!(self, Placement::FullScreen)
    }

    fn quad(&self) -> QuadKind {
        match self {
            Placement::Polygon(_) => QuadKind::Polygon,
            _ => QuadKind::Rect,
        }
    }

    // Partial regions fade out at their edges over the seeded target.
    fn blend(&self) -> Option<BlendState> {
        match self {
            Placement::FullScreen => None,
            _ => Some(BlendState::ALPHA_BLENDING),
        }
    }

    fn depth_compare(&self) -> CompareFunction {
        match self {
            Placement::FullScreen => CompareFunction::Always,
            _ => CompareFunction::LessEqual,
        }
    }

    fn write(&self, uniforms: &mut PostProcessUniforms) {
        match self {
            Placement::FullScreen => {}
            Placement::Area(region) => {
                uniforms.region = region.to_array();
                uniforms.screen[3] = region.depth;
            }
            Placement::Polygon(corners) => {
                uniforms.corners = corners.map(|c| c.to_array());
            }
        }
    }
}

/// One draw of a filter, rendered in its own pass.
#[derive(Debug, Clone, Copy)]
struct Step {
    label: &'static str,
    pass: PostPass,
    target: RenderTargetSlot,
    inputs: [Option<TextureViewId>; 3],
    quad: QuadKind,
    blend: Option<BlendState>,
    /// Attaches the main depth buffer with this test.
    depth: Option<CompareFunction>,
    uniforms: PostProcessUniforms,
}

impl Step {
    /// A full-target draw with no blending or depth.
    fn full(
        label: &'static str,
        pass: PostPass,
        target: RenderTargetSlot,
        inputs: [Option<TextureViewId>; 3],
        uniforms: PostProcessUniforms,
    ) -> Self {
        Self {
            label,
            pass,
            target,
            inputs,
            quad: QuadKind::Rect,
            blend: None,
            depth: None,
            uniforms,
        }
    }

    fn copy(label: &'static str, target: RenderTargetSlot, source: TextureViewId) -> Self {
        Self::full(
            label,
            PostPass::Copy,
            target,
            [Some(source), None, None],
            PostProcessUniforms::default(),
        )
    }
}

/// What [`PostProcessLane::execute`] produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostProcessOutput {
    /// Shader-readable view of the processed image.
    pub view: TextureViewId,
    /// Passes and draws recorded.
    pub stats: PassStats,
    /// Filters that drew something.
    pub applied: usize,
    /// Filters skipped because their region or light was not visible.
    pub skipped: usize,
}

struct PostResources {
    device: Arc<dyn GraphicsDevice>,
    uniforms: Owned<BufferId>,
    sampler: Owned<SamplerId>,
    images: DefaultImages,
    shader: Owned<ShaderModuleId>,
}

/// Runs the filter stack.
///
/// Pipelines are created on first use for each combination of effect,
/// quad kind, target format, blending and depth test.
pub struct PostProcessLane {
    assets: PostProcessAssets,
    rng: StdRng,
    pipelines: HashMap<PipelineKey, Owned<RenderPipelineId>>,
    resources: Option<PostResources>,
}

impl PostProcessLane {
    /// Creates an uninitialized lane loading its images from `assets`.
    pub fn new(assets: PostProcessAssets) -> Self {
        Self {
            assets,
            rng: StdRng::seed_from_u64(NOISE_SEED),
            pipelines: HashMap::new(),
            resources: None,
        }
    }

    fn resources(&self) -> Result<&PostResources, RenderError> {
        self.resources
            .as_ref()
            .ok_or(RenderError::NotInitialized("PostProcessLane"))
    }

    /// The loaded default images.
    pub fn images(&self) -> Option<&DefaultImages> {
        self.resources.as_ref().map(|r| &r.images)
    }

    /// The post-processing uniform buffer.
    pub fn uniform_buffer(&self) -> Option<BufferId> {
        self.resources.as_ref().map(|r| r.uniforms.id())
    }

    /// Number of pipelines created so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn pipeline(&mut self, key: PipelineKey) -> Result<RenderPipelineId, RenderError> {
        if let Some(pipeline) = self.pipelines.get(&key) {
            return Ok(pipeline.id());
        }
        let resources = self
            .resources
            .as_ref()
            .ok_or(RenderError::NotInitialized("PostProcessLane"))?;
        let color_targets = [ColorTargetState {
            format: key.format,
            blend: key.blend,
        }];
        let id = resources
            .device
            .create_render_pipeline(&RenderPipelineDescriptor {
                label: Some(format!("post-process {}", key.pass.entry_point()).into()),
                vertex_shader: resources.shader.id(),
                vertex_entry_point: key.quad.entry_point(),
                fragment_shader: Some(resources.shader.id()),
                fragment_entry_point: key.pass.entry_point(),
                vertex_layout: None,
                primitive: PrimitiveState {
                    topology: PrimitiveTopology::TriangleStrip,
                    cull_mode: None,
                },
                depth_stencil: key.depth.map(|depth_compare| DepthStencilState {
                    format: RenderTargetSlot::DEPTH_FORMAT,
                    depth_write_enabled: false,
                    depth_compare,
                }),
                color_targets: Cow::Borrowed(&color_targets),
            })
            .map_err(|e| RenderError::from(e).in_stage(STAGE))?;
        let owned = Owned::new(resources.device.clone(), id);
        log::debug!("PostProcessLane: created pipeline {:?}", key);
        self.pipelines.insert(key, owned);
        Ok(id)
    }

    /// Runs every filter of `filters` in order.
    ///
    /// A filter whose region is behind the camera (or, for god rays, with no
    /// visible light) is skipped without affecting the others. With no
    /// applied filter the output is the unprocessed scene image.
    pub fn execute(
        &mut self,
        encoder: &mut dyn CommandEncoder,
        filters: &FilterStack,
        lights: &LightRegistry,
        targets: &RenderTargets,
        time: f32,
    ) -> Result<PostProcessOutput, RenderError> {
        self.resources()?;
        let (_, scene) = targets.views(RenderTargetSlot::Scene)?;
        let mut output = PostProcessOutput {
            view: scene,
            stats: PassStats::default(),
            applied: 0,
            skipped: 0,
        };

        for filter in filters {
            let steps = Placement::resolve(&filter.region, lights.camera(), targets.extent())
                .map(|placement| self.plan(filter.effect, &placement, lights, targets, time))
                .transpose()?
                .flatten();
            let Some(steps) = steps else {
                log::trace!(
                    "PostProcessLane: '{}' is not visible this frame",
                    filter.effect
                );
                output.skipped += 1;
                continue;
            };
            for step in &steps {
                self.record(encoder, targets, step)?;
                output.stats.passes += 1;
                output.stats.draws += 1;
            }
            output.applied += 1;
        }

        if output.applied > 0 {
            output.view = targets.views(RenderTargetSlot::Final)?.1;
        }
        Ok(output)
    }

    /// Lists the draws of one filter, or `None` when it has nothing to show.
    fn plan(
        &mut self,
        effect: PostProcessEffect,
        placement: &Placement,
        lights: &LightRegistry,
        targets: &RenderTargets,
        time: f32,
    ) -> Result<Option<Vec<Step>>, RenderError> {
        let sample = |slot: RenderTargetSlot| targets.views(slot).map(|(_, sample)| sample);
        let scene = sample(RenderTargetSlot::Scene)?;
        let final_view = sample(RenderTargetSlot::Final)?;
        let extent = targets.extent();

        let full_uniforms = PostProcessUniforms {
            screen: [extent.width as f32, extent.height as f32, time, 0.0],
            ..Default::default()
        };
        let mut uniforms = full_uniforms;
        placement.write(&mut uniforms);

        let mut steps = Vec::new();
        let mut blend = placement.blend();
        let mut inputs = [Some(scene), None, None];

        let pass = match effect {
            PostProcessEffect::Tint { color } => {
                uniforms.extra = color.into();
                PostPass::Tint
            }
            PostProcessEffect::GreyNoise { strength } => {
                let offset: [f32; 2] = self.rng.gen();
                uniforms.params = [strength, offset[0], offset[1], 0.0];
                inputs[1] = Some(self.resources()?.images.noise());
                PostPass::GreyNoise
            }
            PostProcessEffect::Burn { speed } => {
                uniforms.params[0] = (time * speed).rem_euclid(1.0);
                inputs[1] = Some(self.resources()?.images.burn_ramp());
                PostPass::Burn
            }
            PostProcessEffect::Distort { strength } => {
                uniforms.params[0] = strength;
                inputs[1] = Some(self.resources()?.images.distortion());
                PostPass::Distort
            }
            PostProcessEffect::Spiral { angle } => {
                uniforms.params[0] = angle;
                PostPass::Spiral
            }
            PostProcessEffect::HeatHaze { strength, speed } => {
                uniforms.params = [strength, speed, 0.0, 0.0];
                PostPass::HeatHaze
            }
            PostProcessEffect::ChromaticAberration { offset } => {
                uniforms.params[0] = offset;
                PostPass::ChromaticAberration
            }
            PostProcessEffect::GaussianBlur { radius } => {
                uniforms.params[0] = radius;
                PostPass::GaussianBlur
            }
            PostProcessEffect::Ssao {
                radius,
                intensity,
                blur,
                copy_back,
            } => {
                let depth = sample(RenderTargetSlot::PostDepth)?;
                let ssao = sample(RenderTargetSlot::Ssao)?;
                let luminance = sample(RenderTargetSlot::Luminance)?;
                let random = self.resources()?.images.random_vectors();
                steps.push(Step::full(
                    "ssao occlusion",
                    PostPass::Ssao,
                    RenderTargetSlot::Ssao,
                    [Some(scene), Some(depth), Some(random)],
                    PostProcessUniforms {
                        params: [radius, intensity, 0.0, 0.0],
                        ..full_uniforms
                    },
                ));
                let mut occlusion = ssao;
                if blur {
                    steps.push(Step::full(
                        "ssao blur",
                        PostPass::SsaoBlur,
                        RenderTargetSlot::Luminance,
                        [Some(ssao), None, None],
                        full_uniforms,
                    ));
                    occlusion = luminance;
                    if copy_back {
                        steps.push(Step::copy("ssao copy back", RenderTargetSlot::Ssao, luminance));
                        occlusion = ssao;
                    }
                }
                inputs[1] = Some(occlusion);
                PostPass::SsaoComposite
            }
            PostProcessEffect::Bloom {
                threshold,
                intensity,
            } => {
                let luminance = sample(RenderTargetSlot::Luminance)?;
                uniforms.params = [threshold, intensity, 0.0, 0.0];
                steps.push(Step::full(
                    "bloom extract",
                    PostPass::BloomExtract,
                    RenderTargetSlot::Luminance,
                    [Some(scene), None, None],
                    PostProcessUniforms {
                        params: uniforms.params,
                        ..full_uniforms
                    },
                ));
                steps.push(Step::full(
                    "bloom blur",
                    PostPass::BloomBlur,
                    RenderTargetSlot::Final,
                    [Some(luminance), None, None],
                    full_uniforms,
                ));
                steps.push(Step::copy("bloom copy back", RenderTargetSlot::Luminance, final_view));
                inputs[0] = Some(luminance);
                blend = Some(BlendState::ADDITIVE);
                PostPass::BloomComposite
            }
            PostProcessEffect::GodRays {
                density,
                decay,
                exposure,
            } => {
                let camera = lights.camera();
                let Some(uv) = god_ray_source(lights).and_then(|p| camera.project_to_screen(p))
                else {
                    return Ok(None);
                };
                uniforms.params = [density, decay, exposure, 0.0];
                uniforms.extra = [uv.x, uv.y, 0.0, 0.0];
                PostPass::GodRays
            }
        };

        // Bloom adds onto the seeded image, so it is seeded even full-screen.
        if !placement.is_full_screen() || matches!(effect, PostProcessEffect::Bloom { .. }) {
            steps.push(Step::copy("post-process seed", RenderTargetSlot::Final, scene));
        }
        steps.push(Step {
            label: effect.name(),
            pass,
            target: RenderTargetSlot::Final,
            inputs,
            quad: placement.quad(),
            blend,
            depth: Some(placement.depth_compare()),
            uniforms,
        });
        steps.push(Step::copy(
            "post-process copy back",
            RenderTargetSlot::Scene,
            final_view,
        ));
        Ok(Some(steps))
    }

    fn record(
        &mut self,
        encoder: &mut dyn CommandEncoder,
        targets: &RenderTargets,
        step: &Step,
    ) -> Result<(), RenderError> {
        let pipeline = self.pipeline(PipelineKey {
            pass: step.pass,
            quad: step.quad,
            format: step.target.format(),
            blend: step.blend,
            depth: step.depth,
        })?;
        let resources = self.resources()?;
        let (target, _) = targets.views(step.target)?;
        let depth = match step.depth {
            Some(_) => Some(RenderPassDepthStencilAttachment::load(
                targets.views(RenderTargetSlot::MainDepth)?.0,
            )),
            None => None,
        };

        {
            let color = [RenderPassColorAttachment::load(target)];
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some(step.label),
                color_attachments: &color,
                depth_stencil_attachment: depth,
            });
            pass.set_pipeline(pipeline);
            pass.set_viewport(Viewport::from_extent(targets.extent()));
            pass.write_uniform(resources.uniforms.id(), bytemuck::bytes_of(&step.uniforms));
            pass.set_uniform_buffer(POST_PROCESS_UNIFORM_SLOT, resources.uniforms.id());
            pass.set_sampler(POST_SAMPLER_SLOT, resources.sampler.id());
            for (slot, view) in (SOURCE_TEXTURE_SLOT..).zip(step.inputs) {
                pass.set_texture(slot, view);
            }
            pass.draw(0..4, 0..1);
        }

        // The next step may render into one of these inputs.
        encoder.unbind_textures(SOURCE_TEXTURE_SLOT..AUX_TEXTURE_SLOT_1 + 1);
        Ok(())
    }
}

/// Position of the first enabled light, preferring directional, then
/// ambient, then spot, then point lights.
fn god_ray_source(lights: &LightRegistry) -> Option<Vec3> {
    let directional = lights.directional_lights().map(|(_, e)| &e.light.base);
    let ambient = lights.ambient_lights().map(|(_, l)| &l.base);
    let spot = lights.spot_lights().map(|(_, e)| &e.light.base);
    let point = lights.point_lights().map(|(_, e)| &e.light.base);
    directional
        .chain(ambient)
        .chain(spot)
        .chain(point)
        .find(|base: &&LightBase| base.enabled)
        .map(|base| base.position())
}

impl Lane for PostProcessLane {
    fn strategy_name(&self) -> &'static str {
        "PostProcess"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::PostProcess
    }

    fn on_initialize(&mut self, device: &Arc<dyn GraphicsDevice>) -> Result<(), LaneError> {
        let shader = create_builtin_shader(device, "post-process shader", POST_PROCESS_WGSL)
            .map_err(LaneError::init)?;
        let images = DefaultImages::load(device, &self.assets).map_err(LaneError::init)?;
        let stage = |e: ResourceError| LaneError::init(RenderError::from(e).in_stage(STAGE));

        let uniforms = device
            .create_buffer(&BufferDescriptor {
                label: Some("post-process uniforms".into()),
                size: std::mem::size_of::<PostProcessUniforms>() as u64,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            })
            .map_err(stage)?;
        let uniforms = Owned::new(device.clone(), uniforms);
        let sampler = device
            .create_sampler(&SamplerDescriptor {
                label: Some("post-process sampler".into()),
                ..Default::default()
            })
            .map_err(stage)?;
        let sampler = Owned::new(device.clone(), sampler);

        self.pipelines.clear();
        self.resources = Some(PostResources {
            device: device.clone(),
            uniforms,
            sampler,
            images,
            shader,
        });
        log::info!("PostProcessLane: initialized");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.resources.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use umbra_core::math::{LinearRgba, Mat4, Transform, Vec2};
    use umbra_core::renderer::{AmbientLight, DirectionalLight, PointLight, SpotLight};
    use umbra_data::PostProcessFilter;
    use umbra_infra::graphics::headless::PassRecord;
    use umbra_infra::HeadlessDevice;

    struct Fixture {
        headless: HeadlessDevice,
        device: Arc<dyn GraphicsDevice>,
        lights: LightRegistry,
        targets: RenderTargets,
        lane: PostProcessLane,
    }

    fn fixture() -> Fixture {
        let headless = HeadlessDevice::new();
        let device: Arc<dyn GraphicsDevice> = Arc::new(headless.clone());
        let mut lane = PostProcessLane::new(PostProcessAssets::default());
        lane.on_initialize(&device).unwrap();
        let mut lights = LightRegistry::new(device.clone(), 4);
        lights.camera_mut().set_viewport(Extent2D::new(64, 32));
        Fixture {
            headless,
            lights,
            targets: RenderTargets::new(device.clone(), Extent2D::new(64, 32)).unwrap(),
            device,
            lane,
        }
    }

    fn run(f: &mut Fixture, filters: Vec<PostProcessFilter>, time: f32) -> PostProcessOutput {
        let filters = FilterStack::from(filters);
        let mut encoder = f.device.create_command_encoder(None);
        let output = f
            .lane
            .execute(encoder.as_mut(), &filters, &f.lights, &f.targets, time)
            .unwrap();
        f.device.submit_command_buffer(encoder.finish());
        output
    }

    fn labels(passes: &[PassRecord]) -> Vec<&str> {
        passes.iter().filter_map(|p| p.label.as_deref()).collect()
    }

    fn uniforms(pass: &PassRecord) -> PostProcessUniforms {
        pass.draws[0]
            .uniform::<PostProcessUniforms>(POST_PROCESS_UNIFORM_SLOT)
            .unwrap()
    }

    fn tint() -> PostProcessEffect {
        PostProcessEffect::Tint {
            color: LinearRgba::new(1.0, 0.5, 0.25, 1.0),
        }
    }

    fn view(f: &Fixture, slot: RenderTargetSlot) -> TextureViewId {
        f.targets.view(slot).unwrap()
    }

    fn sample(f: &Fixture, slot: RenderTargetSlot) -> TextureViewId {
        f.targets.sample_view(slot).unwrap()
    }

    #[test]
    fn empty_stack_presents_the_scene() {
        let mut f = fixture();
        let output = run(&mut f, Vec::new(), 0.0);
        assert_eq!(output.view, sample(&f, RenderTargetSlot::Scene));
        assert_eq!(output.stats, PassStats::default());
        assert!(f.headless.submitted_passes().is_empty());
    }

    #[test]
    fn full_screen_filter_renders_into_final_then_copies_back() {
        let mut f = fixture();
        let output = run(&mut f, vec![PostProcessFilter::full_screen(tint())], 0.0);
        assert_eq!(output.view, sample(&f, RenderTargetSlot::Final));
        assert_eq!(output.applied, 1);

        let passes = f.headless.submitted_passes();
        assert_eq!(labels(&passes), ["tint", "post-process copy back"]);

        let effect = &passes[0];
        let final_target = view(&f, RenderTargetSlot::Final);
        let main_depth = view(&f, RenderTargetSlot::MainDepth);
        assert_eq!(effect.color_attachments, vec![final_target]);
        assert_eq!(effect.depth_attachment, Some(main_depth));
        assert_eq!(effect.depth_clear, None);
        let draw = &effect.draws[0];
        assert_eq!(
            draw.textures.get(&SOURCE_TEXTURE_SLOT),
            Some(&sample(&f, RenderTargetSlot::Scene))
        );
        assert_eq!(uniforms(effect).extra, [1.0, 0.5, 0.25, 1.0]);
        assert_eq!(uniforms(effect).region, [0.0, 0.0, 1.0, 1.0]);
        let pipeline = f.headless.pipeline_info(draw.pipeline.unwrap()).unwrap();
        assert_eq!(pipeline.blend, vec![None]);
        assert_eq!(pipeline.topology, PrimitiveTopology::TriangleStrip);
        assert_eq!(
            pipeline.depth_stencil.map(|d| d.depth_compare),
            Some(CompareFunction::Always)
        );

        let copy = &passes[1];
        let scene_target = view(&f, RenderTargetSlot::Scene);
        assert_eq!(copy.color_attachments, vec![scene_target]);
        assert_eq!(
            copy.draws[0].textures.get(&SOURCE_TEXTURE_SLOT),
            Some(&sample(&f, RenderTargetSlot::Final))
        );

        assert!(f.headless.hazards().is_empty());
        assert!(f.headless.bound_textures().is_empty());
    }

    #[test]
    fn area_inside_the_near_plane_draws_nothing() {
        let mut f = fixture();
        assert_relative_eq!(f.lights.camera().near, 0.1);
        let filter = PostProcessFilter::area(tint(), Vec3::new(0.0, 0.0, -0.05), Vec2::ONE);
        let output = run(&mut f, vec![filter], 0.0);
        assert_eq!(output.skipped, 1);
        assert_eq!(output.applied, 0);
        assert_eq!(output.view, sample(&f, RenderTargetSlot::Scene));
        assert!(f.headless.submitted_passes().is_empty());
    }

    #[test]
    fn area_filter_is_seeded_and_blended_at_its_depth() {
        let mut f = fixture();
        let center = Vec3::new(0.0, 0.0, -5.0);
        let size = Vec2::splat(2.0);
        let filter = PostProcessFilter::area(tint(), center, size);
        run(&mut f, vec![filter], 0.0);

        let passes = f.headless.submitted_passes();
        assert_eq!(
            labels(&passes),
            ["post-process seed", "tint", "post-process copy back"]
        );
        let final_target = view(&f, RenderTargetSlot::Final);
        assert_eq!(passes[0].color_attachments, vec![final_target]);

        let viewport = f.targets.extent();
        let expected = area_region(f.lights.camera(), center, size, viewport).unwrap();
        let effect = uniforms(&passes[1]);
        assert_eq!(effect.region, expected.to_array());
        assert_relative_eq!(effect.screen[3], expected.depth);
        let pipeline = f
            .headless
            .pipeline_info(passes[1].draws[0].pipeline.unwrap())
            .unwrap();
        assert_eq!(pipeline.blend, vec![Some(BlendState::ALPHA_BLENDING)]);
        assert_eq!(
            pipeline.depth_stencil.map(|d| d.depth_compare),
            Some(CompareFunction::LessEqual)
        );
        assert!(f.headless.hazards().is_empty());
    }

    #[test]
    fn polygon_filter_draws_its_clip_space_corners() {
        let mut f = fixture();
        let points = [
            Vec3::new(-1.0, 1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
        ];
        let world = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
        run(
            &mut f,
            vec![PostProcessFilter::polygon(
                PostProcessEffect::GaussianBlur { radius: 2.0 },
                points,
                world,
            )],
            0.0,
        );

        let passes = f.headless.submitted_passes();
        assert_eq!(passes.len(), 3);
        let expected = polygon_corners(f.lights.camera(), &points, world).unwrap();
        assert_eq!(uniforms(&passes[1]).corners, expected.map(|c| c.to_array()));
        assert_eq!(uniforms(&passes[1]).params[0], 2.0);
    }

    #[test]
    fn polygon_behind_the_camera_is_skipped() {
        let mut f = fixture();
        let points = [Vec3::new(0.0, 0.0, 1.0); 4];
        let filters = vec![
            PostProcessFilter::polygon(tint(), points, Mat4::IDENTITY),
            PostProcessFilter::full_screen(tint()),
        ];
        let output = run(&mut f, filters, 0.0);
        assert_eq!(output.skipped, 1);
        assert_eq!(output.applied, 1);
        assert_eq!(f.headless.submitted_passes().len(), 2);
    }

    #[test]
    fn ssao_runs_occlusion_blur_and_copy_back_before_compositing() {
        let mut f = fixture();
        let ssao = PostProcessEffect::Ssao {
            radius: 0.5,
            intensity: 1.0,
            blur: true,
            copy_back: true,
        };
        run(&mut f, vec![PostProcessFilter::full_screen(ssao)], 0.0);
        let passes = f.headless.submitted_passes();
        assert_eq!(
            labels(&passes),
            [
                "ssao occlusion",
                "ssao blur",
                "ssao copy back",
                "ssao",
                "post-process copy back"
            ]
        );
        let occlusion = &passes[0].draws[0];
        let ssao_target = view(&f, RenderTargetSlot::Ssao);
        assert_eq!(passes[0].color_attachments, vec![ssao_target]);
        assert_eq!(
            occlusion.textures.get(&(SOURCE_TEXTURE_SLOT + 1)),
            Some(&sample(&f, RenderTargetSlot::PostDepth))
        );
        assert_eq!(
            passes[3].draws[0].textures.get(&(SOURCE_TEXTURE_SLOT + 1)),
            Some(&sample(&f, RenderTargetSlot::Ssao))
        );
        assert!(f.headless.hazards().is_empty());
    }

    #[test]
    fn ssao_without_blur_composites_the_raw_term() {
        let mut f = fixture();
        let ssao = PostProcessEffect::Ssao {
            radius: 0.5,
            intensity: 1.0,
            blur: false,
            copy_back: true,
        };
        run(&mut f, vec![PostProcessFilter::full_screen(ssao)], 0.0);
        let passes = f.headless.submitted_passes();
        assert_eq!(
            labels(&passes),
            ["ssao occlusion", "ssao", "post-process copy back"]
        );
    }

    #[test]
    fn bloom_adds_the_blurred_highlights_onto_the_seeded_scene() {
        let mut f = fixture();
        let bloom = PostProcessEffect::Bloom {
            threshold: 0.8,
            intensity: 1.5,
        };
        let output = run(&mut f, vec![PostProcessFilter::full_screen(bloom)], 0.0);
        let expected = PassStats {
            passes: 6,
            draws: 6,
        };
        assert_eq!(output.stats, expected);
        let passes = f.headless.submitted_passes();
        assert_eq!(
            labels(&passes),
            [
                "bloom extract",
                "bloom blur",
                "bloom copy back",
                "post-process seed",
                "bloom",
                "post-process copy back"
            ]
        );
        let composite = &passes[4];
        assert_eq!(
            composite.draws[0].textures.get(&SOURCE_TEXTURE_SLOT),
            Some(&sample(&f, RenderTargetSlot::Luminance))
        );
        let pipeline = f
            .headless
            .pipeline_info(composite.draws[0].pipeline.unwrap())
            .unwrap();
        assert_eq!(pipeline.blend, vec![Some(BlendState::ADDITIVE)]);
        assert_eq!(uniforms(composite).params[1], 1.5);
        assert!(f.headless.hazards().is_empty());
    }

    #[test]
    fn god_rays_need_a_visible_light() {
        let mut f = fixture();
        let rays = PostProcessFilter::full_screen(PostProcessEffect::GodRays {
            density: 0.9,
            decay: 0.96,
            exposure: 0.3,
        });
        let output = run(&mut f, vec![rays], 0.0);
        assert_eq!(output.skipped, 1);

        let position = Vec3::new(1.0, 1.0, -10.0);
        f.lights
            .add(DirectionalLight {
                base: LightBase {
                    transform: Transform::from_position(position),
                    ..Default::default()
                },
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();
        let output = run(&mut f, vec![rays], 0.0);
        assert_eq!(output.applied, 1);
        let passes = f.headless.take_submitted_passes();
        let uv = f.lights.camera().project_to_screen(position).unwrap();
        let effect = uniforms(&passes[0]);
        assert_relative_eq!(effect.extra[0], uv.x);
        assert_relative_eq!(effect.extra[1], uv.y);
    }

    fn god_rays() -> PostProcessFilter {
        PostProcessFilter::full_screen(PostProcessEffect::GodRays {
            density: 0.9,
            decay: 0.96,
            exposure: 0.3,
        })
    }

    fn placed_at(position: Vec3) -> LightBase {
        LightBase {
            transform: Transform::from_position(position),
            ..Default::default()
        }
    }

    fn god_ray_uv(f: &mut Fixture) -> Vec2 {
        let output = run(f, vec![god_rays()], 0.0);
        assert_eq!(output.applied, 1);
        let passes = f.headless.take_submitted_passes();
        let effect = uniforms(&passes[0]);
        Vec2::new(effect.extra[0], effect.extra[1])
    }

    fn assert_rays_from(f: &mut Fixture, position: Vec3) {
        let expected = f.lights.camera().project_to_screen(position).unwrap();
        let uv = god_ray_uv(f);
        assert_relative_eq!(uv.x, expected.x, epsilon = 1e-5);
        assert_relative_eq!(uv.y, expected.y, epsilon = 1e-5);
    }

    #[test]
    fn god_rays_prefer_directional_then_ambient_then_spot_then_point() {
        let mut f = fixture();
        let point = Vec3::new(-2.0, 0.5, -10.0);
        let spot = Vec3::new(2.0, -0.5, -10.0);
        let ambient = Vec3::new(0.5, 1.5, -8.0);
        let directional = Vec3::new(-1.0, -1.5, -12.0);

        f.lights
            .add(PointLight {
                base: placed_at(point),
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();
        assert_rays_from(&mut f, point);

        f.lights
            .add(SpotLight {
                base: placed_at(spot),
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();
        assert_rays_from(&mut f, spot);

        f.lights
            .add(AmbientLight {
                base: placed_at(ambient),
            })
            .unwrap();
        assert_rays_from(&mut f, ambient);

        f.lights
            .add(DirectionalLight {
                base: placed_at(directional),
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();
        assert_rays_from(&mut f, directional);
    }

    #[test]
    fn god_rays_skip_disabled_lights() {
        let mut f = fixture();
        let spot = Vec3::new(2.0, -0.5, -10.0);
        f.lights
            .add(SpotLight {
                base: placed_at(spot),
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();
        let mut base = placed_at(Vec3::new(0.0, 0.0, -10.0));
        base.enabled = false;
        f.lights.add(AmbientLight { base }).unwrap();
        assert_rays_from(&mut f, spot);
    }

    #[test]
    fn god_rays_from_a_light_behind_the_camera_are_skipped() {
        let mut f = fixture();
        f.lights
            .add(SpotLight {
                base: placed_at(Vec3::new(0.0, 0.0, -10.0)),
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();
        f.lights
            .add(DirectionalLight {
                base: placed_at(Vec3::new(0.0, 0.0, 10.0)),
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();
        f.headless.take_submitted_passes();

        let output = run(&mut f, vec![god_rays()], 0.0);
        assert_eq!(output.applied, 0);
        assert_eq!(output.skipped, 1);
        assert!(f.headless.take_submitted_passes().is_empty());
    }

    #[test]
    fn grey_noise_samples_the_noise_image_with_a_fresh_offset() {
        let mut f = fixture();
        let noise = PostProcessFilter::full_screen(PostProcessEffect::GreyNoise { strength: 0.2 });
        run(&mut f, vec![noise], 0.0);
        run(&mut f, vec![noise], 0.0);
        let passes = f.headless.take_submitted_passes();
        let grey: Vec<_> = passes
            .iter()
            .filter(|p| p.label.as_deref() == Some("grey-noise"))
            .collect();
        assert_eq!(grey.len(), 2);

        let expected = f.lane.images().unwrap().noise();
        for pass in &grey {
            assert_eq!(
                pass.draws[0].textures.get(&(SOURCE_TEXTURE_SLOT + 1)),
                Some(&expected)
            );
        }
        let first = uniforms(grey[0]).params;
        let second = uniforms(grey[1]).params;
        assert_relative_eq!(first[0], 0.2);
        assert_relative_eq!(second[0], 0.2);
        assert_ne!(first[1..3], second[1..3]);
    }

    #[test]
    fn distort_samples_the_distortion_image() {
        let mut f = fixture();
        let distort = PostProcessFilter::full_screen(PostProcessEffect::Distort { strength: 0.05 });
        run(&mut f, vec![distort], 0.0);
        let passes = f.headless.submitted_passes();
        let pass = passes
            .iter()
            .find(|p| p.label.as_deref() == Some("distort"))
            .unwrap();
        assert_eq!(
            pass.draws[0].textures.get(&(SOURCE_TEXTURE_SLOT + 1)),
            Some(&f.lane.images().unwrap().distortion())
        );
        assert_relative_eq!(uniforms(pass).params[0], 0.05);
    }

    #[test]
    fn burn_height_wraps_with_time() {
        let mut f = fixture();
        let burn = PostProcessFilter::full_screen(PostProcessEffect::Burn { speed: 0.25 });
        run(&mut f, vec![burn], 5.0);
        let passes = f.headless.submitted_passes();
        assert_relative_eq!(uniforms(&passes[0]).params[0], 0.25);
        assert_eq!(
            passes[0].draws[0].textures.get(&(SOURCE_TEXTURE_SLOT + 1)),
            Some(&f.lane.images().unwrap().burn_ramp())
        );
    }

    #[test]
    fn chained_filters_each_read_the_previous_result() {
        let mut f = fixture();
        let filters = vec![
            PostProcessFilter::full_screen(tint()),
            PostProcessFilter::full_screen(PostProcessEffect::Spiral { angle: 1.0 }),
        ];
        run(&mut f, filters, 0.0);
        let passes = f.headless.submitted_passes();
        assert_eq!(
            labels(&passes),
            ["tint", "post-process copy back", "spiral", "post-process copy back"]
        );
        // The copy back wrote the scene target the second filter samples.
        assert!(passes[1].writes(view(&f, RenderTargetSlot::Scene)));
        assert_eq!(
            passes[2].draws[0].textures.get(&SOURCE_TEXTURE_SLOT),
            Some(&sample(&f, RenderTargetSlot::Scene))
        );
    }

    #[test]
    fn pipelines_are_reused_across_frames() {
        let mut f = fixture();
        let filters = vec![PostProcessFilter::full_screen(tint())];
        run(&mut f, filters.clone(), 0.0);
        let count = f.lane.pipeline_count();
        assert_eq!(count, 2);
        run(&mut f, filters, 1.0);
        assert_eq!(f.lane.pipeline_count(), count);
    }

    #[test]
    fn execute_before_initialization_fails() {
        let headless = HeadlessDevice::new();
        let device: Arc<dyn GraphicsDevice> = Arc::new(headless);
        let targets = RenderTargets::new(device.clone(), Extent2D::new(8, 8)).unwrap();
        let lights = LightRegistry::new(device.clone(), 1);
        let mut lane = PostProcessLane::new(PostProcessAssets::default());
        let mut encoder = device.create_command_encoder(None);
        let result = lane.execute(
            encoder.as_mut(),
            &FilterStack::new(),
            &lights,
            &targets,
            0.0,
        );
        assert!(matches!(
            result,
            Err(RenderError::NotInitialized("PostProcessLane"))
        ));
    }
}
