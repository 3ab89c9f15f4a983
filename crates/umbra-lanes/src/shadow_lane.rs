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

//! Shadow pass lane: renders every shadow caster into the shadow map of each
//! active light.

use crate::render_lane::{create_builtin_shader, create_depth_pipeline, TransformBuffers};
use crate::shaders::DEPTH_WGSL;
use std::sync::Arc;
use umbra_core::lane::{Lane, LaneError, LaneKind};
use umbra_core::math::{Mat4, Vec3};
use umbra_core::renderer::shadow_map::SHADOW_MAP_FORMAT;
use umbra_core::renderer::traits::CommandEncoder;
use umbra_core::renderer::uniforms::FrameUniforms;
use umbra_core::renderer::{
    GraphicsDevice, Owned, RenderError, RenderPassDepthStencilAttachment, RenderPassDescriptor,
    RenderPipelineId, ShaderModuleId, ShadowMap, TextureViewId, Viewport,
};
use umbra_data::{LightRegistry, SceneObjects};

const STAGE: &str = "shadow pass";

/// The shadow maps rendered this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowPassOutput {
    /// Shader-readable views in binding order: spot lights, directional
    /// lights, then six views per point light.
    pub views: Vec<TextureViewId>,
    /// Render passes recorded.
    pub passes: usize,
    /// Draw calls recorded.
    pub draws: usize,
}

/// The light-space view a single shadow pass renders from.
struct ShadowView<'a> {
    map: &'a ShadowMap,
    view: Mat4,
    projection: Mat4,
    eye: Vec3,
}

/// The scene state every shadow view draws.
struct ShadowCasters<'a> {
    objects: &'a SceneObjects,
    transforms: &'a TransformBuffers,
    time: f32,
}

/// Renders depth-only views of the scene from each shadow-casting light.
///
/// Spot and directional lights render one pass each. Point lights render six,
/// one per cube face, with view matrices derived from the light position: the
/// stored light orientation is never touched.
#[derive(Default)]
pub struct ShadowPassLane {
    shader: Option<Owned<ShaderModuleId>>,
    pipeline: Option<Owned<RenderPipelineId>>,
}

impl ShadowPassLane {
    /// Creates an uninitialized lane.
    pub fn new() -> Self {
        Self::default()
    }

    /// The depth-only pipeline.
    pub fn pipeline(&self) -> Option<RenderPipelineId> {
        self.pipeline.as_ref().map(Owned::id)
    }

    /// Renders the shadow maps of the first `limit` active lights of each kind.
    ///
    /// Visits the same lights in the same order as the light constant lane,
    /// so the returned views line up with the packed shadow indices.
    pub fn execute(
        &self,
        encoder: &mut dyn CommandEncoder,
        lights: &LightRegistry,
        objects: &SceneObjects,
        transforms: &TransformBuffers,
        limit: usize,
        time: f32,
    ) -> Result<ShadowPassOutput, RenderError> {
        let pipeline = self
            .pipeline()
            .ok_or(RenderError::NotInitialized("ShadowPassLane"))?;
        let casters = ShadowCasters {
            objects,
            transforms,
            time,
        };
        let mut output = ShadowPassOutput::default();

        for entry in lights.active_spot_lights(limit) {
            let light = &entry.light;
            let shadow = ShadowView {
                map: entry.shadow(),
                view: light.base.view_matrix(),
                projection: light.projection_matrix(),
                eye: light.base.position(),
            };
            self.render_view(encoder, pipeline, &casters, &shadow, &mut output)?;
            output.views.push(sample_view(entry.shadow())?);
        }

        for entry in lights.active_directional_lights(limit) {
            let light = &entry.light;
            let shadow = ShadowView {
                map: entry.shadow(),
                view: light.base.view_matrix(),
                projection: light.projection_matrix(),
                eye: light.base.position(),
            };
            self.render_view(encoder, pipeline, &casters, &shadow, &mut output)?;
            output.views.push(sample_view(entry.shadow())?);
        }

        for entry in lights.active_point_lights(limit) {
            let light = &entry.light;
            let projection = light.projection_matrix();
            let faces = entry.shadow().faces();
            for (face, view) in faces.iter().zip(light.face_views()) {
                let shadow = ShadowView {
                    map: face,
                    view,
                    projection,
                    eye: light.base.position(),
                };
                self.render_view(encoder, pipeline, &casters, &shadow, &mut output)?;
                output.views.push(sample_view(face)?);
            }
        }

        log::trace!(
            "ShadowPassLane: {} shadow views, {} passes, {} draws",
            output.views.len(),
            output.passes,
            output.draws
        );
        Ok(output)
    }

    fn render_view(
        &self,
        encoder: &mut dyn CommandEncoder,
        pipeline: RenderPipelineId,
        casters: &ShadowCasters<'_>,
        shadow: &ShadowView<'_>,
        output: &mut ShadowPassOutput,
    ) -> Result<(), RenderError> {
        let label = shadow.map.label();
        let depth_view = shadow
            .map
            .depth_view()
            .ok_or_else(|| RenderError::Internal(format!("'{label}' has no depth view")))
            .map_err(|e| e.in_stage(STAGE))?;
        let resolution = shadow.map.resolution();

        let depth = RenderPassDepthStencilAttachment::clear(depth_view, 1.0);
        let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[],
            depth_stencil_attachment: Some(depth),
        });
        pass.set_pipeline(pipeline);
        pass.set_viewport(Viewport::square(resolution));
        let transforms = casters.transforms;
        transforms.bind(pass.as_mut());
        transforms.write_frame(
            pass.as_mut(),
            &FrameUniforms::new(
                shadow.view,
                shadow.projection,
                shadow.eye,
                resolution,
                resolution,
                casters.time,
            ),
        );

        for caster in casters.objects.shadow_casters() {
            transforms.write_model(pass.as_mut(), caster.transform.to_matrix());
            caster
                .mesh
                .render(pass.as_mut(), true)
                .map_err(|e| e.in_stage(STAGE))?;
            output.draws += 1;
        }
        output.passes += 1;
        Ok(())
    }
}

fn sample_view(map: &ShadowMap) -> Result<TextureViewId, RenderError> {
    let label = map.label();
    map.sample_view()
        .ok_or_else(|| RenderError::Internal(format!("'{label}' has no sample view")))
        .map_err(|e| e.in_stage(STAGE))
}

impl Lane for ShadowPassLane {
    fn strategy_name(&self) -> &'static str {
        "ShadowPass"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Shadow
    }

    fn on_initialize(&mut self, device: &Arc<dyn GraphicsDevice>) -> Result<(), LaneError> {
        let shader = create_builtin_shader(device, "shadow depth shader", DEPTH_WGSL)
            .map_err(LaneError::init)?;
        let label = "shadow depth pipeline";
        let pipeline = create_depth_pipeline(device, shader.id(), label, SHADOW_MAP_FORMAT)
            .map_err(LaneError::init)?;
        self.shader = Some(shader);
        self.pipeline = Some(pipeline);
        log::info!("ShadowPassLane: depth pipeline ready");
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.pipeline.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use umbra_core::math::Transform;
    use umbra_core::renderer::bindings::FRAME_UNIFORM_SLOT;
    use umbra_core::renderer::{DirectionalLight, MeshProvider, PointLight, SpotLight};
    use umbra_data::{MeshMaterial, SceneObject, StaticMesh};
    use umbra_infra::HeadlessDevice;

    struct Fixture {
        headless: HeadlessDevice,
        device: Arc<dyn GraphicsDevice>,
        lights: LightRegistry,
        objects: SceneObjects,
        transforms: TransformBuffers,
        lane: ShadowPassLane,
    }

    fn fixture() -> Fixture {
        let headless = HeadlessDevice::new();
        let device: Arc<dyn GraphicsDevice> = Arc::new(headless.clone());
        let mut lane = ShadowPassLane::new();
        lane.on_initialize(&device).unwrap();
        let mut objects = SceneObjects::new(8);
        let cube = StaticMesh::cube(&device, "cube", 1.0, MeshMaterial::default()).unwrap();
        let cube: Arc<dyn MeshProvider> = Arc::new(cube);
        objects.add(SceneObject::new(cube.clone())).unwrap();
        let mut receiver = SceneObject::new(cube);
        receiver.casts_shadows = false;
        objects.add(receiver).unwrap();
        Fixture {
            headless,
            transforms: TransformBuffers::new(&device).unwrap(),
            lights: LightRegistry::new(device.clone(), 8),
            device,
            objects,
            lane,
        }
    }

    fn run(f: &Fixture, limit: usize) -> ShadowPassOutput {
        let mut encoder = f.device.create_command_encoder(Some("shadows"));
        let output = f.lane.execute(
            encoder.as_mut(),
            &f.lights,
            &f.objects,
            &f.transforms,
            limit,
            0.0,
        );
        let output = output.unwrap();
        f.device.submit_command_buffer(encoder.finish());
        output
    }

    #[test]
    fn shadow_view_list_has_fixed_order_and_length() {
        let mut f = fixture();
        for _ in 0..2 {
            f.lights
                .add(SpotLight {
                    shadow_resolution: 32,
                    ..Default::default()
                })
                .unwrap();
        }
        f.lights
            .add(DirectionalLight {
                shadow_resolution: 32,
                ..Default::default()
            })
            .unwrap();
        f.lights
            .add(PointLight {
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();

        let output = run(&f, 8);
        assert_eq!(output.views.len(), 2 + 1 + 6);
        assert_eq!(output.views, f.lights.shadow_map_views(8));
        assert_eq!(output.passes, 9);
        // One caster per pass; the receiver is skipped.
        assert_eq!(output.draws, 9);
    }

    #[test]
    fn pass_clears_depth_with_no_color_target() {
        let mut f = fixture();
        f.lights
            .add(SpotLight {
                shadow_resolution: 64,
                ..Default::default()
            })
            .unwrap();
        run(&f, 8);

        let passes = f.headless.submitted_passes();
        assert_eq!(passes.len(), 1);
        let pass = &passes[0];
        assert!(pass.color_attachments.is_empty());
        assert_eq!(pass.depth_clear, Some(1.0));
        let viewport = pass.draws[0].viewport.unwrap();
        assert_eq!((viewport.width, viewport.height), (64.0, 64.0));
        assert!(f.headless.hazards().is_empty());
    }

    #[test]
    fn directional_pass_uses_inverse_world_and_ortho_box() {
        let mut f = fixture();
        let mut light = DirectionalLight {
            shadow_resolution: 32,
            extent: 20.0,
            near: 1.0,
            far: 60.0,
            ..Default::default()
        };
        light.base.transform =
            Transform::looking_towards(Vec3::new(0.0, 20.0, 5.0), Vec3::new(0.0, -1.0, -0.2));
        f.lights.add(light).unwrap();
        run(&f, 8);

        let draw = &f.headless.submitted_passes()[0].draws[0];
        let frame: FrameUniforms = draw.uniform(FRAME_UNIFORM_SLOT).unwrap();
        let view = Mat4::from_cols_array_2d(&frame.view).to_cols_array();
        let expected = light.base.transform.to_matrix().inverse();
        for (a, b) in view.iter().zip(expected.to_cols_array()) {
            assert_relative_eq!(*a, b, epsilon = 1e-5);
        }
        let projection = Mat4::from_cols_array_2d(&frame.projection).to_cols_array();
        let ortho = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 1.0, 60.0);
        for (a, b) in projection.iter().zip(ortho.to_cols_array()) {
            assert_relative_eq!(*a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn point_light_rotation_is_untouched() {
        let mut f = fixture();
        let mut light = PointLight {
            shadow_resolution: 16,
            ..Default::default()
        };
        light.base.transform =
            Transform::looking_towards(Vec3::new(1.0, 3.0, -2.0), Vec3::new(0.4, 0.1, 1.0));
        let handle = f.lights.add(light).unwrap();
        let before = f.lights.light(handle).unwrap().base().transform;

        let output = run(&f, 8);

        assert_eq!(output.passes, 6);
        assert_eq!(f.lights.light(handle).unwrap().base().transform, before);
        let passes = f.headless.submitted_passes();
        let views: Vec<_> = passes
            .iter()
            .map(|p| p.draws[0].uniform::<FrameUniforms>(0).unwrap().view)
            .collect();
        for (recorded, expected) in views.iter().zip(light.face_views()) {
            assert_eq!(*recorded, umbra_core::math::mat4_to_gpu(&expected));
        }
    }

    #[test]
    fn disabled_lights_cast_no_shadow() {
        let mut f = fixture();
        let handle = f
            .lights
            .add(SpotLight {
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();
        f.lights.set_enabled(handle, false).unwrap();
        let output = run(&f, 8);
        assert!(output.views.is_empty());
        assert_eq!(f.headless.submitted_passes().len(), 0);
    }

    #[test]
    fn execute_before_initialize_fails() {
        let f = fixture();
        let lane = ShadowPassLane::new();
        let mut encoder = f.device.create_command_encoder(None);
        let result = lane.execute(
            encoder.as_mut(),
            &f.lights,
            &f.objects,
            &f.transforms,
            8,
            0.0,
        );
        assert!(matches!(result, Err(RenderError::NotInitialized(_))));
    }
}
