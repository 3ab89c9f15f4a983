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

use approx::assert_relative_eq;
use std::sync::Arc;
use umbra_agents::SceneRenderer;
use umbra_core::math::{Extent2D, Mat4, Transform, Vec2, Vec3};
use umbra_core::renderer::bindings::FRAME_UNIFORM_SLOT;
use umbra_core::renderer::uniforms::{FrameUniforms, SpotLightRecord};
use umbra_core::renderer::{
    AmbientLight, DirectionalLight, GraphicsDevice, LightKind, MeshProvider, PointLight, SpotLight,
};
use umbra_data::{
    MeshMaterial, PostProcessEffect, PostProcessFilter, RegistryError, RendererConfig, SceneObject,
    StaticMesh,
};
use umbra_infra::HeadlessDevice;
use umbra_lanes::RenderTargetSlot;

fn config() -> RendererConfig {
    RendererConfig {
        viewport: Extent2D::new(48, 32),
        shadow_resolution: 16,
        max_lights_per_kind: 4,
        light_buffer_capacity: 4,
        max_objects: 16,
        reflection_probe_resolution: 8,
        ..Default::default()
    }
}

fn renderer() -> (HeadlessDevice, SceneRenderer) {
    let headless = HeadlessDevice::new();
    let renderer = SceneRenderer::new(Arc::new(headless.clone()), config()).unwrap();
    (headless, renderer)
}

fn add_cube(headless: &HeadlessDevice, renderer: &mut SceneRenderer) {
    let device: Arc<dyn GraphicsDevice> = Arc::new(headless.clone());
    let mesh: Arc<dyn MeshProvider> =
        Arc::new(StaticMesh::cube(&device, "cube", 1.0, MeshMaterial::default()).unwrap());
    renderer.add_object(SceneObject::new(mesh)).unwrap();
}

fn tint() -> PostProcessEffect {
    PostProcessEffect::Tint {
        color: umbra_core::math::LinearRgba::new(1.0, 0.5, 0.5, 1.0),
    }
}

#[test]
fn full_kind_rejects_new_lights_and_keeps_its_count() {
    let (_, mut renderer) = renderer();
    for _ in 0..4 {
        renderer.add_light(PointLight::default()).unwrap();
    }
    let err = renderer.add_light(PointLight::default()).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::CapacityExceeded {
            kind: LightKind::Point,
            capacity: 4
        }
    ));
    assert_eq!(renderer.lights().count(LightKind::Point), 4);
    // Other kinds are independent.
    renderer.add_light(AmbientLight::default()).unwrap();
}

#[test]
fn disabling_a_light_zeroes_the_record_past_the_active_prefix() {
    let (headless, mut renderer) = renderer();
    let handles: Vec<_> = (0..3)
        .map(|_| renderer.add_light(SpotLight::default()).unwrap())
        .collect();
    renderer.render_frame(0.0).unwrap();

    renderer
        .lights_mut()
        .set_enabled(handles[1], false)
        .unwrap();
    renderer.render_frame(0.1).unwrap();

    let buffer = renderer.light_constants().buffer(LightKind::Spot).unwrap();
    let bytes = headless.buffer_contents(buffer).unwrap();
    let size = std::mem::size_of::<SpotLightRecord>();
    let records: Vec<SpotLightRecord> = bytes
        .chunks_exact(size)
        .map(bytemuck::pod_read_unaligned)
        .collect();
    assert_eq!(records.len(), 4);
    let active = |r: &SpotLightRecord| r.enabled == 1 && r.active_count == 2;
    assert!(records[..2].iter().all(active));
    assert!(bytes[2 * size..].iter().all(|b| *b == 0));
}

#[test]
fn resize_round_trip_restores_target_sizes() {
    let (headless, mut renderer) = renderer();
    let slots = [
        RenderTargetSlot::Scene,
        RenderTargetSlot::Final,
        RenderTargetSlot::Luminance,
        RenderTargetSlot::Ssao,
        RenderTargetSlot::MainDepth,
        RenderTargetSlot::PostDepth,
    ];
    let sizes = |renderer: &SceneRenderer| -> Vec<(u32, u32)> {
        slots
            .iter()
            .map(|slot| {
                let view = renderer.targets().view(*slot).unwrap();
                let info = headless.view_texture_info(view).unwrap();
                (info.size.width, info.size.height)
            })
            .collect()
    };
    let before = sizes(&renderer);
    let textures = headless.live_texture_count();
    let views = headless.live_view_count();

    renderer.resize(100, 20).unwrap();
    assert!(sizes(&renderer).iter().all(|s| *s == (100, 20)));
    renderer.resize(48, 32).unwrap();

    assert_eq!(sizes(&renderer), before);
    assert_eq!(headless.live_texture_count(), textures);
    assert_eq!(headless.live_view_count(), views);
    assert!(renderer.targets().is_complete());
    renderer.render_frame(0.0).unwrap();
}

#[test]
fn point_light_orientation_survives_a_frame() {
    let (headless, mut renderer) = renderer();
    add_cube(&headless, &mut renderer);
    let mut light = PointLight::default();
    light.base.transform =
        Transform::looking_towards(Vec3::new(2.0, 1.0, 3.0), Vec3::new(-0.3, 0.2, 1.0));
    let handle = renderer.add_light(light).unwrap();
    let before = renderer.lights().light(handle).unwrap().base().transform;

    renderer.render_frame(0.0).unwrap();

    let after = renderer.lights().light(handle).unwrap().base().transform;
    assert_eq!(before, after);
    assert_eq!(renderer.last_stats().shadow_views, 6);
}

#[test]
fn filters_run_in_stack_order() {
    let (headless, mut renderer) = renderer();
    let filters = renderer.filters_mut();
    filters.push(PostProcessFilter::full_screen(PostProcessEffect::GaussianBlur {
        radius: 2.0,
    }));
    filters.push(PostProcessFilter::full_screen(tint()));
    filters.push(PostProcessFilter::full_screen(PostProcessEffect::Spiral {
        angle: 1.0,
    }));
    filters.move_up(2).unwrap();

    let view = renderer.render_frame(0.0).unwrap();
    assert_eq!(
        Some(view),
        renderer.targets().sample_view(RenderTargetSlot::Final)
    );

    let order: Vec<String> = headless
        .submitted_passes()
        .into_iter()
        .filter_map(|pass| pass.label)
        .filter(|label| ["gaussian-blur", "tint", "spiral"].contains(&label.as_str()))
        .collect();
    assert_eq!(order, ["gaussian-blur", "spiral", "tint"]);
    assert_eq!(renderer.last_stats().filters_applied, 3);
    assert!(headless.hazards().is_empty());
}

#[test]
fn area_filter_at_the_camera_is_skipped() {
    let (headless, mut renderer) = renderer();
    renderer.filters_mut().push(PostProcessFilter::area(
        tint(),
        Vec3::new(0.0, 0.0, -0.05),
        Vec2::new(1.0, 1.0),
    ));
    let view = renderer.render_frame(0.0).unwrap();

    assert_eq!(
        Some(view),
        renderer.targets().sample_view(RenderTargetSlot::Scene)
    );
    let stats = renderer.last_stats();
    assert_eq!((stats.filters_applied, stats.filters_skipped), (0, 1));
    assert!(headless
        .submitted_passes()
        .iter()
        .all(|pass| pass.label.as_deref() != Some("tint")));
}

#[test]
fn shadow_views_list_spots_then_directionals_then_point_faces() {
    let (headless, mut renderer) = renderer();
    add_cube(&headless, &mut renderer);
    let point = renderer.add_light(PointLight::default()).unwrap();
    renderer.add_light(SpotLight::default()).unwrap();
    renderer.add_light(DirectionalLight::default()).unwrap();
    renderer.add_light(SpotLight::default()).unwrap();

    let views = renderer.shadow_maps();
    assert_eq!(views.len(), 2 + 1 + 6);

    let lights = renderer.lights();
    let mut expected: Vec<_> = lights
        .spot_lights()
        .filter_map(|(_, entry)| entry.shadow().sample_view())
        .collect();
    expected.extend(
        lights
            .directional_lights()
            .filter_map(|(_, entry)| entry.shadow().sample_view()),
    );
    expected.extend(
        lights
            .point_lights()
            .filter_map(|(_, entry)| entry.shadow().sample_views())
            .flatten(),
    );
    assert_eq!(views, expected);

    renderer.render_frame(0.0).unwrap();
    assert_eq!(renderer.last_stats().shadow_views, 9);

    // The list is rebuilt the same way once a light goes away.
    renderer.lights_mut().queue_removal(point);
    renderer.render_frame(0.1).unwrap();
    assert_eq!(renderer.shadow_maps(), expected[..3].to_vec());
    assert_eq!(renderer.last_stats().shadow_views, 3);
}

#[test]
fn directional_light_and_cube_render_end_to_end() {
    let (headless, mut renderer) = renderer();
    add_cube(&headless, &mut renderer);
    let mut light = DirectionalLight {
        shadow_resolution: 1024,
        ..Default::default()
    };
    light.base.transform =
        Transform::looking_towards(Vec3::new(0.0, 10.0, 4.0), Vec3::new(0.0, -1.0, -0.4));
    renderer.add_light(light).unwrap();
    renderer.camera_mut().transform = Transform::from_position(Vec3::new(0.0, 0.0, 5.0));

    let view = renderer.render_frame(0.0).unwrap();
    assert!(headless.is_view_live(view));
    assert!(headless.hazards().is_empty());

    let shadow_view = renderer
        .lights()
        .directional_lights()
        .find_map(|(_, entry)| entry.shadow().depth_view())
        .unwrap();
    let passes = headless.submitted_passes();
    let shadow_pass = passes
        .iter()
        .find(|pass| pass.depth_attachment == Some(shadow_view))
        .unwrap();
    assert!(shadow_pass.color_attachments.is_empty());
    let viewport = shadow_pass.draws[0].viewport.unwrap();
    assert_eq!((viewport.width, viewport.height), (1024.0, 1024.0));

    let frame: FrameUniforms = shadow_pass.draws[0].uniform(FRAME_UNIFORM_SLOT).unwrap();
    let expected_view = light.base.transform.to_matrix().inverse();
    let actual_view = Mat4::from_cols_array_2d(&frame.view).to_cols_array();
    for (a, b) in actual_view.iter().zip(expected_view.to_cols_array()) {
        assert_relative_eq!(*a, b, epsilon = 1e-5);
    }
    let half = light.extent * 0.5;
    let ortho = Mat4::orthographic_rh(-half, half, -half, half, light.near, light.far);
    let actual_projection = Mat4::from_cols_array_2d(&frame.projection).to_cols_array();
    for (a, b) in actual_projection.iter().zip(ortho.to_cols_array()) {
        assert_relative_eq!(*a, b, epsilon = 1e-6);
    }

    let stats = renderer.last_stats();
    assert_eq!(stats.shadow_views, 1);
    // Shadow, main and depth passes each draw the cube once.
    assert_eq!(stats.draws, 3);
}
