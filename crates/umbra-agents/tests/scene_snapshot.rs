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

use std::collections::HashMap;
use std::sync::Arc;
use umbra_agents::{AgentError, SceneRenderer};
use umbra_core::camera::Camera;
use umbra_core::math::{Extent2D, LinearRgba, Transform, Vec2, Vec3};
use umbra_core::renderer::{DirectionalLight, GraphicsDevice, Light, MeshProvider, SpotLight};
use umbra_data::scene::ObjectDescription;
use umbra_data::{
    MeshLibrary, MeshMaterial, PostProcessEffect, PostProcessFilter, RendererConfig,
    SceneDescription, SceneFormatError, StaticMesh,
};
use tempfile::tempdir;
use umbra_infra::HeadlessDevice;

fn config() -> RendererConfig {
    RendererConfig {
        viewport: Extent2D::new(48, 32),
        shadow_resolution: 32,
        max_lights_per_kind: 4,
        light_buffer_capacity: 4,
        max_objects: 8,
        reflection_probe_resolution: 8,
        ..Default::default()
    }
}

fn meshes(headless: &HeadlessDevice) -> MeshLibrary {
    let device: Arc<dyn GraphicsDevice> = Arc::new(headless.clone());
    let cube: Arc<dyn MeshProvider> =
        Arc::new(StaticMesh::cube(&device, "cube", 1.0, MeshMaterial::default()).unwrap());
    HashMap::from([("cube".to_owned(), cube)])
}

fn description() -> SceneDescription {
    SceneDescription {
        camera: Camera {
            transform: Transform::from_position(Vec3::new(0.0, 1.0, 6.0)),
            aspect_ratio: 1.5,
            ..Default::default()
        },
        lights: vec![
            Light::Spot(SpotLight {
                shadow_resolution: 64,
                ..Default::default()
            }),
            Light::Directional(DirectionalLight {
                shadow_resolution: 128,
                ..Default::default()
            }),
        ],
        objects: vec![ObjectDescription {
            mesh: "cube".into(),
            transform: Transform::IDENTITY,
            casts_shadows: true,
            translucent: false,
            reflection_probe: false,
            visible: true,
        }],
        filters: vec![
            PostProcessFilter::full_screen(PostProcessEffect::Tint {
                color: LinearRgba::new(0.8, 0.9, 1.0, 1.0),
            }),
            PostProcessFilter::area(
                PostProcessEffect::Spiral { angle: 0.5 },
                Vec3::ZERO,
                Vec2::splat(1.0),
            ),
        ],
    }
}

#[test]
fn snapshot_reproduces_the_loaded_description() {
    let headless = HeadlessDevice::new();
    let library = meshes(&headless);
    let desc = description();
    let mut renderer =
        SceneRenderer::from_description(Arc::new(headless.clone()), config(), &desc, &library)
            .unwrap();

    assert_eq!(renderer.snapshot(), desc);
    renderer.render_frame(0.0).unwrap();
    assert_eq!(renderer.last_stats().filters_applied, 2);
    assert!(headless.hazards().is_empty());
}

#[test]
fn saved_scene_loads_back_from_disk() {
    let headless = HeadlessDevice::new();
    let library = meshes(&headless);
    let desc = description();
    let renderer =
        SceneRenderer::from_description(Arc::new(headless.clone()), config(), &desc, &library)
            .unwrap();

    let dir = tempdir().unwrap();
    let scene_path = dir.path().join("scene.ron");
    let config_path = dir.path().join("config.ron");
    renderer.save(&scene_path).unwrap();
    config().save(&config_path).unwrap();

    let mut loaded = SceneRenderer::load(
        Arc::new(headless.clone()),
        Some(config_path.as_path()),
        &scene_path,
        &library,
    )
    .unwrap();
    assert_eq!(loaded.snapshot(), desc);
    assert_eq!(loaded.config(), &config());
    loaded.render_frame(0.5).unwrap();
}

#[test]
fn unknown_mesh_fails_without_adding_anything() {
    let headless = HeadlessDevice::new();
    let mut desc = description();
    desc.objects[0].mesh = "teapot".into();
    match SceneRenderer::from_description(Arc::new(headless), config(), &desc, &MeshLibrary::new())
    {
        Err(AgentError::Scene(SceneFormatError::UnknownMesh(name))) => assert_eq!(name, "teapot"),
        other => panic!("unexpected result: {:?}", other.err()),
    }
}

#[test]
fn zero_resolution_lights_in_a_description_get_the_default() {
    let headless = HeadlessDevice::new();
    let library = meshes(&headless);
    let mut desc = description();
    desc.lights = vec![Light::Spot(SpotLight {
        shadow_resolution: 0,
        ..Default::default()
    })];
    let renderer =
        SceneRenderer::from_description(Arc::new(headless), config(), &desc, &library).unwrap();
    let (_, entry) = renderer.lights().spot_lights().next().unwrap();
    assert_eq!(entry.shadow().resolution(), 32);
}

#[test]
fn missing_scene_file_reports_the_path() {
    let headless = HeadlessDevice::new();
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.ron");
    let err = SceneRenderer::load(Arc::new(headless), None, &path, &MeshLibrary::new())
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("absent.ron"));
}
