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

// Umbra Runtime
// Loads a scene description and renders it offline on the headless device.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use umbra_agents::SceneRenderer;
use umbra_core::renderer::{GraphicsDevice, MeshProvider};
use umbra_data::{MeshLibrary, MeshMaterial, StaticMesh};
use umbra_infra::HeadlessDevice;

/// Renders a scene description offline and logs per-frame statistics.
#[derive(Debug, Parser)]
#[command(name = "umbra-runtime", version)]
struct Options {
    /// Scene description to load (RON).
    scene: PathBuf,
    /// Renderer configuration (RON). Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of frames to render.
    #[arg(long, default_value_t = 60)]
    frames: u64,
}

/// The meshes scene descriptions can refer to by name.
fn builtin_meshes(device: &Arc<dyn GraphicsDevice>) -> Result<MeshLibrary> {
    let mut meshes: MeshLibrary = HashMap::new();
    for (name, size) in [("cube", 1.0), ("floor", 20.0)] {
        let mesh = StaticMesh::cube(device, name, size, MeshMaterial::default())
            .with_context(|| format!("Failed to create built-in mesh '{name}'"))?;
        meshes.insert(name.to_owned(), Arc::new(mesh) as Arc<dyn MeshProvider>);
    }
    Ok(meshes)
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let options = Options::parse();
    let headless = HeadlessDevice::new();
    let device: Arc<dyn GraphicsDevice> = Arc::new(headless.clone());
    let meshes = builtin_meshes(&device)?;

    let mut renderer =
        SceneRenderer::load(device, options.config.as_deref(), &options.scene, &meshes)?;
    log::info!(
        "Runtime: loaded {} lights and {} objects from {}",
        renderer.lights().len(),
        renderer.objects().len(),
        options.scene.display()
    );

    let frame_time = 1.0 / 60.0;
    for frame in 0..options.frames {
        renderer
            .render_frame(frame as f32 * frame_time)
            .with_context(|| format!("Frame {frame} failed"))?;
        log::info!("Runtime: {}", renderer.last_stats());
    }

    let hazards = headless.hazards();
    if !hazards.is_empty() {
        log::warn!("Runtime: {} render target hazards recorded", hazards.len());
    }
    log::info!(
        "Runtime: rendered {} frames, {} resources live",
        renderer.frame_count(),
        headless.live_resource_count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scene_config_and_frames() {
        let options = Options::try_parse_from([
            "umbra-runtime",
            "scene.ron",
            "--frames",
            "3",
            "--config",
            "c.ron",
        ])
        .unwrap();
        assert_eq!(options.scene, PathBuf::from("scene.ron"));
        assert_eq!(options.config, Some(PathBuf::from("c.ron")));
        assert_eq!(options.frames, 3);
    }

    #[test]
    fn frames_default_to_sixty() {
        let options = Options::try_parse_from(["umbra-runtime", "scene.ron"]).unwrap();
        assert_eq!(options.frames, 60);
        assert!(options.config.is_none());
    }

    #[test]
    fn scene_is_required() {
        assert!(Options::try_parse_from(["umbra-runtime", "--frames", "3"]).is_err());
        assert!(Options::try_parse_from(["umbra-runtime", "a.ron", "b.ron"]).is_err());
        assert!(Options::try_parse_from(["umbra-runtime", "a.ron", "--frames", "many"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Options::command().debug_assert();
    }

    #[test]
    fn builtin_meshes_are_named() {
        let device: Arc<dyn GraphicsDevice> = Arc::new(HeadlessDevice::new());
        let meshes = builtin_meshes(&device).unwrap();
        assert_eq!(meshes["cube"].name(), "cube");
        assert_eq!(meshes["floor"].name(), "floor");
    }

    #[test]
    fn demo_scene_renders() {
        let demos = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let headless = HeadlessDevice::new();
        let device: Arc<dyn GraphicsDevice> = Arc::new(headless.clone());
        let meshes = builtin_meshes(&device).unwrap();
        let config = demos.join("config.ron");
        let mut renderer = SceneRenderer::load(
            device,
            Some(config.as_path()),
            &demos.join("courtyard.ron"),
            &meshes,
        )
        .unwrap();

        assert_eq!(renderer.lights().len(), 3);
        assert_eq!(renderer.objects().len(), 3);
        for frame in 0..2 {
            renderer.render_frame(frame as f32 / 60.0).unwrap();
        }
        let stats = renderer.last_stats();
        // One directional map and six point faces.
        assert_eq!(stats.shadow_views, 7);
        assert_eq!(stats.probe_faces, 6);
        assert_eq!(stats.filters_applied, 4);
        assert!(headless.hazards().is_empty());
    }
}
