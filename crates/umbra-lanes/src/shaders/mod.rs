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

//! Built-in shader sources.
//!
//! Bindings follow one convention across every shader: group 0 holds buffer
//! slots, group 1 texture slots and group 2 sampler slots, and the binding
//! number of a resource equals its slot in
//! [`umbra_core::renderer::bindings`].

/// Forward PBR scene shader with shadowed spot, directional and point lights.
pub const SCENE_WGSL: &str = include_str!("scene.wgsl");

/// Position-only shader for shadow maps and the post-process depth pass.
pub const DEPTH_WGSL: &str = include_str!("depth.wgsl");

/// Full-screen, area and polygon post-processing passes.
///
/// `vs_fullscreen` and `vs_polygon` synthesize a 4-vertex triangle strip
/// without vertex buffers. Each effect has its own `fs_*` entry point.
pub const POST_PROCESS_WGSL: &str = include_str!("post_process.wgsl");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_are_embedded() {
        for source in [SCENE_WGSL, DEPTH_WGSL, POST_PROCESS_WGSL] {
            assert!(!source.is_empty());
            assert!(source.contains("@vertex"));
        }
    }

    #[test]
    fn post_process_exposes_both_vertex_stages() {
        assert!(POST_PROCESS_WGSL.contains("fn vs_fullscreen"));
        assert!(POST_PROCESS_WGSL.contains("fn vs_polygon"));
        assert!(POST_PROCESS_WGSL.contains("fn fs_copy"));
    }

    #[test]
    fn depth_shader_has_no_fragment_stage() {
        assert!(!DEPTH_WGSL.contains("@fragment"));
    }
}
