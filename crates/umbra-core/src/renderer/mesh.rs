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

//! The contract between the renderer and drawable geometry.

use super::error::RenderError;
use super::traits::RenderPass;
use std::fmt::Debug;

/// Something that can submit its own geometry to a render pass.
///
/// The renderer binds the pipeline, viewport and per-object transforms before
/// calling [`render`](Self::render); the provider binds its vertex and index
/// buffers and issues its draws.
pub trait MeshProvider: Send + Sync + Debug {
    /// A name identifying the mesh in scene descriptions.
    fn name(&self) -> &str;

    /// Records the draws of this mesh.
    ///
    /// With `basic_geometry` set, only positions and indices are submitted:
    /// no material textures, uniforms or samplers are bound. Shadow passes and
    /// the depth-only scene pass rely on this.
    fn render(&self, pass: &mut dyn RenderPass, basic_geometry: bool) -> Result<(), RenderError>;
}
