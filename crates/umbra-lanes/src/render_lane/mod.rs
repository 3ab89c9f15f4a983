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

//! Rendering lane: the camera-facing passes and the resources they share.

mod render_targets;
mod scene_pass_lane;
mod transforms;

pub use render_targets::*;
pub use scene_pass_lane::*;
pub use transforms::*;

use std::borrow::Cow;
use std::sync::Arc;
use umbra_core::renderer::{
    DepthStencilState, GraphicsDevice, Owned, PrimitiveState, RenderError, RenderPipelineDescriptor,
    RenderPipelineId, ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData, TextureFormat,
};
use umbra_data::Vertex;

/// Compiles a built-in shader. A failure means the renderer cannot start.
pub(crate) fn create_builtin_shader(
    device: &Arc<dyn GraphicsDevice>,
    name: &'static str,
    source: &'static str,
) -> Result<Owned<ShaderModuleId>, RenderError> {
    let id = device
        .create_shader_module(&ShaderModuleDescriptor {
            label: Some(name),
            source: ShaderSourceData::Wgsl(Cow::Borrowed(source)),
        })
        .map_err(|e| RenderError::MissingDefaultResource {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    Ok(Owned::new(device.clone(), id))
}

/// A position-only pipeline writing depth into `format`, with no color target.
pub(crate) fn create_depth_pipeline(
    device: &Arc<dyn GraphicsDevice>,
    shader: ShaderModuleId,
    label: &'static str,
    format: TextureFormat,
) -> Result<Owned<RenderPipelineId>, RenderError> {
    let id = device
        .create_render_pipeline(&RenderPipelineDescriptor {
            label: Some(label.into()),
            vertex_shader: shader,
            vertex_entry_point: "vs_main",
            fragment_shader: None,
            fragment_entry_point: "",
            vertex_layout: Some(Vertex::layout()),
            primitive: PrimitiveState::default(),
            depth_stencil: Some(DepthStencilState::standard(format)),
            color_targets: Cow::Borrowed(&[]),
        })
        .map_err(|e| RenderError::from(e).in_stage(label))?;
    Ok(Owned::new(device.clone(), id))
}
