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

use crate::math::{Extent3D, Origin3D};
use crate::renderer::api::*;
use crate::renderer::error::ResourceError;
use crate::renderer::traits::CommandEncoder;
use std::fmt::Debug;

/// Creates and destroys the GPU objects the renderer works with, and
/// accepts finished command buffers.
///
/// Ids handed out by a device are only meaningful to that device. Lanes
/// normally hold them through [`Owned`] so they are released on drop. All
/// failures surface as [`ResourceError`]; a device never hands back an id
/// for an object it could not create.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Compiles a WGSL module.
    ///
    /// Fails with [`ResourceError::Shader`] when compilation fails.
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError>;

    /// Releases a shader module.
    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError>;

    /// Builds a pipeline from compiled modules and fixed-function state.
    ///
    /// Fails with [`ResourceError::Pipeline`] when a module id is unknown or
    /// the state is inconsistent (a fragment stage without color targets).
    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError>;

    /// Releases a pipeline.
    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError>;

    /// Allocates a zero-filled buffer of `descriptor.size` bytes.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError>;

    /// Allocates a buffer whose first bytes are `data`; the rest is zero.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError>;

    /// Releases a buffer.
    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError>;

    /// Overwrites `data.len()` bytes of a buffer starting at `offset`.
    ///
    /// The write is visible to every draw recorded after it. Writing past
    /// the end fails with [`ResourceError::OutOfBounds`].
    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Allocates a texture. Zero-sized extents are rejected.
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError>;

    /// Releases a texture. Views created from it become invalid.
    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError>;

    /// Uploads texels into the box at `offset` of extent `size`.
    ///
    /// `bytes_per_row` may be omitted for single-row uploads.
    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        offset: Origin3D,
        size: Extent3D,
    ) -> Result<(), ResourceError>;

    /// Creates a view over a mip and layer range of a texture.
    fn create_texture_view(
        &self,
        texture_id: TextureId,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError>;

    /// Releases a view.
    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError>;

    /// Creates a sampler.
    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError>;

    /// Releases a sampler.
    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError>;

    /// Starts recording a command buffer.
    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder>;

    /// Executes a finished command buffer. Buffers run in submission order.
    fn submit_command_buffer(&self, command_buffer: CommandBufferId);
}
