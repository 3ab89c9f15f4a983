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

use crate::renderer::api::{
    BufferId, CommandBufferId, IndexFormat, RenderPassDescriptor, RenderPipelineId, SamplerId,
    TextureViewId, Viewport,
};
use std::any::Any;
use std::ops::Range;

/// An active render pass, used for recording state changes and draw calls.
///
/// A `RenderPass` is obtained from a [`CommandEncoder`] and borrows it mutably,
/// so only one pass can be recorded at a time. Dropping the pass ends it and
/// releases its attachments.
///
/// Resource slots (`set_texture`, `set_uniform_buffer`, `set_sampler`) belong
/// to the encoder and persist after the pass ends. A texture view left bound
/// to a slot while it is used as an attachment of a later pass is a hazard, so
/// callers unbind inputs explicitly once a pass is done with them.
pub trait RenderPass {
    /// Sets the active render pipeline for subsequent draw calls.
    fn set_pipeline(&mut self, pipeline: RenderPipelineId);

    /// Sets the rasterization rectangle.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Overwrites the start of a uniform buffer.
    ///
    /// The write is ordered with the surrounding draws: draws recorded before
    /// it see the old contents, draws recorded after see the new ones.
    fn write_uniform(&mut self, buffer: BufferId, data: &[u8]);

    /// Binds a uniform or read-only storage buffer to a slot.
    fn set_uniform_buffer(&mut self, slot: u32, buffer: BufferId);

    /// Binds a shader-readable texture view to a slot, or clears the slot with `None`.
    fn set_texture(&mut self, slot: u32, view: Option<TextureViewId>);

    /// Binds a sampler to a slot.
    fn set_sampler(&mut self, slot: u32, sampler: SamplerId);

    /// Binds a vertex buffer to a specific slot.
    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, offset: u64);

    /// Binds an index buffer for indexed drawing.
    fn set_index_buffer(&mut self, buffer: BufferId, offset: u64, index_format: IndexFormat);

    /// Records a non-indexed draw call.
    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>);

    /// Records an indexed draw call.
    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>);
}

/// An object that records a sequence of GPU commands into a command buffer.
pub trait CommandEncoder {
    /// Begins a new render pass.
    ///
    /// The pass ends when the returned object is dropped.
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPass + 'encoder>;

    /// Binds or clears a texture slot outside of any pass.
    fn set_texture(&mut self, slot: u32, view: Option<TextureViewId>);

    /// Clears every texture slot in `slots`.
    fn unbind_textures(&mut self, slots: Range<u32>) {
        for slot in slots {
            self.set_texture(slot, None);
        }
    }

    /// Finalizes the recording and returns a handle to the command buffer.
    fn finish(self: Box<Self>) -> CommandBufferId;

    /// Returns a mutable reference to the underlying trait object as `Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
