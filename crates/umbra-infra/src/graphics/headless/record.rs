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

//! The command stream recorded by a headless encoder and the replay log it
//! produces on submission.

use std::collections::BTreeMap;
use std::ops::Range;
use umbra_core::math::LinearRgba;
use umbra_core::renderer::{
    BufferId, IndexFormat, LoadOp, RenderPipelineId, SamplerId, TextureViewId, Viewport,
};

/// One command, as recorded by [`HeadlessCommandEncoder`](super::HeadlessCommandEncoder).
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    /// A render pass begins.
    BeginRenderPass {
        /// Pass label.
        label: Option<String>,
        /// Color attachments with their load operation.
        color_attachments: Vec<(TextureViewId, LoadOp<LinearRgba>)>,
        /// Depth attachment with its load operation.
        depth_attachment: Option<(TextureViewId, Option<LoadOp<f32>>)>,
    },
    /// The viewport changes.
    SetViewport(Viewport),
    /// The pipeline changes.
    SetPipeline(RenderPipelineId),
    /// An ordered uniform buffer write.
    WriteUniform {
        /// Target buffer.
        buffer: BufferId,
        /// Bytes written at offset 0.
        data: Vec<u8>,
    },
    /// A uniform buffer is bound.
    SetUniformBuffer {
        /// Slot.
        slot: u32,
        /// Buffer.
        buffer: BufferId,
    },
    /// A texture slot is bound or cleared.
    SetTexture {
        /// Slot.
        slot: u32,
        /// View, or `None` to clear.
        view: Option<TextureViewId>,
    },
    /// A sampler is bound.
    SetSampler {
        /// Slot.
        slot: u32,
        /// Sampler.
        sampler: SamplerId,
    },
    /// A vertex buffer is bound.
    SetVertexBuffer {
        /// Slot.
        slot: u32,
        /// Buffer.
        buffer: BufferId,
    },
    /// An index buffer is bound.
    SetIndexBuffer {
        /// Buffer.
        buffer: BufferId,
        /// Index format.
        format: IndexFormat,
    },
    /// A non-indexed draw.
    Draw {
        /// Vertex range.
        vertices: Range<u32>,
        /// Instance range.
        instances: Range<u32>,
    },
    /// An indexed draw.
    DrawIndexed {
        /// Index range.
        indices: Range<u32>,
        /// Added to every index.
        base_vertex: i32,
        /// Instance range.
        instances: Range<u32>,
    },
    /// The current render pass ends.
    EndRenderPass,
}

/// The shape of a replayed draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawKind {
    /// `draw(vertices, instances)`.
    Vertices {
        /// Number of vertices.
        count: u32,
        /// Number of instances.
        instances: u32,
    },
    /// `draw_indexed(indices, ..)`.
    Indexed {
        /// Number of indices.
        count: u32,
        /// Number of instances.
        instances: u32,
    },
}

/// A draw together with the state it executed with.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// The draw shape.
    pub kind: DrawKind,
    /// Active pipeline.
    pub pipeline: Option<RenderPipelineId>,
    /// Active viewport.
    pub viewport: Option<Viewport>,
    /// Bound vertex buffer of slot 0.
    pub vertex_buffer: Option<BufferId>,
    /// Texture slots bound at draw time.
    pub textures: BTreeMap<u32, TextureViewId>,
    /// Contents of every bound uniform buffer at draw time, by slot.
    pub uniforms: BTreeMap<u32, Vec<u8>>,
}

impl DrawRecord {
    /// Decodes the start of the uniform buffer bound at `slot` as `T`.
    pub fn uniform<T: bytemuck::Pod>(&self, slot: u32) -> Option<T> {
        let bytes = self.uniforms.get(&slot)?;
        let size = std::mem::size_of::<T>();
        if bytes.len() < size {
            return None;
        }
        Some(bytemuck::pod_read_unaligned(&bytes[..size]))
    }
}

/// A replayed render pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassRecord {
    /// Pass label.
    pub label: Option<String>,
    /// Color attachments.
    pub color_attachments: Vec<TextureViewId>,
    /// Depth attachment.
    pub depth_attachment: Option<TextureViewId>,
    /// Whether the depth attachment was cleared, and to what.
    pub depth_clear: Option<f32>,
    /// Draws in submission order.
    pub draws: Vec<DrawRecord>,
}

impl PassRecord {
    /// Whether the pass writes `view`.
    pub fn writes(&self, view: TextureViewId) -> bool {
        self.color_attachments.contains(&view) || self.depth_attachment == Some(view)
    }
}

/// A texture that was bound as a shader input while also being a render target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hazard {
    /// Label of the pass in which it happened.
    pub pass: Option<String>,
    /// The offending texture slot.
    pub slot: u32,
    /// The bound shader input.
    pub view: TextureViewId,
}
