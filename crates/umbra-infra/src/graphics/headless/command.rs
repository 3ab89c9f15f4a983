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

use super::device::HeadlessDevice;
use super::record::RecordedCommand;
use std::any::Any;
use std::ops::Range;
use umbra_core::renderer::{
    BufferId, CommandBufferId, CommandEncoder, IndexFormat, RenderPass, RenderPassDescriptor,
    RenderPipelineId, SamplerId, TextureViewId, Viewport,
};

/// An active pass of a [`HeadlessCommandEncoder`]. Ends the pass when dropped.
pub struct HeadlessRenderPass<'a> {
    encoder: &'a mut HeadlessCommandEncoder,
}

impl RenderPass for HeadlessRenderPass<'_> {
    fn set_pipeline(&mut self, pipeline: RenderPipelineId) {
        self.encoder.push(RecordedCommand::SetPipeline(pipeline));
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.encoder.push(RecordedCommand::SetViewport(viewport));
    }

    fn write_uniform(&mut self, buffer: BufferId, data: &[u8]) {
        self.encoder.push(RecordedCommand::WriteUniform {
            buffer,
            data: data.to_vec(),
        });
    }

    fn set_uniform_buffer(&mut self, slot: u32, buffer: BufferId) {
        self.encoder
            .push(RecordedCommand::SetUniformBuffer { slot, buffer });
    }

    fn set_texture(&mut self, slot: u32, view: Option<TextureViewId>) {
        self.encoder
            .push(RecordedCommand::SetTexture { slot, view });
    }

    fn set_sampler(&mut self, slot: u32, sampler: SamplerId) {
        self.encoder
            .push(RecordedCommand::SetSampler { slot, sampler });
    }

    fn set_vertex_buffer(&mut self, slot: u32, buffer: BufferId, _offset: u64) {
        self.encoder
            .push(RecordedCommand::SetVertexBuffer { slot, buffer });
    }

    fn set_index_buffer(&mut self, buffer: BufferId, _offset: u64, index_format: IndexFormat) {
        self.encoder.push(RecordedCommand::SetIndexBuffer {
            buffer,
            format: index_format,
        });
    }

    fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.encoder.push(RecordedCommand::Draw {
            vertices,
            instances,
        });
    }

    fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.encoder.push(RecordedCommand::DrawIndexed {
            indices,
            base_vertex,
            instances,
        });
    }
}

impl Drop for HeadlessRenderPass<'_> {
    fn drop(&mut self) {
        self.encoder.push(RecordedCommand::EndRenderPass);
    }
}

/// Records commands into a plain list; the device replays them on submission.
pub struct HeadlessCommandEncoder {
    device: HeadlessDevice,
    label: Option<String>,
    commands: Vec<RecordedCommand>,
}

impl HeadlessCommandEncoder {
    pub(crate) fn new(device: HeadlessDevice, label: Option<&str>) -> Self {
        Self {
            device,
            label: label.map(str::to_owned),
            commands: Vec::new(),
        }
    }

    fn push(&mut self, command: RecordedCommand) {
        self.commands.push(command);
    }

    /// The commands recorded so far.
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// The encoder label.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl CommandEncoder for HeadlessCommandEncoder {
    fn begin_render_pass<'encoder>(
        &'encoder mut self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Box<dyn RenderPass + 'encoder> {
        self.push(RecordedCommand::BeginRenderPass {
            label: descriptor.label.map(str::to_owned),
            color_attachments: descriptor
                .color_attachments
                .iter()
                .map(|a| (a.view, a.ops.load))
                .collect(),
            depth_attachment: descriptor
                .depth_stencil_attachment
                .map(|d| (d.view, d.depth_ops.map(|ops| ops.load))),
        });
        Box::new(HeadlessRenderPass { encoder: self })
    }

    fn set_texture(&mut self, slot: u32, view: Option<TextureViewId>) {
        self.push(RecordedCommand::SetTexture { slot, view });
    }

    fn finish(self: Box<Self>) -> CommandBufferId {
        let this = *self;
        this.device.register_command_buffer(this.commands)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
