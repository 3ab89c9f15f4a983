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

//! The shared per-frame and per-model transform buffers.

use std::sync::Arc;
use umbra_core::math::Mat4;
use umbra_core::renderer::bindings::{FRAME_UNIFORM_SLOT, MODEL_UNIFORM_SLOT};
use umbra_core::renderer::uniforms::{FrameUniforms, ModelUniforms};
use umbra_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, GraphicsDevice, Owned, RenderError, RenderPass,
};

/// The frame and model uniform buffers every pass draws with.
///
/// Both buffers are overwritten in place through
/// [`RenderPass::write_uniform`] right before the draws that depend on them,
/// so one pair serves every camera, light and object of the frame.
pub struct TransformBuffers {
    frame: Owned<BufferId>,
    model: Owned<BufferId>,
}

impl TransformBuffers {
    /// Creates both buffers.
    pub fn new(device: &Arc<dyn GraphicsDevice>) -> Result<Self, RenderError> {
        let create = |label: &'static str, size: usize| -> Result<Owned<BufferId>, RenderError> {
            let id = device
                .create_buffer(&BufferDescriptor {
                    label: Some(label.into()),
                    size: size as u64,
                    usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                })
                .map_err(|e| RenderError::from(e).in_stage("transform buffers"))?;
            Ok(Owned::new(device.clone(), id))
        };
        Ok(Self {
            frame: create("frame uniforms", std::mem::size_of::<FrameUniforms>())?,
            model: create("model uniforms", std::mem::size_of::<ModelUniforms>())?,
        })
    }

    /// The frame buffer.
    pub fn frame_buffer(&self) -> BufferId {
        self.frame.id()
    }

    /// The model buffer.
    pub fn model_buffer(&self) -> BufferId {
        self.model.id()
    }

    /// Binds both buffers to their slots.
    pub fn bind(&self, pass: &mut dyn RenderPass) {
        pass.set_uniform_buffer(FRAME_UNIFORM_SLOT, self.frame.id());
        pass.set_uniform_buffer(MODEL_UNIFORM_SLOT, self.model.id());
    }

    /// Writes the view data used by the following draws.
    pub fn write_frame(&self, pass: &mut dyn RenderPass, frame: &FrameUniforms) {
        pass.write_uniform(self.frame.id(), bytemuck::bytes_of(frame));
    }

    /// Writes the object transform used by the following draws.
    pub fn write_model(&self, pass: &mut dyn RenderPass, model: Mat4) {
        let uniforms = ModelUniforms::new(model);
        pass.write_uniform(self.model.id(), bytemuck::bytes_of(&uniforms));
    }
}
