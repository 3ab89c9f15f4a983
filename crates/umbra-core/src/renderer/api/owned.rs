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

//! Scoped ownership of device resources.
//!
//! An [`Owned`] handle pairs a resource id with the device that created it and
//! destroys the resource when dropped. Collections hold `Owned` values, so
//! removing a light or resizing a render target releases its GPU memory
//! without any explicit bookkeeping.

use super::pipeline::{RenderPipelineId, ShaderModuleId};
use super::resource::{BufferId, SamplerId, TextureId, TextureViewId};
use crate::renderer::error::ResourceError;
use crate::renderer::traits::GraphicsDevice;
use std::fmt;
use std::sync::Arc;

/// An id type that names a destroyable device resource.
pub trait DeviceResource: Copy + fmt::Debug {
    /// Human readable resource kind, used in log messages.
    const KIND: &'static str;

    /// Releases the resource on `device`.
    fn destroy(self, device: &dyn GraphicsDevice) -> Result<(), ResourceError>;
}

macro_rules! device_resource {
    ($id:ty, $kind:literal, $destroy:ident) => {
        impl DeviceResource for $id {
            const KIND: &'static str = $kind;

            fn destroy(self, device: &dyn GraphicsDevice) -> Result<(), ResourceError> {
                device.$destroy(self)
            }
        }
    };
}

device_resource!(BufferId, "buffer", destroy_buffer);
device_resource!(TextureId, "texture", destroy_texture);
device_resource!(TextureViewId, "texture view", destroy_texture_view);
device_resource!(SamplerId, "sampler", destroy_sampler);
device_resource!(ShaderModuleId, "shader module", destroy_shader_module);
device_resource!(RenderPipelineId, "render pipeline", destroy_render_pipeline);

/// Unique ownership of one device resource.
///
/// Dropping the handle destroys the resource. A failed destroy is logged and
/// never panics.
pub struct Owned<T: DeviceResource> {
    id: T,
    live: bool,
    device: Arc<dyn GraphicsDevice>,
}

impl<T: DeviceResource> Owned<T> {
    /// Takes ownership of `id`, which must have been created by `device`.
    pub fn new(device: Arc<dyn GraphicsDevice>, id: T) -> Self {
        Self {
            id,
            live: true,
            device,
        }
    }

    /// The owned id.
    pub fn id(&self) -> T {
        self.id
    }

    /// Destroys the resource now and reports the outcome.
    pub fn release(mut self) -> Result<(), ResourceError> {
        self.live = false;
        self.id.destroy(self.device.as_ref())
    }
}

impl<T: DeviceResource> Drop for Owned<T> {
    fn drop(&mut self) {
        if !self.live {
            return;
        }
        if let Err(e) = self.id.destroy(self.device.as_ref()) {
            log::warn!("Failed to destroy {} {:?}: {}", T::KIND, self.id, e);
        }
    }
}

impl<T: DeviceResource> fmt::Debug for Owned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owned")
            .field("id", &self.id)
            .field("live", &self.live)
            .finish()
    }
}
