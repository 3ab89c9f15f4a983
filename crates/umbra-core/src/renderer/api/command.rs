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

//! Defines data structures used for recording and describing GPU commands.

use super::resource::TextureViewId;
use crate::math::{Extent2D, LinearRgba};

/// An opaque handle to a recorded command buffer that is ready for submission.
///
/// Returned by [`CommandEncoder::finish`](crate::renderer::CommandEncoder::finish) and
/// consumed by
/// [`GraphicsDevice::submit_command_buffer`](crate::renderer::GraphicsDevice::submit_command_buffer).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CommandBufferId(pub u64);

/// Describes the operation to perform on an attachment at the start of a render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LoadOp<V> {
    /// The existing contents of the attachment are kept.
    Load,
    /// The attachment is cleared to the value before the pass begins.
    Clear(V),
}

/// Describes the operation to perform on an attachment at the end of a render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreOp {
    /// The results are stored.
    Store,
    /// The results are discarded.
    Discard,
}

/// The load and store operations for a single attachment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Operations<V> {
    /// Operation at the beginning of the pass.
    pub load: LoadOp<V>,
    /// Operation at the end of the pass.
    pub store: StoreOp,
}

/// A color attachment of a render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPassColorAttachment {
    /// The view rendered to.
    pub view: TextureViewId,
    /// Load and store operations.
    pub ops: Operations<LinearRgba>,
}

impl RenderPassColorAttachment {
    /// An attachment cleared to `color` and stored.
    pub fn clear(view: TextureViewId, color: LinearRgba) -> Self {
        Self {
            view,
            ops: Operations {
                load: LoadOp::Clear(color),
                store: StoreOp::Store,
            },
        }
    }

    /// An attachment whose previous contents are kept.
    pub fn load(view: TextureViewId) -> Self {
        Self {
            view,
            ops: Operations {
                load: LoadOp::Load,
                store: StoreOp::Store,
            },
        }
    }
}

/// The depth/stencil attachment of a render pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderPassDepthStencilAttachment {
    /// The depth view.
    pub view: TextureViewId,
    /// Depth operations. `None` loads and keeps the depth (read-only test).
    pub depth_ops: Option<Operations<f32>>,
}

impl RenderPassDepthStencilAttachment {
    /// A depth attachment cleared to `depth` and stored.
    pub fn clear(view: TextureViewId, depth: f32) -> Self {
        Self {
            view,
            depth_ops: Some(Operations {
                load: LoadOp::Clear(depth),
                store: StoreOp::Store,
            }),
        }
    }

    /// A depth attachment whose previous contents are kept.
    pub fn load(view: TextureViewId) -> Self {
        Self {
            view,
            depth_ops: Some(Operations {
                load: LoadOp::Load,
                store: StoreOp::Store,
            }),
        }
    }
}

/// A descriptor for a render pass.
#[derive(Debug, Default)]
pub struct RenderPassDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// Color attachments, in slot order.
    pub color_attachments: &'a [RenderPassColorAttachment],
    /// Optional depth attachment.
    pub depth_stencil_attachment: Option<RenderPassDepthStencilAttachment>,
}

impl RenderPassDescriptor<'_> {
    /// All views written by this pass.
    pub fn attachment_views(&self) -> impl Iterator<Item = TextureViewId> + '_ {
        self.color_attachments
            .iter()
            .map(|a| a.view)
            .chain(self.depth_stencil_attachment.map(|d| d.view))
    }
}

/// The rasterization rectangle of a pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Minimum depth.
    pub min_depth: f32,
    /// Maximum depth.
    pub max_depth: f32,
}

impl Viewport {
    /// A viewport covering `extent` with the full `[0, 1]` depth range.
    pub fn from_extent(extent: Extent2D) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }

    /// A square viewport, as used by shadow passes.
    pub fn square(resolution: u32) -> Self {
        Self::from_extent(Extent2D::new(resolution, resolution))
    }
}
