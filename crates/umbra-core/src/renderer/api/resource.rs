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

//! Defines GPU resource handles and the descriptors used to create them.

use crate::math::Extent3D;
use bitflags::bitflags;
use std::borrow::Cow;

/// An opaque handle to a GPU buffer resource.
///
/// Returned by [`GraphicsDevice::create_buffer`](crate::renderer::GraphicsDevice::create_buffer)
/// and used to reference the buffer in all subsequent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub usize);

/// An opaque handle to a GPU texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub usize);

/// An opaque handle to a GPU texture view resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureViewId(pub usize);

/// An opaque handle to a GPU sampler resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerId(pub usize);

bitflags! {
    /// A set of flags describing the allowed usages of a [`BufferId`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// The buffer can be used as the destination of a copy or write.
        const COPY_DST = 1 << 0;
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 1;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 2;
        /// The buffer can be bound as a uniform (constant) buffer.
        const UNIFORM = 1 << 3;
        /// The buffer can be bound as a read-only storage buffer.
        const STORAGE = 1 << 4;
    }
}

bitflags! {
    /// A set of flags describing the allowed usages of a [`TextureId`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextureUsage: u32 {
        /// The texture can be used as the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The texture can be used as the destination of a copy operation.
        const COPY_DST = 1 << 1;
        /// The texture can be bound in a shader for sampling.
        const TEXTURE_BINDING = 1 << 2;
        /// The texture can be used as a color attachment in a render pass.
        const RENDER_ATTACHMENT = 1 << 3;
        /// The texture can be used as a depth/stencil attachment.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 4;
    }
}

/// The texel formats the renderer allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Four 8-bit normalized channels.
    Rgba8Unorm,
    /// Four 16-bit float channels, used for HDR scene targets.
    Rgba16Float,
    /// A single 16-bit float channel.
    R16Float,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with an 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Size of one texel in bytes.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::R16Float => 2,
            TextureFormat::Depth32Float | TextureFormat::Depth24PlusStencil8 => 4,
        }
    }

    /// Whether this is a depth (or depth/stencil) format.
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32Float | TextureFormat::Depth24PlusStencil8
        )
    }
}

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A two-dimensional texture, optionally layered.
    D2,
    /// A three-dimensional (volumetric) texture.
    D3,
}

/// The dimensionality of a texture view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureViewDimension {
    /// A view of a single 2D layer.
    D2,
    /// A view of a 2D texture array.
    D2Array,
    /// A view of the 6 layers of a texture as a cube.
    Cube,
}

/// Which aspects of a texture a view accesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageAspect {
    /// Color, depth and stencil.
    #[default]
    All,
    /// Only the depth component of a depth/stencil texture.
    DepthOnly,
}

/// A descriptor used to create a [`BufferId`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Total size in bytes.
    pub size: u64,
    /// How the buffer will be used.
    pub usage: BufferUsage,
}

/// A descriptor used to create a [`TextureId`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Width, height and depth or layer count.
    pub size: Extent3D,
    /// Number of mip levels.
    pub mip_level_count: u32,
    /// The dimensionality of the texture.
    pub dimension: TextureDimension,
    /// The texel format.
    pub format: TextureFormat,
    /// How the texture will be used.
    pub usage: TextureUsage,
}

impl<'a> TextureDescriptor<'a> {
    /// A single-layer 2D texture with one mip level.
    pub fn d2(
        label: impl Into<Cow<'a, str>>,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: TextureUsage,
    ) -> Self {
        Self {
            label: Some(label.into()),
            size: Extent3D {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            dimension: TextureDimension::D2,
            format,
            usage,
        }
    }
}

/// A descriptor used to create a [`TextureViewId`].
#[derive(Debug, Clone, Default)]
pub struct TextureViewDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// View format. `None` inherits the texture's format.
    pub format: Option<TextureFormat>,
    /// View dimension. `None` infers it from the texture.
    pub dimension: Option<TextureViewDimension>,
    /// Accessed aspects.
    pub aspect: ImageAspect,
    /// First array layer visible through the view.
    pub base_array_layer: u32,
    /// Number of visible layers. `None` means all remaining layers.
    pub array_layer_count: Option<u32>,
}

/// How texture coordinates outside `[0, 1]` are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Coordinates wrap around.
    Repeat,
    /// Coordinates are clamped to the edge texel.
    ClampToEdge,
    /// Coordinates outside the range read the border color.
    ClampToBorder,
}

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest texel.
    Nearest,
    /// Weighted average of the nearest texels.
    Linear,
}

/// The border color used with [`AddressMode::ClampToBorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerBorderColor {
    /// `[0, 0, 0, 0]`.
    TransparentBlack,
    /// `[1, 1, 1, 1]`.
    OpaqueWhite,
}

/// A comparison function for depth tests and comparison samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the new value is less than the existing value.
    Less,
    /// Passes if the new value is less than or equal to the existing value.
    LessEqual,
    /// Always passes.
    Always,
}

/// A descriptor used to create a [`SamplerId`].
#[derive(Debug, Clone)]
pub struct SamplerDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// Address mode applied to all three coordinates.
    pub address_mode: AddressMode,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Maximum anisotropy. `1` disables anisotropic filtering.
    pub anisotropy_clamp: u16,
    /// Border color for [`AddressMode::ClampToBorder`].
    pub border_color: Option<SamplerBorderColor>,
}

impl Default for SamplerDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            address_mode: AddressMode::ClampToEdge,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            anisotropy_clamp: 1,
            border_color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_formats_are_flagged() {
        assert!(TextureFormat::Depth32Float.is_depth());
        assert!(TextureFormat::Depth24PlusStencil8.is_depth());
        assert!(!TextureFormat::Rgba16Float.is_depth());
    }

    #[test]
    fn d2_descriptor_is_single_layer() {
        let desc = TextureDescriptor::d2(
            "scene",
            640,
            480,
            TextureFormat::Rgba16Float,
            TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        );
        assert_eq!(desc.size.depth_or_array_layers, 1);
        assert_eq!(desc.label.as_deref(), Some("scene"));
        assert!(desc.usage.contains(TextureUsage::TEXTURE_BINDING));
    }
}
