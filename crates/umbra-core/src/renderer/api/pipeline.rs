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

//! Shader modules and the static state of render pipelines.

use super::resource::{CompareFunction, TextureFormat};
use std::borrow::Cow;

/// An opaque handle representing a compiled shader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShaderModuleId(pub usize);

/// An opaque handle to a compiled render pipeline state object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderPipelineId(pub usize);

/// Represents the source data for a shader module.
#[derive(Debug, Clone)]
pub enum ShaderSourceData<'a> {
    /// WGSL source text.
    Wgsl(Cow<'a, str>),
}

/// Describes a shader module to be created by the `GraphicsDevice`.
#[derive(Debug, Clone)]
pub struct ShaderModuleDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<&'a str>,
    /// The shader source.
    pub source: ShaderSourceData<'a>,
}

/// The format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
}

impl VertexFormat {
    /// Size of the attribute in bytes.
    pub fn size(self) -> u64 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
        }
    }
}

/// Describes a single vertex attribute within a vertex buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The input location in the vertex shader.
    pub shader_location: u32,
    /// The attribute's data format.
    pub format: VertexFormat,
    /// Byte offset from the start of the vertex.
    pub offset: u64,
}

/// Describes the memory layout of a vertex buffer.
#[derive(Debug, Clone)]
pub struct VertexBufferLayout<'a> {
    /// Byte distance between consecutive vertices.
    pub array_stride: u64,
    /// Attributes contained in each vertex.
    pub attributes: Cow<'a, [VertexAttribute]>,
}

/// The format of index buffer elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// 16-bit indices.
    Uint16,
    /// 32-bit indices.
    Uint32,
}

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Every three vertices form a triangle.
    TriangleList,
    /// Each vertex after the first two forms a triangle with the previous two.
    TriangleStrip,
}

/// Which triangle faces are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// Discard front faces.
    Front,
    /// Discard back faces.
    Back,
}

/// Primitive assembly and rasterization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrimitiveState {
    /// The primitive topology.
    pub topology: PrimitiveTopology,
    /// The culled face, if any.
    pub cull_mode: Option<CullMode>,
}

impl Default for PrimitiveState {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            cull_mode: Some(CullMode::Back),
        }
    }
}

/// Depth testing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthStencilState {
    /// Format of the depth attachment.
    pub format: TextureFormat,
    /// Whether depth values are written.
    pub depth_write_enabled: bool,
    /// The depth comparison.
    pub depth_compare: CompareFunction,
}

impl DepthStencilState {
    /// The standard "less" test with writes enabled.
    pub const fn standard(format: TextureFormat) -> Self {
        Self {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
        }
    }
}

/// A factor applied to a source or destination color in a blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// `0`.
    Zero,
    /// `1`.
    One,
    /// Source alpha.
    SrcAlpha,
    /// `1 - source alpha`.
    OneMinusSrcAlpha,
    /// Destination color.
    Dst,
}

/// The operation combining the weighted source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendOperation {
    /// `src + dst`.
    Add,
}

/// A blend equation for one group of channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// Source factor.
    pub src_factor: BlendFactor,
    /// Destination factor.
    pub dst_factor: BlendFactor,
    /// Combining operation.
    pub operation: BlendOperation,
}

impl BlendComponent {
    const fn add(src_factor: BlendFactor, dst_factor: BlendFactor) -> Self {
        Self {
            src_factor,
            dst_factor,
            operation: BlendOperation::Add,
        }
    }
}

/// The blend state of a single color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// Equation for the RGB channels.
    pub color: BlendComponent,
    /// Equation for the alpha channel.
    pub alpha: BlendComponent,
}

impl BlendState {
    /// Overwrites the destination.
    pub const REPLACE: Self = Self {
        color: BlendComponent::add(BlendFactor::One, BlendFactor::Zero),
        alpha: BlendComponent::add(BlendFactor::One, BlendFactor::Zero),
    };

    /// Standard "over" compositing by source alpha.
    pub const ALPHA_BLENDING: Self = Self {
        color: BlendComponent::add(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
        alpha: BlendComponent::add(BlendFactor::One, BlendFactor::OneMinusSrcAlpha),
    };

    /// Adds the source onto the destination.
    pub const ADDITIVE: Self = Self {
        color: BlendComponent::add(BlendFactor::One, BlendFactor::One),
        alpha: BlendComponent::add(BlendFactor::Zero, BlendFactor::One),
    };

    /// Multiplies the destination by the source.
    pub const MULTIPLY: Self = Self {
        color: BlendComponent::add(BlendFactor::Dst, BlendFactor::Zero),
        alpha: BlendComponent::add(BlendFactor::Zero, BlendFactor::One),
    };
}

/// State of one color target of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorTargetState {
    /// Format of the attachment.
    pub format: TextureFormat,
    /// Blending, or `None` to disable it.
    pub blend: Option<BlendState>,
}

/// A complete description of a render pipeline.
#[derive(Debug, Clone)]
pub struct RenderPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The vertex shader module.
    pub vertex_shader: ShaderModuleId,
    /// The vertex entry point.
    pub vertex_entry_point: &'a str,
    /// The fragment shader module. `None` for depth-only pipelines.
    pub fragment_shader: Option<ShaderModuleId>,
    /// The fragment entry point.
    pub fragment_entry_point: &'a str,
    /// Vertex buffer layout. `None` when the vertex shader synthesizes positions.
    pub vertex_layout: Option<VertexBufferLayout<'a>>,
    /// Primitive assembly state.
    pub primitive: PrimitiveState,
    /// Depth state. `None` disables depth testing.
    pub depth_stencil: Option<DepthStencilState>,
    /// Color targets. Empty for depth-only pipelines.
    pub color_targets: Cow<'a, [ColorTargetState]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_presets_differ() {
        assert_ne!(BlendState::REPLACE, BlendState::ALPHA_BLENDING);
        assert_ne!(BlendState::ALPHA_BLENDING, BlendState::ADDITIVE);
        assert_eq!(BlendState::ADDITIVE.color.dst_factor, BlendFactor::One);
    }

    #[test]
    fn default_primitive_culls_back_faces() {
        let state = PrimitiveState::default();
        assert_eq!(state.cull_mode, Some(CullMode::Back));
        assert_eq!(state.topology, PrimitiveTopology::TriangleList);
    }
}
