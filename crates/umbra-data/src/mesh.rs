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

//! An indexed triangle mesh with a PBR material, resident on the device.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use std::borrow::Cow;
use std::sync::Arc;
use umbra_core::math::LinearRgba;
use umbra_core::renderer::bindings::{
    MATERIAL_SAMPLER_SLOT, MATERIAL_TEXTURE_COUNT, MATERIAL_TEXTURE_SLOT, MATERIAL_UNIFORM_SLOT,
};
use umbra_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, GraphicsDevice, IndexFormat, MeshProvider, Owned,
    RenderError, RenderPass, SamplerId, TextureViewId, VertexAttribute, VertexBufferLayout,
    VertexFormat,
};

/// Vertex layout of [`StaticMesh`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Texture coordinate.
    pub uv: [f32; 2],
}

impl Vertex {
    /// Shader locations 0, 1 and 2.
    pub const ATTRIBUTES: [VertexAttribute; 3] = [
        VertexAttribute {
            shader_location: 0,
            format: VertexFormat::Float32x3,
            offset: 0,
        },
        VertexAttribute {
            shader_location: 1,
            format: VertexFormat::Float32x3,
            offset: 12,
        },
        VertexAttribute {
            shader_location: 2,
            format: VertexFormat::Float32x2,
            offset: 24,
        },
    ];

    /// The buffer layout matching this struct.
    pub fn layout() -> VertexBufferLayout<'static> {
        VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            attributes: Cow::Borrowed(&Self::ATTRIBUTES),
        }
    }

    fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        }
    }
}

/// Material parameters of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshMaterial {
    /// Albedo multiplier.
    pub base_color: LinearRgba,
    /// Perceptual roughness in `[0, 1]`.
    pub roughness: f32,
    /// Metalness in `[0, 1]`.
    pub metallic: f32,
    /// Albedo, normal, roughness/metal and opacity maps.
    pub textures: [Option<TextureViewId>; MATERIAL_TEXTURE_COUNT as usize],
    /// Sampler for the maps. Without one the renderer's material sampler stays bound.
    pub sampler: Option<SamplerId>,
}

impl Default for MeshMaterial {
    fn default() -> Self {
        Self {
            base_color: LinearRgba::WHITE,
            roughness: 0.5,
            metallic: 0.0,
            textures: [None; MATERIAL_TEXTURE_COUNT as usize],
            sampler: None,
        }
    }
}

/// GPU layout of [`MeshMaterial`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialUniforms {
    /// Albedo multiplier.
    pub base_color: [f32; 4],
    /// Roughness, metallic, texture presence bits, unused.
    pub params: [f32; 4],
}

impl From<&MeshMaterial> for MaterialUniforms {
    fn from(material: &MeshMaterial) -> Self {
        let mask = material
            .textures
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_some())
            .fold(0u32, |bits, (i, _)| bits | (1 << i));
        Self {
            base_color: material.base_color.into(),
            params: [material.roughness, material.metallic, mask as f32, 0.0],
        }
    }
}

/// Indexed geometry plus a material, with device-resident buffers.
#[derive(Debug)]
pub struct StaticMesh {
    name: String,
    vertex_buffer: Owned<BufferId>,
    index_buffer: Owned<BufferId>,
    material_buffer: Owned<BufferId>,
    index_count: u32,
    material: MeshMaterial,
}

impl StaticMesh {
    /// Uploads the geometry and material.
    pub fn new(
        device: &Arc<dyn GraphicsDevice>,
        name: impl Into<String>,
        vertices: &[Vertex],
        indices: &[u32],
        material: MeshMaterial,
    ) -> Result<Self, RenderError> {
        let name = name.into();
        let upload = |what: &str, usage: BufferUsage, bytes: &[u8]| {
            device
                .create_buffer_with_data(
                    &BufferDescriptor {
                        label: Some(format!("{name} {what}").into()),
                        size: bytes.len().max(4) as u64,
                        usage,
                    },
                    bytes,
                )
                .map(|id| Owned::new(device.clone(), id))
                .map_err(|e| RenderError::from(e).in_stage("mesh upload"))
        };

        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let vertex_buffer = upload("vertices", BufferUsage::VERTEX, vertex_bytes)?;
        let index_buffer = upload("indices", BufferUsage::INDEX, bytemuck::cast_slice(indices))?;
        let uniforms = MaterialUniforms::from(&material);
        let material_buffer = upload(
            "material",
            BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            bytemuck::bytes_of(&uniforms),
        )?;

        Ok(Self {
            name,
            vertex_buffer,
            index_buffer,
            material_buffer,
            index_count: indices.len() as u32,
            material,
        })
    }

    /// An axis-aligned cube of edge `size`, centered on the origin.
    pub fn cube(
        device: &Arc<dyn GraphicsDevice>,
        name: impl Into<String>,
        size: f32,
        material: MeshMaterial,
    ) -> Result<Self, RenderError> {
        let h = size * 0.5;
        let normals = [Vec3::X, -Vec3::X, Vec3::Y, -Vec3::Y, Vec3::Z, -Vec3::Z];
        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for normal in normals {
            let up = if normal.y.abs() > 0.5 { Vec3::Z } else { Vec3::Y };
            let right = up.cross(normal);
            let base = vertices.len() as u32;
            let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
            for (x, y) in corners {
                let position = (normal + right * x + up * y) * h;
                let uv = Vec2::new((x + 1.0) * 0.5, (1.0 - y) * 0.5);
                vertices.push(Vertex::new(position, normal, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self::new(device, name, &vertices, &indices, material)
    }

    /// Number of indices drawn.
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// The material.
    pub fn material(&self) -> &MeshMaterial {
        &self.material
    }

    /// The vertex buffer.
    pub fn vertex_buffer(&self) -> BufferId {
        self.vertex_buffer.id()
    }
}

impl MeshProvider for StaticMesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn render(&self, pass: &mut dyn RenderPass, basic_geometry: bool) -> Result<(), RenderError> {
        pass.set_vertex_buffer(0, self.vertex_buffer.id(), 0);
        pass.set_index_buffer(self.index_buffer.id(), 0, IndexFormat::Uint32);
        if !basic_geometry {
            for (i, texture) in self.material.textures.iter().enumerate() {
                pass.set_texture(MATERIAL_TEXTURE_SLOT + i as u32, *texture);
            }
            if let Some(sampler) = self.material.sampler {
                pass.set_sampler(MATERIAL_SAMPLER_SLOT, sampler);
            }
            pass.set_uniform_buffer(MATERIAL_UNIFORM_SLOT, self.material_buffer.id());
        }
        pass.draw_indexed(0..self.index_count, 0, 0..1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_infra::HeadlessDevice;

    #[test]
    fn cube_faces_wind_outwards() {
        let device = HeadlessDevice::new();
        let shared: Arc<dyn GraphicsDevice> = Arc::new(device.clone());
        let cube = StaticMesh::cube(&shared, "cube", 2.0, MeshMaterial::default()).unwrap();
        assert_eq!(cube.index_count(), 36);

        let bytes = device.buffer_contents(cube.vertex_buffer()).unwrap();
        let vertices: Vec<Vertex> = bytes
            .chunks_exact(std::mem::size_of::<Vertex>())
            .map(bytemuck::pod_read_unaligned)
            .collect();
        assert_eq!(vertices.len(), 24);
        for face in vertices.chunks(4) {
            let [a, b, c] = [face[0], face[1], face[2]].map(|v| Vec3::from(v.position));
            let winding = (b - a).cross(c - a).normalize();
            assert!(winding.dot(Vec3::from(face[0].normal)) > 0.99);
            let on_unit_cube = |v: &Vertex| v.position.iter().all(|p| p.abs() == 1.0);
            assert!(face.iter().all(on_unit_cube));
        }
    }

    #[test]
    fn dropping_the_mesh_releases_its_buffers() {
        let device = HeadlessDevice::new();
        let shared: Arc<dyn GraphicsDevice> = Arc::new(device.clone());
        let mesh = StaticMesh::cube(&shared, "cube", 1.0, MeshMaterial::default()).unwrap();
        assert_eq!(device.live_buffer_count(), 3);
        drop(mesh);
        assert_eq!(device.live_buffer_count(), 0);
    }

    #[test]
    fn texture_mask_marks_present_maps() {
        let mut material = MeshMaterial::default();
        material.textures[0] = Some(TextureViewId(3));
        material.textures[2] = Some(TextureViewId(4));
        assert_eq!(MaterialUniforms::from(&material).params[2], 5.0);
    }
}
