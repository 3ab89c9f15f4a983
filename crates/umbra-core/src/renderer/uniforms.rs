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

//! GPU-facing record layouts.
//!
//! Every record is `#[repr(C)]` and [`bytemuck::Pod`], padded to 16-byte
//! boundaries so the layouts match the WGSL uniform structs of the built-in
//! shaders. Matrices are column-major.

use crate::math::{mat4_to_gpu, vec3_w, Mat4, Vec3};
use bytemuck::{Pod, Zeroable};

type GpuMat4 = [[f32; 4]; 4];

/// Per-view transform data, rewritten before every camera or light pass.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    /// World to view.
    pub view: GpuMat4,
    /// View to clip.
    pub projection: GpuMat4,
    /// `projection * view`.
    pub view_projection: GpuMat4,
    /// Eye position in `xyz`.
    pub eye_position: [f32; 4],
    /// Target width, height, elapsed seconds, unused.
    pub screen: [f32; 4],
}

impl FrameUniforms {
    /// Builds the record for one view.
    pub fn new(
        view: Mat4,
        projection: Mat4,
        eye: Vec3,
        width: u32,
        height: u32,
        time: f32,
    ) -> Self {
        Self {
            view: mat4_to_gpu(&view),
            projection: mat4_to_gpu(&projection),
            view_projection: mat4_to_gpu(&(projection * view)),
            eye_position: vec3_w(eye, 1.0),
            screen: [width as f32, height as f32, time, 0.0],
        }
    }
}

/// Per-object transform data.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ModelUniforms {
    /// Object to world.
    pub model: GpuMat4,
    /// Inverse-transpose of the model matrix, for normals.
    pub normal_matrix: GpuMat4,
}

impl ModelUniforms {
    /// Builds the record for a world matrix.
    pub fn new(model: Mat4) -> Self {
        Self {
            model: mat4_to_gpu(&model),
            normal_matrix: mat4_to_gpu(&model.inverse().transpose()),
        }
    }
}

/// Fields every per-kind light record carries.
pub trait LightRecord: Pod + Zeroable + Copy {
    /// Writes the count of active lights of this kind.
    fn set_active_count(&mut self, count: u32);

    /// Whether the record is marked enabled.
    fn is_enabled(&self) -> bool;
}

macro_rules! light_record {
    ($record:ty) => {
        impl LightRecord for $record {
            fn set_active_count(&mut self, count: u32) {
                self.active_count = count;
            }

            fn is_enabled(&self) -> bool {
                self.enabled != 0
            }
        }
    };
}

/// Record of a plain light.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct AmbientLightRecord {
    /// `color * intensity` in `rgb`.
    pub radiance: [f32; 4],
    /// World position in `xyz`.
    pub position: [f32; 4],
    /// Non-zero when enabled.
    pub enabled: u32,
    /// Number of active lights of this kind.
    pub active_count: u32,
    /// Padding.
    pub _pad: [u32; 2],
}

/// Record of a spot light.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpotLightRecord {
    /// `color * intensity` in `rgb`, range in `w`.
    pub radiance: [f32; 4],
    /// World position in `xyz`.
    pub position: [f32; 4],
    /// Facing in `xyz`, cosine of the cone half-angle in `w`.
    pub facing: [f32; 4],
    /// Light-space view matrix.
    pub view: GpuMat4,
    /// Perspective shadow projection.
    pub projection: GpuMat4,
    /// Non-zero when enabled.
    pub enabled: u32,
    /// Number of active lights of this kind.
    pub active_count: u32,
    /// Index of the first shadow map view of this light.
    pub shadow_index: u32,
    /// Padding.
    pub _pad: u32,
}

/// Record of a directional light.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DirectionalLightRecord {
    /// `color * intensity` in `rgb`.
    pub radiance: [f32; 4],
    /// World position of the shadow box in `xyz`.
    pub position: [f32; 4],
    /// Facing in `xyz`.
    pub facing: [f32; 4],
    /// Light-space view matrix.
    pub view: GpuMat4,
    /// Orthographic shadow projection.
    pub projection: GpuMat4,
    /// Non-zero when enabled.
    pub enabled: u32,
    /// Number of active lights of this kind.
    pub active_count: u32,
    /// Index of the shadow map view of this light.
    pub shadow_index: u32,
    /// Padding.
    pub _pad: u32,
}

/// Record of a point light.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointLightRecord {
    /// `color * intensity` in `rgb`, range in `w`.
    pub radiance: [f32; 4],
    /// World position in `xyz`.
    pub position: [f32; 4],
    /// One view matrix per cube face.
    pub face_views: [GpuMat4; 6],
    /// The 90° projection shared by all faces.
    pub projection: GpuMat4,
    /// Non-zero when enabled.
    pub enabled: u32,
    /// Number of active lights of this kind.
    pub active_count: u32,
    /// Index of the first of six consecutive shadow map views.
    pub shadow_index: u32,
    /// Padding.
    pub _pad: u32,
}

light_record!(AmbientLightRecord);
light_record!(SpotLightRecord);
light_record!(DirectionalLightRecord);
light_record!(PointLightRecord);

/// A fixed-capacity array of light records mirrored into one uniform buffer.
///
/// Records past the active prefix are always zero. Only a prefix of the block
/// needs uploading: the larger of the current active count and the previously
/// uploaded count, so slots that were active last frame get overwritten with
/// zeros.
#[derive(Debug, Clone)]
pub struct LightBlock<R: LightRecord> {
    records: Vec<R>,
    active: usize,
    uploaded: usize,
}

impl<R: LightRecord> LightBlock<R> {
    /// A zeroed block of `capacity` records.
    pub fn new(capacity: usize) -> Self {
        Self {
            records: vec![R::zeroed(); capacity],
            active: 0,
            uploaded: 0,
        }
    }

    /// Number of record slots.
    pub fn capacity(&self) -> usize {
        self.records.len()
    }

    /// Size of the whole block in bytes.
    pub fn byte_size(&self) -> u64 {
        (self.records.len() * std::mem::size_of::<R>()) as u64
    }

    /// Zeroes every record and the active count.
    pub fn clear(&mut self) {
        self.records.fill(R::zeroed());
        self.active = 0;
    }

    /// Appends a record to the active prefix.
    ///
    /// Returns `false`, leaving the block untouched, when the block is full.
    pub fn push(&mut self, record: R) -> bool {
        match self.records.get_mut(self.active) {
            Some(slot) => {
                *slot = record;
                self.active += 1;
                true
            }
            None => false,
        }
    }

    /// Broadcasts the active count into every active record.
    pub fn finalize(&mut self) {
        let count = self.active as u32;
        for record in &mut self.records[..self.active] {
            record.set_active_count(count);
        }
    }

    /// Number of active records.
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// All record slots.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// The bytes that must be transferred this frame, and marks them uploaded.
    pub fn take_upload(&mut self) -> &[u8] {
        let len = self.active.max(self.uploaded);
        self.uploaded = self.active;
        bytemuck::cast_slice(&self.records[..len])
    }
}

/// Uniforms of one post-processing draw.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PostProcessUniforms {
    /// Normalized top-left corner and size of the affected region.
    pub region: [f32; 4],
    /// Effect parameters; meaning depends on the effect.
    pub params: [f32; 4],
    /// Extra effect parameters (tint color, light screen position, ...).
    pub extra: [f32; 4],
    /// Target width, height, elapsed seconds, region NDC depth.
    pub screen: [f32; 4],
    /// Clip-space corners of a polygon region.
    pub corners: [[f32; 4]; 4],
}

impl Default for PostProcessUniforms {
    fn default() -> Self {
        Self {
            region: [0.0, 0.0, 1.0, 1.0],
            ..Zeroable::zeroed()
        }
    }
}
