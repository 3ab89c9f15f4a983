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

//! Math primitives used throughout the renderer.
//!
//! Vector, matrix and quaternion types come from `glam`. This module adds the
//! few renderer-specific pieces on top: an affine [`Transform`], texture
//! extents, and conversion helpers for GPU-facing column arrays.
//!
//! All angles are in **radians**. Projections are right-handed with a
//! `[0, 1]` depth range.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};
pub use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

mod color;
mod dimension;
mod transform;

pub use self::color::LinearRgba;
pub use self::dimension::{Extent2D, Extent3D, Origin3D};
pub use self::transform::Transform;

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

/// Converts a matrix into the column-major `[[f32; 4]; 4]` layout used by GPU records.
#[inline]
pub fn mat4_to_gpu(m: &Mat4) -> [[f32; 4]; 4] {
    m.to_cols_array_2d()
}

/// Packs a `Vec3` and a trailing scalar into a 16-byte aligned `[f32; 4]`.
#[inline]
pub fn vec3_w(v: Vec3, w: f32) -> [f32; 4] {
    [v.x, v.y, v.z, w]
}
