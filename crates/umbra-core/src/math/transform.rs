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

use super::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A decomposed affine transform: scale, then rotation, then translation.
///
/// Objects and lights face down their local `-Z` axis, matching the
/// right-handed view convention used by [`Mat4::look_to_rh`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World-space position.
    pub position: Vec3,
    /// Orientation.
    pub rotation: Quat,
    /// Non-uniform scale.
    pub scale: Vec3,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Creates a transform with only a translation.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Creates a transform placed at `position` and facing `direction`.
    pub fn looking_towards(position: Vec3, direction: Vec3) -> Self {
        let mut transform = Self::from_position(position);
        transform.set_forward(direction);
        transform
    }

    /// Composes the world matrix (`T * R * S`).
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// The unit direction this transform faces (local `-Z` rotated into world space).
    pub fn forward(&self) -> Vec3 {
        (self.rotation * Vec3::NEG_Z).normalize_or_zero()
    }

    /// Rotates the transform so that [`forward`](Self::forward) equals `direction`.
    ///
    /// A zero-length direction leaves the rotation untouched.
    pub fn set_forward(&mut self, direction: Vec3) {
        let direction = direction.normalize_or_zero();
        if direction == Vec3::ZERO {
            return;
        }
        self.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, direction);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn forward_defaults_to_negative_z() {
        assert_eq!(Transform::IDENTITY.forward(), Vec3::NEG_Z);
    }

    #[test]
    fn set_forward_round_trips() {
        let dir = Vec3::new(1.0, -2.0, 0.5).normalize();
        let t = Transform::looking_towards(Vec3::ZERO, dir);
        let f = t.forward();
        assert_relative_eq!(f.x, dir.x, epsilon = 1e-5);
        assert_relative_eq!(f.y, dir.y, epsilon = 1e-5);
        assert_relative_eq!(f.z, dir.z, epsilon = 1e-5);
    }

    #[test]
    fn set_forward_ignores_zero_direction() {
        let mut t = Transform::looking_towards(Vec3::ZERO, Vec3::X);
        let before = t.rotation;
        t.set_forward(Vec3::ZERO);
        assert_eq!(t.rotation, before);
    }

    #[test]
    fn matrix_applies_scale_then_translation() {
        let t = Transform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            scale: Vec3::splat(2.0),
        };
        let p = t.to_matrix().transform_point3(Vec3::ONE);
        assert_relative_eq!(p.x, 3.0);
        assert_relative_eq!(p.y, 4.0);
        assert_relative_eq!(p.z, 5.0);
    }
}
