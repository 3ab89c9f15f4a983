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

//! The scene camera and its screen-space projection helpers.

use crate::math::{Extent2D, Mat4, Transform, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// A perspective camera.
///
/// The camera looks down its local `-Z` axis. Its view matrix is the inverse
/// of its world transform and its projection maps depth into `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// World placement of the camera.
    pub transform: Transform,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Width over height of the viewport.
    pub aspect_ratio: f32,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            fov_y: 60.0_f32.to_radians(),
            aspect_ratio: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    /// The world position of the camera.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// The view matrix (inverse of the world transform).
    pub fn view_matrix(&self) -> Mat4 {
        self.transform.to_matrix().inverse()
    }

    /// The perspective projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect_ratio, self.near, self.far)
    }

    /// `projection * view`.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Updates the aspect ratio from a viewport size.
    pub fn set_viewport(&mut self, viewport: Extent2D) {
        self.aspect_ratio = viewport.aspect_ratio();
    }

    /// Distance of `point` in front of the camera along its view axis.
    ///
    /// Negative for points behind the camera.
    pub fn view_depth(&self, point: Vec3) -> f32 {
        -self.view_matrix().transform_point3(point).z
    }

    /// Projects a world point into normalized screen coordinates.
    ///
    /// `(0, 0)` is the top-left corner of the viewport and `(1, 1)` the
    /// bottom-right. Returns `None` when the point lies closer than the near
    /// clip plane (including anything behind the camera).
    pub fn project_to_screen(&self, point: Vec3) -> Option<Vec2> {
        if self.view_depth(point) < self.near {
            return None;
        }
        let clip = self.view_projection() * Vec4::new(point.x, point.y, point.z, 1.0);
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5))
    }

    /// The normalized device depth produced by this projection at a view distance.
    ///
    /// Equals `0.0` on the near plane and `1.0` on the far plane.
    pub fn ndc_depth_at(&self, distance: f32) -> f32 {
        if distance <= 0.0 {
            return 0.0;
        }
        self.far * (distance - self.near) / (distance * (self.far - self.near))
    }

    /// World-space size covered by one pixel at the given view distance.
    pub fn world_units_per_pixel(&self, distance: f32, viewport: Extent2D) -> Vec2 {
        let frustum_height = 2.0 * distance * (self.fov_y * 0.5).tan();
        let frustum_width = frustum_height * self.aspect_ratio;
        Vec2::new(
            frustum_width / viewport.width.max(1) as f32,
            frustum_height / viewport.height.max(1) as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera_at_origin() -> Camera {
        Camera {
            aspect_ratio: 1.0,
            fov_y: 90.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            ..Default::default()
        }
    }

    #[test]
    fn point_ahead_projects_to_center() {
        let cam = camera_at_origin();
        let uv = cam.project_to_screen(Vec3::new(0.0, 0.0, -5.0)).unwrap();
        assert_relative_eq!(uv.x, 0.5, epsilon = 1e-5);
        assert_relative_eq!(uv.y, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn point_up_projects_towards_top() {
        let cam = camera_at_origin();
        let uv = cam.project_to_screen(Vec3::new(0.0, 2.0, -5.0)).unwrap();
        assert!(uv.y < 0.5);
    }

    #[test]
    fn point_behind_or_inside_near_plane_is_rejected() {
        let cam = camera_at_origin();
        assert!(cam.project_to_screen(Vec3::new(0.0, 0.0, 5.0)).is_none());
        assert!(cam.project_to_screen(Vec3::new(0.0, 0.0, -0.05)).is_none());
    }

    #[test]
    fn ndc_depth_spans_near_to_far() {
        let cam = camera_at_origin();
        assert_relative_eq!(cam.ndc_depth_at(cam.near), 0.0, epsilon = 1e-6);
        assert_relative_eq!(cam.ndc_depth_at(cam.far), 1.0, epsilon = 1e-5);
    }

    #[test]
    fn ndc_depth_matches_projection_matrix() {
        let cam = camera_at_origin();
        let clip = cam.view_projection() * Vec4::new(0.0, 0.0, -7.5, 1.0);
        assert_relative_eq!(cam.ndc_depth_at(7.5), clip.z / clip.w, epsilon = 1e-5);
    }

    #[test]
    fn pixel_footprint_grows_with_distance() {
        let cam = camera_at_origin();
        let viewport = Extent2D::new(100, 100);
        let near = cam.world_units_per_pixel(1.0, viewport);
        let far = cam.world_units_per_pixel(10.0, viewport);
        // 90° fov: frustum height at distance 1 is 2 units.
        assert_relative_eq!(near.y, 0.02, epsilon = 1e-5);
        assert_relative_eq!(far.y, 0.2, epsilon = 1e-5);
    }
}
