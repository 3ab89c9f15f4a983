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

//! Screen-space placement of area and polygon filters.

use umbra_core::camera::Camera;
use umbra_core::math::{Extent2D, Mat4, Vec2, Vec3, Vec4};

/// A rectangle in normalized screen space with the depth it is drawn at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRegion {
    /// Top-left corner, `(0, 0)` being the top-left of the viewport.
    pub top_left: Vec2,
    /// Width and height as fractions of the viewport.
    pub size: Vec2,
    /// Normalized device depth of the region's world point.
    pub depth: f32,
}

impl ScreenRegion {
    /// `[x, y, width, height]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.top_left.x, self.top_left.y, self.size.x, self.size.y]
    }
}

/// Maps a world-space rectangle centered on `center` to the screen.
///
/// The rectangle faces the camera and keeps `size` world units across at
/// the center's depth. Returns `None` when the center is closer than the
/// near clip plane.
pub fn area_region(
    camera: &Camera,
    center: Vec3,
    size: Vec2,
    viewport: Extent2D,
) -> Option<ScreenRegion> {
    let distance = camera.view_depth(center);
    if distance < camera.near {
        return None;
    }
    let uv = camera.project_to_screen(center)?;
    let pixels = size / camera.world_units_per_pixel(distance, viewport);
    let extent = pixels / Vec2::new(viewport.width.max(1) as f32, viewport.height.max(1) as f32);
    Some(ScreenRegion {
        top_left: uv - extent * 0.5,
        size: extent,
        depth: camera.ndc_depth_at(distance),
    })
}

/// Transforms the corners of a polygon filter into clip space.
///
/// Returns `None` when every corner lies closer than the near clip plane,
/// in which case nothing of the quad can be visible.
pub fn polygon_corners(camera: &Camera, points: &[Vec3; 4], world: Mat4) -> Option<[Vec4; 4]> {
    let view_projection = camera.view_projection();
    let corners = points.map(|p| view_projection * world * p.extend(1.0));
    // With a perspective projection clip w is the view depth.
    if corners.iter().all(|c| c.w < camera.near) {
        return None;
    }
    Some(corners)
}
