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

//! Defines the light types of the renderer.
//!
//! Lights are a closed set of four kinds, modelled as the [`Light`] sum type.
//! Every kind shares a [`LightBase`] (placement, color, intensity, enabled
//! flag). The shadow-casting kinds add the parameters their shadow
//! projection needs. GPU resources are not stored here: they are owned by the
//! light registry next to each light.

use crate::math::{LinearRgba, Mat4, Transform, Vec3, FRAC_PI_2};
use serde::{Deserialize, Serialize};

/// Default shadow map edge length in texels.
pub const DEFAULT_SHADOW_RESOLUTION: u32 = 1024;

/// Near clip distance of the perspective shadow projections.
pub const SHADOW_NEAR_PLANE: f32 = 0.1;

/// The fixed facing table of a cube shadow map, as `(forward, up)` pairs.
///
/// Ordered +X, -X, +Y, -Y, +Z, -Z, matching the layer order of a cube texture.
pub const CUBE_FACE_DIRECTIONS: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

/// View matrices looking from `position` down each cube face.
pub fn cube_face_views(position: Vec3) -> [Mat4; 6] {
    CUBE_FACE_DIRECTIONS.map(|(forward, up)| Mat4::look_to_rh(position, forward, up))
}

/// Attributes shared by every light kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightBase {
    /// World placement. The light faces its local `-Z` axis.
    pub transform: Transform,
    /// Linear RGB color.
    pub color: LinearRgba,
    /// Scalar strength multiplied into the color.
    pub intensity: f32,
    /// Disabled lights are neither packed nor shadow-cast.
    pub enabled: bool,
}

impl Default for LightBase {
    fn default() -> Self {
        Self {
            transform: Transform::IDENTITY,
            color: LinearRgba::WHITE,
            intensity: 1.0,
            enabled: true,
        }
    }
}

impl LightBase {
    /// World position.
    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    /// Unit facing direction.
    pub fn facing(&self) -> Vec3 {
        self.transform.forward()
    }

    /// The composed world matrix.
    pub fn world_matrix(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// The light-space view matrix (inverse of the world matrix).
    pub fn view_matrix(&self) -> Mat4 {
        self.world_matrix().inverse()
    }

    /// `color * intensity`.
    pub fn radiance(&self) -> Vec3 {
        self.color.to_vec3() * self.intensity
    }
}

/// A plain light that contributes without casting shadows.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AmbientLight {
    /// Shared attributes.
    pub base: LightBase,
}

/// A cone-shaped light that casts shadows into a single 2D map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    /// Shared attributes.
    pub base: LightBase,
    /// Cone half-angle in radians.
    pub cone_angle: f32,
    /// Far clip distance of the shadow projection.
    pub range: f32,
    /// Shadow map edge length in texels.
    pub shadow_resolution: u32,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            base: LightBase::default(),
            cone_angle: 30.0_f32.to_radians(),
            range: 50.0,
            shadow_resolution: DEFAULT_SHADOW_RESOLUTION,
        }
    }
}

impl SpotLight {
    /// Perspective projection covering the full cone.
    pub fn projection_matrix(&self) -> Mat4 {
        let fov = (self.cone_angle * 2.0).clamp(1e-3, std::f32::consts::PI - 1e-3);
        let far = self.range.max(SHADOW_NEAR_PLANE * 2.0);
        Mat4::perspective_rh(fov, 1.0, SHADOW_NEAR_PLANE, far)
    }
}

/// A distant light with parallel rays, shadow-cast through an orthographic box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Shared attributes. The position places the shadow box.
    pub base: LightBase,
    /// Near clip distance of the shadow box.
    pub near: f32,
    /// Far clip distance of the shadow box.
    pub far: f32,
    /// World-space width and height of the shadow box.
    pub extent: f32,
    /// Shadow map edge length in texels.
    pub shadow_resolution: u32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            base: LightBase::default(),
            near: 0.1,
            far: 100.0,
            extent: 40.0,
            shadow_resolution: DEFAULT_SHADOW_RESOLUTION,
        }
    }
}

impl DirectionalLight {
    /// Orthographic projection of the shadow box.
    pub fn projection_matrix(&self) -> Mat4 {
        let half = self.extent * 0.5;
        Mat4::orthographic_rh(-half, half, -half, half, self.near, self.far)
    }
}

/// An omnidirectional light that casts shadows into six cube faces.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    /// Shared attributes. Only the position matters for shadows.
    pub base: LightBase,
    /// Far clip distance of the face projections.
    pub range: f32,
    /// Edge length of each face in texels.
    pub shadow_resolution: u32,
}

impl Default for PointLight {
    fn default() -> Self {
        Self {
            base: LightBase::default(),
            range: 25.0,
            shadow_resolution: DEFAULT_SHADOW_RESOLUTION,
        }
    }
}

impl PointLight {
    /// The symmetric 90° projection shared by all six faces.
    pub fn projection_matrix(&self) -> Mat4 {
        let far = self.range.max(SHADOW_NEAR_PLANE * 2.0);
        Mat4::perspective_rh(FRAC_PI_2, 1.0, SHADOW_NEAR_PLANE, far)
    }

    /// View matrices of the six faces, computed from the position alone.
    ///
    /// The stored rotation is never read or written.
    pub fn face_views(&self) -> [Mat4; 6] {
        cube_face_views(self.base.position())
    }
}

/// The kind of a [`Light`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    /// [`AmbientLight`].
    Ambient,
    /// [`SpotLight`].
    Spot,
    /// [`DirectionalLight`].
    Directional,
    /// [`PointLight`].
    Point,
}

impl LightKind {
    /// All kinds, in shadow order followed by the plain kind.
    pub const ALL: [LightKind; 4] = [
        LightKind::Spot,
        LightKind::Directional,
        LightKind::Point,
        LightKind::Ambient,
    ];

    /// Number of shadow map views one light of this kind contributes.
    pub fn shadow_view_count(self) -> usize {
        match self {
            LightKind::Ambient => 0,
            LightKind::Spot | LightKind::Directional => 1,
            LightKind::Point => 6,
        }
    }
}

impl std::fmt::Display for LightKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LightKind::Ambient => write!(f, "Ambient"),
            LightKind::Spot => write!(f, "Spot"),
            LightKind::Directional => write!(f, "Directional"),
            LightKind::Point => write!(f, "Point"),
        }
    }
}

/// Any light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    /// A plain, non shadow-casting light.
    Ambient(AmbientLight),
    /// A spot light.
    Spot(SpotLight),
    /// A directional light.
    Directional(DirectionalLight),
    /// A point light.
    Point(PointLight),
}

impl Light {
    /// The kind tag.
    pub fn kind(&self) -> LightKind {
        match self {
            Light::Ambient(_) => LightKind::Ambient,
            Light::Spot(_) => LightKind::Spot,
            Light::Directional(_) => LightKind::Directional,
            Light::Point(_) => LightKind::Point,
        }
    }

    /// Shared attributes.
    pub fn base(&self) -> &LightBase {
        match self {
            Light::Ambient(l) => &l.base,
            Light::Spot(l) => &l.base,
            Light::Directional(l) => &l.base,
            Light::Point(l) => &l.base,
        }
    }

    /// Shared attributes, mutably.
    pub fn base_mut(&mut self) -> &mut LightBase {
        match self {
            Light::Ambient(l) => &mut l.base,
            Light::Spot(l) => &mut l.base,
            Light::Directional(l) => &mut l.base,
            Light::Point(l) => &mut l.base,
        }
    }

    /// Shadow resolution, or `None` for kinds that cast no shadows.
    pub fn shadow_resolution(&self) -> Option<u32> {
        match self {
            Light::Ambient(_) => None,
            Light::Spot(l) => Some(l.shadow_resolution),
            Light::Directional(l) => Some(l.shadow_resolution),
            Light::Point(l) => Some(l.shadow_resolution),
        }
    }
}

impl From<AmbientLight> for Light {
    fn from(l: AmbientLight) -> Self {
        Light::Ambient(l)
    }
}

impl From<SpotLight> for Light {
    fn from(l: SpotLight) -> Self {
        Light::Spot(l)
    }
}

impl From<DirectionalLight> for Light {
    fn from(l: DirectionalLight) -> Self {
        Light::Directional(l)
    }
}

impl From<PointLight> for Light {
    fn from(l: PointLight) -> Self {
        Light::Point(l)
    }
}
