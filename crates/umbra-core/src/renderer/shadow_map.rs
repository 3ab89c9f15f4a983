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

//! Depth textures rendered from a light's point of view.
//!
//! A [`ShadowMap`] bundles the depth texture with the two views every shadow
//! pass needs: a depth-attachment view to render into and a shader-readable
//! view to sample from. The three are created together and released together.

use super::api::{
    ImageAspect, Owned, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
    TextureViewDescriptor, TextureViewDimension, TextureViewId,
};
use super::error::{RenderError, ResourceError};
use super::traits::GraphicsDevice;
use std::sync::Arc;

/// The texel format of every shadow map.
pub const SHADOW_MAP_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// GPU objects backing a live shadow map.
///
/// Fields drop in declaration order, so the views are released before the texture.
#[derive(Debug)]
pub struct ShadowMapResources {
    /// View bound as the depth attachment of shadow passes.
    pub depth_view: Owned<TextureViewId>,
    /// View sampled by the main pass.
    pub sample_view: Owned<TextureViewId>,
    /// The depth texture.
    pub texture: Owned<TextureId>,
}

impl ShadowMapResources {
    fn create(
        device: &Arc<dyn GraphicsDevice>,
        label: &str,
        resolution: u32,
    ) -> Result<Self, ResourceError> {
        if resolution == 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "shadow map '{label}' has a zero resolution"
            )));
        }

        let texture = device.create_texture(&TextureDescriptor::d2(
            label,
            resolution,
            resolution,
            SHADOW_MAP_FORMAT,
            TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        ))?;
        let texture = Owned::new(device.clone(), texture);

        let depth_view = device.create_texture_view(
            texture.id(),
            &TextureViewDescriptor {
                label: Some(format!("{label} depth view").into()),
                dimension: Some(TextureViewDimension::D2),
                aspect: ImageAspect::DepthOnly,
                ..Default::default()
            },
        )?;
        let depth_view = Owned::new(device.clone(), depth_view);

        let sample_view = device.create_texture_view(
            texture.id(),
            &TextureViewDescriptor {
                label: Some(format!("{label} sample view").into()),
                format: Some(SHADOW_MAP_FORMAT),
                dimension: Some(TextureViewDimension::D2),
                aspect: ImageAspect::DepthOnly,
                ..Default::default()
            },
        )?;
        let sample_view = Owned::new(device.clone(), sample_view);

        Ok(Self {
            depth_view,
            sample_view,
            texture,
        })
    }
}

fn zero_resolution(label: &str) -> RenderError {
    RenderError::from(ResourceError::InvalidDescriptor(format!(
        "shadow map '{label}' has a zero resolution"
    )))
    .in_stage("shadow map")
}

/// A single 2D shadow map, as owned by spot and directional lights.
#[derive(Debug)]
pub struct ShadowMap {
    label: String,
    resolution: u32,
    resources: Option<ShadowMapResources>,
}

impl ShadowMap {
    /// Allocates the texture and both views.
    ///
    /// Any failure is fatal for the owning light.
    pub fn new(
        device: &Arc<dyn GraphicsDevice>,
        label: impl Into<String>,
        resolution: u32,
    ) -> Result<Self, RenderError> {
        let label = label.into();
        let resources = ShadowMapResources::create(device, &label, resolution)
            .map_err(|e| RenderError::from(e).in_stage("shadow map"))?;
        Ok(Self {
            label,
            resolution,
            resources: Some(resources),
        })
    }

    /// Tears the current resources down, then allocates new ones at `resolution`.
    ///
    /// A zero resolution is rejected before anything is released. Any later
    /// failure leaves the map without resources and [`is_valid`](Self::is_valid)
    /// returns `false`.
    pub fn recreate(
        &mut self,
        device: &Arc<dyn GraphicsDevice>,
        resolution: u32,
    ) -> Result<(), RenderError> {
        if resolution == 0 {
            return Err(zero_resolution(&self.label));
        }
        self.resources = None;
        self.resolution = resolution;
        let resources = ShadowMapResources::create(device, &self.label, resolution)
            .map_err(|e| RenderError::from(e).in_stage("shadow map"))?;
        self.resources = Some(resources);
        Ok(())
    }

    /// Edge length in texels.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The view to render depth into.
    pub fn depth_view(&self) -> Option<TextureViewId> {
        self.resources.as_ref().map(|r| r.depth_view.id())
    }

    /// The view to sample in shaders.
    pub fn sample_view(&self) -> Option<TextureViewId> {
        self.resources.as_ref().map(|r| r.sample_view.id())
    }

    /// Whether all three resources are alive.
    pub fn is_valid(&self) -> bool {
        self.resources.is_some()
    }
}

/// Six shadow maps covering every direction around a point light.
///
/// Faces follow the order of
/// [`CUBE_FACE_DIRECTIONS`](crate::renderer::light::CUBE_FACE_DIRECTIONS).
#[derive(Debug)]
pub struct CubeShadowMap {
    faces: Vec<ShadowMap>,
}

impl CubeShadowMap {
    /// Number of faces.
    pub const FACE_COUNT: usize = 6;

    /// Allocates all six faces.
    pub fn new(
        device: &Arc<dyn GraphicsDevice>,
        label: &str,
        resolution: u32,
    ) -> Result<Self, RenderError> {
        let faces = (0..Self::FACE_COUNT)
            .map(|face| ShadowMap::new(device, format!("{label} face {face}"), resolution))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { faces })
    }

    /// Recreates every face at `resolution`. A zero resolution leaves all faces untouched.
    pub fn recreate(
        &mut self,
        device: &Arc<dyn GraphicsDevice>,
        resolution: u32,
    ) -> Result<(), RenderError> {
        if resolution == 0 {
            let label = self.faces.first().map_or("cube", ShadowMap::label);
            return Err(zero_resolution(label));
        }
        for face in &mut self.faces {
            face.recreate(device, resolution)?;
        }
        Ok(())
    }

    /// The faces, in cube order.
    pub fn faces(&self) -> &[ShadowMap] {
        &self.faces
    }

    /// Edge length of each face.
    pub fn resolution(&self) -> u32 {
        self.faces.first().map_or(0, ShadowMap::resolution)
    }

    /// Shader-readable views of all six faces, or `None` if any face is invalid.
    pub fn sample_views(&self) -> Option<[TextureViewId; 6]> {
        let mut views = [TextureViewId(0); 6];
        for (slot, face) in views.iter_mut().zip(&self.faces) {
            *slot = face.sample_view()?;
        }
        Some(views)
    }

    /// Whether every face is valid.
    pub fn is_valid(&self) -> bool {
        self.faces.len() == Self::FACE_COUNT && self.faces.iter().all(ShadowMap::is_valid)
    }
}
