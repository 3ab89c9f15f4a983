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

//! The chain of intermediate images passed between the stages of a frame.

use std::sync::Arc;
use umbra_core::math::Extent2D;
use umbra_core::renderer::{
    GraphicsDevice, ImageAspect, Owned, RenderError, ResourceError, TextureDescriptor,
    TextureFormat, TextureId, TextureUsage, TextureViewDescriptor, TextureViewDimension,
    TextureViewId,
};

const STAGE: &str = "render targets";

/// One image of the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTargetSlot {
    /// The main pass output and the input of every post-process filter.
    Scene,
    /// The output of every post-process filter.
    Final,
    /// Bloom and SSAO scratch space.
    Luminance,
    /// The ambient occlusion term.
    Ssao,
    /// Depth of the main pass.
    MainDepth,
    /// Depth of opaque objects only, sampled by screen-space effects.
    PostDepth,
}

impl RenderTargetSlot {
    /// Every slot, in creation order.
    pub const ALL: [RenderTargetSlot; 6] = [
        RenderTargetSlot::Scene,
        RenderTargetSlot::Final,
        RenderTargetSlot::Luminance,
        RenderTargetSlot::Ssao,
        RenderTargetSlot::MainDepth,
        RenderTargetSlot::PostDepth,
    ];

    /// Color format of the scene, final and luminance images.
    pub const COLOR_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
    /// Format of the occlusion image.
    pub const SSAO_FORMAT: TextureFormat = TextureFormat::R16Float;
    /// Format of both depth images.
    pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth24PlusStencil8;

    /// Texel format of the slot.
    pub fn format(self) -> TextureFormat {
        match self {
            RenderTargetSlot::Scene | RenderTargetSlot::Final | RenderTargetSlot::Luminance => {
                Self::COLOR_FORMAT
            }
            RenderTargetSlot::Ssao => Self::SSAO_FORMAT,
            RenderTargetSlot::MainDepth | RenderTargetSlot::PostDepth => Self::DEPTH_FORMAT,
        }
    }

    /// Whether the slot holds depth.
    pub fn is_depth(self) -> bool {
        self.format().is_depth()
    }

    fn label(self) -> &'static str {
        match self {
            RenderTargetSlot::Scene => "scene target",
            RenderTargetSlot::Final => "final target",
            RenderTargetSlot::Luminance => "luminance target",
            RenderTargetSlot::Ssao => "ssao target",
            RenderTargetSlot::MainDepth => "main depth target",
            RenderTargetSlot::PostDepth => "post-process depth target",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// The two views of one target image.
struct TargetViews {
    /// Bound as a render pass attachment.
    target: Owned<TextureViewId>,
    /// Bound as a shader input.
    sample: Owned<TextureViewId>,
}

/// Owns every intermediate image and its views, sized to the viewport.
///
/// Images only change size through [`resize`](Self::resize), which releases
/// the whole set before creating the new one.
pub struct RenderTargets {
    device: Arc<dyn GraphicsDevice>,
    extent: Extent2D,
    textures: [Option<Owned<TextureId>>; 6],
    views: [Option<TargetViews>; 6],
}

impl RenderTargets {
    /// Creates the full set at `extent`.
    pub fn new(device: Arc<dyn GraphicsDevice>, extent: Extent2D) -> Result<Self, RenderError> {
        let mut targets = Self {
            device,
            extent,
            textures: Default::default(),
            views: Default::default(),
        };
        targets.init_textures()?;
        Ok(targets)
    }

    /// Allocates every image and both of its views at the current extent.
    ///
    /// On failure nothing of the new set is kept.
    pub fn init_textures(&mut self) -> Result<(), RenderError> {
        let mut textures: [Option<Owned<TextureId>>; 6] = Default::default();
        let mut views: [Option<TargetViews>; 6] = Default::default();
        for slot in RenderTargetSlot::ALL {
            let (texture, target_views) = self.create_slot(slot)?;
            textures[slot.index()] = Some(texture);
            views[slot.index()] = Some(target_views);
        }
        self.textures = textures;
        self.views = views;
        log::debug!(
            "RenderTargets: created {}x{} target set",
            self.extent.width,
            self.extent.height
        );
        Ok(())
    }

    fn create_slot(
        &self,
        slot: RenderTargetSlot,
    ) -> Result<(Owned<TextureId>, TargetViews), RenderError> {
        let label = slot.label();
        let attachment = if slot.is_depth() {
            TextureUsage::DEPTH_STENCIL_ATTACHMENT
        } else {
            TextureUsage::RENDER_ATTACHMENT
        };
        let texture = self
            .device
            .create_texture(&TextureDescriptor::d2(
                label,
                self.extent.width,
                self.extent.height,
                slot.format(),
                attachment | TextureUsage::TEXTURE_BINDING,
            ))
            .map_err(|e| RenderError::from(e).in_stage(STAGE))?;
        let texture = Owned::new(self.device.clone(), texture);

        let target = self
            .device
            .create_texture_view(
                texture.id(),
                &TextureViewDescriptor {
                    label: Some(format!("{label} view").into()),
                    dimension: Some(TextureViewDimension::D2),
                    ..Default::default()
                },
            )
            .map_err(|e| RenderError::from(e).in_stage(STAGE))?;
        let target = Owned::new(self.device.clone(), target);

        let aspect = if slot.is_depth() {
            ImageAspect::DepthOnly
        } else {
            ImageAspect::All
        };
        let sample = self
            .device
            .create_texture_view(
                texture.id(),
                &TextureViewDescriptor {
                    label: Some(format!("{label} sample view").into()),
                    dimension: Some(TextureViewDimension::D2),
                    aspect,
                    ..Default::default()
                },
            )
            .map_err(|e| RenderError::from(e).in_stage(STAGE))?;
        let sample = Owned::new(self.device.clone(), sample);

        Ok((texture, TargetViews { target, sample }))
    }

    /// Releases every image. Safe to call repeatedly.
    pub fn release_textures(&mut self) {
        for texture in &mut self.textures {
            texture.take();
        }
    }

    /// Releases every view. Safe to call repeatedly.
    pub fn release_views(&mut self) {
        for views in &mut self.views {
            views.take();
        }
    }

    /// Recreates the whole set at a new size.
    ///
    /// A zero width or height is rejected while the current set is still intact.
    pub fn resize(&mut self, extent: Extent2D) -> Result<(), RenderError> {
        if extent.width == 0 || extent.height == 0 {
            let msg = format!("cannot resize to {}x{}", extent.width, extent.height);
            return Err(RenderError::from(ResourceError::InvalidDescriptor(msg)).in_stage(STAGE));
        }
        log::info!(
            "RenderTargets: resizing {}x{} -> {}x{}",
            self.extent.width,
            self.extent.height,
            extent.width,
            extent.height
        );
        self.extent = extent;
        self.release_textures();
        self.release_views();
        self.init_textures()
    }

    /// The size of every image.
    pub fn extent(&self) -> Extent2D {
        self.extent
    }

    /// The image of a slot.
    pub fn texture(&self, slot: RenderTargetSlot) -> Option<TextureId> {
        self.textures[slot.index()].as_ref().map(Owned::id)
    }

    /// The attachment view of a slot.
    pub fn view(&self, slot: RenderTargetSlot) -> Option<TextureViewId> {
        self.views[slot.index()].as_ref().map(|v| v.target.id())
    }

    /// The shader-input view of a slot.
    pub fn sample_view(&self, slot: RenderTargetSlot) -> Option<TextureViewId> {
        self.views[slot.index()].as_ref().map(|v| v.sample.id())
    }

    /// Both views of a slot, failing when the set was released.
    pub fn views(
        &self,
        slot: RenderTargetSlot,
    ) -> Result<(TextureViewId, TextureViewId), RenderError> {
        self.views[slot.index()]
            .as_ref()
            .map(|v| (v.target.id(), v.sample.id()))
            .ok_or(RenderError::NotInitialized(slot.label()))
    }

    /// Whether every image and view exists.
    pub fn is_complete(&self) -> bool {
        self.textures.iter().all(Option::is_some) && self.views.iter().all(Option::is_some)
    }
}
