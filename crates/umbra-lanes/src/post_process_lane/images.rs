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

//! The images post-processing effects sample besides the scene.
//!
//! Each one is loaded from the path configured in [`PostProcessAssets`] or,
//! when no path is set, generated from a fixed seed so two runs produce the
//! same frames.

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::Path;
use std::sync::Arc;
use umbra_core::math::{Extent3D, Origin3D};
use umbra_core::renderer::{
    GraphicsDevice, Owned, RenderError, TextureDescriptor, TextureFormat, TextureId, TextureUsage,
    TextureViewDescriptor, TextureViewId,
};
use umbra_data::PostProcessAssets;

const SEED: u64 = 0x5eed_u64;
const TILE: u32 = 64;
const RANDOM_VECTOR_TILE: u32 = 4;

/// A sampled image and its view.
struct ImageTexture {
    view: Owned<TextureViewId>,
    _texture: Owned<TextureId>,
}

impl ImageTexture {
    fn upload(
        device: &Arc<dyn GraphicsDevice>,
        name: &'static str,
        image: &RgbaImage,
    ) -> Result<Self, RenderError> {
        let (width, height) = image.dimensions();
        let missing = |reason: String| RenderError::MissingDefaultResource {
            name: name.to_string(),
            reason,
        };
        let texture = device
            .create_texture(&TextureDescriptor::d2(
                name,
                width,
                height,
                TextureFormat::Rgba8Unorm,
                TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
            ))
            .map_err(|e| missing(e.to_string()))?;
        let texture = Owned::new(device.clone(), texture);
        device
            .write_texture(
                texture.id(),
                image.as_raw(),
                Some(4 * width),
                Origin3D::default(),
                Extent3D {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            )
            .map_err(|e| missing(e.to_string()))?;
        let view = device
            .create_texture_view(
                texture.id(),
                &TextureViewDescriptor {
                    label: Some(name.into()),
                    ..Default::default()
                },
            )
            .map_err(|e| missing(e.to_string()))?;
        Ok(Self {
            view: Owned::new(device.clone(), view),
            _texture: texture,
        })
    }
}

/// The noise, burn ramp, distortion and SSAO random-vector images.
pub struct DefaultImages {
    noise: ImageTexture,
    burn_ramp: ImageTexture,
    distortion: ImageTexture,
    random_vectors: ImageTexture,
}

impl DefaultImages {
    /// Loads or generates every image and uploads it.
    ///
    /// Any failure is a [`RenderError::MissingDefaultResource`] naming the
    /// image.
    pub fn load(
        device: &Arc<dyn GraphicsDevice>,
        assets: &PostProcessAssets,
    ) -> Result<Self, RenderError> {
        let mut rng = StdRng::seed_from_u64(SEED);
        let mut image = |name: &'static str,
                         path: Option<&Path>,
                         generate: fn(&mut StdRng) -> RgbaImage|
         -> Result<ImageTexture, RenderError> {
            let pixels = match path {
                Some(path) => read_image(name, path)?,
                None => generate(&mut rng),
            };
            ImageTexture::upload(device, name, &pixels)
        };

        let images = Self {
            noise: image("noise image", assets.noise.as_deref(), grey_noise)?,
            burn_ramp: image("burn ramp image", assets.burn_ramp.as_deref(), burn_ramp)?,
            distortion: image("distortion image", assets.distortion.as_deref(), distortion)?,
            random_vectors: image(
                "random vector image",
                assets.random_vectors.as_deref(),
                random_vectors,
            )?,
        };
        log::debug!("PostProcessLane: default images ready");
        Ok(images)
    }

    /// Grain sampled by the grey-noise effect.
    pub fn noise(&self) -> TextureViewId {
        self.noise.view.id()
    }

    /// Dissolve thresholds sampled by the burn effect.
    pub fn burn_ramp(&self) -> TextureViewId {
        self.burn_ramp.view.id()
    }

    /// Offset vectors sampled by the distort effect.
    pub fn distortion(&self) -> TextureViewId {
        self.distortion.view.id()
    }

    /// The tiled rotation vectors of the SSAO kernel.
    pub fn random_vectors(&self) -> TextureViewId {
        self.random_vectors.view.id()
    }
}

fn read_image(name: &'static str, path: &Path) -> Result<RgbaImage, RenderError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|e| RenderError::MissingDefaultResource {
            name: name.to_string(),
            reason: format!("{}: {e}", path.display()),
        })
}

fn grey_noise(rng: &mut StdRng) -> RgbaImage {
    RgbaImage::from_fn(TILE, TILE, |_, _| {
        let v: u8 = rng.gen();
        Rgba([v, v, v, 255])
    })
}

// Mostly a vertical gradient so the burn front rises, broken up by noise.
fn burn_ramp(rng: &mut StdRng) -> RgbaImage {
    RgbaImage::from_fn(TILE, TILE, |_, y| {
        let gradient = 1.0 - y as f32 / (TILE - 1) as f32;
        let v = (gradient * 0.75 + rng.gen_range(0.0..0.25f32)) * 255.0;
        let v = v.clamp(0.0, 255.0) as u8;
        Rgba([v, v, v, 255])
    })
}

fn distortion(rng: &mut StdRng) -> RgbaImage {
    RgbaImage::from_fn(TILE, TILE, |x, y| {
        let (fx, fy) = (x as f32 / TILE as f32, y as f32 / TILE as f32);
        let dx = (fy * std::f32::consts::TAU * 3.0).sin() * 0.4 + rng.gen_range(-0.1..0.1f32);
        let dy = (fx * std::f32::consts::TAU * 2.0).cos() * 0.4 + rng.gen_range(-0.1..0.1f32);
        Rgba([to_unorm(dx), to_unorm(dy), 128, 255])
    })
}

fn random_vectors(rng: &mut StdRng) -> RgbaImage {
    RgbaImage::from_fn(RANDOM_VECTOR_TILE, RANDOM_VECTOR_TILE, |_, _| {
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        Rgba([to_unorm(angle.cos()), to_unorm(angle.sin()), 128, 255])
    })
}

/// Maps `[-1, 1]` to `[0, 255]`.
fn to_unorm(v: f32) -> u8 {
    ((v.clamp(-1.0, 1.0) * 0.5 + 0.5) * 255.0).round() as u8
}
