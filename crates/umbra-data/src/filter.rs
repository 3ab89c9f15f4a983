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

//! The ordered post-processing filter stack.
//!
//! Filter order is execution order: each filter reads the image produced by
//! the one before it.

use crate::error::FilterStackError;
use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use umbra_core::math::LinearRgba;

/// A post-processing effect and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PostProcessEffect {
    /// Multiplies the image by a color.
    Tint {
        /// Tint color; alpha is the blend amount.
        color: LinearRgba,
    },
    /// Desaturates and overlays animated film grain.
    GreyNoise {
        /// Grain strength.
        strength: f32,
    },
    /// Dissolves the image along a burn ramp rising over time.
    Burn {
        /// Ramp cycles per second.
        speed: f32,
    },
    /// Offsets texels along a distortion map.
    Distort {
        /// Offset scale in UV units.
        strength: f32,
    },
    /// Twists the image around the region center.
    Spiral {
        /// Twist in radians at the center.
        angle: f32,
    },
    /// Wobbles the image like hot air.
    HeatHaze {
        /// Offset scale in UV units.
        strength: f32,
        /// Wobble frequency.
        speed: f32,
    },
    /// Splits the color channels radially.
    ChromaticAberration {
        /// Channel offset in UV units.
        offset: f32,
    },
    /// Separable Gaussian blur.
    GaussianBlur {
        /// Kernel radius in texels.
        radius: f32,
    },
    /// Screen-space ambient occlusion.
    Ssao {
        /// Sampling radius in view-space units.
        radius: f32,
        /// Occlusion strength.
        intensity: f32,
        /// Blur the occlusion term.
        blur: bool,
        /// Copy the blurred term back before compositing.
        copy_back: bool,
    },
    /// Glow around bright areas.
    Bloom {
        /// Luminance above which texels glow.
        threshold: f32,
        /// Glow strength.
        intensity: f32,
    },
    /// Light shafts radiating from the first available light.
    GodRays {
        /// Sample density along each ray.
        density: f32,
        /// Per-sample falloff.
        decay: f32,
        /// Overall strength.
        exposure: f32,
    },
}

impl PostProcessEffect {
    /// Every effect with its default parameters, in menu order.
    pub fn catalog() -> [PostProcessEffect; 11] {
        [
            PostProcessEffect::Tint {
                color: LinearRgba::new(1.0, 0.6, 0.6, 1.0),
            },
            PostProcessEffect::GreyNoise { strength: 0.15 },
            PostProcessEffect::Burn { speed: 0.25 },
            PostProcessEffect::Distort { strength: 0.02 },
            PostProcessEffect::Spiral { angle: 3.0 },
            PostProcessEffect::HeatHaze {
                strength: 0.005,
                speed: 4.0,
            },
            PostProcessEffect::ChromaticAberration { offset: 0.004 },
            PostProcessEffect::GaussianBlur { radius: 4.0 },
            PostProcessEffect::Ssao {
                radius: 0.5,
                intensity: 1.0,
                blur: true,
                copy_back: true,
            },
            PostProcessEffect::Bloom {
                threshold: 0.8,
                intensity: 1.0,
            },
            PostProcessEffect::GodRays {
                density: 0.9,
                decay: 0.96,
                exposure: 0.3,
            },
        ]
    }

    /// A short name for logs and labels.
    pub fn name(&self) -> &'static str {
        match self {
            PostProcessEffect::Tint { .. } => "tint",
            PostProcessEffect::GreyNoise { .. } => "grey-noise",
            PostProcessEffect::Burn { .. } => "burn",
            PostProcessEffect::Distort { .. } => "distort",
            PostProcessEffect::Spiral { .. } => "spiral",
            PostProcessEffect::HeatHaze { .. } => "heat-haze",
            PostProcessEffect::ChromaticAberration { .. } => "chromatic-aberration",
            PostProcessEffect::GaussianBlur { .. } => "gaussian-blur",
            PostProcessEffect::Ssao { .. } => "ssao",
            PostProcessEffect::Bloom { .. } => "bloom",
            PostProcessEffect::GodRays { .. } => "god-rays",
        }
    }
}

impl fmt::Display for PostProcessEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where on screen a filter applies.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PostProcessRegion {
    /// The whole frame.
    #[default]
    FullScreen,
    /// A screen rectangle around a world point, sized in world units at that
    /// point's depth. Edges are blended.
    Area {
        /// World-space center.
        center: Vec3,
        /// World-space width and height.
        size: Vec2,
    },
    /// An arbitrary quadrilateral.
    Polygon {
        /// Corners in model space, in strip order.
        points: [Vec3; 4],
        /// Model to world.
        world: Mat4,
    },
}

/// One entry of the filter stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostProcessFilter {
    /// The effect.
    pub effect: PostProcessEffect,
    /// Where it applies.
    #[serde(default)]
    pub region: PostProcessRegion,
}

impl PostProcessFilter {
    /// A full-screen filter.
    pub fn full_screen(effect: PostProcessEffect) -> Self {
        Self {
            effect,
            region: PostProcessRegion::FullScreen,
        }
    }

    /// A filter restricted to a world-space area.
    pub fn area(effect: PostProcessEffect, center: Vec3, size: Vec2) -> Self {
        Self {
            effect,
            region: PostProcessRegion::Area { center, size },
        }
    }

    /// A filter restricted to a quadrilateral.
    pub fn polygon(effect: PostProcessEffect, points: [Vec3; 4], world: Mat4) -> Self {
        Self {
            effect,
            region: PostProcessRegion::Polygon { points, world },
        }
    }
}

/// The ordered list of filters. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterStack {
    filters: Vec<PostProcessFilter>,
}

impl FilterStack {
    /// An empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self, index: usize) -> Result<(), FilterStackError> {
        if index < self.filters.len() {
            Ok(())
        } else {
            Err(FilterStackError::OutOfRange {
                index,
                len: self.filters.len(),
            })
        }
    }

    /// Appends a filter; it runs last.
    pub fn push(&mut self, filter: PostProcessFilter) {
        self.filters.push(filter);
    }

    /// Inserts a filter at `index`, shifting later ones down.
    pub fn insert(
        &mut self,
        index: usize,
        filter: PostProcessFilter,
    ) -> Result<(), FilterStackError> {
        if index > self.filters.len() {
            return Err(FilterStackError::OutOfRange {
                index,
                len: self.filters.len(),
            });
        }
        self.filters.insert(index, filter);
        Ok(())
    }

    /// Removes the filter at `index`, keeping the order of the others.
    pub fn remove(&mut self, index: usize) -> Result<PostProcessFilter, FilterStackError> {
        self.check(index)?;
        Ok(self.filters.remove(index))
    }

    /// Swaps the filter at `index` with the one before it.
    pub fn move_up(&mut self, index: usize) -> Result<(), FilterStackError> {
        self.check(index)?;
        if index == 0 {
            return Err(FilterStackError::AlreadyFirst(index));
        }
        self.filters.swap(index - 1, index);
        Ok(())
    }

    /// Swaps the filter at `index` with the one after it.
    pub fn move_down(&mut self, index: usize) -> Result<(), FilterStackError> {
        self.check(index)?;
        if index + 1 == self.filters.len() {
            return Err(FilterStackError::AlreadyLast(index));
        }
        self.filters.swap(index, index + 1);
        Ok(())
    }

    /// Swaps two filters.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), FilterStackError> {
        self.check(a)?;
        self.check(b)?;
        self.filters.swap(a, b);
        Ok(())
    }

    /// The filter at `index`.
    pub fn get(&self, index: usize) -> Option<&PostProcessFilter> {
        self.filters.get(index)
    }

    /// The filter at `index`, mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut PostProcessFilter> {
        self.filters.get_mut(index)
    }

    /// Filters in execution order.
    pub fn iter(&self) -> std::slice::Iter<'_, PostProcessFilter> {
        self.filters.iter()
    }

    /// Filters in execution order.
    pub fn as_slice(&self) -> &[PostProcessFilter] {
        &self.filters
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the stack is empty.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Removes every filter.
    pub fn clear(&mut self) {
        self.filters.clear();
    }
}

impl From<Vec<PostProcessFilter>> for FilterStack {
    fn from(filters: Vec<PostProcessFilter>) -> Self {
        Self { filters }
    }
}

impl<'a> IntoIterator for &'a FilterStack {
    type Item = &'a PostProcessFilter;
    type IntoIter = std::slice::Iter<'a, PostProcessFilter>;

    fn into_iter(self) -> Self::IntoIter {
        self.filters.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack() -> FilterStack {
        PostProcessEffect::catalog()
            .into_iter()
            .take(5)
            .map(PostProcessFilter::full_screen)
            .collect::<Vec<_>>()
            .into()
    }

    fn names(stack: &FilterStack) -> Vec<&'static str> {
        stack.iter().map(|f| f.effect.name()).collect()
    }

    #[test]
    fn up_then_down_restores_order() {
        for i in 1..5 {
            let mut s = stack();
            let before = names(&s);
            s.move_up(i).unwrap();
            assert_ne!(names(&s), before);
            s.move_down(i - 1).unwrap();
            assert_eq!(names(&s), before);
        }
        for i in 0..4 {
            let mut s = stack();
            let before = names(&s);
            s.move_down(i).unwrap();
            s.move_up(i + 1).unwrap();
            assert_eq!(names(&s), before);
        }
    }

    #[test]
    fn remove_keeps_relative_order() {
        for i in 0..5 {
            let mut s = stack();
            let mut expected = names(&s);
            expected.remove(i);
            s.remove(i).unwrap();
            assert_eq!(s.len(), 4);
            assert_eq!(names(&s), expected);
        }
    }

    #[test]
    fn boundary_moves_fail_without_change() {
        let mut s = stack();
        let before = names(&s);
        assert_eq!(s.move_up(0), Err(FilterStackError::AlreadyFirst(0)));
        assert_eq!(s.move_down(4), Err(FilterStackError::AlreadyLast(4)));
        assert_eq!(
            s.remove(9).unwrap_err(),
            FilterStackError::OutOfRange { index: 9, len: 5 }
        );
        assert_eq!(names(&s), before);
    }

    #[test]
    fn empty_stack_is_allowed() {
        let mut s = FilterStack::new();
        assert!(s.is_empty());
        assert!(s.move_up(0).is_err());
        let spiral = PostProcessFilter::full_screen(PostProcessEffect::Spiral { angle: 1.0 });
        s.insert(0, spiral).unwrap();
        assert_eq!(s.len(), 1);
    }
}
