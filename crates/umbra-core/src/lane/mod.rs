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

//! # Lane Abstraction
//!
//! A **Lane** is one hot-path rendering strategy owned by the scene agent:
//! light packing, shadow casting, the main scene pass, post-processing.
//! Lanes are created cheaply, acquire their GPU resources in
//! [`Lane::on_initialize`], and release them when dropped.
//!
//! Each lane then exposes its own domain-specific execution methods; the
//! agent calls them in frame order and passes every piece of shared state
//! explicitly.

use crate::renderer::{GraphicsDevice, RenderError};
use std::fmt;
use std::sync::Arc;

/// Error type for lane operations.
#[derive(Debug)]
pub enum LaneError {
    /// A domain-specific error occurred during initialization.
    InitializationFailed(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for LaneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneError::InitializationFailed(e) => write!(f, "Lane initialization failed: {e}"),
        }
    }
}

impl std::error::Error for LaneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LaneError::InitializationFailed(e) => Some(e.as_ref()),
        }
    }
}

impl LaneError {
    /// Wraps a rendering failure raised while initializing.
    pub fn init(err: RenderError) -> Self {
        LaneError::InitializationFailed(Box::new(err))
    }
}

impl From<LaneError> for RenderError {
    fn from(err: LaneError) -> Self {
        match err {
            LaneError::InitializationFailed(e) => match e.downcast::<RenderError>() {
                Ok(render) => *render,
                Err(other) => RenderError::InitializationFailed(other.to_string()),
            },
        }
    }
}

/// Classification of lanes, used in logs and frame statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Light constant packing.
    Lighting,
    /// Shadow map generation.
    Shadow,
    /// Main scene and depth passes.
    Render,
    /// Post-processing chain.
    PostProcess,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LaneKind::Lighting => write!(f, "Lighting"),
            LaneKind::Shadow => write!(f, "Shadow"),
            LaneKind::Render => write!(f, "Render"),
            LaneKind::PostProcess => write!(f, "PostProcess"),
        }
    }
}

/// The base trait shared by every lane.
pub trait Lane: Send + Sync {
    /// A human-readable name for the strategy (e.g. `"ShadowPass"`).
    fn strategy_name(&self) -> &'static str;

    /// The kind of work this lane does.
    fn lane_kind(&self) -> LaneKind;

    /// Creates the lane's GPU resources. Failures are fatal.
    fn on_initialize(&mut self, device: &Arc<dyn GraphicsDevice>) -> Result<(), LaneError>;

    /// Whether [`on_initialize`](Self::on_initialize) completed.
    fn is_initialized(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::ResourceError;

    #[test]
    fn lane_error_unwraps_render_errors() {
        let err = LaneError::init(RenderError::from(ResourceError::OutOfMemory).in_stage("shadow"));
        let render: RenderError = err.into();
        assert!(matches!(render, RenderError::Stage { stage: "shadow", .. }));
    }

    #[test]
    fn lane_error_keeps_foreign_sources() {
        let err = LaneError::InitializationFailed("no adapter".into());
        assert_eq!(err.to_string(), "Lane initialization failed: no adapter");
        assert!(std::error::Error::source(&err).is_some());
        let render: RenderError = err.into();
        let RenderError::InitializationFailed(msg) = render else {
            panic!("expected an initialization failure");
        };
        assert_eq!(msg, "no adapter");
    }

    #[test]
    fn lane_kind_display() {
        assert_eq!(LaneKind::PostProcess.to_string(), "PostProcess");
    }
}
