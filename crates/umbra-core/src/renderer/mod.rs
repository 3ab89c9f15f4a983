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

//! Provides the public, backend-agnostic rendering contracts for Umbra.
//!
//! This module defines the "common language" for all rendering operations. It contains
//! the abstract `traits` (like [`GraphicsDevice`]), data structures (like [`TextureDescriptor`]),
//! and error types that form the stable, public-facing API for rendering.
//!
//! The 'how' is handled by a concrete backend implementing these traits (the
//! `umbra-infra` crate ships a headless, recording backend). The `umbra-lanes`
//! and `umbra-agents` crates use these traits to perform their work without
//! knowing the specifics of the underlying graphics API.

pub mod api;
pub mod bindings;
pub mod error;
pub mod light;
pub mod mesh;
pub mod shadow_map;
pub mod traits;
pub mod uniforms;

pub use self::api::*;
pub use self::error::{PipelineError, RenderError, ResourceError, ShaderError};
pub use self::light::{
    AmbientLight, DirectionalLight, Light, LightBase, LightKind, PointLight, SpotLight,
};
pub use self::mesh::MeshProvider;
pub use self::shadow_map::{CubeShadowMap, ShadowMap};
pub use self::traits::{CommandEncoder, GraphicsDevice, RenderPass};
pub use self::uniforms::{LightBlock, LightRecord};
