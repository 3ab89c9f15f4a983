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

//! Scene state for the Umbra renderer.
//!
//! This crate owns everything the renderer reads each frame but does not
//! draw itself: the [`LightRegistry`] with its per-light shadow resources, the
//! [`SceneObjects`] collection, the ordered post-processing [`FilterStack`],
//! and the serializable [`SceneDescription`] and [`RendererConfig`].
//!
//! Collections hand out generation-checked keys. Removal can be queued and
//! flushed between frames so iteration order never changes mid-frame.

#![warn(missing_docs)]

pub mod arena;
pub mod config;
pub mod error;
pub mod filter;
pub mod light_registry;
pub mod mesh;
pub mod objects;
pub mod scene;

pub use config::{PostProcessAssets, RendererConfig};
pub use error::{ConfigError, FilterStackError, RegistryError, SceneFormatError};
pub use filter::{FilterStack, PostProcessEffect, PostProcessFilter, PostProcessRegion};
pub use light_registry::{LightHandle, LightMut, LightRef, LightRegistry};
pub use mesh::{MeshMaterial, StaticMesh, Vertex};
pub use objects::{ObjectKey, SceneObject, SceneObjects};
pub use scene::{MeshLibrary, SceneDescription};
