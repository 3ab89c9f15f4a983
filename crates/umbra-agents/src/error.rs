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

//! Errors raised while building or feeding a [`SceneRenderer`](crate::SceneRenderer).

use thiserror::Error;
use umbra_core::renderer::RenderError;
use umbra_data::{ConfigError, RegistryError, SceneFormatError};

/// A failure to construct or populate the renderer.
///
/// Frame rendering itself reports [`RenderError`] directly.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The configuration was rejected.
    #[error("Invalid renderer configuration: {0}")]
    Config(#[from] ConfigError),
    /// GPU resources or built-in assets could not be created.
    #[error("Renderer setup failed: {0}")]
    Render(#[from] RenderError),
    /// A light or object could not be registered.
    #[error("Scene registration failed: {0}")]
    Registry(#[from] RegistryError),
    /// A scene description could not be read, written or resolved.
    #[error("Scene description error: {0}")]
    Scene(#[from] SceneFormatError),
}
