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

//! Error types of the scene-state layer.

use thiserror::Error;
use umbra_core::renderer::{LightKind, RenderError};

/// Failures of the light registry and the scene object collection.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A light kind is already at capacity. The registry is left unchanged.
    #[error("Cannot add {kind} light: capacity of {capacity} reached")]
    CapacityExceeded {
        /// The kind that is full.
        kind: LightKind,
        /// The configured capacity.
        capacity: usize,
    },
    /// The object collection is at capacity.
    #[error("Cannot add scene object: capacity of {capacity} reached")]
    ObjectCapacityExceeded {
        /// The configured capacity.
        capacity: usize,
    },
    /// The handle refers to an entry that was removed.
    #[error("Stale or unknown handle")]
    StaleHandle,
    /// The operation needs a shadow-casting light.
    #[error("{0} lights do not cast shadows")]
    NoShadow(LightKind),
    /// Shadow maps need at least one texel per side. Nothing was changed.
    #[error("{0} light shadow resolution must be non-zero")]
    ZeroShadowResolution(LightKind),
    /// Shadow resources could not be created.
    #[error("Shadow resources unavailable: {0}")]
    Resource(#[from] RenderError),
}

/// Failures of filter stack edits. The stack is left unchanged.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterStackError {
    /// The index is past the end of the stack.
    #[error("Filter index {index} out of range (len {len})")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// Current length of the stack.
        len: usize,
    },
    /// The first filter cannot move up.
    #[error("Filter {0} is already first")]
    AlreadyFirst(usize),
    /// The last filter cannot move down.
    #[error("Filter {0} is already last")]
    AlreadyLast(usize),
}

/// Failures while reading, writing or applying a scene description.
#[derive(Debug, Error)]
pub enum SceneFormatError {
    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The text is not a valid scene description.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The scene could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// An object references a mesh the library does not contain.
    #[error("Unknown mesh '{0}'")]
    UnknownMesh(String),
    /// Populating the registry failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Failures while loading or validating a renderer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The text is not a valid configuration.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The configuration could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(String),
    /// A value is out of its allowed range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
