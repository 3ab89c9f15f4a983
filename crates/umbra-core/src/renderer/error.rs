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

//! Defines the hierarchy of error types for the rendering subsystem.
//!
//! Every failure in this layer is fatal for the operation that raised it:
//! nothing here is retried. Resource-creation failures abort scene
//! construction or resize, and rendering failures abort the current frame.

use crate::renderer::api::{RenderPipelineId, ShaderModuleId};
use std::fmt;

/// A built-in WGSL module could not be compiled or looked up.
#[derive(Debug)]
pub enum ShaderError {
    /// The backend rejected the source.
    CompilationError {
        /// Label of the module.
        label: String,
        /// Compiler output.
        details: String,
    },
    /// No module with this id is alive.
    NotFound {
        /// The unknown id.
        id: ShaderModuleId,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::NotFound { id } => {
                write!(f, "Shader module not found for ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// A pipeline could not be built or looked up.
#[derive(Debug)]
pub enum PipelineError {
    /// The fixed-function state is inconsistent.
    CompilationFailed {
        /// Label of the pipeline.
        label: Option<String>,
        /// What was wrong.
        details: String,
    },
    /// The pipeline names a shader module that is not alive.
    InvalidShaderModuleForPipeline {
        /// The unknown module.
        id: ShaderModuleId,
        /// Label of the pipeline.
        pipeline_label: Option<String>,
    },
    /// No pipeline with this id is alive.
    InvalidRenderPipeline {
        /// The unknown id.
        id: RenderPipelineId,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::CompilationFailed { label, details } => {
                write!(
                    f,
                    "Pipeline compilation failed for '{}': {}",
                    label.as_deref().unwrap_or("Unknown"),
                    details
                )
            }
            PipelineError::InvalidShaderModuleForPipeline { id, pipeline_label } => {
                write!(
                    f,
                    "Invalid shader module {:?} for pipeline '{}'",
                    id,
                    pipeline_label.as_deref().unwrap_or("Unknown")
                )
            }
            PipelineError::InvalidRenderPipeline { id } => {
                write!(f, "Invalid render pipeline ID: {id:?}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// A device call on a buffer, texture, view, sampler, shader or pipeline failed.
#[derive(Debug)]
pub enum ResourceError {
    /// Shader compilation or lookup failed.
    Shader(ShaderError),
    /// Pipeline creation or lookup failed.
    Pipeline(PipelineError),
    /// The id does not name a live resource of that type.
    InvalidHandle,
    /// The descriptor asked for something the backend cannot create (e.g. a zero-sized texture).
    InvalidDescriptor(String),
    /// The backend ran out of memory for the allocation.
    OutOfMemory,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// An attempt was made to access a resource out of its bounds (e.g., in a buffer).
    OutOfBounds,
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::InvalidDescriptor(msg) => {
                write!(f, "Invalid resource descriptor: {msg}")
            }
            ResourceError::OutOfMemory => write!(f, "Out of GPU memory."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => {
                write!(f, "Resource access out of bounds.")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

/// A high-level error that can occur within the renderer.
#[derive(Debug)]
pub enum RenderError {
    /// An operation was attempted before the owning component was initialized.
    NotInitialized(&'static str),
    /// A failure occurred during the initialization of the renderer.
    InitializationFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// A built-in shader or post-processing image could not be loaded.
    MissingDefaultResource {
        /// Name of the resource.
        name: String,
        /// Why it failed.
        reason: String,
    },
    /// A failure tagged with the frame stage or resource it occurred in.
    Stage {
        /// The stage or resource name (e.g. `"render targets"`, `"shadow pass"`).
        stage: &'static str,
        /// The underlying failure.
        source: Box<RenderError>,
    },
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl RenderError {
    /// Wraps this error with the name of the stage it occurred in.
    pub fn in_stage(self, stage: &'static str) -> Self {
        RenderError::Stage {
            stage,
            source: Box::new(self),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotInitialized(what) => {
                write!(f, "'{what}' is used before it was initialized.")
            }
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize renderer: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::MissingDefaultResource { name, reason } => {
                write!(f, "Default resource '{name}' is unavailable: {reason}")
            }
            RenderError::Stage { stage, source } => write!(f, "[{stage}] {source}"),
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            RenderError::Stage { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn shader_error_display() {
        let err = ShaderError::CompilationError {
            label: "bloom_extract".to_string(),
            details: "unknown identifier".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Shader compilation failed for 'bloom_extract': unknown identifier"
        );
    }

    #[test]
    fn render_error_display_wrapping_resource_error() {
        let res_err: ResourceError = ShaderError::NotFound {
            id: ShaderModuleId(7),
        }
        .into();
        let render_err: RenderError = res_err.into();
        assert_eq!(
            format!("{render_err}"),
            "Graphics resource operation failed: Shader resource error: Shader module not found for ID: ShaderModuleId(7)"
        );
        assert!(render_err.source().unwrap().source().is_some());
    }

    #[test]
    fn stage_error_names_the_stage() {
        let err = RenderError::from(ResourceError::OutOfMemory).in_stage("render targets");
        assert_eq!(
            format!("{err}"),
            "[render targets] Graphics resource operation failed: Out of GPU memory."
        );
        assert!(err.source().is_some());
    }
}
