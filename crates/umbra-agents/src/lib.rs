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

//! Orchestration layer of the Umbra renderer.
//!
//! The [`SceneRenderer`] owns the scene state and every lane, and drives them
//! in frame order: light packing, shadow maps, reflection probes, the main
//! pass, the post-process depth pass and finally the filter stack.

#![warn(missing_docs)]

pub mod error;
pub mod scene_agent;

pub use error::AgentError;
pub use scene_agent::{FrameStats, SceneRenderer};
