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

//! Hot-path render strategies for the Umbra renderer.
//!
//! Each lane owns the GPU resources of one stage of the frame and records
//! that stage's commands into an encoder handed to it by the orchestrator:
//!
//! - [`LightConstantLane`] packs the registry's lights into GPU light blocks.
//! - [`ShadowPassLane`] renders shadow casters into every active shadow map.
//! - [`ScenePassLane`] renders reflection probes, the main camera view and
//!   the post-process depth pass into the [`RenderTargets`].
//! - [`PostProcessLane`] runs the ordered filter stack over the targets.
//!
//! Lanes never reach for shared state: the registry, the object list and the
//! targets are passed to them explicitly.

pub mod light_lane;
pub mod post_process_lane;
pub mod render_lane;
pub mod shaders;
pub mod shadow_lane;

pub use light_lane::LightConstantLane;
pub use post_process_lane::{DefaultImages, PostProcessLane, PostProcessOutput};
pub use render_lane::{
    PassStats, RenderTargetSlot, RenderTargets, ScenePassLane, ScenePassSettings, TransformBuffers,
};
pub use shadow_lane::{ShadowPassLane, ShadowPassOutput};
