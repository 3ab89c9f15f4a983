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

//! Backend-agnostic rendering API.
//!
//! - **[`resource`]**: GPU handles (buffers, textures, views, samplers) and their descriptors.
//! - **[`pipeline`]**: Shader modules and static pipeline state.
//! - **[`command`]**: Render pass descriptors and attachment operations.
//! - **[`owned`]**: Scoped ownership of device resources.

pub mod command;
pub mod owned;
pub mod pipeline;
pub mod resource;

pub use self::command::*;
pub use self::owned::{DeviceResource, Owned};
pub use self::pipeline::*;
pub use self::resource::*;
