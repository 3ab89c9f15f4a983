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

//! Fixed binding slots shared by the renderer and the built-in shaders.

/// Texture slot of the primary input of a post-processing pass.
pub const SOURCE_TEXTURE_SLOT: u32 = 0;
/// First auxiliary texture slot of a post-processing pass.
pub const AUX_TEXTURE_SLOT_0: u32 = 1;
/// Second auxiliary texture slot of a post-processing pass.
pub const AUX_TEXTURE_SLOT_1: u32 = 2;
/// First of four material texture slots (albedo, normal, roughness/metal, opacity).
pub const MATERIAL_TEXTURE_SLOT: u32 = 0;
/// Number of material texture slots.
pub const MATERIAL_TEXTURE_COUNT: u32 = 4;
/// Slot of the sky or reflection probe cube map.
pub const ENVIRONMENT_TEXTURE_SLOT: u32 = 7;
/// First slot of the per-frame shadow map list.
pub const SHADOW_TEXTURE_BASE_SLOT: u32 = 8;

/// Uniform slot of [`FrameUniforms`](super::uniforms::FrameUniforms).
pub const FRAME_UNIFORM_SLOT: u32 = 0;
/// Uniform slot of [`ModelUniforms`](super::uniforms::ModelUniforms).
pub const MODEL_UNIFORM_SLOT: u32 = 1;
/// Uniform slot of material parameters.
pub const MATERIAL_UNIFORM_SLOT: u32 = 2;
/// Uniform slot of post-processing parameters.
pub const POST_PROCESS_UNIFORM_SLOT: u32 = MATERIAL_UNIFORM_SLOT;
/// Uniform slot of the plain light block.
pub const AMBIENT_LIGHT_SLOT: u32 = 3;
/// Uniform slot of the spot light block.
pub const SPOT_LIGHT_SLOT: u32 = 4;
/// Uniform slot of the directional light block.
pub const DIRECTIONAL_LIGHT_SLOT: u32 = 5;
/// Uniform slot of the point light block.
pub const POINT_LIGHT_SLOT: u32 = 6;

/// Sampler slot for material textures.
pub const MATERIAL_SAMPLER_SLOT: u32 = 0;
/// Sampler slot for shadow maps.
pub const SHADOW_SAMPLER_SLOT: u32 = 1;
/// Sampler slot for post-processing inputs.
pub const POST_SAMPLER_SLOT: u32 = 2;
