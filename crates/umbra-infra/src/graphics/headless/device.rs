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

use super::command::HeadlessCommandEncoder;
use super::record::{DrawKind, DrawRecord, Hazard, PassRecord, RecordedCommand};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use umbra_core::math::{Extent3D, Origin3D};
use umbra_core::renderer::traits::CommandEncoder;
use umbra_core::renderer::{
    AddressMode, BlendState, BufferDescriptor, BufferId, CommandBufferId, DepthStencilState,
    GraphicsDevice, LoadOp, PipelineError, PrimitiveTopology, RenderPipelineDescriptor,
    RenderPipelineId, ResourceError, SamplerBorderColor, SamplerDescriptor, SamplerId, ShaderError,
    ShaderModuleDescriptor, ShaderModuleId, ShaderSourceData, TextureDescriptor, TextureFormat,
    TextureId, TextureUsage, TextureViewDescriptor, TextureViewId,
};

/// What a headless texture was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureInfo {
    /// Debug label.
    pub label: Option<String>,
    /// Dimensions.
    pub size: Extent3D,
    /// Texel format.
    pub format: TextureFormat,
    /// Allowed usages.
    pub usage: TextureUsage,
}

/// What a headless pipeline was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineInfo {
    /// Debug label.
    pub label: Option<String>,
    /// Blend state of each color target.
    pub blend: Vec<Option<BlendState>>,
    /// Depth state.
    pub depth_stencil: Option<DepthStencilState>,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Whether a fragment stage is present.
    pub has_fragment: bool,
}

/// What a headless sampler was created with.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerInfo {
    /// Debug label.
    pub label: Option<String>,
    /// Address mode.
    pub address_mode: AddressMode,
    /// Anisotropy clamp.
    pub anisotropy_clamp: u16,
    /// Border color.
    pub border_color: Option<SamplerBorderColor>,
}

/// Failures the device should simulate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaultInjection {
    /// Number of textures that may still be created before creation reports
    /// `OutOfMemory`. `None` means unlimited.
    pub texture_budget: Option<usize>,
    /// Shader modules whose label contains this text fail to compile.
    pub failing_shader: Option<String>,
}

#[derive(Debug)]
struct BufferEntry {
    label: Option<String>,
    data: Vec<u8>,
}

#[derive(Debug)]
struct ViewEntry {
    texture: TextureId,
}

/// Binding state that persists across command buffers, like a device context.
#[derive(Debug, Default)]
struct ContextState {
    bound_textures: BTreeMap<u32, TextureViewId>,
    uniform_slots: BTreeMap<u32, BufferId>,
    passes: Vec<PassRecord>,
    hazards: Vec<Hazard>,
    submitted: usize,
}

#[derive(Debug)]
struct HeadlessDeviceInternal {
    shader_modules: Mutex<HashMap<ShaderModuleId, Option<String>>>,
    pipelines: Mutex<HashMap<RenderPipelineId, PipelineInfo>>,
    buffers: Mutex<HashMap<BufferId, BufferEntry>>,
    textures: Mutex<HashMap<TextureId, TextureInfo>>,
    texture_views: Mutex<HashMap<TextureViewId, ViewEntry>>,
    samplers: Mutex<HashMap<SamplerId, SamplerInfo>>,

    next_id: AtomicUsize,

    pending_command_buffers: Mutex<HashMap<CommandBufferId, Vec<RecordedCommand>>>,
    command_buffer_id_counter: AtomicU64,

    context: Mutex<ContextState>,
    faults: Mutex<FaultInjection>,
}

/// A clonable handle to a headless device. Clones share all state.
#[derive(Clone, Debug)]
pub struct HeadlessDevice {
    internal: Arc<HeadlessDeviceInternal>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

fn guard<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, ResourceError> {
    mutex
        .lock()
        .map_err(|e| ResourceError::BackendError(format!("Mutex poisoned ({what}): {e}")))
}

fn inspect<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl HeadlessDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self {
            internal: Arc::new(HeadlessDeviceInternal {
                shader_modules: Mutex::new(HashMap::new()),
                pipelines: Mutex::new(HashMap::new()),
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                texture_views: Mutex::new(HashMap::new()),
                samplers: Mutex::new(HashMap::new()),
                next_id: AtomicUsize::new(1),
                pending_command_buffers: Mutex::new(HashMap::new()),
                command_buffer_id_counter: AtomicU64::new(0),
                context: Mutex::new(ContextState::default()),
                faults: Mutex::new(FaultInjection::default()),
            }),
        }
    }

    /// Creates a device that simulates the given failures.
    pub fn with_faults(faults: FaultInjection) -> Self {
        let device = Self::new();
        device.set_faults(faults);
        device
    }

    /// Replaces the simulated failures.
    pub fn set_faults(&self, faults: FaultInjection) {
        *inspect(&self.internal.faults) = faults;
    }

    fn generate_id(&self) -> usize {
        self.internal.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn register_command_buffer(
        &self,
        commands: Vec<RecordedCommand>,
    ) -> CommandBufferId {
        let id = CommandBufferId(
            self.internal
                .command_buffer_id_counter
                .fetch_add(1, Ordering::SeqCst),
        );
        inspect(&self.internal.pending_command_buffers).insert(id, commands);
        id
    }

    // --- Inspection ---

    /// Number of live textures.
    pub fn live_texture_count(&self) -> usize {
        inspect(&self.internal.textures).len()
    }

    /// Number of live texture views.
    pub fn live_view_count(&self) -> usize {
        inspect(&self.internal.texture_views).len()
    }

    /// Number of live buffers.
    pub fn live_buffer_count(&self) -> usize {
        inspect(&self.internal.buffers).len()
    }

    /// Number of live samplers.
    pub fn live_sampler_count(&self) -> usize {
        inspect(&self.internal.samplers).len()
    }

    /// Number of live pipelines.
    pub fn live_pipeline_count(&self) -> usize {
        inspect(&self.internal.pipelines).len()
    }

    /// Number of live shader modules.
    pub fn live_shader_count(&self) -> usize {
        inspect(&self.internal.shader_modules).len()
    }

    /// Total number of live resources of every kind.
    pub fn live_resource_count(&self) -> usize {
        self.live_texture_count()
            + self.live_view_count()
            + self.live_buffer_count()
            + self.live_sampler_count()
            + self.live_pipeline_count()
            + self.live_shader_count()
    }

    /// Creation parameters of a live texture.
    pub fn texture_info(&self, id: TextureId) -> Option<TextureInfo> {
        inspect(&self.internal.textures).get(&id).cloned()
    }

    /// The texture a live view refers to.
    pub fn view_texture(&self, view: TextureViewId) -> Option<TextureId> {
        inspect(&self.internal.texture_views)
            .get(&view)
            .map(|v| v.texture)
    }

    /// Creation parameters of the texture behind a view, if both are alive.
    pub fn view_texture_info(&self, view: TextureViewId) -> Option<TextureInfo> {
        self.view_texture(view).and_then(|t| self.texture_info(t))
    }

    /// Whether a view is alive.
    pub fn is_view_live(&self, view: TextureViewId) -> bool {
        inspect(&self.internal.texture_views).contains_key(&view)
    }

    /// Current contents of a buffer.
    pub fn buffer_contents(&self, id: BufferId) -> Option<Vec<u8>> {
        inspect(&self.internal.buffers)
            .get(&id)
            .map(|b| b.data.clone())
    }

    /// Label of a live buffer.
    pub fn buffer_label(&self, id: BufferId) -> Option<String> {
        inspect(&self.internal.buffers)
            .get(&id)
            .and_then(|b| b.label.clone())
    }

    /// Creation parameters of a live pipeline.
    pub fn pipeline_info(&self, id: RenderPipelineId) -> Option<PipelineInfo> {
        inspect(&self.internal.pipelines).get(&id).cloned()
    }

    /// Creation parameters of a live sampler.
    pub fn sampler_info(&self, id: SamplerId) -> Option<SamplerInfo> {
        inspect(&self.internal.samplers).get(&id).cloned()
    }

    /// Every pass replayed so far.
    pub fn submitted_passes(&self) -> Vec<PassRecord> {
        inspect(&self.internal.context).passes.clone()
    }

    /// Drains the replayed passes.
    pub fn take_submitted_passes(&self) -> Vec<PassRecord> {
        std::mem::take(&mut inspect(&self.internal.context).passes)
    }

    /// Every hazard detected so far.
    pub fn hazards(&self) -> Vec<Hazard> {
        inspect(&self.internal.context).hazards.clone()
    }

    /// Texture slots currently bound on the device context.
    pub fn bound_textures(&self) -> BTreeMap<u32, TextureViewId> {
        inspect(&self.internal.context).bound_textures.clone()
    }

    /// Number of command buffers submitted.
    pub fn submitted_command_buffers(&self) -> usize {
        inspect(&self.internal.context).submitted
    }

    // --- Replay ---

    fn replay(&self, commands: Vec<RecordedCommand>) -> Result<(), ResourceError> {
        let views = guard(&self.internal.texture_views, "texture_views")?;
        let mut buffers = guard(&self.internal.buffers, "buffers")?;
        let mut ctx = guard(&self.internal.context, "context")?;
        let texture_of = |view: TextureViewId| views.get(&view).map(|v| v.texture);

        let mut current: Option<PassRecord> = None;
        let mut targets: Vec<TextureId> = Vec::new();
        let mut pipeline = None;
        let mut viewport = None;
        let mut vertex_buffer = None;

        for command in commands {
            match command {
                RecordedCommand::BeginRenderPass {
                    label,
                    color_attachments,
                    depth_attachment,
                } => {
                    if current.is_some() {
                        log::warn!("HeadlessDevice: render pass begun while another is active");
                    }
                    let depth_clear = match depth_attachment {
                        Some((_, Some(LoadOp::Clear(depth)))) => Some(depth),
                        _ => None,
                    };
                    let pass = PassRecord {
                        label,
                        color_attachments: color_attachments.iter().map(|(v, _)| *v).collect(),
                        depth_attachment: depth_attachment.map(|(v, _)| v),
                        depth_clear,
                        draws: Vec::new(),
                    };
                    targets = pass
                        .color_attachments
                        .iter()
                        .copied()
                        .chain(pass.depth_attachment)
                        .filter_map(texture_of)
                        .collect();
                    let conflicts: Vec<Hazard> = ctx
                        .bound_textures
                        .iter()
                        .filter(|(_, view)| {
                            texture_of(**view).is_some_and(|t| targets.contains(&t))
                        })
                        .map(|(slot, view)| Hazard {
                            pass: pass.label.clone(),
                            slot: *slot,
                            view: *view,
                        })
                        .collect();
                    for hazard in conflicts {
                        log::warn!(
                            "HeadlessDevice: slot {} still binds {:?}, a target of pass {:?}",
                            hazard.slot,
                            hazard.view,
                            hazard.pass
                        );
                        ctx.hazards.push(hazard);
                    }
                    pipeline = None;
                    viewport = None;
                    vertex_buffer = None;
                    current = Some(pass);
                }
                RecordedCommand::EndRenderPass => {
                    if let Some(pass) = current.take() {
                        ctx.passes.push(pass);
                    }
                    targets.clear();
                }
                RecordedCommand::SetViewport(vp) => viewport = Some(vp),
                RecordedCommand::SetPipeline(id) => pipeline = Some(id),
                RecordedCommand::WriteUniform { buffer, data } => match buffers.get_mut(&buffer) {
                    Some(entry) if data.len() <= entry.data.len() => {
                        entry.data[..data.len()].copy_from_slice(&data);
                    }
                    Some(_) => log::warn!("HeadlessDevice: uniform write overflows {buffer:?}"),
                    None => log::warn!("HeadlessDevice: uniform write to unknown {buffer:?}"),
                },
                RecordedCommand::SetUniformBuffer { slot, buffer } => {
                    ctx.uniform_slots.insert(slot, buffer);
                }
                RecordedCommand::SetTexture { slot, view } => match view {
                    Some(view) => {
                        if current.is_some()
                            && texture_of(view).is_some_and(|t| targets.contains(&t))
                        {
                            let hazard = Hazard {
                                pass: current.as_ref().and_then(|p| p.label.clone()),
                                slot,
                                view,
                            };
                            log::warn!(
                                "HeadlessDevice: {view:?} bound to slot {slot} during pass {:?}",
                                hazard.pass
                            );
                            ctx.hazards.push(hazard);
                        }
                        ctx.bound_textures.insert(slot, view);
                    }
                    None => {
                        ctx.bound_textures.remove(&slot);
                    }
                },
                RecordedCommand::SetSampler { .. } | RecordedCommand::SetIndexBuffer { .. } => {}
                RecordedCommand::SetVertexBuffer { slot, buffer } => {
                    if slot == 0 {
                        vertex_buffer = Some(buffer);
                    }
                }
                RecordedCommand::Draw {
                    vertices,
                    instances,
                } => {
                    let kind = DrawKind::Vertices {
                        count: vertices.len() as u32,
                        instances: instances.len() as u32,
                    };
                    let record = snapshot(&ctx, &buffers, kind, pipeline, viewport, vertex_buffer);
                    match current.as_mut() {
                        Some(pass) => pass.draws.push(record),
                        None => log::warn!("HeadlessDevice: draw outside of a render pass"),
                    }
                }
                RecordedCommand::DrawIndexed {
                    indices, instances, ..
                } => {
                    let kind = DrawKind::Indexed {
                        count: indices.len() as u32,
                        instances: instances.len() as u32,
                    };
                    let record = snapshot(&ctx, &buffers, kind, pipeline, viewport, vertex_buffer);
                    match current.as_mut() {
                        Some(pass) => pass.draws.push(record),
                        None => log::warn!("HeadlessDevice: draw outside of a render pass"),
                    }
                }
            }
        }

        if let Some(pass) = current.take() {
            log::warn!(
                "HeadlessDevice: command buffer ended inside pass {:?}",
                pass.label
            );
            ctx.passes.push(pass);
        }
        ctx.submitted += 1;
        Ok(())
    }
}

fn snapshot(
    ctx: &ContextState,
    buffers: &HashMap<BufferId, BufferEntry>,
    kind: DrawKind,
    pipeline: Option<RenderPipelineId>,
    viewport: Option<umbra_core::renderer::Viewport>,
    vertex_buffer: Option<BufferId>,
) -> DrawRecord {
    DrawRecord {
        kind,
        pipeline,
        viewport,
        vertex_buffer,
        textures: ctx.bound_textures.clone(),
        uniforms: ctx
            .uniform_slots
            .iter()
            .filter_map(|(slot, id)| buffers.get(id).map(|b| (*slot, b.data.clone())))
            .collect(),
    }
}

impl GraphicsDevice for HeadlessDevice {
    // --- Shader Module Operations ---

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<ShaderModuleId, ResourceError> {
        let label = descriptor.label.unwrap_or("unnamed");
        let ShaderSourceData::Wgsl(source) = &descriptor.source;
        if source.trim().is_empty() {
            return Err(ShaderError::CompilationError {
                label: label.to_owned(),
                details: "empty source".to_owned(),
            }
            .into());
        }
        let injected = guard(&self.internal.faults, "faults")?
            .failing_shader
            .as_deref()
            .is_some_and(|pattern| label.contains(pattern));
        if injected {
            return Err(ShaderError::CompilationError {
                label: label.to_owned(),
                details: "injected compilation failure".to_owned(),
            }
            .into());
        }

        let id = ShaderModuleId(self.generate_id());
        guard(&self.internal.shader_modules, "shader_modules")?
            .insert(id, descriptor.label.map(str::to_owned));
        log::debug!("HeadlessDevice: Created shader module '{label}' with ID: {id:?}");
        Ok(id)
    }

    fn destroy_shader_module(&self, id: ShaderModuleId) -> Result<(), ResourceError> {
        match guard(&self.internal.shader_modules, "shader_modules")?.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ShaderError::NotFound { id }.into()),
        }
    }

    // --- Render Pipeline Operations ---

    fn create_render_pipeline(
        &self,
        descriptor: &RenderPipelineDescriptor,
    ) -> Result<RenderPipelineId, ResourceError> {
        let label = descriptor.label.as_deref().map(String::from);
        {
            let modules = guard(&self.internal.shader_modules, "shader_modules")?;
            let stages =
                std::iter::once(descriptor.vertex_shader).chain(descriptor.fragment_shader);
            for module in stages {
                if !modules.contains_key(&module) {
                    return Err(PipelineError::InvalidShaderModuleForPipeline {
                        id: module,
                        pipeline_label: label,
                    }
                    .into());
                }
            }
        }
        if descriptor.fragment_shader.is_some() && descriptor.color_targets.is_empty() {
            return Err(PipelineError::CompilationFailed {
                label,
                details: "fragment stage without color targets".to_owned(),
            }
            .into());
        }

        let id = RenderPipelineId(self.generate_id());
        let info = PipelineInfo {
            label,
            blend: descriptor.color_targets.iter().map(|t| t.blend).collect(),
            depth_stencil: descriptor.depth_stencil,
            topology: descriptor.primitive.topology,
            has_fragment: descriptor.fragment_shader.is_some(),
        };
        guard(&self.internal.pipelines, "pipelines")?.insert(id, info);
        log::debug!(
            "HeadlessDevice: Created render pipeline {:?} with ID: {id:?}",
            descriptor.label
        );
        Ok(id)
    }

    fn destroy_render_pipeline(&self, id: RenderPipelineId) -> Result<(), ResourceError> {
        match guard(&self.internal.pipelines, "pipelines")?.remove(&id) {
            Some(_) => Ok(()),
            None => Err(PipelineError::InvalidRenderPipeline { id }.into()),
        }
    }

    // --- Buffer Operations ---

    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferId, ResourceError> {
        self.create_buffer_with_data(descriptor, &[])
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor,
        data: &[u8],
    ) -> Result<BufferId, ResourceError> {
        if descriptor.size == 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "buffer {:?} has a zero size",
                descriptor.label
            )));
        }
        if data.len() as u64 > descriptor.size {
            return Err(ResourceError::OutOfBounds);
        }
        if descriptor.usage.is_empty() {
            return Err(ResourceError::InvalidDescriptor(format!(
                "buffer {:?} has no usage",
                descriptor.label
            )));
        }
        let mut contents = vec![0u8; descriptor.size as usize];
        contents[..data.len()].copy_from_slice(data);

        let id = BufferId(self.generate_id());
        guard(&self.internal.buffers, "buffers")?.insert(
            id,
            BufferEntry {
                label: descriptor.label.as_deref().map(String::from),
                data: contents,
            },
        );
        Ok(id)
    }

    fn destroy_buffer(&self, id: BufferId) -> Result<(), ResourceError> {
        match guard(&self.internal.buffers, "buffers")?.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::InvalidHandle),
        }
    }

    fn write_buffer(&self, id: BufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut buffers = guard(&self.internal.buffers, "buffers")?;
        let entry = buffers.get_mut(&id).ok_or(ResourceError::InvalidHandle)?;
        let start = offset as usize;
        let end = start + data.len();
        if end > entry.data.len() {
            return Err(ResourceError::OutOfBounds);
        }
        entry.data[start..end].copy_from_slice(data);
        Ok(())
    }

    // --- Texture Operations ---

    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, ResourceError> {
        let size = descriptor.size;
        if size.width == 0 || size.height == 0 || size.depth_or_array_layers == 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "texture {:?} has a zero dimension",
                descriptor.label
            )));
        }
        {
            let mut faults = guard(&self.internal.faults, "faults")?;
            if let Some(budget) = faults.texture_budget.as_mut() {
                if *budget == 0 {
                    return Err(ResourceError::OutOfMemory);
                }
                *budget -= 1;
            }
        }

        let id = TextureId(self.generate_id());
        guard(&self.internal.textures, "textures")?.insert(
            id,
            TextureInfo {
                label: descriptor.label.as_deref().map(String::from),
                size,
                format: descriptor.format,
                usage: descriptor.usage,
            },
        );
        Ok(id)
    }

    fn destroy_texture(&self, id: TextureId) -> Result<(), ResourceError> {
        match guard(&self.internal.textures, "textures")?.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::InvalidHandle),
        }
    }

    fn write_texture(
        &self,
        texture_id: TextureId,
        data: &[u8],
        bytes_per_row: Option<u32>,
        offset: Origin3D,
        size: Extent3D,
    ) -> Result<(), ResourceError> {
        let textures = guard(&self.internal.textures, "textures")?;
        let info = textures
            .get(&texture_id)
            .ok_or(ResourceError::InvalidHandle)?;
        if offset.x + size.width > info.size.width
            || offset.y + size.height > info.size.height
            || offset.z + size.depth_or_array_layers > info.size.depth_or_array_layers
        {
            return Err(ResourceError::OutOfBounds);
        }
        let row = bytes_per_row.unwrap_or(size.width * info.format.bytes_per_pixel()) as usize;
        let needed = row * size.height as usize * size.depth_or_array_layers as usize;
        if data.len() < needed {
            return Err(ResourceError::OutOfBounds);
        }
        Ok(())
    }

    fn create_texture_view(
        &self,
        texture_id: TextureId,
        descriptor: &TextureViewDescriptor,
    ) -> Result<TextureViewId, ResourceError> {
        {
            let textures = guard(&self.internal.textures, "textures")?;
            let info = textures
                .get(&texture_id)
                .ok_or(ResourceError::InvalidHandle)?;
            let layers = descriptor
                .array_layer_count
                .unwrap_or_else(|| {
                    info.size
                        .depth_or_array_layers
                        .saturating_sub(descriptor.base_array_layer)
                });
            if descriptor.base_array_layer + layers > info.size.depth_or_array_layers {
                return Err(ResourceError::OutOfBounds);
            }
        }
        let id = TextureViewId(self.generate_id());
        let entry = ViewEntry {
            texture: texture_id,
        };
        guard(&self.internal.texture_views, "texture_views")?.insert(id, entry);
        Ok(id)
    }

    fn destroy_texture_view(&self, id: TextureViewId) -> Result<(), ResourceError> {
        match guard(&self.internal.texture_views, "texture_views")?.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::InvalidHandle),
        }
    }

    // --- Sampler Operations ---

    fn create_sampler(&self, descriptor: &SamplerDescriptor) -> Result<SamplerId, ResourceError> {
        let id = SamplerId(self.generate_id());
        guard(&self.internal.samplers, "samplers")?.insert(
            id,
            SamplerInfo {
                label: descriptor.label.as_deref().map(String::from),
                address_mode: descriptor.address_mode,
                anisotropy_clamp: descriptor.anisotropy_clamp,
                border_color: descriptor.border_color,
            },
        );
        Ok(id)
    }

    fn destroy_sampler(&self, id: SamplerId) -> Result<(), ResourceError> {
        match guard(&self.internal.samplers, "samplers")?.remove(&id) {
            Some(_) => Ok(()),
            None => Err(ResourceError::InvalidHandle),
        }
    }

    // --- Command Operations ---

    fn create_command_encoder(&self, label: Option<&str>) -> Box<dyn CommandEncoder> {
        Box::new(HeadlessCommandEncoder::new(self.clone(), label))
    }

    fn submit_command_buffer(&self, command_buffer: CommandBufferId) {
        let commands = inspect(&self.internal.pending_command_buffers).remove(&command_buffer);
        let Some(commands) = commands else {
            log::error!("HeadlessDevice: unknown command buffer {command_buffer:?} submitted");
            return;
        };
        if let Err(e) = self.replay(commands) {
            log::error!("HeadlessDevice: failed to replay {command_buffer:?}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::renderer::{
        BufferUsage, Owned, RenderPassColorAttachment, RenderPassDescriptor, TextureDescriptor,
    };

    fn color_texture(device: &HeadlessDevice, label: &str) -> (TextureId, TextureViewId) {
        let texture = device
            .create_texture(&TextureDescriptor::d2(
                label,
                4,
                4,
                TextureFormat::Rgba8Unorm,
                TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap();
        let view = device
            .create_texture_view(texture, &TextureViewDescriptor::default())
            .unwrap();
        (texture, view)
    }

    #[test]
    fn owned_handles_release_on_drop() {
        let device = HeadlessDevice::new();
        let shared: Arc<dyn GraphicsDevice> = Arc::new(device.clone());
        {
            let (texture, view) = color_texture(&device, "scratch");
            let _view = Owned::new(shared.clone(), view);
            let _texture = Owned::new(shared.clone(), texture);
            assert_eq!(device.live_texture_count(), 1);
            assert_eq!(device.live_view_count(), 1);
        }
        assert_eq!(device.live_resource_count(), 0);
    }

    #[test]
    fn texture_budget_reports_out_of_memory() {
        let device = HeadlessDevice::with_faults(FaultInjection {
            texture_budget: Some(1),
            ..Default::default()
        });
        color_texture(&device, "first");
        let err = device
            .create_texture(&TextureDescriptor::d2(
                "second",
                4,
                4,
                TextureFormat::Rgba8Unorm,
                TextureUsage::TEXTURE_BINDING,
            ))
            .unwrap_err();
        assert!(matches!(err, ResourceError::OutOfMemory));
    }

    #[test]
    fn write_buffer_rejects_overflow() {
        let device = HeadlessDevice::new();
        let buffer = device
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 8,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            })
            .unwrap();
        assert!(device.write_buffer(buffer, 4, &[1, 2, 3, 4]).is_ok());
        assert!(matches!(
            device.write_buffer(buffer, 6, &[1, 2, 3, 4]),
            Err(ResourceError::OutOfBounds)
        ));
        assert_eq!(
            device.buffer_contents(buffer).unwrap(),
            vec![0, 0, 0, 0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn binding_a_target_as_input_is_a_hazard() {
        let device = HeadlessDevice::new();
        let (_, view) = color_texture(&device, "target");
        let mut encoder = device.create_command_encoder(Some("hazard"));
        encoder.set_texture(0, Some(view));
        {
            let colors = [RenderPassColorAttachment::load(view)];
            let _pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("writes target"),
                color_attachments: &colors,
                depth_stencil_attachment: None,
            });
        }
        device.submit_command_buffer(encoder.finish());
        let hazards = device.hazards();
        assert_eq!(hazards.len(), 1);
        assert_eq!(hazards[0].slot, 0);
        assert_eq!(hazards[0].pass.as_deref(), Some("writes target"));
    }

    #[test]
    fn uniform_writes_are_ordered_with_draws() {
        let device = HeadlessDevice::new();
        let (_, view) = color_texture(&device, "target");
        let buffer = device
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 4,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            })
            .unwrap();
        let mut encoder = device.create_command_encoder(None);
        {
            let colors = [RenderPassColorAttachment::load(view)];
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: None,
                color_attachments: &colors,
                depth_stencil_attachment: None,
            });
            pass.set_uniform_buffer(0, buffer);
            pass.write_uniform(buffer, &[1, 0, 0, 0]);
            pass.draw(0..3, 0..1);
            pass.write_uniform(buffer, &[2, 0, 0, 0]);
            pass.draw(0..3, 0..1);
        }
        device.submit_command_buffer(encoder.finish());
        let passes = device.submitted_passes();
        assert_eq!(passes[0].draws[0].uniforms[&0][0], 1);
        assert_eq!(passes[0].draws[1].uniforms[&0][0], 2);
    }

    #[test]
    fn injected_shader_failure() {
        let device = HeadlessDevice::with_faults(FaultInjection {
            failing_shader: Some("bloom".into()),
            ..Default::default()
        });
        let result = device.create_shader_module(&ShaderModuleDescriptor {
            label: Some("bloom_extract"),
            source: ShaderSourceData::Wgsl("fn main() {}".into()),
        });
        assert!(matches!(
            result,
            Err(ResourceError::Shader(ShaderError::CompilationError { .. }))
        ));
    }
}
