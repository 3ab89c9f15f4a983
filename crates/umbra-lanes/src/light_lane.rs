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

//! Light constant lane: packs the registry's lights into the per-kind GPU
//! light blocks once per frame.

use bytemuck::Zeroable;
use std::sync::Arc;
use umbra_core::lane::{Lane, LaneError, LaneKind};
use umbra_core::math::{mat4_to_gpu, vec3_w};
use umbra_core::renderer::bindings::{
    AMBIENT_LIGHT_SLOT, DIRECTIONAL_LIGHT_SLOT, POINT_LIGHT_SLOT, SPOT_LIGHT_SLOT,
};
use umbra_core::renderer::uniforms::{
    AmbientLightRecord, DirectionalLightRecord, PointLightRecord, SpotLightRecord,
};
use umbra_core::renderer::{
    BufferDescriptor, BufferId, BufferUsage, GraphicsDevice, LightBlock, LightKind, Owned,
    RenderError, RenderPass,
};
use umbra_data::LightRegistry;

const STAGE: &str = "light constants";

/// The four light buffers, created on initialization.
struct LightBuffers {
    device: Arc<dyn GraphicsDevice>,
    ambient: Owned<BufferId>,
    spot: Owned<BufferId>,
    directional: Owned<BufferId>,
    point: Owned<BufferId>,
}

/// Packs enabled lights of each kind into fixed-capacity record arrays.
///
/// Lights are compacted: the `n` active lights of a kind fill records
/// `0..n` in registry order and every record past them is zero. A light is
/// active when it is enabled, its shadow map is valid, and it falls within
/// the block capacity. The shadow pass walks the same lights in the same
/// order, so the `shadow_index` written here addresses the shadow map list
/// it produces: spot lights first, then directional lights, then six
/// consecutive entries per point light.
pub struct LightConstantLane {
    ambient: LightBlock<AmbientLightRecord>,
    spot: LightBlock<SpotLightRecord>,
    directional: LightBlock<DirectionalLightRecord>,
    point: LightBlock<PointLightRecord>,
    buffers: Option<LightBuffers>,
}

impl LightConstantLane {
    /// A lane whose blocks hold `capacity` records per kind.
    pub fn new(capacity: usize) -> Self {
        Self {
            ambient: LightBlock::new(capacity),
            spot: LightBlock::new(capacity),
            directional: LightBlock::new(capacity),
            point: LightBlock::new(capacity),
            buffers: None,
        }
    }

    /// Records per kind.
    pub fn capacity(&self) -> usize {
        self.spot.capacity()
    }

    /// Rebuilds every block from the registry.
    pub fn update(&mut self, lights: &LightRegistry) {
        let capacity = self.capacity();

        self.ambient.clear();
        for light in lights.active_ambient_lights(capacity) {
            self.ambient.push(AmbientLightRecord {
                radiance: vec3_w(light.base.radiance(), 0.0),
                position: vec3_w(light.base.position(), 1.0),
                enabled: 1,
                ..Zeroable::zeroed()
            });
        }

        self.spot.clear();
        for (index, entry) in lights.active_spot_lights(capacity).enumerate() {
            let light = &entry.light;
            self.spot.push(SpotLightRecord {
                radiance: vec3_w(light.base.radiance(), light.range),
                position: vec3_w(light.base.position(), 1.0),
                facing: vec3_w(light.base.facing(), light.cone_angle.cos()),
                view: mat4_to_gpu(&light.base.view_matrix()),
                projection: mat4_to_gpu(&light.projection_matrix()),
                enabled: 1,
                shadow_index: index as u32,
                ..Zeroable::zeroed()
            });
        }
        let spot_count = self.spot.active_count();

        self.directional.clear();
        for (index, entry) in lights.active_directional_lights(capacity).enumerate() {
            let light = &entry.light;
            self.directional.push(DirectionalLightRecord {
                radiance: vec3_w(light.base.radiance(), 0.0),
                position: vec3_w(light.base.position(), 1.0),
                facing: vec3_w(light.base.facing(), 0.0),
                view: mat4_to_gpu(&light.base.view_matrix()),
                projection: mat4_to_gpu(&light.projection_matrix()),
                enabled: 1,
                shadow_index: (spot_count + index) as u32,
                ..Zeroable::zeroed()
            });
        }
        let flat_count = spot_count + self.directional.active_count();

        self.point.clear();
        for (index, entry) in lights.active_point_lights(capacity).enumerate() {
            let light = &entry.light;
            self.point.push(PointLightRecord {
                radiance: vec3_w(light.base.radiance(), light.range),
                position: vec3_w(light.base.position(), 1.0),
                face_views: light.face_views().map(|view| mat4_to_gpu(&view)),
                projection: mat4_to_gpu(&light.projection_matrix()),
                enabled: 1,
                shadow_index: (flat_count + index * LightKind::Point.shadow_view_count()) as u32,
                ..Zeroable::zeroed()
            });
        }

        self.ambient.finalize();
        self.spot.finalize();
        self.directional.finalize();
        self.point.finalize();

        log::trace!(
            "LightConstantLane: packed {} ambient, {} spot, {} directional, {} point lights",
            self.ambient.active_count(),
            spot_count,
            self.directional.active_count(),
            self.point.active_count()
        );
    }

    /// Transfers the changed prefix of every block to its GPU buffer.
    pub fn upload(&mut self) -> Result<(), RenderError> {
        let buffers = self
            .buffers
            .as_ref()
            .ok_or(RenderError::NotInitialized("LightConstantLane"))?;
        let device = buffers.device.as_ref();
        let result = write_prefix(device, buffers.ambient.id(), self.ambient.take_upload())
            .and_then(|_| write_prefix(device, buffers.spot.id(), self.spot.take_upload()))
            .and_then(|_| {
                let directional = self.directional.take_upload();
                write_prefix(device, buffers.directional.id(), directional)
            })
            .and_then(|_| write_prefix(device, buffers.point.id(), self.point.take_upload()));
        result.map_err(|e| RenderError::from(e).in_stage(STAGE))
    }

    /// Binds the four light buffers to their slots.
    pub fn bind(&self, pass: &mut dyn RenderPass) -> Result<(), RenderError> {
        let buffers = self
            .buffers
            .as_ref()
            .ok_or(RenderError::NotInitialized("LightConstantLane"))?;
        pass.set_uniform_buffer(AMBIENT_LIGHT_SLOT, buffers.ambient.id());
        pass.set_uniform_buffer(SPOT_LIGHT_SLOT, buffers.spot.id());
        pass.set_uniform_buffer(DIRECTIONAL_LIGHT_SLOT, buffers.directional.id());
        pass.set_uniform_buffer(POINT_LIGHT_SLOT, buffers.point.id());
        Ok(())
    }

    /// The GPU buffer of a light kind.
    pub fn buffer(&self, kind: LightKind) -> Option<BufferId> {
        let buffers = self.buffers.as_ref()?;
        Some(match kind {
            LightKind::Ambient => buffers.ambient.id(),
            LightKind::Spot => buffers.spot.id(),
            LightKind::Directional => buffers.directional.id(),
            LightKind::Point => buffers.point.id(),
        })
    }

    /// Packed ambient light records.
    pub fn ambient_block(&self) -> &LightBlock<AmbientLightRecord> {
        &self.ambient
    }

    /// Packed spot light records.
    pub fn spot_block(&self) -> &LightBlock<SpotLightRecord> {
        &self.spot
    }

    /// Packed directional light records.
    pub fn directional_block(&self) -> &LightBlock<DirectionalLightRecord> {
        &self.directional
    }

    /// Packed point light records.
    pub fn point_block(&self) -> &LightBlock<PointLightRecord> {
        &self.point
    }

    /// Number of shadow map views the packed lights address.
    pub fn shadow_view_count(&self) -> usize {
        self.spot.active_count()
            + self.directional.active_count()
            + self.point.active_count() * LightKind::Point.shadow_view_count()
    }
}

fn write_prefix(
    device: &dyn GraphicsDevice,
    buffer: BufferId,
    bytes: &[u8],
) -> Result<(), umbra_core::renderer::ResourceError> {
    if bytes.is_empty() {
        return Ok(());
    }
    device.write_buffer(buffer, 0, bytes)
}

fn create_light_buffer(
    device: &Arc<dyn GraphicsDevice>,
    label: &'static str,
    size: u64,
) -> Result<Owned<BufferId>, RenderError> {
    let id = device
        .create_buffer(&BufferDescriptor {
            label: Some(label.into()),
            size,
            usage: BufferUsage::STORAGE | BufferUsage::COPY_DST,
        })
        .map_err(|e| RenderError::from(e).in_stage(STAGE))?;
    Ok(Owned::new(device.clone(), id))
}

impl Lane for LightConstantLane {
    fn strategy_name(&self) -> &'static str {
        "LightConstants"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Lighting
    }

    fn on_initialize(&mut self, device: &Arc<dyn GraphicsDevice>) -> Result<(), LaneError> {
        let buffers = LightBuffers {
            device: device.clone(),
            ambient: create_light_buffer(device, "ambient light buffer", self.ambient.byte_size())
                .map_err(LaneError::init)?,
            spot: create_light_buffer(device, "spot light buffer", self.spot.byte_size())
                .map_err(LaneError::init)?,
            directional: create_light_buffer(
                device,
                "directional light buffer",
                self.directional.byte_size(),
            )
            .map_err(LaneError::init)?,
            point: create_light_buffer(device, "point light buffer", self.point.byte_size())
                .map_err(LaneError::init)?,
        };
        self.buffers = Some(buffers);
        log::info!(
            "LightConstantLane: initialized with {} records per kind",
            self.capacity()
        );
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.buffers.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::math::{LinearRgba, Transform, Vec3};
    use umbra_core::renderer::{AmbientLight, DirectionalLight, PointLight, SpotLight};
    use umbra_infra::HeadlessDevice;

    fn setup(capacity: usize) -> (HeadlessDevice, LightRegistry, LightConstantLane) {
        let headless = HeadlessDevice::new();
        let device: Arc<dyn GraphicsDevice> = Arc::new(headless.clone());
        let registry = LightRegistry::new(device.clone(), 16);
        let mut lane = LightConstantLane::new(capacity);
        lane.on_initialize(&device).unwrap();
        (headless, registry, lane)
    }

    fn small_spot(x: f32) -> SpotLight {
        let mut light = SpotLight {
            shadow_resolution: 16,
            ..Default::default()
        };
        light.base.transform = Transform::from_position(Vec3::new(x, 2.0, 0.0));
        light
    }

    fn spot_records(headless: &HeadlessDevice, lane: &LightConstantLane) -> Vec<SpotLightRecord> {
        let bytes = headless
            .buffer_contents(lane.buffer(LightKind::Spot).unwrap())
            .unwrap();
        bytes
            .chunks_exact(std::mem::size_of::<SpotLightRecord>())
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    #[test]
    fn buffers_are_sized_for_full_capacity() {
        let (headless, _, lane) = setup(8);
        let bytes = headless
            .buffer_contents(lane.buffer(LightKind::Point).unwrap())
            .unwrap();
        assert_eq!(bytes.len(), 8 * std::mem::size_of::<PointLightRecord>());
        assert!(lane.is_initialized());
    }

    #[test]
    fn upload_before_initialize_fails() {
        let mut lane = LightConstantLane::new(4);
        assert!(matches!(
            lane.upload(),
            Err(RenderError::NotInitialized("LightConstantLane"))
        ));
    }

    #[test]
    fn active_count_is_broadcast_to_every_record() {
        let (_, mut registry, mut lane) = setup(8);
        for i in 0..3 {
            registry.add(small_spot(i as f32)).unwrap();
        }
        lane.update(&registry);
        let records = lane.spot_block().records();
        let broadcast = |r: &SpotLightRecord| r.active_count == 3 && r.enabled == 1;
        assert!(records[..3].iter().all(broadcast));
        assert_eq!(records[3], SpotLightRecord::zeroed());
    }

    #[test]
    fn disabling_a_light_leaves_no_stale_record() {
        let (headless, mut registry, mut lane) = setup(8);
        let handles: Vec<_> = (0..3)
            .map(|i| registry.add(small_spot(i as f32)).unwrap())
            .collect();
        lane.update(&registry);
        lane.upload().unwrap();
        assert_eq!(
            spot_records(&headless, &lane)
                .iter()
                .filter(|r| r.enabled == 1)
                .count(),
            3
        );

        registry.set_enabled(handles[1], false).unwrap();
        lane.update(&registry);
        lane.upload().unwrap();

        let records = spot_records(&headless, &lane);
        let active = |r: &SpotLightRecord| r.enabled == 1 && r.active_count == 2;
        assert!(records[..2].iter().all(active));
        assert!(records[2..].iter().all(|r| *r == SpotLightRecord::zeroed()));
        // Compaction keeps registry order.
        assert_eq!(records[1].position[0], 2.0);
    }

    #[test]
    fn lights_beyond_capacity_are_not_packed() {
        let (_, mut registry, mut lane) = setup(2);
        for i in 0..4 {
            registry.add(small_spot(i as f32)).unwrap();
        }
        lane.update(&registry);
        assert_eq!(lane.spot_block().active_count(), 2);
        assert_eq!(lane.shadow_view_count(), 2);
    }

    #[test]
    fn shadow_indices_follow_the_shadow_view_order() {
        let (_, mut registry, mut lane) = setup(8);
        registry.add(small_spot(0.0)).unwrap();
        registry.add(small_spot(1.0)).unwrap();
        registry
            .add(DirectionalLight {
                shadow_resolution: 16,
                ..Default::default()
            })
            .unwrap();
        for _ in 0..2 {
            registry
                .add(PointLight {
                    shadow_resolution: 16,
                    ..Default::default()
                })
                .unwrap();
        }
        lane.update(&registry);

        let spot: Vec<u32> = lane.spot_block().records()[..2]
            .iter()
            .map(|r| r.shadow_index)
            .collect();
        assert_eq!(spot, vec![0, 1]);
        assert_eq!(lane.directional_block().records()[0].shadow_index, 2);
        let point: Vec<u32> = lane.point_block().records()[..2]
            .iter()
            .map(|r| r.shadow_index)
            .collect();
        assert_eq!(point, vec![3, 9]);
        assert_eq!(lane.shadow_view_count(), registry.shadow_map_views(8).len());
    }

    #[test]
    fn ambient_record_carries_radiance() {
        let (_, mut registry, mut lane) = setup(4);
        let mut ambient = AmbientLight::default();
        ambient.base.color = LinearRgba::rgb(1.0, 0.5, 0.0);
        ambient.base.intensity = 2.0;
        registry.add(ambient).unwrap();
        lane.update(&registry);
        let record = lane.ambient_block().records()[0];
        assert_eq!(&record.radiance[..3], &[2.0, 1.0, 0.0]);
        assert_eq!(record.active_count, 1);
    }

    #[test]
    fn directional_record_uses_light_view_and_ortho_projection() {
        let (_, mut registry, mut lane) = setup(4);
        let mut light = DirectionalLight {
            shadow_resolution: 16,
            ..Default::default()
        };
        light.base.transform =
            Transform::looking_towards(Vec3::new(0.0, 10.0, 0.0), Vec3::new(0.3, -1.0, 0.0));
        registry.add(light).unwrap();
        lane.update(&registry);
        let record = lane.directional_block().records()[0];
        let view = light.base.world_matrix().inverse();
        assert_eq!(record.view, mat4_to_gpu(&view));
        assert_eq!(record.projection, mat4_to_gpu(&light.projection_matrix()));
    }
}
