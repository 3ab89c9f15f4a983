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

//! The light registry: every light of the scene, its shadow resources, the
//! camera and the sky reference.

use crate::arena::OrderedArena;
use crate::error::RegistryError;
use slotmap::new_key_type;
use std::sync::Arc;
use umbra_core::renderer::{
    AmbientLight, CubeShadowMap, DirectionalLight, GraphicsDevice, Light, LightKind, PointLight,
    RenderError, ShadowMap, SpotLight, TextureViewId,
};
use umbra_core::Camera;

new_key_type! {
    /// Key of an [`AmbientLight`].
    pub struct AmbientKey;
    /// Key of a [`SpotLight`].
    pub struct SpotKey;
    /// Key of a [`DirectionalLight`].
    pub struct DirectionalKey;
    /// Key of a [`PointLight`].
    pub struct PointKey;
}

/// A stable handle to a light of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightHandle {
    /// An ambient light.
    Ambient(AmbientKey),
    /// A spot light.
    Spot(SpotKey),
    /// A directional light.
    Directional(DirectionalKey),
    /// A point light.
    Point(PointKey),
}

impl LightHandle {
    /// The kind of light this handle refers to.
    pub fn kind(&self) -> LightKind {
        match self {
            LightHandle::Ambient(_) => LightKind::Ambient,
            LightHandle::Spot(_) => LightKind::Spot,
            LightHandle::Directional(_) => LightKind::Directional,
            LightHandle::Point(_) => LightKind::Point,
        }
    }
}

/// A spot light and its shadow map.
#[derive(Debug)]
pub struct SpotEntry {
    /// Light parameters.
    pub light: SpotLight,
    shadow: ShadowMap,
}

impl SpotEntry {
    /// The shadow map.
    pub fn shadow(&self) -> &ShadowMap {
        &self.shadow
    }
}

/// A directional light and its shadow map.
#[derive(Debug)]
pub struct DirectionalEntry {
    /// Light parameters.
    pub light: DirectionalLight,
    shadow: ShadowMap,
}

impl DirectionalEntry {
    /// The shadow map.
    pub fn shadow(&self) -> &ShadowMap {
        &self.shadow
    }
}

/// A point light and its six-face shadow map.
#[derive(Debug)]
pub struct PointEntry {
    /// Light parameters.
    pub light: PointLight,
    shadow: CubeShadowMap,
}

impl PointEntry {
    /// The cube shadow map.
    pub fn shadow(&self) -> &CubeShadowMap {
        &self.shadow
    }
}

/// Read access to one registered light.
#[derive(Debug, Clone, Copy)]
pub enum LightRef<'a> {
    /// An ambient light.
    Ambient(&'a AmbientLight),
    /// A spot light with its shadow map.
    Spot(&'a SpotEntry),
    /// A directional light with its shadow map.
    Directional(&'a DirectionalEntry),
    /// A point light with its shadow maps.
    Point(&'a PointEntry),
}

impl LightRef<'_> {
    /// A copy of the light parameters.
    pub fn to_light(&self) -> Light {
        match self {
            LightRef::Ambient(l) => Light::Ambient(**l),
            LightRef::Spot(e) => Light::Spot(e.light),
            LightRef::Directional(e) => Light::Directional(e.light),
            LightRef::Point(e) => Light::Point(e.light),
        }
    }
}

/// Mutable access to the parameters of one registered light.
///
/// Shadow resources are not reachable through this type. A changed
/// `shadow_resolution` takes effect at the next
/// [`LightRegistry::flush_pending`].
#[derive(Debug)]
pub enum LightMut<'a> {
    /// An ambient light.
    Ambient(&'a mut AmbientLight),
    /// A spot light.
    Spot(&'a mut SpotLight),
    /// A directional light.
    Directional(&'a mut DirectionalLight),
    /// A point light.
    Point(&'a mut PointLight),
}

/// Owns every light of the scene, grouped by kind.
///
/// Each kind keeps insertion order, which is also render and shadow order.
/// Shadow-casting lights own their shadow maps, allocated when the light is
/// added and released when it is removed.
pub struct LightRegistry {
    device: Arc<dyn GraphicsDevice>,
    capacity: usize,
    ambient: OrderedArena<AmbientKey, AmbientLight>,
    spot: OrderedArena<SpotKey, SpotEntry>,
    directional: OrderedArena<DirectionalKey, DirectionalEntry>,
    point: OrderedArena<PointKey, PointEntry>,
    pending_removals: Vec<LightHandle>,
    next_label: usize,
    camera: Camera,
    sky: Option<TextureViewId>,
}

impl std::fmt::Debug for LightRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LightRegistry")
            .field("capacity", &self.capacity)
            .field("ambient", &self.ambient.len())
            .field("spot", &self.spot.len())
            .field("directional", &self.directional.len())
            .field("point", &self.point.len())
            .field("pending_removals", &self.pending_removals.len())
            .finish()
    }
}

impl LightRegistry {
    /// An empty registry holding at most `capacity` lights of each kind.
    pub fn new(device: Arc<dyn GraphicsDevice>, capacity: usize) -> Self {
        Self {
            device,
            capacity,
            ambient: OrderedArena::new(),
            spot: OrderedArena::new(),
            directional: OrderedArena::new(),
            point: OrderedArena::new(),
            pending_removals: Vec::new(),
            next_label: 0,
            camera: Camera::default(),
            sky: None,
        }
    }

    /// Maximum number of lights per kind.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of registered lights of `kind`, enabled or not.
    pub fn count(&self, kind: LightKind) -> usize {
        match kind {
            LightKind::Ambient => self.ambient.len(),
            LightKind::Spot => self.spot.len(),
            LightKind::Directional => self.directional.len(),
            LightKind::Point => self.point.len(),
        }
    }

    /// Total number of registered lights.
    pub fn len(&self) -> usize {
        LightKind::ALL.iter().map(|k| self.count(*k)).sum()
    }

    /// Whether no light is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn shadow_label(&mut self, kind: LightKind) -> String {
        self.next_label += 1;
        format!("{kind} light #{} shadow", self.next_label)
    }

    /// Registers a light, allocating its shadow resources.
    ///
    /// Fails without touching the registry when the kind is full, when the
    /// shadow resolution is zero or when the shadow resources cannot be created.
    pub fn add(&mut self, light: impl Into<Light>) -> Result<LightHandle, RegistryError> {
        let light = light.into();
        let kind = light.kind();
        if self.count(kind) >= self.capacity {
            return Err(RegistryError::CapacityExceeded {
                kind,
                capacity: self.capacity,
            });
        }
        if light.shadow_resolution() == Some(0) {
            return Err(RegistryError::ZeroShadowResolution(kind));
        }

        let handle = match light {
            Light::Ambient(light) => LightHandle::Ambient(self.ambient.insert(light)),
            Light::Spot(light) => {
                let label = self.shadow_label(kind);
                let shadow = ShadowMap::new(&self.device, label, light.shadow_resolution)?;
                LightHandle::Spot(self.spot.insert(SpotEntry { light, shadow }))
            }
            Light::Directional(light) => {
                let label = self.shadow_label(kind);
                let shadow = ShadowMap::new(&self.device, label, light.shadow_resolution)?;
                LightHandle::Directional(
                    self.directional
                        .insert(DirectionalEntry { light, shadow }),
                )
            }
            Light::Point(light) => {
                let label = self.shadow_label(kind);
                let shadow = CubeShadowMap::new(&self.device, &label, light.shadow_resolution)?;
                LightHandle::Point(self.point.insert(PointEntry { light, shadow }))
            }
        };
        log::debug!("LightRegistry: added {kind} light {handle:?}");
        Ok(handle)
    }

    /// Removes a light immediately, releasing its shadow resources.
    ///
    /// Do not call this while a frame iterates the registry; use
    /// [`queue_removal`](Self::queue_removal) instead.
    pub fn remove(&mut self, handle: LightHandle) -> Result<Light, RegistryError> {
        let light = match handle {
            LightHandle::Ambient(key) => self.ambient.remove(key).map(Light::Ambient),
            LightHandle::Spot(key) => self.spot.remove(key).map(|e| Light::Spot(e.light)),
            LightHandle::Directional(key) => self
                .directional
                .remove(key)
                .map(|e| Light::Directional(e.light)),
            LightHandle::Point(key) => self.point.remove(key).map(|e| Light::Point(e.light)),
        };
        light.ok_or(RegistryError::StaleHandle)
    }

    /// Marks a light for removal at the next [`flush_pending`](Self::flush_pending).
    pub fn queue_removal(&mut self, handle: LightHandle) {
        if !self.pending_removals.contains(&handle) {
            self.pending_removals.push(handle);
        }
    }

    /// Applies queued removals, then reallocates any shadow map whose light's
    /// resolution was edited or whose resources are missing.
    ///
    /// A resolution edited to zero is reverted to the map's current one. A
    /// resolution whose allocation fails is reverted as well, so the next flush
    /// restores the previous map instead of retrying.
    ///
    /// Returns the number of lights removed.
    pub fn flush_pending(&mut self) -> Result<usize, RegistryError> {
        let mut removed = 0;
        for handle in std::mem::take(&mut self.pending_removals) {
            match self.remove(handle) {
                Ok(_) => removed += 1,
                Err(_) => log::debug!("LightRegistry: queued {handle:?} was already gone"),
            }
        }

        for entry in self.spot.values_mut() {
            let wanted = &mut entry.light.shadow_resolution;
            sync_shadow(&self.device, LightKind::Spot, wanted, &mut entry.shadow)?;
        }
        for entry in self.directional.values_mut() {
            let wanted = &mut entry.light.shadow_resolution;
            sync_shadow(
                &self.device,
                LightKind::Directional,
                wanted,
                &mut entry.shadow,
            )?;
        }
        for entry in self.point.values_mut() {
            let wanted = &mut entry.light.shadow_resolution;
            sync_shadow(&self.device, LightKind::Point, wanted, &mut entry.shadow)?;
        }
        Ok(removed)
    }

    /// Read access to a light.
    pub fn get(&self, handle: LightHandle) -> Option<LightRef<'_>> {
        match handle {
            LightHandle::Ambient(key) => self.ambient.get(key).map(LightRef::Ambient),
            LightHandle::Spot(key) => self.spot.get(key).map(LightRef::Spot),
            LightHandle::Directional(key) => self.directional.get(key).map(LightRef::Directional),
            LightHandle::Point(key) => self.point.get(key).map(LightRef::Point),
        }
    }

    /// Mutable access to a light's parameters.
    pub fn get_mut(&mut self, handle: LightHandle) -> Option<LightMut<'_>> {
        match handle {
            LightHandle::Ambient(key) => self.ambient.get_mut(key).map(LightMut::Ambient),
            LightHandle::Spot(key) => self.spot.get_mut(key).map(|e| LightMut::Spot(&mut e.light)),
            LightHandle::Directional(key) => self
                .directional
                .get_mut(key)
                .map(|e| LightMut::Directional(&mut e.light)),
            LightHandle::Point(key) => self
                .point
                .get_mut(key)
                .map(|e| LightMut::Point(&mut e.light)),
        }
    }

    /// A copy of a light's parameters.
    pub fn light(&self, handle: LightHandle) -> Option<Light> {
        self.get(handle).map(|l| l.to_light())
    }

    /// Whether `handle` refers to a live light.
    pub fn contains(&self, handle: LightHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Adds a copy of a light, with its own freshly allocated shadow resources.
    pub fn duplicate(&mut self, handle: LightHandle) -> Result<LightHandle, RegistryError> {
        let light = self.light(handle).ok_or(RegistryError::StaleHandle)?;
        self.add(light)
    }

    /// Enables or disables a light.
    pub fn set_enabled(&mut self, handle: LightHandle, enabled: bool) -> Result<(), RegistryError> {
        let base = match self.get_mut(handle).ok_or(RegistryError::StaleHandle)? {
            LightMut::Ambient(l) => &mut l.base,
            LightMut::Spot(l) => &mut l.base,
            LightMut::Directional(l) => &mut l.base,
            LightMut::Point(l) => &mut l.base,
        };
        base.enabled = enabled;
        Ok(())
    }

    /// Changes a light's shadow resolution, tearing down and recreating its
    /// shadow resources right away.
    ///
    /// A zero resolution is rejected before the light or its map is touched.
    /// If the new map cannot be allocated the light keeps its old resolution.
    pub fn set_shadow_resolution(
        &mut self,
        handle: LightHandle,
        resolution: u32,
    ) -> Result<(), RegistryError> {
        if resolution == 0 {
            return Err(match handle.kind() {
                LightKind::Ambient => RegistryError::NoShadow(LightKind::Ambient),
                kind => RegistryError::ZeroShadowResolution(kind),
            });
        }
        match handle {
            LightHandle::Ambient(_) => Err(RegistryError::NoShadow(LightKind::Ambient)),
            LightHandle::Spot(key) => {
                let entry = self.spot.get_mut(key).ok_or(RegistryError::StaleHandle)?;
                entry.light.shadow_resolution = resolution;
                let wanted = &mut entry.light.shadow_resolution;
                sync_shadow(&self.device, LightKind::Spot, wanted, &mut entry.shadow)
            }
            LightHandle::Directional(key) => {
                let entry = self
                    .directional
                    .get_mut(key)
                    .ok_or(RegistryError::StaleHandle)?;
                entry.light.shadow_resolution = resolution;
                let wanted = &mut entry.light.shadow_resolution;
                sync_shadow(
                    &self.device,
                    LightKind::Directional,
                    wanted,
                    &mut entry.shadow,
                )
            }
            LightHandle::Point(key) => {
                let entry = self.point.get_mut(key).ok_or(RegistryError::StaleHandle)?;
                entry.light.shadow_resolution = resolution;
                let wanted = &mut entry.light.shadow_resolution;
                sync_shadow(&self.device, LightKind::Point, wanted, &mut entry.shadow)
            }
        }
    }

    /// Handles of every light: spot, directional, point, then ambient, each
    /// in insertion order.
    pub fn handles(&self) -> Vec<LightHandle> {
        let spot = self.spot.keys().iter().copied().map(LightHandle::Spot);
        let directional = self
            .directional
            .keys()
            .iter()
            .copied()
            .map(LightHandle::Directional);
        let point = self.point.keys().iter().copied().map(LightHandle::Point);
        let ambient = self
            .ambient
            .keys()
            .iter()
            .copied()
            .map(LightHandle::Ambient);
        spot.chain(directional)
            .chain(point)
            .chain(ambient)
            .collect()
    }

    /// Every ambient light, in order.
    pub fn ambient_lights(&self) -> impl Iterator<Item = (AmbientKey, &AmbientLight)> + '_ {
        self.ambient.iter()
    }

    /// Every spot light, in order.
    pub fn spot_lights(&self) -> impl Iterator<Item = (SpotKey, &SpotEntry)> + '_ {
        self.spot.iter()
    }

    /// Every directional light, in order.
    pub fn directional_lights(
        &self,
    ) -> impl Iterator<Item = (DirectionalKey, &DirectionalEntry)> + '_ {
        self.directional.iter()
    }

    /// Every point light, in order.
    pub fn point_lights(&self) -> impl Iterator<Item = (PointKey, &PointEntry)> + '_ {
        self.point.iter()
    }

    // The active_* iterators define which lights are packed and shadow-cast
    // this frame. The light aggregator and the shadow pass must agree on them.

    /// The first `limit` enabled ambient lights.
    pub fn active_ambient_lights(&self, limit: usize) -> impl Iterator<Item = &AmbientLight> + '_ {
        self.ambient
            .values()
            .filter(|l| l.base.enabled)
            .take(limit)
    }

    /// The first `limit` enabled spot lights with valid shadow maps.
    pub fn active_spot_lights(&self, limit: usize) -> impl Iterator<Item = &SpotEntry> + '_ {
        self.spot
            .values()
            .filter(|e| e.light.base.enabled && e.shadow.is_valid())
            .take(limit)
    }

    /// The first `limit` enabled directional lights with valid shadow maps.
    pub fn active_directional_lights(
        &self,
        limit: usize,
    ) -> impl Iterator<Item = &DirectionalEntry> + '_ {
        self.directional
            .values()
            .filter(|e| e.light.base.enabled && e.shadow.is_valid())
            .take(limit)
    }

    /// The first `limit` enabled point lights with valid shadow maps.
    pub fn active_point_lights(&self, limit: usize) -> impl Iterator<Item = &PointEntry> + '_ {
        self.point
            .values()
            .filter(|e| e.light.base.enabled && e.shadow.is_valid())
            .take(limit)
    }

    /// Shader-readable shadow views of the active lights: spot lights, then
    /// directional lights, then six consecutive views per point light.
    pub fn shadow_map_views(&self, limit: usize) -> Vec<TextureViewId> {
        let spot = self
            .active_spot_lights(limit)
            .filter_map(|e| e.shadow.sample_view());
        let directional = self
            .active_directional_lights(limit)
            .filter_map(|e| e.shadow.sample_view());
        let point = self
            .active_point_lights(limit)
            .filter_map(|e| e.shadow.sample_views())
            .flatten();
        spot.chain(directional).chain(point).collect()
    }

    /// The scene camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The scene camera, mutably.
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Replaces the scene camera.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// The environment texture bound during the main pass.
    pub fn sky(&self) -> Option<TextureViewId> {
        self.sky
    }

    /// Sets or clears the environment texture.
    pub fn set_sky(&mut self, sky: Option<TextureViewId>) {
        self.sky = sky;
    }

    /// Removes every light.
    pub fn clear(&mut self) {
        self.ambient.clear();
        self.spot.clear();
        self.directional.clear();
        self.point.clear();
        self.pending_removals.clear();
    }
}

/// The shadow resources of one shadow-casting light.
trait LightShadow {
    fn resolution(&self) -> u32;
    fn is_valid(&self) -> bool;
    fn recreate(
        &mut self,
        device: &Arc<dyn GraphicsDevice>,
        resolution: u32,
    ) -> Result<(), RenderError>;
}

impl LightShadow for ShadowMap {
    fn resolution(&self) -> u32 {
        ShadowMap::resolution(self)
    }

    fn is_valid(&self) -> bool {
        ShadowMap::is_valid(self)
    }

    fn recreate(
        &mut self,
        device: &Arc<dyn GraphicsDevice>,
        resolution: u32,
    ) -> Result<(), RenderError> {
        ShadowMap::recreate(self, device, resolution)
    }
}

impl LightShadow for CubeShadowMap {
    fn resolution(&self) -> u32 {
        CubeShadowMap::resolution(self)
    }

    fn is_valid(&self) -> bool {
        CubeShadowMap::is_valid(self)
    }

    fn recreate(
        &mut self,
        device: &Arc<dyn GraphicsDevice>,
        resolution: u32,
    ) -> Result<(), RenderError> {
        CubeShadowMap::recreate(self, device, resolution)
    }
}

/// Brings `shadow` in line with the light's `wanted` resolution.
///
/// `wanted` is rewritten when it cannot be honored: a zero is replaced by the
/// map's resolution, a failed allocation restores the previous one.
fn sync_shadow(
    device: &Arc<dyn GraphicsDevice>,
    kind: LightKind,
    wanted: &mut u32,
    shadow: &mut impl LightShadow,
) -> Result<(), RegistryError> {
    if *wanted == 0 {
        log::warn!(
            "LightRegistry: ignoring zero shadow resolution on a {kind} light, keeping {}",
            shadow.resolution()
        );
        *wanted = shadow.resolution();
    }
    if shadow.resolution() == *wanted && shadow.is_valid() {
        return Ok(());
    }

    let previous = shadow.resolution();
    if let Err(e) = shadow.recreate(device, *wanted) {
        log::warn!("LightRegistry: {kind} shadow map at {wanted} failed: {e}");
        *wanted = previous;
        return Err(e.into());
    }
    Ok(())
}
