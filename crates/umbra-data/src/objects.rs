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

//! Renderable scene objects.

use crate::arena::OrderedArena;
use crate::error::RegistryError;
use slotmap::new_key_type;
use std::sync::Arc;
use umbra_core::math::Transform;
use umbra_core::renderer::MeshProvider;

new_key_type! {
    /// Key of a [`SceneObject`].
    pub struct ObjectKey;
}

/// One drawable instance of a mesh.
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// The geometry and material.
    pub mesh: Arc<dyn MeshProvider>,
    /// World placement.
    pub transform: Transform,
    /// Rendered into shadow maps.
    pub casts_shadows: bool,
    /// Uses an opacity map. Translucent objects are left out of the
    /// post-process depth pass.
    pub translucent: bool,
    /// Captures a reflection cube map from its position every frame.
    pub reflection_probe: bool,
    /// Drawn at all.
    pub visible: bool,
}

impl SceneObject {
    /// A visible, shadow-casting, opaque object at the origin.
    pub fn new(mesh: Arc<dyn MeshProvider>) -> Self {
        Self {
            mesh,
            transform: Transform::IDENTITY,
            casts_shadows: true,
            translucent: false,
            reflection_probe: false,
            visible: true,
        }
    }

    /// Sets the transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Marks the object as translucent.
    pub fn translucent(mut self) -> Self {
        self.translucent = true;
        self
    }

    /// Makes the object capture a reflection probe.
    pub fn with_reflection_probe(mut self) -> Self {
        self.reflection_probe = true;
        self
    }
}

/// The ordered set of scene objects, with a fixed capacity.
#[derive(Debug)]
pub struct SceneObjects {
    objects: OrderedArena<ObjectKey, SceneObject>,
    capacity: usize,
    pending_removals: Vec<ObjectKey>,
}

impl SceneObjects {
    /// An empty set holding at most `capacity` objects.
    pub fn new(capacity: usize) -> Self {
        Self {
            objects: OrderedArena::new(),
            capacity,
            pending_removals: Vec::new(),
        }
    }

    /// Adds an object at the end of the draw order.
    pub fn add(&mut self, object: SceneObject) -> Result<ObjectKey, RegistryError> {
        if self.objects.len() >= self.capacity {
            return Err(RegistryError::ObjectCapacityExceeded {
                capacity: self.capacity,
            });
        }
        Ok(self.objects.insert(object))
    }

    /// Removes an object immediately.
    pub fn remove(&mut self, key: ObjectKey) -> Result<SceneObject, RegistryError> {
        self.objects.remove(key).ok_or(RegistryError::StaleHandle)
    }

    /// Marks an object for removal at the next [`flush_pending`](Self::flush_pending).
    pub fn queue_removal(&mut self, key: ObjectKey) {
        if !self.pending_removals.contains(&key) {
            self.pending_removals.push(key);
        }
    }

    /// Applies queued removals and returns how many objects were removed.
    pub fn flush_pending(&mut self) -> usize {
        std::mem::take(&mut self.pending_removals)
            .into_iter()
            .filter(|key| self.objects.remove(*key).is_some())
            .count()
    }

    /// Looks up an object.
    pub fn get(&self, key: ObjectKey) -> Option<&SceneObject> {
        self.objects.get(key)
    }

    /// Looks up an object mutably.
    pub fn get_mut(&mut self, key: ObjectKey) -> Option<&mut SceneObject> {
        self.objects.get_mut(key)
    }

    /// Whether `key` is live.
    pub fn contains(&self, key: ObjectKey) -> bool {
        self.objects.contains(key)
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether there are no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Maximum number of objects.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Every object in draw order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjectKey, &SceneObject)> + '_ {
        self.objects.iter()
    }

    /// Visible objects.
    pub fn visible(&self) -> impl Iterator<Item = (ObjectKey, &SceneObject)> + '_ {
        self.iter().filter(|(_, o)| o.visible)
    }

    /// Visible objects that cast shadows.
    pub fn shadow_casters(&self) -> impl Iterator<Item = &SceneObject> + '_ {
        self.visible()
            .map(|(_, o)| o)
            .filter(|o| o.casts_shadows)
    }

    /// Visible opaque objects, as drawn by the post-process depth pass.
    pub fn opaque(&self) -> impl Iterator<Item = &SceneObject> + '_ {
        self.visible().map(|(_, o)| o).filter(|o| !o.translucent)
    }

    /// Visible objects that capture a reflection probe.
    pub fn probes(&self) -> impl Iterator<Item = (ObjectKey, &SceneObject)> + '_ {
        self.visible().filter(|(_, o)| o.reflection_probe)
    }

    /// Removes every object.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.pending_removals.clear();
    }
}
