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

//! An insertion-ordered, generation-checked arena.

use slotmap::{Key, SlotMap};

/// A [`SlotMap`] that also remembers insertion order.
///
/// Keys stay valid until their entry is removed; a removed key never aliases a
/// later entry. Ordered iteration follows insertion order, which is the render
/// and shadow order of the entries.
#[derive(Debug, Clone)]
pub struct OrderedArena<K: Key, V> {
    slots: SlotMap<K, V>,
    order: Vec<K>,
}

impl<K: Key, V> Default for OrderedArena<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, V> OrderedArena<K, V> {
    /// An empty arena.
    pub fn new() -> Self {
        Self {
            slots: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Appends a value.
    pub fn insert(&mut self, value: V) -> K {
        let key = self.slots.insert(value);
        self.order.push(key);
        key
    }

    /// Removes a value, keeping the relative order of the others.
    pub fn remove(&mut self, key: K) -> Option<V> {
        let value = self.slots.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(value)
    }

    /// Looks up a value.
    pub fn get(&self, key: K) -> Option<&V> {
        self.slots.get(key)
    }

    /// Looks up a value mutably.
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.slots.get_mut(key)
    }

    /// Whether `key` is live.
    pub fn contains(&self, key: K) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> &[K] {
        &self.order
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.order
            .iter()
            .filter_map(move |key| self.slots.get(*key).map(|v| (*key, v)))
    }

    /// Values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Mutable access to every value, in no particular order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.slots.values_mut()
    }

    /// Removes everything.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::DefaultKey;

    #[test]
    fn iteration_follows_insertion_order_after_removal() {
        let mut arena = OrderedArena::<DefaultKey, &str>::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        let c = arena.insert("c");
        assert_eq!(arena.remove(b), Some("b"));
        let values: Vec<_> = arena.values().copied().collect();
        assert_eq!(values, ["a", "c"]);
        assert!(arena.contains(a) && arena.contains(c));
    }

    #[test]
    fn removed_keys_stay_dead() {
        let mut arena = OrderedArena::<DefaultKey, u32>::new();
        let first = arena.insert(1);
        arena.remove(first);
        let second = arena.insert(2);
        assert_ne!(first, second);
        assert!(arena.get(first).is_none());
        assert_eq!(arena.get(second), Some(&2));
    }
}
