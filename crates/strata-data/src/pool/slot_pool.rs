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

use super::entity::Entity;
use strata_core::renderer::ResourceError;

#[derive(Debug)]
struct Slot<H, T> {
    /// The handle of the current occupant, `H::NULL` when the slot is free.
    handle: H,
    value: Option<T>,
}

/// A fixed-capacity, array-backed store that hands out generational handles.
///
/// All slots are reserved up front; allocation pops the most recently freed
/// slot index from a stack, so slots are reused LIFO. A single generation
/// counter is shared by every slot of the pool and advances on each
/// allocation, which means a handle is only mistaken for a newer one after the
/// counter wraps around its tag width.
///
/// A handle is valid iff the handle stored in its slot is bit-identical to it.
/// That single comparison rejects out-of-range indices, freed slots and slots
/// that have been reused since.
#[derive(Debug)]
pub struct Pool<H: Entity, T> {
    label: &'static str,
    slots: Vec<Slot<H, T>>,
    free: Vec<usize>,
    generation: u32,
    len: usize,
}

impl<H: Entity, T> Pool<H, T> {
    /// Creates a pool able to hold `capacity` live entries.
    ///
    /// `label` names the pool in errors and logs. A capacity larger than what
    /// the handle type can address is clamped.
    pub fn new(label: &'static str, capacity: usize) -> Self {
        let capacity = if capacity > H::max_slots() {
            log::warn!(
                "Pool: '{}' capacity {} exceeds the {} slots addressable by its handle, clamping",
                label,
                capacity,
                H::max_slots()
            );
            H::max_slots()
        } else {
            capacity
        };

        let slots = (0..capacity)
            .map(|_| Slot {
                handle: H::NULL,
                value: None,
            })
            .collect();

        Self {
            label,
            slots,
            // Reversed so that the first allocations fill slots 0, 1, 2...
            free: (0..capacity).rev().collect(),
            generation: 1,
            len: 0,
        }
    }

    fn next_generation(&mut self) -> u32 {
        let generation = self.generation;
        self.generation = if generation >= H::max_generation() {
            1
        } else {
            generation + 1
        };
        generation
    }

    fn slot_of(&self, handle: H) -> Option<&Slot<H, T>> {
        if handle.is_null() {
            return None;
        }
        self.slots
            .get(handle.index())
            .filter(|slot| slot.handle == handle)
    }

    fn slot_of_mut(&mut self, handle: H) -> Option<&mut Slot<H, T>> {
        if handle.is_null() {
            return None;
        }
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.handle == handle)
    }

    fn invalid(&self, handle: H) -> ResourceError {
        ResourceError::invalid(self.label, handle.to_raw())
    }

    /// Stores `value` in a free slot and returns its handle.
    ///
    /// # Errors
    ///
    /// [`ResourceError::CapacityExceeded`] when every slot is occupied. The
    /// pool is left untouched in that case.
    pub fn push_back(&mut self, value: T) -> Result<H, ResourceError> {
        let Some(index) = self.free.pop() else {
            return Err(ResourceError::CapacityExceeded {
                what: self.label,
                capacity: self.slots.len(),
            });
        };

        let handle = H::from_parts(index, self.next_generation());
        let slot = &mut self.slots[index];
        slot.handle = handle;
        slot.value = Some(value);
        self.len += 1;
        Ok(handle)
    }

    /// Removes the entry behind `handle` and returns its value.
    ///
    /// A stale or null handle is ignored and yields `None`.
    pub fn erase(&mut self, handle: H) -> Option<T> {
        let slot = self.slot_of_mut(handle)?;
        slot.handle = H::NULL;
        let value = slot.value.take();
        self.free.push(handle.index());
        self.len -= 1;
        value
    }

    /// Stores `value` under a fresh generation in the slot of `handle`.
    ///
    /// The old handle becomes stale; the returned one replaces it.
    ///
    /// # Errors
    ///
    /// [`ResourceError::InvalidHandle`] if `handle` is stale.
    pub fn replace(&mut self, handle: H, value: T) -> Result<H, ResourceError> {
        if self.slot_of(handle).is_none() {
            return Err(self.invalid(handle));
        }
        let new_handle = H::from_parts(handle.index(), self.next_generation());
        let slot = &mut self.slots[handle.index()];
        slot.handle = new_handle;
        slot.value = Some(value);
        Ok(new_handle)
    }

    /// Swaps the value behind `handle` in place and returns the previous one.
    ///
    /// The handle stays valid.
    ///
    /// # Errors
    ///
    /// [`ResourceError::InvalidHandle`] if `handle` is stale.
    pub fn overwrite(&mut self, handle: H, value: T) -> Result<T, ResourceError> {
        let error = self.invalid(handle);
        self.slot_of_mut(handle)
            .and_then(|slot| slot.value.replace(value))
            .ok_or(error)
    }

    /// Whether `handle` refers to a live entry.
    pub fn is_valid(&self, handle: H) -> bool {
        self.slot_of(handle).is_some()
    }

    /// The value behind `handle`, or `None` if it is stale.
    pub fn get(&self, handle: H) -> Option<&T> {
        self.slot_of(handle).and_then(|slot| slot.value.as_ref())
    }

    /// Mutable access to the value behind `handle`, or `None` if it is stale.
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.slot_of_mut(handle)
            .and_then(|slot| slot.value.as_mut())
    }

    /// Like [`Pool::get`], for lookups that cannot proceed without the value.
    ///
    /// # Errors
    ///
    /// [`ResourceError::InvalidHandle`] if `handle` is stale.
    pub fn fetch(&self, handle: H) -> Result<&T, ResourceError> {
        self.get(handle).ok_or_else(|| self.invalid(handle))
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` when no entry is live.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Maximum number of live entries.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The name given to the pool at construction.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Iterates live entries in slot order.
    pub fn iter(&self) -> Iter<'_, H, T> {
        Iter {
            inner: self.slots.iter(),
        }
    }

    /// Iterates live entries mutably in slot order.
    pub fn iter_mut(&mut self) -> IterMut<'_, H, T> {
        IterMut {
            inner: self.slots.iter_mut(),
        }
    }

    /// Handles of all live entries in slot order.
    pub fn handles(&self) -> impl Iterator<Item = H> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Drops every entry and returns each one to the free list.
    ///
    /// The generation counter keeps running, so handles issued before the
    /// clear stay stale afterwards.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.handle = H::NULL;
            slot.value = None;
        }
        self.free = (0..self.slots.len()).rev().collect();
        self.len = 0;
    }

    /// Removes every live entry and returns them in slot order.
    pub fn drain(&mut self) -> Vec<(H, T)> {
        let drained = self
            .slots
            .iter_mut()
            .filter_map(|slot| {
                let handle = std::mem::replace(&mut slot.handle, H::NULL);
                slot.value.take().map(|value| (handle, value))
            })
            .collect();
        self.free = (0..self.slots.len()).rev().collect();
        self.len = 0;
        drained
    }
}

/// Iterator over the live entries of a [`Pool`].
pub struct Iter<'a, H, T> {
    inner: std::slice::Iter<'a, Slot<H, T>>,
}

impl<'a, H: Entity, T> Iterator for Iter<'a, H, T> {
    type Item = (H, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find_map(|slot| slot.value.as_ref().map(|value| (slot.handle, value)))
    }
}

/// Mutable iterator over the live entries of a [`Pool`].
pub struct IterMut<'a, H, T> {
    inner: std::slice::IterMut<'a, Slot<H, T>>,
}

impl<'a, H: Entity, T> Iterator for IterMut<'a, H, T> {
    type Item = (H, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .by_ref()
            .find_map(|slot| slot.value.as_mut().map(|value| (slot.handle, value)))
    }
}

impl<'a, H: Entity, T> IntoIterator for &'a Pool<H, T> {
    type Item = (H, &'a T);
    type IntoIter = Iter<'a, H, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
