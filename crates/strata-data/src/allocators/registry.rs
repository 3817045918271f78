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

use super::arena::Arena;
use crate::pool::Pool;
use crate::strata_handle;
use strata_core::memory::{ArenaKind, MemoryError};
use strata_core::renderer::ResourceError;

strata_handle! {
    /// Refers to an [`Arena`] owned by an [`ArenaRegistry`].
    pub struct ArenaHandle(u16);
}

/// Owns a set of arenas and hands out generational handles to them.
///
/// Arenas live in a [`Pool`], so a handle to a destroyed arena is detected by
/// its generation tag rather than by inspecting the arena itself.
#[derive(Debug)]
pub struct ArenaRegistry {
    arenas: Pool<ArenaHandle, Arena>,
}

impl ArenaRegistry {
    /// Creates a registry able to hold `max_arenas` arenas at once.
    pub fn new(max_arenas: usize) -> Self {
        Self {
            arenas: Pool::new("arena", max_arenas),
        }
    }

    /// Creates an arena of `kind` with `capacity` bytes reserved.
    pub fn create(&mut self, kind: ArenaKind, capacity: usize) -> Result<ArenaHandle, ResourceError> {
        let handle = self.arenas.push_back(Arena::new(kind, capacity))?;
        log::debug!(
            "ArenaRegistry: created {:?} arena {:?} ({} bytes)",
            kind,
            handle,
            capacity
        );
        Ok(handle)
    }

    /// The arena behind `handle`.
    pub fn get(&self, handle: ArenaHandle) -> Result<&Arena, MemoryError> {
        self.arenas.get(handle).ok_or(MemoryError::InvalidArena)
    }

    /// Mutable access to the arena behind `handle`.
    pub fn get_mut(&mut self, handle: ArenaHandle) -> Result<&mut Arena, MemoryError> {
        self.arenas.get_mut(handle).ok_or(MemoryError::InvalidArena)
    }

    /// Destroys an arena. A stale handle is logged and ignored.
    pub fn destroy(&mut self, handle: ArenaHandle) -> bool {
        match self.arenas.erase(handle) {
            Some(arena) => {
                if arena.live_allocations() > 0 {
                    log::warn!(
                        "ArenaRegistry: destroying {:?} arena {:?} with {} live allocations",
                        arena.kind(),
                        handle,
                        arena.live_allocations()
                    );
                }
                true
            }
            None => {
                log::warn!("ArenaRegistry: destroy of stale arena handle {:?}", handle);
                false
            }
        }
    }

    /// Resets every `Frame` arena. Called at frame boundaries.
    pub fn reset_frame_arenas(&mut self) {
        for (_, arena) in self.arenas.iter_mut() {
            if arena.kind() == ArenaKind::Frame {
                arena.reset();
            }
        }
    }

    /// Number of live arenas.
    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    /// `true` if no arena is live.
    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }
}

impl Default for ArenaRegistry {
    fn default() -> Self {
        Self::new(16)
    }
}
