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

//! Memory contracts shared by the arena allocators.
//!
//! The arenas themselves live in `strata-data`; this module only defines the
//! closed set of arena flavours and the errors they report, so that
//! `ResourceError` can wrap them without a dependency cycle.

use std::fmt;

/// The closed set of arena behaviours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArenaKind {
    /// General purpose bump arena that grows on demand.
    Default,
    /// Bump arena reset wholesale once per frame.
    Frame,
    /// Bump arena with a hard capacity that never grows.
    Fixed,
    /// Stack arena: every allocation must be popped in reverse order.
    Scratch,
}

/// Errors reported by arena allocators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The arena cannot satisfy the request without growing, and may not grow.
    OutOfMemory {
        /// The number of bytes requested (after alignment padding).
        requested: usize,
        /// The number of bytes still available.
        available: usize,
    },
    /// A scratch allocation was released while a younger one is still live.
    OutOfOrderRelease {
        /// Offset of the allocation the caller tried to release.
        offset: usize,
        /// Offset of the allocation that must be released first.
        expected: usize,
    },
    /// The allocation lies past the arena top: it was popped or reset already.
    StaleAllocation {
        /// Offset of the stale allocation.
        offset: usize,
    },
    /// The element type needs a stricter alignment than arenas provide.
    UnsupportedAlignment(usize),
    /// The arena handle does not refer to a live arena.
    InvalidArena,
}

impl fmt::Display for MemoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryError::OutOfMemory {
                requested,
                available,
            } => write!(
                f,
                "Arena out of memory: requested {requested} bytes, {available} available"
            ),
            MemoryError::OutOfOrderRelease { offset, expected } => write!(
                f,
                "Scratch release out of order: got offset {offset}, expected {expected}"
            ),
            MemoryError::StaleAllocation { offset } => {
                write!(f, "Arena allocation at offset {offset} was already released")
            }
            MemoryError::UnsupportedAlignment(align) => {
                write!(f, "Unsupported arena alignment: {align}")
            }
            MemoryError::InvalidArena => write!(f, "Invalid or stale arena handle."),
        }
    }
}

impl std::error::Error for MemoryError {}
