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

//! Arena allocators and the registry that owns them.
//!
//! Arenas serve short-lived, plain-old-data allocations such as the input and
//! resource layouts assembled while building a pipeline description. They are
//! addressed through [`ArenaHandle`]s validated by the same generation scheme
//! as every other pooled object.

mod arena;
mod registry;

pub use self::arena::{Arena, ArenaSlice, ARENA_ALIGNMENT};
pub use self::registry::{ArenaHandle, ArenaRegistry};
pub use strata_core::memory::{ArenaKind, MemoryError};
