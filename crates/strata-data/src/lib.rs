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

//! Data layouts for the rendering core: generational slot pools and arenas.
//!
//! Everything the renderer hands out to its callers is a small integer handle
//! minted by a [`pool::Pool`]; nothing outside this crate ever sees an index
//! or a pointer into the underlying storage.

#![warn(missing_docs)]

pub mod allocators;
pub mod pool;

pub use pool::{Entity, Pool};
