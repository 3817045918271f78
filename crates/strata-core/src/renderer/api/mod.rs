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

//! Backend-agnostic rendering API.
//!
//! - **[`ids`]**: opaque handles to objects owned by the backend.
//! - **[`enums`]**: formats, topologies and fixed-function modes.
//! - **[`resource`]**: buffer, texture and render-target descriptors.
//! - **[`shader`]**: shader modules and the resources a program declares.
//! - **[`pipeline`]**: vertex layouts and the pipeline creation record.
//! - **[`draw`]**: viewport and draw-call parameters.
//! - **[`stats`]**: per-frame deduplication counters.

pub mod draw;
pub mod enums;
pub mod ids;
pub mod pipeline;
pub mod resource;
pub mod shader;
pub mod stats;

pub use self::draw::*;
pub use self::enums::*;
pub use self::ids::*;
pub use self::pipeline::*;
pub use self::resource::*;
pub use self::shader::*;
pub use self::stats::*;
