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

//! Notifications emitted by a [`Renderer`](crate::Renderer).

use crate::command::CommandId;
use crate::pipeline_cache::PipelineId;
use crate::srb_cache::SrbId;

/// Something the renderer created, reused or released.
///
/// Delivered synchronously to listeners registered with
/// [`Renderer::subscribe`](crate::Renderer::subscribe), in subscription order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderEvent {
    /// The device compiled a new pipeline.
    PipelineCreated(PipelineId),
    /// The device created a new resource binding.
    SrbCreated(SrbId),
    /// A resource binding was patched in place. Its id is unchanged.
    SrbUpdated(SrbId),
    /// A new command was baked.
    CommandBaked(CommandId),
    /// `end()` found an identical baked command.
    CommandReused(CommandId),
    /// A baked command was removed from the table.
    CommandDestroyed(CommandId),
    /// A pooled resource was destroyed.
    ResourceDestroyed {
        /// Pool the resource lived in.
        kind: &'static str,
        /// Raw handle value.
        raw: u64,
    },
    /// The context snapshot was cleared.
    StatesReset,
}
