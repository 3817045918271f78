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

//! The hot path of the rendering core.
//!
//! A [`Renderer`] turns logical draw state into as few backend object creations
//! and context calls as possible:
//!
//! - pipelines and shader-resource-bindings are cached by content hash
//!   ([`pipeline_cache`], [`srb_cache`]),
//! - draw state is baked into immutable, content-addressed render commands
//!   ([`command`]),
//! - submitting a command only replays the aspects that differ from what the
//!   context last received ([`context`]).

#![warn(missing_docs)]

pub mod command;
pub mod config;
pub mod context;
pub mod event;
pub mod pipeline_cache;
pub mod renderer;
pub mod resources;
pub mod srb_cache;

pub use command::{CommandId, RenderCommand, RenderCommandBuilder};
pub use config::{ConfigError, RendererConfig};
pub use context::DirtyFlags;
pub use event::RenderEvent;
pub use pipeline_cache::{GraphicsPipelineDesc, PipelineCache, PipelineId};
pub use renderer::Renderer;
pub use resources::{BufferHandle, ProgramHandle, RenderTargetHandle, ResourceRegistry, TextureHandle};
pub use srb_cache::{SrbCache, SrbId};

/// How a cache served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// An entry with the same content hash already existed.
    Hit,
    /// A new backend object was created.
    Created,
    /// An existing backend object was patched in place and re-keyed.
    Updated,
}
