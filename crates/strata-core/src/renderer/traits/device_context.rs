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

use crate::renderer::api::*;
use std::fmt::Debug;

/// The immediate context that records state changes and draws.
///
/// Every call is assumed to be expensive at the driver level, which is why
/// the renderer only issues the ones whose state actually changed.
pub trait DeviceContext: Send + Debug + 'static {
    /// Binds color targets (in slot order) and an optional depth-stencil target.
    fn set_render_targets(
        &mut self,
        color: &[BackendRenderTargetId],
        depth_stencil: Option<BackendRenderTargetId>,
    );

    /// Sets the active viewport.
    fn set_viewport(&mut self, viewport: &Viewport);

    /// Binds a pipeline state object.
    fn set_pipeline(&mut self, pipeline: BackendPipelineId);

    /// Makes the resources of a binding visible to the bound pipeline.
    fn commit_resources(&mut self, srb: BackendSrbId);

    /// Binds vertex streams starting at `start_slot`, one offset per buffer.
    fn set_vertex_buffers(&mut self, start_slot: u32, buffers: &[BackendBufferId], offsets: &[u64]);

    /// Binds the index stream.
    fn set_index_buffer(&mut self, buffer: BackendBufferId, offset: u64, format: IndexFormat);

    /// Issues a non-indexed draw.
    fn draw(&mut self, attribs: &DrawAttribs);

    /// Issues an indexed draw.
    fn draw_indexed(&mut self, attribs: &DrawIndexedAttribs);
}
