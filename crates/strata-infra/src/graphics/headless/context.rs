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

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strata_core::renderer::api::*;
use strata_core::renderer::DeviceContext;

/// One call received by a [`HeadlessContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContextCall {
    /// `set_render_targets`.
    SetRenderTargets {
        /// Color targets in slot order.
        color: Vec<BackendRenderTargetId>,
        /// Depth-stencil target.
        depth_stencil: Option<BackendRenderTargetId>,
    },
    /// `set_viewport`.
    SetViewport(Viewport),
    /// `set_pipeline`.
    SetPipeline(BackendPipelineId),
    /// `commit_resources`.
    CommitResources(BackendSrbId),
    /// `set_vertex_buffers`.
    SetVertexBuffers {
        /// First slot.
        start_slot: u32,
        /// Buffers from `start_slot` on.
        buffers: Vec<BackendBufferId>,
        /// One offset per buffer.
        offsets: Vec<u64>,
    },
    /// `set_index_buffer`.
    SetIndexBuffer {
        /// Index buffer.
        buffer: BackendBufferId,
        /// Byte offset.
        offset: u64,
        /// Index width.
        format: IndexFormat,
    },
    /// `draw`.
    Draw(DrawAttribs),
    /// `draw_indexed`.
    DrawIndexed(DrawIndexedAttribs),
}

impl ContextCall {
    /// `true` for draw calls, `false` for state changes.
    pub fn is_draw(&self) -> bool {
        matches!(self, ContextCall::Draw(_) | ContextCall::DrawIndexed(_))
    }
}

/// A shared, inspectable record of context calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<ContextCall>>>,
}

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, Vec<ContextCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, call: ContextCall) {
        self.lock().push(call);
    }

    /// A copy of every call recorded so far.
    pub fn calls(&self) -> Vec<ContextCall> {
        self.lock().clone()
    }

    /// Returns the recorded calls and clears the log.
    pub fn take(&self) -> Vec<ContextCall> {
        std::mem::take(&mut *self.lock())
    }

    /// Forgets every recorded call.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of recorded calls.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of recorded calls that are not draws.
    pub fn state_changes(&self) -> usize {
        self.lock().iter().filter(|call| !call.is_draw()).count()
    }
}

/// A [`DeviceContext`] that records calls instead of executing them.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    log: CallLog,
}

impl HeadlessContext {
    /// Creates a context with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle to the log, still readable after the context is moved away.
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }
}

impl DeviceContext for HeadlessContext {
    fn set_render_targets(
        &mut self,
        color: &[BackendRenderTargetId],
        depth_stencil: Option<BackendRenderTargetId>,
    ) {
        self.log.push(ContextCall::SetRenderTargets {
            color: color.to_vec(),
            depth_stencil,
        });
    }

    fn set_viewport(&mut self, viewport: &Viewport) {
        self.log.push(ContextCall::SetViewport(*viewport));
    }

    fn set_pipeline(&mut self, pipeline: BackendPipelineId) {
        self.log.push(ContextCall::SetPipeline(pipeline));
    }

    fn commit_resources(&mut self, srb: BackendSrbId) {
        self.log.push(ContextCall::CommitResources(srb));
    }

    fn set_vertex_buffers(&mut self, start_slot: u32, buffers: &[BackendBufferId], offsets: &[u64]) {
        if buffers.len() != offsets.len() {
            log::warn!(
                "HeadlessContext: {} vertex buffers bound with {} offsets",
                buffers.len(),
                offsets.len()
            );
        }
        self.log.push(ContextCall::SetVertexBuffers {
            start_slot,
            buffers: buffers.to_vec(),
            offsets: offsets.to_vec(),
        });
    }

    fn set_index_buffer(&mut self, buffer: BackendBufferId, offset: u64, format: IndexFormat) {
        self.log.push(ContextCall::SetIndexBuffer {
            buffer,
            offset,
            format,
        });
    }

    fn draw(&mut self, attribs: &DrawAttribs) {
        self.log.push(ContextCall::Draw(*attribs));
    }

    fn draw_indexed(&mut self, attribs: &DrawIndexedAttribs) {
        self.log.push(ContextCall::DrawIndexed(*attribs));
    }
}
