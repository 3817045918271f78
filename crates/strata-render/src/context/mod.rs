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

//! The context differ.
//!
//! Tracks what was last submitted to the device context, one hash per
//! aspect, and issues only the state calls whose aspect changed.

use crate::command::RenderCommand;
use crate::pipeline_cache::{PipelineCache, PipelineId};
use crate::resources::ResourceRegistry;
use crate::srb_cache::{SrbCache, SrbId};
use std::sync::Arc;
use strata_core::renderer::api::*;
use strata_core::renderer::{DeviceContext, RenderError, ResourceError};
use strata_core::strata_bitflags;

strata_bitflags! {
    /// Aspects of the context that must be re-sent before the next draw.
    pub struct DirtyFlags: u8 {
        /// Color and depth targets.
        const RENDER_TARGETS = 1 << 0;
        /// Viewport.
        const VIEWPORT = 1 << 1;
        /// Pipeline state object.
        const PIPELINE = 1 << 2;
        /// Committed resource binding.
        const SRB = 1 << 3;
        /// Vertex buffer handles.
        const VERTEX_BUFFERS = 1 << 4;
        /// Vertex buffer offsets.
        const VERTEX_OFFSETS = 1 << 5;
        /// Index buffer.
        const INDEX_BUFFER = 1 << 6;
    }
}

impl DirtyFlags {
    /// Every aspect.
    pub const ALL: Self = Self::from_bits_truncate(0x7f);
}

/// What the device context currently holds. `None` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextSnapshot {
    /// Render target aspect hash.
    pub render_targets: Option<u32>,
    /// Viewport aspect hash.
    pub viewport: Option<u32>,
    /// Bound pipeline.
    pub pipeline: Option<PipelineId>,
    /// Committed binding.
    pub srb: Option<SrbId>,
    /// Vertex buffer aspect hash.
    pub vertex_buffers: Option<u32>,
    /// Vertex offset aspect hash.
    pub vertex_offsets: Option<u32>,
    /// Index buffer aspect hash.
    pub index_buffer: Option<u32>,
}

impl ContextSnapshot {
    /// The aspects of `command` that differ from this snapshot.
    pub fn diff(&self, command: &RenderCommand) -> DirtyFlags {
        let hashes = command.hashes();
        let mut dirty = DirtyFlags::EMPTY;
        dirty.set(
            DirtyFlags::RENDER_TARGETS,
            self.render_targets != Some(hashes.render_targets),
        );
        dirty.set(DirtyFlags::VIEWPORT, self.viewport != Some(hashes.viewport));
        dirty.set(DirtyFlags::PIPELINE, self.pipeline != command.pipeline());
        dirty.set(DirtyFlags::SRB, self.srb != command.srb());
        dirty.set(
            DirtyFlags::VERTEX_BUFFERS,
            self.vertex_buffers != Some(hashes.vertex_buffers),
        );
        dirty.set(
            DirtyFlags::VERTEX_OFFSETS,
            self.vertex_offsets != Some(hashes.vertex_offsets),
        );
        dirty.set(
            DirtyFlags::INDEX_BUFFER,
            self.index_buffer != Some(hashes.index_buffer),
        );

        // A derived viewport follows the bound target.
        if dirty.contains(DirtyFlags::RENDER_TARGETS) && command.viewport().is_none() {
            dirty.insert(DirtyFlags::VIEWPORT);
        }
        // Resources are committed against the bound pipeline.
        if dirty.contains(DirtyFlags::PIPELINE) && command.srb().is_some() {
            dirty.insert(DirtyFlags::SRB);
        }
        dirty
    }
}

/// The command in use, the snapshot it is compared against and the pending
/// dirty bits.
#[derive(Debug, Default)]
pub struct ContextState {
    snapshot: ContextSnapshot,
    dirty: DirtyFlags,
    current: Option<Arc<RenderCommand>>,
}

impl ContextState {
    /// Creates a state with an unknown context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `command` the one the next flush applies and returns the
    /// aspects that will be re-sent.
    pub fn use_command(&mut self, command: Arc<RenderCommand>) -> DirtyFlags {
        self.dirty = self.snapshot.diff(&command);
        log::trace!(
            "ContextState: using {:?}, dirty {:?}",
            command.id(),
            self.dirty
        );
        self.current = Some(command);
        self.dirty
    }

    /// Issues the pending state calls in dependency order.
    ///
    /// Each aspect is recorded in the snapshot and cleared from the dirty
    /// set as soon as it is applied, so an error leaves only the aspects
    /// that were not sent yet marked dirty. Returns the aspects applied.
    ///
    /// # Errors
    ///
    /// * [`RenderError::NoActiveCommand`] if no command is in use.
    /// * [`RenderError::ResourceError`] if a handle, pipeline or binding the
    ///   command refers to no longer exists.
    pub fn flush(
        &mut self,
        context: &mut dyn DeviceContext,
        resources: &ResourceRegistry,
        pipelines: &PipelineCache,
        srbs: &SrbCache,
        stats: &mut RenderStats,
    ) -> Result<DirtyFlags, RenderError> {
        let command = self.current.clone().ok_or(RenderError::NoActiveCommand)?;
        let pending = self.dirty;
        let hashes = *command.hashes();

        if self.dirty.contains(DirtyFlags::RENDER_TARGETS) {
            let color = command
                .render_targets()
                .iter()
                .map(|rt| resources.render_target_backend(*rt))
                .collect::<Result<Vec<_>, _>>()?;
            let depth = command
                .depth_target()
                .map(|rt| resources.render_target_backend(rt))
                .transpose()?;
            context.set_render_targets(&color, depth);
            stats.render_target_changes += 1;
            self.snapshot.render_targets = Some(hashes.render_targets);
            self.dirty.remove(DirtyFlags::RENDER_TARGETS);
        }

        if self.dirty.contains(DirtyFlags::VIEWPORT) {
            match Self::viewport_for(&command, resources)? {
                Some(viewport) => {
                    context.set_viewport(&viewport);
                    stats.viewport_changes += 1;
                }
                None => log::warn!(
                    "ContextState: {:?} has no viewport and no render target to derive one from",
                    command.id()
                ),
            }
            self.snapshot.viewport = Some(hashes.viewport);
            self.dirty.remove(DirtyFlags::VIEWPORT);
        }

        if self.dirty.contains(DirtyFlags::PIPELINE) {
            if let Some(pipeline) = command.pipeline() {
                context.set_pipeline(pipelines.get(pipeline)?.backend);
                stats.pipeline_changes += 1;
            }
            self.snapshot.pipeline = command.pipeline();
            self.dirty.remove(DirtyFlags::PIPELINE);
        }

        if self.dirty.contains(DirtyFlags::SRB) {
            if let Some(srb) = command.srb() {
                command.check_bindings(resources)?;
                context.commit_resources(srbs.get(srb)?.backend);
                stats.srb_commits += 1;
            }
            self.snapshot.srb = command.srb();
            self.dirty.remove(DirtyFlags::SRB);
        }

        let streams = DirtyFlags::VERTEX_BUFFERS | DirtyFlags::VERTEX_OFFSETS;
        if self.dirty.intersects(streams) {
            let buffers = command
                .vertex_buffers()
                .iter()
                .map(|vb| resources.buffer_backend(*vb))
                .collect::<Result<Vec<_>, _>>()?;
            context.set_vertex_buffers(0, &buffers, command.vertex_offsets());
            stats.vertex_buffer_changes += 1;
            self.snapshot.vertex_buffers = Some(hashes.vertex_buffers);
            self.snapshot.vertex_offsets = Some(hashes.vertex_offsets);
            self.dirty.remove(streams);
        }

        if self.dirty.contains(DirtyFlags::INDEX_BUFFER) {
            if let Some(index) = command.index_buffer() {
                let buffer = resources.buffer_backend(index.buffer)?;
                context.set_index_buffer(buffer, index.offset, index.format);
                stats.index_buffer_changes += 1;
            }
            self.snapshot.index_buffer = Some(hashes.index_buffer);
            self.dirty.remove(DirtyFlags::INDEX_BUFFER);
        }

        Ok(pending)
    }

    fn viewport_for(
        command: &RenderCommand,
        resources: &ResourceRegistry,
    ) -> Result<Option<Viewport>, ResourceError> {
        if let Some(viewport) = command.viewport() {
            return Ok(Some(viewport));
        }
        let target = command
            .render_targets()
            .first()
            .copied()
            .or(command.depth_target());
        match target {
            Some(rt) => {
                let entry = resources.render_target(rt)?;
                Ok(Some(Viewport::full(entry.width, entry.height)))
            }
            None => Ok(None),
        }
    }

    /// Forces `srb` to be committed again if the context holds it.
    ///
    /// Needed after the binding was patched in place: the handle is the same
    /// but the objects behind it are not.
    pub fn invalidate_srb(&mut self, srb: SrbId) {
        if self.snapshot.srb != Some(srb) {
            return;
        }
        self.snapshot.srb = None;
        if self.current.as_ref().is_some_and(|c| c.srb() == Some(srb)) {
            self.dirty.insert(DirtyFlags::SRB);
        }
    }

    /// Forgets the context contents and the command in use.
    pub fn reset(&mut self) {
        self.snapshot = ContextSnapshot::default();
        self.dirty = DirtyFlags::EMPTY;
        self.current = None;
    }

    /// Aspects still waiting to be applied.
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    /// The command in use.
    pub fn current(&self) -> Option<&Arc<RenderCommand>> {
        self.current.as_ref()
    }

    /// What the context is believed to hold.
    pub fn snapshot(&self) -> &ContextSnapshot {
        &self.snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{BufferHandle, RenderTargetHandle};
    use strata_data::Entity;

    fn baked(build: impl FnOnce(&mut RenderCommand)) -> Arc<RenderCommand> {
        let mut command = RenderCommand {
            render_targets: vec![RenderTargetHandle::from_parts(0, 1)],
            vertex_buffers: vec![BufferHandle::from_parts(0, 1)],
            vertex_offsets: vec![0],
            pipeline: Some(PipelineId(10)),
            srb: Some(SrbId::from_parts(0, 1)),
            ..RenderCommand::default()
        };
        build(&mut command);
        command.compute_hashes();
        Arc::new(command)
    }

    fn applied(command: &RenderCommand) -> ContextSnapshot {
        let hashes = command.hashes();
        ContextSnapshot {
            render_targets: Some(hashes.render_targets),
            viewport: Some(hashes.viewport),
            pipeline: command.pipeline(),
            srb: command.srb(),
            vertex_buffers: Some(hashes.vertex_buffers),
            vertex_offsets: Some(hashes.vertex_offsets),
            index_buffer: Some(hashes.index_buffer),
        }
    }

    #[test]
    fn unknown_context_is_all_dirty() {
        let command = baked(|_| {});
        assert_eq!(ContextSnapshot::default().diff(&command), DirtyFlags::ALL);
    }

    #[test]
    fn same_command_is_clean() {
        let command = baked(|_| {});
        assert!(applied(&command).diff(&command).is_empty());
    }

    #[test]
    fn explicit_viewport_change_is_isolated() {
        let a = baked(|_| {});
        let b = baked(|c| c.viewport = Some(Viewport::full(32, 32)));
        assert_eq!(applied(&a).diff(&b), DirtyFlags::VIEWPORT);
    }

    #[test]
    fn target_change_drags_a_derived_viewport() {
        let a = baked(|_| {});
        let b = baked(|c| c.render_targets = vec![RenderTargetHandle::from_parts(1, 2)]);
        assert_eq!(
            applied(&a).diff(&b),
            DirtyFlags::RENDER_TARGETS | DirtyFlags::VIEWPORT
        );

        let explicit = Some(Viewport::full(4, 4));
        let c = baked(|c| c.viewport = explicit);
        let d = baked(|c| {
            c.viewport = explicit;
            c.render_targets = vec![RenderTargetHandle::from_parts(1, 2)];
        });
        assert_eq!(applied(&c).diff(&d), DirtyFlags::RENDER_TARGETS);
    }

    #[test]
    fn pipeline_change_recommits_resources() {
        let a = baked(|_| {});
        let b = baked(|c| c.pipeline = Some(PipelineId(11)));
        assert_eq!(
            applied(&a).diff(&b),
            DirtyFlags::PIPELINE | DirtyFlags::SRB
        );
    }

    #[test]
    fn invalidated_binding_is_dirty_again() {
        let command = baked(|_| {});
        let srb = command.srb().unwrap();
        let mut state = ContextState::new();
        state.snapshot = applied(&command);
        assert!(state.use_command(Arc::clone(&command)).is_empty());

        state.invalidate_srb(SrbId::from_parts(5, 1));
        assert!(state.dirty().is_empty(), "an uncommitted binding changes nothing");

        state.invalidate_srb(srb);
        assert_eq!(state.dirty(), DirtyFlags::SRB);
        assert_eq!(state.snapshot().srb, None);
    }

    #[test]
    fn reset_forgets_everything() {
        let mut state = ContextState::new();
        state.use_command(baked(|_| {}));
        state.reset();

        assert!(state.current().is_none());
        assert!(state.dirty().is_empty());
        assert_eq!(*state.snapshot(), ContextSnapshot::default());
    }
}
