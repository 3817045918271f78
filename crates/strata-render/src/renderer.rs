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

//! The owned rendering context tying caches, commands and the differ together.

use crate::command::{CommandId, CommandTable, RenderCommand, RenderCommandBuilder};
use crate::config::RendererConfig;
use crate::context::{ContextState, DirtyFlags};
use crate::event::RenderEvent;
use crate::pipeline_cache::{GraphicsPipelineDesc, PipelineCache, PipelineId};
use crate::resources::{
    BufferHandle, ProgramHandle, RenderTargetHandle, ResourceRegistry, TextureHandle,
};
use crate::srb_cache::{SrbCache, SrbId};
use crate::CacheOutcome;
use std::fmt;
use std::sync::Arc;
use strata_core::event::{ObserverList, ObserverToken};
use strata_core::memory::ArenaKind;
use strata_core::renderer::api::*;
use strata_core::renderer::{DeviceContext, GraphicsDevice, RenderError, ResourceError};
use strata_data::allocators::{ArenaHandle, ArenaRegistry};
use strata_data::Entity;

/// A single-threaded rendering context.
///
/// Owns every pool and cache, the table of baked commands and the snapshot of
/// what the device context holds. Several renderers can coexist; they share
/// nothing but the device they were given.
pub struct Renderer {
    device: Arc<dyn GraphicsDevice>,
    context: Box<dyn DeviceContext>,
    config: RendererConfig,
    resources: ResourceRegistry,
    pipelines: PipelineCache,
    srbs: SrbCache,
    commands: CommandTable,
    state: ContextState,
    arenas: ArenaRegistry,
    scratch: ArenaHandle,
    default_command: RenderCommand,
    events: ObserverList<RenderEvent>,
    stats: RenderStats,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("device", &self.device)
            .field("resources", &self.resources)
            .field("pipelines", &self.pipelines.len())
            .field("srbs", &self.srbs.len())
            .field("commands", &self.commands.len())
            .field("dirty", &self.state.dirty())
            .finish_non_exhaustive()
    }
}

impl Renderer {
    /// Creates a renderer drawing through `context` with objects from `device`.
    ///
    /// The dummy texture and the scratch arena are created here.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        context: Box<dyn DeviceContext>,
        config: RendererConfig,
    ) -> Result<Self, RenderError> {
        let resources = ResourceRegistry::new(device.as_ref(), &config)?;
        let mut arenas = ArenaRegistry::new(4);
        let scratch = arenas.create(ArenaKind::Scratch, config.scratch_arena_bytes)?;

        log::info!(
            "Renderer: initialised ({} pipelines, {} bindings, {} commands max)",
            config.max_pipelines,
            config.max_srbs,
            config.max_commands
        );

        Ok(Self {
            pipelines: PipelineCache::new(config.max_pipelines, config.hash_pipeline_names),
            srbs: SrbCache::new(config.max_srbs),
            commands: CommandTable::new(config.max_commands),
            state: ContextState::new(),
            default_command: RenderCommand::default(),
            events: ObserverList::new(),
            stats: RenderStats::default(),
            device,
            context,
            config,
            resources,
            arenas,
            scratch,
        })
    }

    /// The configuration the renderer was built with.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// The resource pools, for read access.
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    // --- Resources ---

    /// Creates a buffer, optionally with initial contents.
    pub fn create_buffer(
        &mut self,
        descriptor: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<BufferHandle, ResourceError> {
        self.resources
            .create_buffer(self.device.as_ref(), descriptor, initial_data)
    }

    /// Exposes the CPU copy of a buffer. See [`ResourceRegistry::map_buffer`].
    pub fn map_buffer(&mut self, handle: BufferHandle) -> Result<&mut [u8], ResourceError> {
        self.resources.map_buffer(handle)
    }

    /// Uploads the CPU copy of a mapped buffer.
    pub fn unmap_buffer(&mut self, handle: BufferHandle) -> Result<(), ResourceError> {
        self.resources.unmap_buffer(self.device.as_ref(), handle)
    }

    /// Destroys a buffer. Stale handles are ignored.
    pub fn destroy_buffer(&mut self, handle: BufferHandle) -> bool {
        let destroyed = self.resources.destroy_buffer(self.device.as_ref(), handle);
        self.resource_destroyed(destroyed, "buffer", handle.to_raw())
    }

    /// Creates a sampled texture.
    pub fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<TextureHandle, ResourceError> {
        self.resources
            .create_texture(self.device.as_ref(), descriptor, initial_data)
    }

    /// Destroys a texture. Stale handles and the dummy texture are ignored.
    pub fn destroy_texture(&mut self, handle: TextureHandle) -> bool {
        let destroyed = self.resources.destroy_texture(self.device.as_ref(), handle);
        self.resource_destroyed(destroyed, "texture", handle.to_raw())
    }

    /// Creates a color or depth-stencil render target.
    pub fn create_render_target(
        &mut self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetHandle, ResourceError> {
        self.resources
            .create_render_target(self.device.as_ref(), descriptor)
    }

    /// Destroys a render target. Stale handles are ignored.
    pub fn destroy_render_target(&mut self, handle: RenderTargetHandle) -> bool {
        let destroyed = self
            .resources
            .destroy_render_target(self.device.as_ref(), handle);
        self.resource_destroyed(destroyed, "render target", handle.to_raw())
    }

    /// Compiles a shader program.
    pub fn create_program(
        &mut self,
        descriptor: &ProgramDescriptor,
    ) -> Result<ProgramHandle, ResourceError> {
        self.resources.create_program(self.device.as_ref(), descriptor)
    }

    /// Destroys a shader program. Stale handles are ignored.
    pub fn destroy_program(&mut self, handle: ProgramHandle) -> bool {
        let destroyed = self.resources.destroy_program(self.device.as_ref(), handle);
        self.resource_destroyed(destroyed, "program", handle.to_raw())
    }

    fn resource_destroyed(&mut self, destroyed: bool, kind: &'static str, raw: u64) -> bool {
        if destroyed {
            self.events.emit(&RenderEvent::ResourceDestroyed { kind, raw });
        }
        destroyed
    }

    // --- Pipelines and bindings ---

    /// Returns the pipeline matching `desc`, compiling it on a miss.
    pub fn create_pipeline(&mut self, desc: &GraphicsPipelineDesc) -> Result<PipelineId, RenderError> {
        let scratch = self
            .arenas
            .get_mut(self.scratch)
            .map_err(ResourceError::from)?;
        let (id, outcome) =
            self.pipelines
                .create_graphics(self.device.as_ref(), &self.resources, scratch, desc)?;
        Self::record_pipeline(&mut self.stats, &mut self.events, id, outcome);
        Ok(id)
    }

    /// Returns the binding of `resources` for `pipeline`, creating it on a miss.
    pub fn create_srb(
        &mut self,
        pipeline: PipelineId,
        resources: &[ResourceBinding],
    ) -> Result<SrbId, RenderError> {
        let (id, outcome) =
            self.srbs
                .create(self.device.as_ref(), &self.pipelines, pipeline, resources)?;
        Self::record_srb(&mut self.stats, &mut self.events, id, outcome);
        Ok(id)
    }

    /// Rebinds some variables of a binding in place. See [`SrbCache::update`].
    ///
    /// Commands baked against `id` keep using it and see the new objects. If
    /// the context holds the binding, the next flush commits it again.
    pub fn update_srb(&mut self, id: SrbId, resources: &[ResourceBinding]) -> Result<SrbId, RenderError> {
        let (srb, outcome) = self.srbs.update(self.device.as_ref(), id, resources)?;
        match outcome {
            CacheOutcome::Updated => {
                self.stats.srb_updates += 1;
                self.state.invalidate_srb(srb);
                self.events.emit(&RenderEvent::SrbUpdated(srb));
            }
            CacheOutcome::Hit | CacheOutcome::Created => self.stats.srb_cache_hits += 1,
        }
        Ok(srb)
    }

    /// Number of cached pipelines.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Number of cached resource bindings.
    pub fn srb_count(&self) -> usize {
        self.srbs.len()
    }

    fn record_pipeline(
        stats: &mut RenderStats,
        events: &mut ObserverList<RenderEvent>,
        id: PipelineId,
        outcome: CacheOutcome,
    ) {
        if outcome == CacheOutcome::Created {
            stats.pipeline_cache_misses += 1;
            events.emit(&RenderEvent::PipelineCreated(id));
        } else {
            stats.pipeline_cache_hits += 1;
        }
    }

    fn record_srb(
        stats: &mut RenderStats,
        events: &mut ObserverList<RenderEvent>,
        id: SrbId,
        outcome: CacheOutcome,
    ) {
        if outcome == CacheOutcome::Created {
            stats.srb_cache_misses += 1;
            events.emit(&RenderEvent::SrbCreated(id));
        } else {
            stats.srb_cache_hits += 1;
        }
    }

    // --- Commands ---

    /// Sets the targets [`begin`](Self::begin) seeds new commands with while
    /// no command is in use.
    pub fn set_default_render_targets(
        &mut self,
        color: &[RenderTargetHandle],
        depth: Option<RenderTargetHandle>,
    ) {
        let count = color.len().min(MAX_RENDER_TARGETS);
        self.default_command.render_targets = color[..count].to_vec();
        self.default_command.depth_target = depth;
    }

    /// Opens a builder seeded with the state of the command last used.
    ///
    /// Falls back to the default state when nothing was used since creation
    /// or the last [`reset_states`](Self::reset_states).
    pub fn begin(&self) -> RenderCommandBuilder {
        match self.state.current() {
            Some(current) => RenderCommandBuilder::fresh(current),
            None => RenderCommandBuilder::fresh(&self.default_command),
        }
    }

    /// Opens a builder seeded with a baked command.
    ///
    /// The baked command stays in the table; [`end`](Self::end) bakes the
    /// edited state as a separate command.
    pub fn begin_update(&self, id: CommandId) -> Result<RenderCommandBuilder, RenderError> {
        let baked = self
            .commands
            .get(id)
            .ok_or_else(|| ResourceError::invalid("render command", id.0))?;
        Ok(RenderCommandBuilder::from_baked(baked))
    }

    /// Bakes the builder into an immutable command and returns its id.
    ///
    /// Declared texture slots left empty are bound to the dummy texture. If a
    /// command with the same content is already baked, its id is returned and
    /// nothing is created.
    ///
    /// # Errors
    ///
    /// * [`RenderError::IncompleteCommand`] if no program was set.
    /// * [`RenderError::ResourceError`] if a handle is stale, a cache or the
    ///   command table is full, or the device refused to create an object.
    pub fn end(&mut self, builder: RenderCommandBuilder) -> Result<CommandId, RenderError> {
        let mut command = builder.into_command();
        let program_handle = command
            .program
            .ok_or(RenderError::IncompleteCommand("shader program"))?;
        let program = self.resources.program(program_handle)?;

        command.fill_unbound_slots(program, self.resources.dummy_texture());
        command.compute_hashes();
        let id = command.id();

        if self.commands.contains(id) {
            log::trace!("Renderer: {:?} already baked", id);
            self.stats.commands_reused += 1;
            self.events.emit(&RenderEvent::CommandReused(id));
            return Ok(id);
        }

        let pipeline = match command.pipeline.filter(|p| self.pipelines.contains(*p)) {
            Some(pipeline) => pipeline,
            None => {
                let formats = command
                    .render_targets
                    .iter()
                    .map(|rt| self.resources.render_target(*rt).map(|entry| entry.format))
                    .collect::<Result<Vec<_>, _>>()?;
                let depth_stencil_format = match command.depth_target {
                    Some(rt) => self.resources.render_target(rt)?.format,
                    None => TextureFormat::Unknown,
                };
                let desc = GraphicsPipelineDesc {
                    name: command.pipeline_name.as_deref().unwrap_or(&program.name),
                    program: program_handle,
                    render_target_formats: &formats,
                    depth_stencil_format,
                    topology: command.topology,
                    cull_mode: command.cull_mode,
                    blend: command.blend,
                    depth_enabled: command.depth_enabled,
                    stencil_enabled: command.stencil_enabled,
                    wireframe: command.wireframe,
                };
                let scratch = self
                    .arenas
                    .get_mut(self.scratch)
                    .map_err(ResourceError::from)?;
                let (pipeline, outcome) = self.pipelines.create_graphics(
                    self.device.as_ref(),
                    &self.resources,
                    scratch,
                    &desc,
                )?;
                Self::record_pipeline(&mut self.stats, &mut self.events, pipeline, outcome);
                command.pipeline = Some(pipeline);
                command.srb = None;
                pipeline
            }
        };

        if !command.srb.is_some_and(|srb| self.srbs.contains(srb)) {
            let bindings = command.resource_bindings(program, &self.resources)?;
            let (srb, outcome) =
                self.srbs
                    .create(self.device.as_ref(), &self.pipelines, pipeline, &bindings)?;
            Self::record_srb(&mut self.stats, &mut self.events, srb, outcome);
            command.srb = Some(srb);
        }

        let id = self.commands.insert(Arc::new(command))?;
        self.stats.commands_baked += 1;
        self.events.emit(&RenderEvent::CommandBaked(id));
        log::debug!("Renderer: baked {:?} ({} commands)", id, self.commands.len());
        Ok(id)
    }

    /// Removes a baked command. An unknown id is ignored.
    ///
    /// A command currently in use stays applied until another one replaces it.
    pub fn destroy_command(&mut self, id: CommandId) -> bool {
        if self.commands.remove(id).is_some() {
            self.events.emit(&RenderEvent::CommandDestroyed(id));
            true
        } else {
            log::warn!("Renderer: destroy of unknown command {:?}", id);
            false
        }
    }

    /// The baked command behind `id`.
    pub fn command(&self, id: CommandId) -> Option<Arc<RenderCommand>> {
        self.commands.get(id).cloned()
    }

    /// Number of baked commands.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    // --- Submission ---

    /// Makes a baked command the one the next draw applies.
    ///
    /// Returns `false`, with a warning, if `id` is not baked.
    pub fn use_command(&mut self, id: CommandId) -> bool {
        match self.commands.get(id) {
            Some(command) => {
                self.state.use_command(Arc::clone(command));
                true
            }
            None => {
                log::warn!("Renderer: use of unknown command {:?}", id);
                false
            }
        }
    }

    /// Aspects of the command in use that the next flush will send.
    pub fn dirty(&self) -> DirtyFlags {
        self.state.dirty()
    }

    /// Sends the state of the command in use that differs from the context.
    pub fn flush(&mut self) -> Result<(), RenderError> {
        self.state
            .flush(
                self.context.as_mut(),
                &self.resources,
                &self.pipelines,
                &self.srbs,
                &mut self.stats,
            )
            .map(|_| ())
    }

    /// Flushes and issues a non-indexed draw.
    pub fn draw(&mut self, attribs: &DrawAttribs) -> Result<(), RenderError> {
        self.flush()?;
        self.context.draw(attribs);
        self.stats.draw_calls += 1;
        Ok(())
    }

    /// Flushes and issues an indexed draw.
    ///
    /// # Errors
    ///
    /// [`RenderError::IncompleteCommand`] if the command in use has no index
    /// buffer, plus everything [`flush`](Self::flush) reports.
    pub fn draw_indexed(&mut self, attribs: &DrawIndexedAttribs) -> Result<(), RenderError> {
        let current = self.state.current().ok_or(RenderError::NoActiveCommand)?;
        if current.index_buffer().is_none() {
            return Err(RenderError::IncompleteCommand("index buffer"));
        }
        self.flush()?;
        self.context.draw_indexed(attribs);
        self.stats.draw_calls += 1;
        Ok(())
    }

    /// Forgets what the context holds and restores the default command.
    ///
    /// Call at pass or frame boundaries, or after something else touched the
    /// device context.
    pub fn reset_states(&mut self) {
        self.state.reset();
        self.default_command = RenderCommand::default();
        self.events.emit(&RenderEvent::StatesReset);
    }

    // --- Observation ---

    /// Registers a listener for [`RenderEvent`]s.
    pub fn subscribe<F>(&mut self, listener: F) -> ObserverToken
    where
        F: FnMut(&RenderEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    /// Removes a listener. Returns `false` for an unknown token.
    pub fn unsubscribe(&mut self, token: ObserverToken) -> bool {
        self.events.unsubscribe(token)
    }

    /// Counters accumulated since the last [`reset_stats`](Self::reset_stats).
    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// Clears the counters and advances the frame number.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.state.reset();
        self.commands.clear();
        self.srbs.clear(self.device.as_ref());
        self.pipelines.clear(self.device.as_ref());
        self.resources.destroy_all(self.device.as_ref());
        log::debug!("Renderer: released every backend object");
    }
}
