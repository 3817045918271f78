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

//! Render commands: mutable builders, immutable baked commands and the table
//! that stores them by content.
//!
//! A command bundles every piece of draw state the context differ needs. Its
//! identity is the combination of seven per-aspect hashes, so two commands
//! built independently from the same values share one [`CommandId`] and one
//! table entry.

mod builder;
mod table;

pub use self::builder::RenderCommandBuilder;
pub use self::table::CommandTable;

use crate::pipeline_cache::PipelineId;
use crate::resources::{
    BufferHandle, ProgramHandle, RenderTargetHandle, ResourceRegistry, ShaderProgram, TextureHandle,
};
use crate::srb_cache::SrbId;
use std::collections::BTreeMap;
use strata_core::hash::ContentHasher;
use strata_core::renderer::api::*;
use strata_core::renderer::ResourceError;
use strata_data::Entity;

/// Identifies a baked command: the combination of its aspect hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(pub u32);

/// An object bound to a resource slot of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotBinding {
    /// A sampled texture.
    Texture(TextureHandle),
    /// A constant buffer.
    ConstantBuffer(BufferHandle),
    /// A render target sampled as a texture.
    RenderTarget(RenderTargetHandle),
}

impl SlotBinding {
    fn resource_type(&self) -> ResourceType {
        match self {
            SlotBinding::Texture(_) => ResourceType::Texture,
            SlotBinding::ConstantBuffer(_) => ResourceType::ConstantBuffer,
            SlotBinding::RenderTarget(_) => ResourceType::RenderTarget,
        }
    }

    fn raw(&self) -> u64 {
        match self {
            SlotBinding::Texture(h) => h.to_raw(),
            SlotBinding::ConstantBuffer(h) => h.to_raw(),
            SlotBinding::RenderTarget(h) => h.to_raw(),
        }
    }

    fn resolve(&self, resources: &ResourceRegistry) -> Result<BoundObject, ResourceError> {
        Ok(match *self {
            SlotBinding::Texture(h) => BoundObject::Texture(resources.texture_backend(h)?),
            SlotBinding::ConstantBuffer(h) => BoundObject::Buffer(resources.buffer_backend(h)?),
            SlotBinding::RenderTarget(h) => {
                BoundObject::RenderTarget(resources.render_target_backend(h)?)
            }
        })
    }
}

/// The index stream of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBinding {
    /// Index buffer.
    pub buffer: BufferHandle,
    /// Byte offset of the first index.
    pub offset: u64,
    /// Index width.
    pub format: IndexFormat,
}

/// Per-aspect content hashes of a command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandHashes {
    /// Color and depth targets.
    pub render_targets: u32,
    /// Vertex buffer handles.
    pub vertex_buffers: u32,
    /// Vertex buffer offsets.
    pub vertex_offsets: u32,
    /// Index buffer, offset and format.
    pub index_buffer: u32,
    /// Explicit viewport, or the marker for a derived one.
    pub viewport: u32,
    /// Objects bound to resource slots.
    pub textures: u32,
    /// Program, pipeline name and fixed-function state.
    pub graphics_state: u32,
}

impl CommandHashes {
    /// The command id these hashes add up to.
    pub fn overall(&self) -> CommandId {
        CommandId(
            ContentHasher::new()
                .write_raw(self.render_targets)
                .write_raw(self.vertex_buffers)
                .write_raw(self.vertex_offsets)
                .write_raw(self.index_buffer)
                .write_raw(self.viewport)
                .write_raw(self.textures)
                .write_raw(self.graphics_state)
                .finish(),
        )
    }
}

/// A bundle of draw state.
///
/// While owned by a [`RenderCommandBuilder`] the command is mutable. Once
/// baked it is shared behind an `Arc` and never changes again.
#[derive(Debug, Clone)]
pub struct RenderCommand {
    pub(crate) render_targets: Vec<RenderTargetHandle>,
    pub(crate) depth_target: Option<RenderTargetHandle>,
    pub(crate) vertex_buffers: Vec<BufferHandle>,
    pub(crate) vertex_offsets: Vec<u64>,
    pub(crate) index_buffer: Option<IndexBinding>,
    pub(crate) viewport: Option<Viewport>,
    pub(crate) program: Option<ProgramHandle>,
    pub(crate) pipeline_name: Option<String>,
    pub(crate) topology: PrimitiveTopology,
    pub(crate) cull_mode: CullMode,
    pub(crate) blend: BlendMode,
    pub(crate) depth_enabled: bool,
    pub(crate) stencil_enabled: bool,
    pub(crate) wireframe: bool,
    pub(crate) bindings: BTreeMap<u32, SlotBinding>,
    pub(crate) pipeline: Option<PipelineId>,
    pub(crate) srb: Option<SrbId>,
    pub(crate) hashes: CommandHashes,
}

impl Default for RenderCommand {
    fn default() -> Self {
        Self {
            render_targets: Vec::new(),
            depth_target: None,
            vertex_buffers: Vec::new(),
            vertex_offsets: Vec::new(),
            index_buffer: None,
            viewport: None,
            program: None,
            pipeline_name: None,
            topology: PrimitiveTopology::default(),
            cull_mode: CullMode::default(),
            blend: BlendMode::default(),
            depth_enabled: true,
            stencil_enabled: false,
            wireframe: false,
            bindings: BTreeMap::new(),
            pipeline: None,
            srb: None,
            hashes: CommandHashes::default(),
        }
    }
}

impl RenderCommand {
    /// The command id. Only meaningful once baked.
    pub fn id(&self) -> CommandId {
        self.hashes.overall()
    }

    /// Per-aspect hashes. Only meaningful once baked.
    pub fn hashes(&self) -> &CommandHashes {
        &self.hashes
    }

    /// Color targets in slot order.
    pub fn render_targets(&self) -> &[RenderTargetHandle] {
        &self.render_targets
    }

    /// Depth-stencil target.
    pub fn depth_target(&self) -> Option<RenderTargetHandle> {
        self.depth_target
    }

    /// Vertex streams, bound from slot 0.
    pub fn vertex_buffers(&self) -> &[BufferHandle] {
        &self.vertex_buffers
    }

    /// One byte offset per vertex stream.
    pub fn vertex_offsets(&self) -> &[u64] {
        &self.vertex_offsets
    }

    /// Index stream.
    pub fn index_buffer(&self) -> Option<IndexBinding> {
        self.index_buffer
    }

    /// Explicit viewport; `None` derives it from the bound render target.
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Shader program.
    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }

    /// Pipeline name override; `None` uses the program name.
    pub fn pipeline_name(&self) -> Option<&str> {
        self.pipeline_name.as_deref()
    }

    /// Primitive topology.
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Face culling.
    pub fn cull_mode(&self) -> CullMode {
        self.cull_mode
    }

    /// Color blending.
    pub fn blend(&self) -> BlendMode {
        self.blend
    }

    /// Depth testing.
    pub fn depth_enabled(&self) -> bool {
        self.depth_enabled
    }

    /// Stencil testing.
    pub fn stencil_enabled(&self) -> bool {
        self.stencil_enabled
    }

    /// Wireframe fill.
    pub fn wireframe(&self) -> bool {
        self.wireframe
    }

    /// The object bound to resource `slot`.
    pub fn binding(&self, slot: u32) -> Option<SlotBinding> {
        self.bindings.get(&slot).copied()
    }

    /// Resolved pipeline, `None` until baked or after a pipeline-affecting change.
    pub fn pipeline(&self) -> Option<PipelineId> {
        self.pipeline
    }

    /// Resolved resource binding, `None` until baked or after a binding change.
    pub fn srb(&self) -> Option<SrbId> {
        self.srb
    }

    /// Binds `dummy` to every texture-like slot `program` declares but the
    /// command leaves empty. Returns the number of slots filled.
    pub(crate) fn fill_unbound_slots(&mut self, program: &ShaderProgram, dummy: TextureHandle) -> usize {
        let mut filled = 0;
        for resource in &program.resources {
            if resource.resource_type == ResourceType::ConstantBuffer {
                continue;
            }
            self.bindings.entry(resource.slot).or_insert_with(|| {
                log::trace!(
                    "RenderCommand: slot {} ('{}') of '{}' bound to the dummy texture",
                    resource.slot,
                    resource.name,
                    program.name
                );
                filled += 1;
                SlotBinding::Texture(dummy)
            });
        }
        if filled > 0 {
            self.srb = None;
        }
        filled
    }

    /// The binding list for `program`'s declared resources, in declaration order.
    ///
    /// Declared constant buffers with nothing bound are skipped with a warning.
    pub(crate) fn resource_bindings<'p>(
        &self,
        program: &'p ShaderProgram,
        resources: &ResourceRegistry,
    ) -> Result<Vec<ResourceBinding<'p>>, ResourceError> {
        let mut bindings = Vec::with_capacity(program.resources.len());
        for declared in &program.resources {
            let Some(bound) = self.bindings.get(&declared.slot) else {
                log::warn!(
                    "RenderCommand: '{}' declares '{}' at slot {} but nothing is bound",
                    program.name,
                    declared.name,
                    declared.slot
                );
                continue;
            };
            if bound.resource_type() == ResourceType::ConstantBuffer
                && declared.resource_type != ResourceType::ConstantBuffer
            {
                log::warn!(
                    "RenderCommand: constant buffer bound to {:?} slot {} of '{}'",
                    declared.resource_type,
                    declared.slot,
                    program.name
                );
            }
            bindings.push(ResourceBinding {
                name: &declared.name,
                object: bound.resolve(resources)?,
            });
        }
        Ok(bindings)
    }

    /// Fails if an object bound to a resource slot was destroyed since baking.
    pub(crate) fn check_bindings(&self, resources: &ResourceRegistry) -> Result<(), ResourceError> {
        self.bindings
            .values()
            .try_for_each(|bound| bound.resolve(resources).map(|_| ()))
    }

    /// Recomputes every aspect hash from the current field values.
    pub(crate) fn compute_hashes(&mut self) {
        let render_targets = self
            .render_targets
            .iter()
            .fold(ContentHasher::new().write_usize(self.render_targets.len()), |h, rt| {
                h.write_u64(rt.to_raw())
            })
            .write_u64(self.depth_target.map_or(0, Entity::to_raw))
            .finish();

        let vertex_buffers = self
            .vertex_buffers
            .iter()
            .fold(ContentHasher::new().write_usize(self.vertex_buffers.len()), |h, vb| {
                h.write_u64(vb.to_raw())
            })
            .finish();

        let vertex_offsets = self
            .vertex_offsets
            .iter()
            .fold(ContentHasher::new().write_usize(self.vertex_offsets.len()), |h, offset| {
                h.write_u64(*offset)
            })
            .finish();

        let index_buffer = match self.index_buffer {
            Some(ib) => ContentHasher::new()
                .write_bool(true)
                .write_u64(ib.buffer.to_raw())
                .write_u64(ib.offset)
                .write_u32(ib.format.code()),
            None => ContentHasher::new().write_bool(false),
        }
        .finish();

        let viewport = match self.viewport {
            Some(vp) => ContentHasher::new()
                .write_bool(true)
                .write_f32(vp.x)
                .write_f32(vp.y)
                .write_f32(vp.width)
                .write_f32(vp.height)
                .write_f32(vp.min_depth)
                .write_f32(vp.max_depth),
            None => ContentHasher::new().write_bool(false),
        }
        .finish();

        let textures = self
            .bindings
            .iter()
            .fold(ContentHasher::new(), |h, (slot, binding)| {
                h.write_u32(*slot)
                    .write_u32(binding.resource_type().code())
                    .write_u64(binding.raw())
            })
            .finish();

        let graphics_state = ContentHasher::new()
            .write_u64(self.program.map_or(0, Entity::to_raw))
            .write_bool(self.pipeline_name.is_some())
            .write_str(self.pipeline_name.as_deref().unwrap_or_default())
            .write_u32(self.topology.code())
            .write_u32(self.cull_mode.code())
            .write_u32(self.blend.code())
            .write_bool(self.depth_enabled)
            .write_bool(self.stencil_enabled)
            .write_bool(self.wireframe)
            .finish();

        self.hashes = CommandHashes {
            render_targets,
            vertex_buffers,
            vertex_offsets,
            index_buffer,
            viewport,
            textures,
            graphics_state,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashed(mut command: RenderCommand) -> RenderCommand {
        command.compute_hashes();
        command
    }

    #[test]
    fn equal_state_gives_equal_ids() {
        let a = hashed(RenderCommand::default());
        let b = hashed(RenderCommand::default());
        assert_eq!(a.id(), b.id());
        assert_eq!(a.hashes(), b.hashes());
    }

    #[test]
    fn viewport_change_only_touches_the_viewport_aspect() {
        let a = hashed(RenderCommand::default());
        let b = hashed(RenderCommand {
            viewport: Some(Viewport::full(640, 480)),
            ..RenderCommand::default()
        });

        assert_ne!(a.id(), b.id());
        assert_ne!(a.hashes().viewport, b.hashes().viewport);
        assert_eq!(
            CommandHashes {
                viewport: 0,
                ..*a.hashes()
            },
            CommandHashes {
                viewport: 0,
                ..*b.hashes()
            }
        );
    }

    #[test]
    fn offsets_are_a_separate_aspect_from_buffers() {
        let buffer = BufferHandle::from_parts(0, 1);
        let a = hashed(RenderCommand {
            vertex_buffers: vec![buffer],
            vertex_offsets: vec![0],
            ..RenderCommand::default()
        });
        let b = hashed(RenderCommand {
            vertex_buffers: vec![buffer],
            vertex_offsets: vec![64],
            ..RenderCommand::default()
        });

        assert_eq!(a.hashes().vertex_buffers, b.hashes().vertex_buffers);
        assert_ne!(a.hashes().vertex_offsets, b.hashes().vertex_offsets);
    }

    #[test]
    fn binding_kind_is_part_of_the_texture_hash() {
        let mut a = RenderCommand::default();
        a.bindings
            .insert(0, SlotBinding::Texture(TextureHandle::from_parts(0, 1)));
        let mut b = RenderCommand::default();
        b.bindings
            .insert(0, SlotBinding::ConstantBuffer(BufferHandle::from_parts(0, 1)));

        assert_ne!(hashed(a).hashes().textures, hashed(b).hashes().textures);
    }
}
