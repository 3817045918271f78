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

use super::{CommandId, IndexBinding, RenderCommand, SlotBinding};
use crate::resources::{BufferHandle, ProgramHandle, RenderTargetHandle, TextureHandle};
use strata_core::renderer::api::*;

/// Stores `value` into `field` and reports whether it changed.
fn replace_if_changed<T: PartialEq>(field: &mut T, value: T) -> bool {
    if *field == value {
        false
    } else {
        *field = value;
        true
    }
}

/// Accumulates draw state for a command that is not baked yet.
///
/// Obtained from [`Renderer::begin`](crate::Renderer::begin) or
/// [`Renderer::begin_update`](crate::Renderer::begin_update) and consumed by
/// [`Renderer::end`](crate::Renderer::end).
///
/// Setters that change anything the pipeline is built from drop the resolved
/// pipeline (and with it the resolved resource binding), whether or not the
/// resulting hash differs. Resource setters only drop the resolved binding.
#[derive(Debug, Clone)]
pub struct RenderCommandBuilder {
    command: RenderCommand,
    source: Option<CommandId>,
}

impl RenderCommandBuilder {
    pub(crate) fn fresh(defaults: &RenderCommand) -> Self {
        let mut command = defaults.clone();
        command.pipeline = None;
        command.srb = None;
        Self {
            command,
            source: None,
        }
    }

    pub(crate) fn from_baked(baked: &RenderCommand) -> Self {
        Self {
            command: baked.clone(),
            source: Some(baked.id()),
        }
    }

    pub(crate) fn into_command(self) -> RenderCommand {
        self.command
    }

    /// The baked command this builder was seeded from, if any.
    pub fn source(&self) -> Option<CommandId> {
        self.source
    }

    /// The state accumulated so far.
    pub fn command(&self) -> &RenderCommand {
        &self.command
    }

    fn invalidate_pipeline(&mut self) {
        self.command.pipeline = None;
        self.command.srb = None;
    }

    fn invalidate_srb(&mut self) {
        self.command.srb = None;
    }

    /// Binds color targets in slot order.
    pub fn set_rts(&mut self, targets: &[RenderTargetHandle]) -> &mut Self {
        let targets = if targets.len() > MAX_RENDER_TARGETS {
            log::warn!(
                "RenderCommandBuilder: {} render targets requested, keeping the first {}",
                targets.len(),
                MAX_RENDER_TARGETS
            );
            &targets[..MAX_RENDER_TARGETS]
        } else {
            targets
        };
        if self.command.render_targets != targets {
            self.command.render_targets = targets.to_vec();
            self.invalidate_pipeline();
        }
        self
    }

    /// Binds or unbinds the depth-stencil target.
    pub fn set_depth_target(&mut self, target: Option<RenderTargetHandle>) -> &mut Self {
        if replace_if_changed(&mut self.command.depth_target, target) {
            self.invalidate_pipeline();
        }
        self
    }

    /// Binds vertex streams from slot 0. Offsets are reset to zero.
    pub fn set_vbuffers(&mut self, buffers: &[BufferHandle]) -> &mut Self {
        let buffers = if buffers.len() > MAX_VERTEX_BUFFERS {
            log::warn!(
                "RenderCommandBuilder: {} vertex buffers requested, keeping the first {}",
                buffers.len(),
                MAX_VERTEX_BUFFERS
            );
            &buffers[..MAX_VERTEX_BUFFERS]
        } else {
            buffers
        };
        self.command.vertex_buffers = buffers.to_vec();
        self.command.vertex_offsets = vec![0; buffers.len()];
        self
    }

    /// Sets one byte offset per vertex stream.
    pub fn set_vbuffer_offsets(&mut self, offsets: &[u64]) -> &mut Self {
        let count = self.command.vertex_buffers.len();
        if offsets.len() != count {
            log::warn!(
                "RenderCommandBuilder: {} offsets given for {} vertex buffers",
                offsets.len(),
                count
            );
        }
        let mut padded = vec![0; count];
        for (slot, offset) in padded.iter_mut().zip(offsets) {
            *slot = *offset;
        }
        self.command.vertex_offsets = padded;
        self
    }

    /// Binds the index stream.
    pub fn set_ibuffer(&mut self, buffer: BufferHandle, offset: u64, format: IndexFormat) -> &mut Self {
        self.command.index_buffer = Some(IndexBinding {
            buffer,
            offset,
            format,
        });
        self
    }

    /// Unbinds the index stream.
    pub fn clear_ibuffer(&mut self) -> &mut Self {
        self.command.index_buffer = None;
        self
    }

    /// Sets an explicit viewport, or `None` to derive it from the first target.
    pub fn set_viewport(&mut self, viewport: Option<Viewport>) -> &mut Self {
        self.command.viewport = viewport;
        self
    }

    /// Selects the shader program.
    pub fn set_program(&mut self, program: ProgramHandle) -> &mut Self {
        if replace_if_changed(&mut self.command.program, Some(program)) {
            self.invalidate_pipeline();
        }
        self
    }

    /// Overrides the pipeline name, which defaults to the program name.
    pub fn set_pipeline_name(&mut self, name: &str) -> &mut Self {
        if self.command.pipeline_name.as_deref() != Some(name) {
            self.command.pipeline_name = Some(name.to_string());
            self.invalidate_pipeline();
        }
        self
    }

    /// Sets the primitive topology.
    pub fn set_topology(&mut self, topology: PrimitiveTopology) -> &mut Self {
        if replace_if_changed(&mut self.command.topology, topology) {
            self.invalidate_pipeline();
        }
        self
    }

    /// Sets face culling.
    pub fn set_cull(&mut self, cull_mode: CullMode) -> &mut Self {
        if replace_if_changed(&mut self.command.cull_mode, cull_mode) {
            self.invalidate_pipeline();
        }
        self
    }

    /// Sets color blending.
    pub fn set_blend(&mut self, blend: BlendMode) -> &mut Self {
        if replace_if_changed(&mut self.command.blend, blend) {
            self.invalidate_pipeline();
        }
        self
    }

    /// Enables or disables depth testing.
    pub fn set_depth_enabled(&mut self, enabled: bool) -> &mut Self {
        if replace_if_changed(&mut self.command.depth_enabled, enabled) {
            self.invalidate_pipeline();
        }
        self
    }

    /// Enables or disables stencil testing.
    pub fn set_stencil_enabled(&mut self, enabled: bool) -> &mut Self {
        if replace_if_changed(&mut self.command.stencil_enabled, enabled) {
            self.invalidate_pipeline();
        }
        self
    }

    /// Switches between solid and wireframe fill.
    pub fn set_wireframe(&mut self, wireframe: bool) -> &mut Self {
        if replace_if_changed(&mut self.command.wireframe, wireframe) {
            self.invalidate_pipeline();
        }
        self
    }

    fn set_binding(&mut self, slot: u32, binding: SlotBinding) -> &mut Self {
        if self.command.bindings.insert(slot, binding) != Some(binding) {
            self.invalidate_srb();
        }
        self
    }

    /// Binds a texture to resource `slot`.
    pub fn set_texture(&mut self, slot: u32, texture: TextureHandle) -> &mut Self {
        self.set_binding(slot, SlotBinding::Texture(texture))
    }

    /// Binds a constant buffer to resource `slot`.
    pub fn set_constant_buffer(&mut self, slot: u32, buffer: BufferHandle) -> &mut Self {
        self.set_binding(slot, SlotBinding::ConstantBuffer(buffer))
    }

    /// Binds a render target, sampled as a texture, to resource `slot`.
    pub fn set_sampled_target(&mut self, slot: u32, target: RenderTargetHandle) -> &mut Self {
        self.set_binding(slot, SlotBinding::RenderTarget(target))
    }

    /// Unbinds whatever is bound to resource `slot`.
    ///
    /// A declared texture slot left empty is bound to the dummy texture when
    /// the command is baked.
    pub fn clear_texture(&mut self, slot: u32) -> &mut Self {
        if self.command.bindings.remove(&slot).is_some() {
            self.invalidate_srb();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline_cache::PipelineId;
    use crate::srb_cache::SrbId;
    use strata_data::Entity;

    fn resolved() -> RenderCommandBuilder {
        let mut command = RenderCommand::default();
        command.pipeline = Some(PipelineId(1));
        command.srb = Some(SrbId::from_parts(2, 1));
        command.compute_hashes();
        RenderCommandBuilder::from_baked(&command)
    }

    #[test]
    fn fresh_builder_has_nothing_resolved() {
        let mut defaults = RenderCommand::default();
        defaults.pipeline = Some(PipelineId(9));
        let builder = RenderCommandBuilder::fresh(&defaults);
        assert_eq!(builder.command().pipeline(), None);
        assert_eq!(builder.source(), None);
    }

    #[test]
    fn pipeline_setters_drop_the_resolved_pipeline_on_change_only() {
        let mut builder = resolved();
        builder.set_cull(CullMode::Back);
        assert_eq!(builder.command().pipeline(), Some(PipelineId(1)));

        builder.set_cull(CullMode::None);
        assert_eq!(builder.command().pipeline(), None);
        assert_eq!(builder.command().srb(), None);
    }

    #[test]
    fn toggling_back_still_requires_a_rebuild() {
        let mut builder = resolved();
        builder.set_wireframe(true).set_wireframe(false);
        assert_eq!(builder.command().pipeline(), None);
    }

    #[test]
    fn texture_setters_only_drop_the_binding() {
        let mut builder = resolved();
        builder.set_texture(0, TextureHandle::from_parts(0, 1));

        assert_eq!(builder.command().pipeline(), Some(PipelineId(1)));
        assert_eq!(builder.command().srb(), None);
    }

    #[test]
    fn state_only_setters_keep_everything_resolved() {
        let mut builder = resolved();
        let vb = BufferHandle::from_parts(0, 1);
        builder
            .set_vbuffers(&[vb, vb])
            .set_vbuffer_offsets(&[16])
            .set_viewport(Some(Viewport::full(8, 8)));

        assert_eq!(builder.command().vertex_offsets(), &[16, 0]);
        assert_eq!(builder.command().pipeline(), Some(PipelineId(1)));
        assert_eq!(builder.command().srb(), Some(SrbId::from_parts(2, 1)));
    }

    #[test]
    fn extra_render_targets_are_dropped() {
        let mut builder = resolved();
        let targets: Vec<_> = (0..10)
            .map(|i| RenderTargetHandle::from_parts(i, 1))
            .collect();
        builder.set_rts(&targets);
        assert_eq!(builder.command().render_targets().len(), MAX_RENDER_TARGETS);
    }
}
