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

//! Content-addressed cache of graphics pipeline state objects.

use crate::resources::{ProgramHandle, ResourceRegistry, ShaderProgram};
use crate::CacheOutcome;
use ahash::AHashMap;
use strata_core::hash::{hash_str, ContentHasher};
use strata_core::renderer::api::*;
use strata_core::renderer::{GraphicsDevice, ResourceError};
use strata_data::allocators::{Arena, ArenaSlice};
use strata_data::Entity;

/// Identifies a cached pipeline. The value is the content hash of its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub u32);

/// Everything that selects a distinct pipeline state object.
#[derive(Debug, Clone, Copy)]
pub struct GraphicsPipelineDesc<'a> {
    /// Debug name. Whether it is part of the identity is configurable.
    pub name: &'a str,
    /// The shader program; its vertex inputs define the input layout.
    pub program: ProgramHandle,
    /// Formats of the color targets, in slot order.
    pub render_target_formats: &'a [TextureFormat],
    /// Depth-stencil format, `Unknown` without a depth target.
    pub depth_stencil_format: TextureFormat,
    /// Primitive assembly.
    pub topology: PrimitiveTopology,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Color blending.
    pub blend: BlendMode,
    /// Depth testing.
    pub depth_enabled: bool,
    /// Stencil testing.
    pub stencil_enabled: bool,
    /// Wireframe fill.
    pub wireframe: bool,
}

impl GraphicsPipelineDesc<'_> {
    /// The content hash of this description.
    ///
    /// `vertex_inputs` comes from the program, `include_name` from
    /// [`RendererConfig::hash_pipeline_names`](crate::RendererConfig::hash_pipeline_names).
    pub fn content_hash(&self, vertex_inputs: VertexElementFlags, include_name: bool) -> u32 {
        let mut hasher = ContentHasher::new();
        if include_name {
            hasher = hasher.write_str(self.name);
        }
        for format in self.render_target_formats {
            hasher = hasher.write_u32(format.code());
        }
        hasher
            .write_u32(self.depth_stencil_format.code())
            .write_usize(self.render_target_formats.len())
            .write_u32(self.topology.code())
            .write_u32(self.cull_mode.code())
            .write_u32(vertex_inputs.bits())
            .write_bool(self.depth_enabled)
            .write_bool(self.wireframe)
            .write_u64(self.program.to_raw())
            .write_u32(self.blend.code())
            .write_bool(self.stencil_enabled)
            .finish()
    }
}

/// A pipeline owned by the cache.
#[derive(Debug, Clone)]
pub struct CachedPipeline {
    /// Backend object.
    pub backend: BackendPipelineId,
    /// Name it was created with.
    pub name: String,
    /// Program it was built from; resource bindings read its declared resources.
    pub program: ProgramHandle,
}

/// Maps pipeline content hashes to backend pipeline objects.
///
/// The cache owns every backend pipeline it creates and is the only place
/// that destroys them.
#[derive(Debug)]
pub struct PipelineCache {
    entries: AHashMap<PipelineId, CachedPipeline>,
    capacity: usize,
    hash_names: bool,
}

impl PipelineCache {
    /// Creates an empty cache holding at most `capacity` pipelines.
    pub fn new(capacity: usize, hash_names: bool) -> Self {
        Self {
            entries: AHashMap::with_capacity(capacity.min(256)),
            capacity,
            hash_names,
        }
    }

    /// Returns the pipeline matching `desc`, compiling it on a miss.
    ///
    /// The temporary input and resource layouts are carved out of `scratch`
    /// and released before returning, whatever the outcome.
    ///
    /// # Errors
    ///
    /// * [`ResourceError::InvalidHandle`] if the program is stale.
    /// * [`ResourceError::CapacityExceeded`] if the cache is full.
    /// * [`ResourceError::BackendCreationFailed`] if the device refused.
    pub fn create_graphics(
        &mut self,
        device: &dyn GraphicsDevice,
        resources: &ResourceRegistry,
        scratch: &mut Arena,
        desc: &GraphicsPipelineDesc,
    ) -> Result<(PipelineId, CacheOutcome), ResourceError> {
        if desc.render_target_formats.len() > MAX_RENDER_TARGETS {
            return Err(ResourceError::CapacityExceeded {
                what: "render target slot",
                capacity: MAX_RENDER_TARGETS,
            });
        }
        let program = resources.program(desc.program)?;
        let id = PipelineId(desc.content_hash(program.vertex_inputs, self.hash_names));

        if self.entries.contains_key(&id) {
            log::trace!("PipelineCache: hit for '{}' ({:?})", desc.name, id);
            return Ok((id, CacheOutcome::Hit));
        }
        if self.entries.len() >= self.capacity {
            return Err(ResourceError::CapacityExceeded {
                what: "pipeline cache",
                capacity: self.capacity,
            });
        }

        let backend = Self::build(device, scratch, program, desc)?;
        self.entries.insert(
            id,
            CachedPipeline {
                backend,
                name: desc.name.to_string(),
                program: desc.program,
            },
        );
        log::debug!("PipelineCache: compiled '{}' as {:?}", desc.name, id);
        Ok((id, CacheOutcome::Created))
    }

    fn build(
        device: &dyn GraphicsDevice,
        scratch: &mut Arena,
        program: &ShaderProgram,
        desc: &GraphicsPipelineDesc,
    ) -> Result<BackendPipelineId, ResourceError> {
        let input_layout =
            scratch.alloc::<VertexElement>(program.vertex_inputs.count() as usize)?;
        let resource_layout = match scratch.alloc::<ResourceLayoutEntry>(program.resources.len()) {
            Ok(slice) => slice,
            Err(err) => {
                scratch.pop(input_layout)?;
                return Err(err.into());
            }
        };

        let created = Self::fill_and_create(
            device,
            scratch,
            &input_layout,
            &resource_layout,
            program,
            desc,
        );

        scratch.pop(resource_layout)?;
        scratch.pop(input_layout)?;
        created
    }

    fn fill_and_create(
        device: &dyn GraphicsDevice,
        scratch: &mut Arena,
        input_layout: &ArenaSlice<VertexElement>,
        resource_layout: &ArenaSlice<ResourceLayoutEntry>,
        program: &ShaderProgram,
        desc: &GraphicsPipelineDesc,
    ) -> Result<BackendPipelineId, ResourceError> {
        for (slot, element) in scratch
            .get_mut(input_layout)?
            .iter_mut()
            .zip(program.vertex_inputs.elements())
        {
            *slot = element;
        }
        for (slot, resource) in scratch
            .get_mut(resource_layout)?
            .iter_mut()
            .zip(&program.resources)
        {
            *slot = ResourceLayoutEntry {
                name_hash: hash_str(&resource.name),
                slot: resource.slot,
                resource_type: resource.resource_type.code(),
                stage: resource.stage.code(),
            };
        }

        let info = PipelineCreateInfo {
            label: desc.name,
            vertex_shader: program.vertex,
            pixel_shader: program.pixel,
            render_target_formats: desc.render_target_formats,
            depth_stencil_format: desc.depth_stencil_format,
            topology: desc.topology,
            cull_mode: desc.cull_mode,
            blend: desc.blend,
            depth_enabled: desc.depth_enabled,
            stencil_enabled: desc.stencil_enabled,
            wireframe: desc.wireframe,
            input_layout: scratch.get(input_layout)?,
            resource_layout: scratch.get(resource_layout)?,
        };
        device
            .create_pipeline(&info)
            .map_err(|e| ResourceError::BackendCreationFailed {
                what: "pipeline",
                details: e.to_string(),
            })
    }

    /// The cached pipeline behind `id`.
    pub fn get(&self, id: PipelineId) -> Result<&CachedPipeline, ResourceError> {
        self.entries
            .get(&id)
            .ok_or_else(|| ResourceError::invalid("pipeline", id.0))
    }

    /// Whether `id` is cached.
    pub fn contains(&self, id: PipelineId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Evicts and destroys a pipeline. An unknown id is logged and ignored.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice, id: PipelineId) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                if let Err(e) = device.destroy_pipeline(entry.backend) {
                    log::error!("PipelineCache: failed to destroy '{}': {}", entry.name, e);
                }
                true
            }
            None => {
                log::warn!("PipelineCache: destroy of unknown pipeline {:?}", id);
                false
            }
        }
    }

    /// Destroys every cached pipeline.
    pub fn clear(&mut self, device: &dyn GraphicsDevice) {
        for (_, entry) in self.entries.drain() {
            if let Err(e) = device.destroy_pipeline(entry.backend) {
                log::error!("PipelineCache: failed to destroy '{}': {}", entry.name, e);
            }
        }
    }

    /// Number of cached pipelines.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
