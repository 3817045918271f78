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

//! Content-addressed cache of shader-resource-bindings.
//!
//! Bindings live in a generational pool, so the [`SrbId`] a command holds
//! stays valid for as long as the binding exists. The content hash is only
//! the lookup key. Unlike pipelines, a binding whose content changed is not
//! rebuilt: the backend object is patched in place and the lookup key moves
//! to the new hash while the handle stays the same.

use crate::pipeline_cache::{PipelineCache, PipelineId};
use crate::CacheOutcome;
use ahash::AHashMap;
use strata_core::hash::{combine, hash_str, hash_u64};
use strata_core::renderer::api::*;
use strata_core::renderer::{GraphicsDevice, ResourceError};
use strata_data::{strata_handle, Pool};

strata_handle! {
    /// A resource binding owned by a [`SrbCache`].
    pub struct SrbId(u32);
}

/// Hashes a pipeline and the objects bound to its variables, in order.
pub fn srb_hash(pipeline: PipelineId, resources: &[ResourceBinding]) -> u32 {
    content_hash(
        pipeline,
        resources.iter().map(|resource| (resource.name, resource.object)),
    )
}

fn content_hash<'a>(
    pipeline: PipelineId,
    resources: impl IntoIterator<Item = (&'a str, BoundObject)>,
) -> u32 {
    resources.into_iter().fold(pipeline.0, |hash, (name, object)| {
        let entry = combine(
            combine(hash_str(name), hash_u64(object.raw())),
            object.resource_type().code(),
        );
        combine(hash, entry)
    })
}

/// A binding owned by the cache.
#[derive(Debug, Clone)]
pub struct CachedSrb {
    /// Backend object.
    pub backend: BackendSrbId,
    /// Pipeline the binding was created for.
    pub pipeline: PipelineId,
    /// Content hash the binding is looked up by.
    pub hash: u32,
    /// Objects currently bound, by variable name, in declaration order.
    pub resources: Vec<(String, BoundObject)>,
}

impl CachedSrb {
    /// The object bound to `name`, if any.
    pub fn bound(&self, name: &str) -> Option<BoundObject> {
        self.resources
            .iter()
            .find(|(bound_name, _)| bound_name == name)
            .map(|(_, object)| *object)
    }

    fn content_hash(&self) -> u32 {
        content_hash(
            self.pipeline,
            self.resources
                .iter()
                .map(|(name, object)| (name.as_str(), *object)),
        )
    }
}

fn owned(resources: &[ResourceBinding]) -> Vec<(String, BoundObject)> {
    resources
        .iter()
        .map(|resource| (resource.name.to_string(), resource.object))
        .collect()
}

/// Owns backend resource-binding objects and finds them by content.
#[derive(Debug)]
pub struct SrbCache {
    entries: Pool<SrbId, CachedSrb>,
    lookup: AHashMap<u32, SrbId>,
}

impl SrbCache {
    /// Creates an empty cache holding at most `capacity` bindings.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Pool::new("resource binding", capacity),
            lookup: AHashMap::with_capacity(capacity.min(256)),
        }
    }

    /// Returns the binding of `resources` for `pipeline`, creating it on a miss.
    ///
    /// # Errors
    ///
    /// * [`ResourceError::InvalidHandle`] if `pipeline` is not cached.
    /// * [`ResourceError::CapacityExceeded`] if the cache is full.
    /// * [`ResourceError::BackendCreationFailed`] if the device refused.
    pub fn create(
        &mut self,
        device: &dyn GraphicsDevice,
        pipelines: &PipelineCache,
        pipeline: PipelineId,
        resources: &[ResourceBinding],
    ) -> Result<(SrbId, CacheOutcome), ResourceError> {
        let hash = srb_hash(pipeline, resources);
        if let Some(&id) = self.lookup.get(&hash) {
            return Ok((id, CacheOutcome::Hit));
        }
        if self.entries.len() >= self.entries.capacity() {
            return Err(ResourceError::CapacityExceeded {
                what: self.entries.label(),
                capacity: self.entries.capacity(),
            });
        }

        let backend_pipeline = pipelines.get(pipeline)?.backend;
        let backend = device
            .create_resource_binding(backend_pipeline, resources)
            .map_err(|e| ResourceError::BackendCreationFailed {
                what: "resource binding",
                details: e.to_string(),
            })?;
        let entry = CachedSrb {
            backend,
            pipeline,
            hash,
            resources: owned(resources),
        };
        let id = self.entries.push_back(entry).inspect_err(|_| {
            if let Err(e) = device.destroy_resource_binding(backend) {
                log::error!("SrbCache: failed to release {:?}: {}", backend, e);
            }
        })?;
        self.lookup.insert(hash, id);
        log::debug!(
            "SrbCache: created {:?} for {:?} ({} resources, key {:#010x})",
            id,
            pipeline,
            resources.len(),
            hash
        );
        Ok((id, CacheOutcome::Created))
    }

    /// Rebinds some variables of an existing binding.
    ///
    /// `resources` may name only the variables that change. The new key is
    /// the hash of the merged list, so a later [`create`](Self::create) with
    /// the same full content finds this entry. If the content is unchanged
    /// nothing happens. Otherwise the backend object is patched in place,
    /// the entry is re-keyed and `id` stays valid. When another entry already
    /// holds the new content, that entry is returned and `id` is left as is.
    ///
    /// # Errors
    ///
    /// [`ResourceError::InvalidHandle`] if `id` is stale.
    pub fn update(
        &mut self,
        device: &dyn GraphicsDevice,
        id: SrbId,
        resources: &[ResourceBinding],
    ) -> Result<(SrbId, CacheOutcome), ResourceError> {
        let entry = self.entries.fetch(id)?;
        let mut patched = entry.clone();
        for resource in resources {
            match patched
                .resources
                .iter_mut()
                .find(|(name, _)| name == resource.name)
            {
                Some((_, object)) => *object = resource.object,
                None => patched
                    .resources
                    .push((resource.name.to_string(), resource.object)),
            }
        }
        let old_hash = entry.hash;
        let new_hash = patched.content_hash();
        if new_hash == old_hash {
            return Ok((id, CacheOutcome::Hit));
        }
        if let Some(&other) = self.lookup.get(&new_hash) {
            return Ok((other, CacheOutcome::Hit));
        }

        device.update_resource_binding(patched.backend, resources)?;

        patched.hash = new_hash;
        self.entries.overwrite(id, patched)?;
        if self.lookup.get(&old_hash) == Some(&id) {
            self.lookup.remove(&old_hash);
        }
        self.lookup.insert(new_hash, id);
        log::debug!(
            "SrbCache: patched {:?} in place, key {:#010x} -> {:#010x}",
            id,
            old_hash,
            new_hash
        );
        Ok((id, CacheOutcome::Updated))
    }

    /// The cached binding behind `id`.
    pub fn get(&self, id: SrbId) -> Result<&CachedSrb, ResourceError> {
        self.entries.fetch(id)
    }

    /// Whether `id` is live.
    pub fn contains(&self, id: SrbId) -> bool {
        self.entries.is_valid(id)
    }

    /// The binding currently keyed by `hash`.
    pub fn find(&self, hash: u32) -> Option<SrbId> {
        self.lookup.get(&hash).copied()
    }

    /// Evicts and destroys a binding. A stale id is logged and ignored.
    pub fn destroy(&mut self, device: &dyn GraphicsDevice, id: SrbId) -> bool {
        match self.entries.erase(id) {
            Some(entry) => {
                if self.lookup.get(&entry.hash) == Some(&id) {
                    self.lookup.remove(&entry.hash);
                }
                if let Err(e) = device.destroy_resource_binding(entry.backend) {
                    log::error!("SrbCache: failed to destroy {:?}: {}", id, e);
                }
                true
            }
            None => {
                log::warn!("SrbCache: destroy of stale resource binding {:?}", id);
                false
            }
        }
    }

    /// Destroys every cached binding.
    pub fn clear(&mut self, device: &dyn GraphicsDevice) {
        self.lookup.clear();
        for (id, entry) in self.entries.drain() {
            if let Err(e) = device.destroy_resource_binding(entry.backend) {
                log::error!("SrbCache: failed to destroy {:?}: {}", id, e);
            }
        }
    }

    /// Number of cached bindings.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RendererConfig;
    use crate::pipeline_cache::GraphicsPipelineDesc;
    use crate::resources::ResourceRegistry;
    use strata_core::memory::ArenaKind;
    use strata_data::allocators::Arena;
    use strata_data::Entity;
    use strata_infra::HeadlessDevice;

    fn setup() -> (HeadlessDevice, PipelineCache, PipelineId) {
        let device = HeadlessDevice::new();
        let mut resources = ResourceRegistry::new(&device, &RendererConfig::default()).unwrap();
        let program = resources
            .create_program(
                &device,
                &ProgramDescriptor {
                    name: "sprite",
                    vertex: ShaderModuleDescriptor {
                        label: None,
                        stage: ShaderStage::Vertex,
                        bytecode: &[],
                    },
                    pixel: ShaderModuleDescriptor {
                        label: None,
                        stage: ShaderStage::Pixel,
                        bytecode: &[],
                    },
                    resources: vec![ShaderResourceDesc::texture("sprite", 0)],
                    vertex_inputs: VertexElementFlags::POSITION,
                },
            )
            .unwrap();
        let mut pipelines = PipelineCache::new(4, true);
        let mut scratch = Arena::new(ArenaKind::Scratch, 64);
        let (pipeline, _) = pipelines
            .create_graphics(
                &device,
                &resources,
                &mut scratch,
                &GraphicsPipelineDesc {
                    name: "sprite",
                    program,
                    render_target_formats: &[TextureFormat::Rgba8Unorm],
                    depth_stencil_format: TextureFormat::Unknown,
                    topology: PrimitiveTopology::TriangleStrip,
                    cull_mode: CullMode::None,
                    blend: BlendMode::Alpha,
                    depth_enabled: false,
                    stencil_enabled: false,
                    wireframe: false,
                },
            )
            .unwrap();
        (device, pipelines, pipeline)
    }

    fn texture(raw: u64) -> [ResourceBinding<'static>; 1] {
        [ResourceBinding {
            name: "sprite",
            object: BoundObject::Texture(BackendTextureId(raw)),
        }]
    }

    #[test]
    fn hash_depends_on_pipeline_name_object_and_order() {
        let p = PipelineId(1);
        let a = ResourceBinding {
            name: "a",
            object: BoundObject::Texture(BackendTextureId(1)),
        };
        let b = ResourceBinding {
            name: "b",
            object: BoundObject::Texture(BackendTextureId(2)),
        };
        let as_buffer = ResourceBinding {
            name: "a",
            object: BoundObject::Buffer(BackendBufferId(1)),
        };

        assert_eq!(srb_hash(p, &[a, b]), srb_hash(p, &[a, b]));
        assert_ne!(srb_hash(p, &[a, b]), srb_hash(p, &[b, a]));
        assert_ne!(srb_hash(p, &[a]), srb_hash(PipelineId(2), &[a]));
        assert_ne!(srb_hash(p, &[a]), srb_hash(p, &[as_buffer]));
    }

    #[test]
    fn same_resources_hit_the_cache() {
        let (device, pipelines, pipeline) = setup();
        let mut cache = SrbCache::new(8);

        let (first, outcome) = cache.create(&device, &pipelines, pipeline, &texture(10)).unwrap();
        assert_eq!(outcome, CacheOutcome::Created);
        let (second, outcome) = cache.create(&device, &pipelines, pipeline, &texture(10)).unwrap();

        assert_eq!(outcome, CacheOutcome::Hit);
        assert_eq!(first, second);
        assert_eq!(device.srbs_created(), 1);
    }

    #[test]
    fn unchanged_update_is_a_no_op() {
        let (device, pipelines, pipeline) = setup();
        let mut cache = SrbCache::new(8);
        let (id, _) = cache.create(&device, &pipelines, pipeline, &texture(10)).unwrap();

        assert_eq!(
            cache.update(&device, id, &texture(10)).unwrap(),
            (id, CacheOutcome::Hit)
        );
        assert_eq!(device.srb_updates(), 0);
    }

    #[test]
    fn changed_update_patches_in_place_and_keeps_the_handle() {
        let (device, pipelines, pipeline) = setup();
        let mut cache = SrbCache::new(8);
        let (id, _) = cache.create(&device, &pipelines, pipeline, &texture(10)).unwrap();
        let backend = cache.get(id).unwrap().backend;

        let (updated, outcome) = cache.update(&device, id, &texture(20)).unwrap();

        assert_eq!(outcome, CacheOutcome::Updated);
        assert_eq!(updated, id);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(id).unwrap().backend, backend);
        assert_eq!(
            cache.get(id).unwrap().bound("sprite"),
            Some(BoundObject::Texture(BackendTextureId(20)))
        );
        assert_eq!(cache.find(srb_hash(pipeline, &texture(10))), None);
        assert_eq!(cache.find(srb_hash(pipeline, &texture(20))), Some(id));
        assert_eq!(device.srbs_created(), 1);
        assert_eq!(device.srb_updates(), 1);
        assert_eq!(
            device.srb(backend).unwrap().bindings.get("sprite"),
            Some(&BoundObject::Texture(BackendTextureId(20)))
        );
    }

    #[test]
    fn partial_update_is_keyed_by_the_merged_content() {
        let (device, pipelines, pipeline) = setup();
        let mut cache = SrbCache::new(8);
        let both = |sprite: u64| {
            [
                ResourceBinding {
                    name: "sprite",
                    object: BoundObject::Texture(BackendTextureId(sprite)),
                },
                ResourceBinding {
                    name: "mask",
                    object: BoundObject::Texture(BackendTextureId(5)),
                },
            ]
        };
        let (id, _) = cache.create(&device, &pipelines, pipeline, &both(10)).unwrap();

        let (updated, _) = cache.update(&device, id, &texture(20)).unwrap();
        assert_eq!(updated, id);

        let (found, outcome) = cache.create(&device, &pipelines, pipeline, &both(20)).unwrap();
        assert_eq!((found, outcome), (id, CacheOutcome::Hit));
        assert_eq!(device.srbs_created(), 1);
    }

    #[test]
    fn update_onto_existing_content_returns_that_entry() {
        let (device, pipelines, pipeline) = setup();
        let mut cache = SrbCache::new(8);
        let (a, _) = cache.create(&device, &pipelines, pipeline, &texture(10)).unwrap();
        let (b, _) = cache.create(&device, &pipelines, pipeline, &texture(20)).unwrap();

        assert_eq!(
            cache.update(&device, a, &texture(20)).unwrap(),
            (b, CacheOutcome::Hit)
        );
        assert_eq!(
            cache.get(a).unwrap().bound("sprite"),
            Some(BoundObject::Texture(BackendTextureId(10)))
        );
        assert_eq!(device.srb_updates(), 0);
    }

    #[test]
    fn destroyed_binding_is_stale_and_its_key_is_free() {
        let (device, pipelines, pipeline) = setup();
        let mut cache = SrbCache::new(8);
        let (id, _) = cache.create(&device, &pipelines, pipeline, &texture(10)).unwrap();

        assert!(cache.destroy(&device, id));
        assert!(!cache.destroy(&device, id));
        assert!(!cache.contains(id));

        let (again, outcome) = cache.create(&device, &pipelines, pipeline, &texture(10)).unwrap();
        assert_eq!(outcome, CacheOutcome::Created);
        assert_ne!(again, id);
    }

    #[test]
    fn update_of_unknown_binding_is_invalid() {
        let (device, _, _) = setup();
        let mut cache = SrbCache::new(8);
        let stale = SrbId::from_parts(3, 42);
        assert!(matches!(
            cache.update(&device, stale, &texture(1)),
            Err(ResourceError::InvalidHandle { what: "resource binding", .. })
        ));
    }

    #[test]
    fn full_cache_rejects_new_content() {
        let (device, pipelines, pipeline) = setup();
        let mut cache = SrbCache::new(1);
        cache.create(&device, &pipelines, pipeline, &texture(1)).unwrap();
        assert!(matches!(
            cache.create(&device, &pipelines, pipeline, &texture(2)),
            Err(ResourceError::CapacityExceeded { what: "resource binding", capacity: 1 })
        ));
        assert_eq!(device.srbs_created(), 1);
    }

    #[test]
    fn unknown_pipeline_is_invalid() {
        let (device, pipelines, _) = setup();
        let mut cache = SrbCache::new(8);
        assert!(matches!(
            cache.create(&device, &pipelines, PipelineId(7), &texture(1)),
            Err(ResourceError::InvalidHandle { what: "pipeline", .. })
        ));
        assert!(cache.is_empty());
    }

    #[test]
    fn backend_failure_is_reported() {
        let (device, pipelines, pipeline) = setup();
        let mut cache = SrbCache::new(8);
        device.fail_creations("resource binding");
        assert!(matches!(
            cache.create(&device, &pipelines, pipeline, &texture(1)),
            Err(ResourceError::BackendCreationFailed { what: "resource binding", .. })
        ));
    }
}
