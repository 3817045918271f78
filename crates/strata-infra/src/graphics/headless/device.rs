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

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use strata_core::renderer::api::*;
use strata_core::renderer::{GraphicsDevice, ResourceError};

/// What the device remembers about a compiled pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPipeline {
    /// Debug label passed at creation.
    pub label: String,
    /// Color target formats.
    pub render_target_formats: Vec<TextureFormat>,
    /// Depth-stencil format.
    pub depth_stencil_format: TextureFormat,
    /// Primitive topology.
    pub topology: PrimitiveTopology,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Wireframe fill.
    pub wireframe: bool,
    /// Input layout, copied out of the caller's scratch memory.
    pub input_layout: Vec<VertexElement>,
    /// Resource layout, copied out of the caller's scratch memory.
    pub resource_layout: Vec<ResourceLayoutEntry>,
}

/// What the device remembers about a resource binding.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSrb {
    /// Pipeline the binding was created for.
    pub pipeline: BackendPipelineId,
    /// Variables bound so far, by name.
    pub bindings: HashMap<String, BoundObject>,
}

#[derive(Debug, Default)]
struct DeviceCounters {
    pipelines_created: AtomicUsize,
    srbs_created: AtomicUsize,
    srb_updates: AtomicUsize,
    buffer_writes: AtomicUsize,
}

#[derive(Debug)]
struct HeadlessDeviceInternal {
    next_id: AtomicU64,
    buffers: Mutex<HashMap<BackendBufferId, Vec<u8>>>,
    textures: Mutex<HashMap<BackendTextureId, Vec<u8>>>,
    render_targets: Mutex<HashMap<BackendRenderTargetId, (TextureFormat, u32, u32)>>,
    shaders: Mutex<HashSet<BackendShaderId>>,
    pipelines: Mutex<HashMap<BackendPipelineId, RecordedPipeline>>,
    srbs: Mutex<HashMap<BackendSrbId, RecordedSrb>>,
    failing: Mutex<HashSet<&'static str>>,
    counters: DeviceCounters,
}

/// A clonable handle to a headless device.
///
/// Clones share the same object tables, so a test can keep one clone for
/// inspection while the renderer owns another.
#[derive(Debug, Clone)]
pub struct HeadlessDevice {
    internal: Arc<HeadlessDeviceInternal>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    /// Creates an empty device.
    pub fn new() -> Self {
        Self {
            internal: Arc::new(HeadlessDeviceInternal {
                next_id: AtomicU64::new(1),
                buffers: Mutex::new(HashMap::new()),
                textures: Mutex::new(HashMap::new()),
                render_targets: Mutex::new(HashMap::new()),
                shaders: Mutex::new(HashSet::new()),
                pipelines: Mutex::new(HashMap::new()),
                srbs: Mutex::new(HashMap::new()),
                failing: Mutex::new(HashSet::new()),
                counters: DeviceCounters::default(),
            }),
        }
    }

    fn next_id(&self) -> u64 {
        self.internal.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check_failure(&self, what: &'static str) -> Result<(), ResourceError> {
        if lock(&self.internal.failing).contains(what) {
            log::debug!("HeadlessDevice: injected failure for {}", what);
            return Err(ResourceError::BackendError(format!(
                "headless device configured to fail {what} creation"
            )));
        }
        Ok(())
    }

    /// Makes every subsequent creation of `what` fail.
    ///
    /// `what` is one of `"buffer"`, `"texture"`, `"render target"`,
    /// `"shader"`, `"pipeline"` or `"resource binding"`.
    pub fn fail_creations(&self, what: &'static str) {
        lock(&self.internal.failing).insert(what);
    }

    /// Undoes [`HeadlessDevice::fail_creations`].
    pub fn restore_creations(&self, what: &'static str) {
        lock(&self.internal.failing).remove(what);
    }

    /// Number of pipelines compiled since creation.
    pub fn pipelines_created(&self) -> usize {
        self.internal.counters.pipelines_created.load(Ordering::Relaxed)
    }

    /// Number of resource bindings created since creation.
    pub fn srbs_created(&self) -> usize {
        self.internal.counters.srbs_created.load(Ordering::Relaxed)
    }

    /// Number of in-place resource binding updates.
    pub fn srb_updates(&self) -> usize {
        self.internal.counters.srb_updates.load(Ordering::Relaxed)
    }

    /// Number of buffer uploads.
    pub fn buffer_writes(&self) -> usize {
        self.internal.counters.buffer_writes.load(Ordering::Relaxed)
    }

    /// A live pipeline's description.
    pub fn pipeline(&self, id: BackendPipelineId) -> Option<RecordedPipeline> {
        lock(&self.internal.pipelines).get(&id).cloned()
    }

    /// A live resource binding's bound variables.
    pub fn srb(&self, id: BackendSrbId) -> Option<RecordedSrb> {
        lock(&self.internal.srbs).get(&id).cloned()
    }

    /// Current contents of a live buffer.
    pub fn buffer_contents(&self, id: BackendBufferId) -> Option<Vec<u8>> {
        lock(&self.internal.buffers).get(&id).cloned()
    }

    /// Current contents of a live texture.
    pub fn texture_contents(&self, id: BackendTextureId) -> Option<Vec<u8>> {
        lock(&self.internal.textures).get(&id).cloned()
    }

    /// Total number of live objects of every kind.
    pub fn live_objects(&self) -> usize {
        let internal = &self.internal;
        lock(&internal.buffers).len()
            + lock(&internal.textures).len()
            + lock(&internal.render_targets).len()
            + lock(&internal.shaders).len()
            + lock(&internal.pipelines).len()
            + lock(&internal.srbs).len()
    }

    fn destroy_in<K, V>(
        table: &Mutex<HashMap<K, V>>,
        id: K,
        what: &'static str,
    ) -> Result<(), ResourceError>
    where
        K: std::hash::Hash + Eq + Copy + Into<u64>,
    {
        lock(table)
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ResourceError::invalid(what, id))
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BackendBufferId, ResourceError> {
        self.check_failure("buffer")?;
        let id = BackendBufferId(self.next_id());
        lock(&self.internal.buffers).insert(id, vec![0; descriptor.size as usize]);
        log::trace!("HeadlessDevice: created buffer {:?} ({:?})", id, descriptor.label);
        Ok(id)
    }

    fn write_buffer(&self, id: BackendBufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError> {
        let mut buffers = lock(&self.internal.buffers);
        let contents = buffers
            .get_mut(&id)
            .ok_or_else(|| ResourceError::invalid("buffer", id))?;
        let start = offset as usize;
        let end = start + data.len();
        if end > contents.len() {
            return Err(ResourceError::BackendError(format!(
                "write of {} bytes at offset {} overflows buffer of {} bytes",
                data.len(),
                offset,
                contents.len()
            )));
        }
        contents[start..end].copy_from_slice(data);
        self.internal
            .counters
            .buffer_writes
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn destroy_buffer(&self, id: BackendBufferId) -> Result<(), ResourceError> {
        Self::destroy_in(&self.internal.buffers, id, "buffer")
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<BackendTextureId, ResourceError> {
        self.check_failure("texture")?;
        let size = descriptor.width as usize
            * descriptor.height as usize
            * descriptor.format.bytes_per_texel() as usize;
        let mut contents = vec![0; size];
        if let Some(data) = initial_data {
            let len = data.len().min(size);
            contents[..len].copy_from_slice(&data[..len]);
        }
        let id = BackendTextureId(self.next_id());
        lock(&self.internal.textures).insert(id, contents);
        log::trace!("HeadlessDevice: created texture {:?} ({:?})", id, descriptor.label);
        Ok(id)
    }

    fn write_texture(&self, id: BackendTextureId, data: &[u8]) -> Result<(), ResourceError> {
        let mut textures = lock(&self.internal.textures);
        let contents = textures
            .get_mut(&id)
            .ok_or_else(|| ResourceError::invalid("texture", id))?;
        let len = data.len().min(contents.len());
        contents[..len].copy_from_slice(&data[..len]);
        Ok(())
    }

    fn destroy_texture(&self, id: BackendTextureId) -> Result<(), ResourceError> {
        Self::destroy_in(&self.internal.textures, id, "texture")
    }

    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<BackendRenderTargetId, ResourceError> {
        self.check_failure("render target")?;
        let id = BackendRenderTargetId(self.next_id());
        lock(&self.internal.render_targets).insert(
            id,
            (descriptor.format, descriptor.width, descriptor.height),
        );
        Ok(id)
    }

    fn destroy_render_target(&self, id: BackendRenderTargetId) -> Result<(), ResourceError> {
        Self::destroy_in(&self.internal.render_targets, id, "render target")
    }

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<BackendShaderId, ResourceError> {
        self.check_failure("shader")?;
        let id = BackendShaderId(self.next_id());
        lock(&self.internal.shaders).insert(id);
        log::trace!(
            "HeadlessDevice: created {:?} shader {:?} ({} bytes)",
            descriptor.stage,
            id,
            descriptor.bytecode.len()
        );
        Ok(id)
    }

    fn destroy_shader_module(&self, id: BackendShaderId) -> Result<(), ResourceError> {
        if lock(&self.internal.shaders).remove(&id) {
            Ok(())
        } else {
            Err(ResourceError::invalid("shader", id))
        }
    }

    fn create_pipeline(&self, info: &PipelineCreateInfo) -> Result<BackendPipelineId, ResourceError> {
        self.check_failure("pipeline")?;
        {
            let shaders = lock(&self.internal.shaders);
            for shader in [info.vertex_shader, info.pixel_shader] {
                if !shaders.contains(&shader) {
                    return Err(ResourceError::invalid("shader", shader));
                }
            }
        }

        let id = BackendPipelineId(self.next_id());
        let recorded = RecordedPipeline {
            label: info.label.to_string(),
            render_target_formats: info.render_target_formats.to_vec(),
            depth_stencil_format: info.depth_stencil_format,
            topology: info.topology,
            cull_mode: info.cull_mode,
            wireframe: info.wireframe,
            input_layout: info.input_layout.to_vec(),
            resource_layout: info.resource_layout.to_vec(),
        };
        lock(&self.internal.pipelines).insert(id, recorded);
        self.internal
            .counters
            .pipelines_created
            .fetch_add(1, Ordering::Relaxed);
        log::trace!("HeadlessDevice: compiled pipeline '{}' as {:?}", info.label, id);
        Ok(id)
    }

    fn destroy_pipeline(&self, id: BackendPipelineId) -> Result<(), ResourceError> {
        Self::destroy_in(&self.internal.pipelines, id, "pipeline")
    }

    fn create_resource_binding(
        &self,
        pipeline: BackendPipelineId,
        resources: &[ResourceBinding],
    ) -> Result<BackendSrbId, ResourceError> {
        self.check_failure("resource binding")?;
        if !lock(&self.internal.pipelines).contains_key(&pipeline) {
            return Err(ResourceError::invalid("pipeline", pipeline));
        }
        let id = BackendSrbId(self.next_id());
        let bindings = resources
            .iter()
            .map(|binding| (binding.name.to_string(), binding.object))
            .collect();
        lock(&self.internal.srbs).insert(id, RecordedSrb { pipeline, bindings });
        self.internal
            .counters
            .srbs_created
            .fetch_add(1, Ordering::Relaxed);
        Ok(id)
    }

    fn update_resource_binding(
        &self,
        srb: BackendSrbId,
        resources: &[ResourceBinding],
    ) -> Result<(), ResourceError> {
        let mut srbs = lock(&self.internal.srbs);
        let recorded = srbs
            .get_mut(&srb)
            .ok_or_else(|| ResourceError::invalid("resource binding", srb))?;
        for binding in resources {
            recorded
                .bindings
                .insert(binding.name.to_string(), binding.object);
        }
        self.internal
            .counters
            .srb_updates
            .fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn destroy_resource_binding(&self, id: BackendSrbId) -> Result<(), ResourceError> {
        Self::destroy_in(&self.internal.srbs, id, "resource binding")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader(device: &HeadlessDevice, stage: ShaderStage) -> BackendShaderId {
        device
            .create_shader_module(&ShaderModuleDescriptor {
                label: None,
                stage,
                bytecode: &[0; 4],
            })
            .unwrap()
    }

    fn pipeline_info<'a>(vs: BackendShaderId, ps: BackendShaderId) -> PipelineCreateInfo<'a> {
        PipelineCreateInfo {
            label: "test",
            vertex_shader: vs,
            pixel_shader: ps,
            render_target_formats: &[TextureFormat::Rgba8Unorm],
            depth_stencil_format: TextureFormat::Unknown,
            topology: PrimitiveTopology::TriangleList,
            cull_mode: CullMode::Back,
            blend: BlendMode::Opaque,
            depth_enabled: false,
            stencil_enabled: false,
            wireframe: false,
            input_layout: &[],
            resource_layout: &[],
        }
    }

    #[test]
    fn ids_are_unique_across_kinds() {
        let device = HeadlessDevice::new();
        let buffer = device
            .create_buffer(&BufferDescriptor {
                label: None,
                size: 16,
                usage: BufferUsage::VERTEX,
            })
            .unwrap();
        let vs = shader(&device, ShaderStage::Vertex);
        assert_ne!(buffer.0, vs.0);
        assert_eq!(device.live_objects(), 2);
    }

    #[test]
    fn buffer_writes_are_bounds_checked() {
        let device = HeadlessDevice::new();
        let buffer = device
            .create_buffer(&BufferDescriptor {
                label: Some("vb"),
                size: 4,
                usage: BufferUsage::VERTEX | BufferUsage::MAP_WRITE,
            })
            .unwrap();

        device.write_buffer(buffer, 1, &[7, 8]).unwrap();
        assert_eq!(device.buffer_contents(buffer), Some(vec![0, 7, 8, 0]));
        assert!(device.write_buffer(buffer, 3, &[1, 2]).is_err());
        assert_eq!(device.buffer_writes(), 1);
    }

    #[test]
    fn injected_failures_surface_as_errors() {
        let device = HeadlessDevice::new();
        let vs = shader(&device, ShaderStage::Vertex);
        let ps = shader(&device, ShaderStage::Pixel);

        device.fail_creations("pipeline");
        assert!(matches!(
            device.create_pipeline(&pipeline_info(vs, ps)),
            Err(ResourceError::BackendError(_))
        ));
        assert_eq!(device.pipelines_created(), 0);

        device.restore_creations("pipeline");
        assert!(device.create_pipeline(&pipeline_info(vs, ps)).is_ok());
    }

    #[test]
    fn srb_update_patches_bindings_in_place() {
        let device = HeadlessDevice::new();
        let vs = shader(&device, ShaderStage::Vertex);
        let ps = shader(&device, ShaderStage::Pixel);
        let pipeline = device.create_pipeline(&pipeline_info(vs, ps)).unwrap();

        let a = BoundObject::Texture(BackendTextureId(100));
        let b = BoundObject::Texture(BackendTextureId(200));
        let srb = device
            .create_resource_binding(pipeline, &[ResourceBinding { name: "albedo", object: a }])
            .unwrap();
        device
            .update_resource_binding(srb, &[ResourceBinding { name: "albedo", object: b }])
            .unwrap();

        let recorded = device.srb(srb).unwrap();
        assert_eq!(recorded.pipeline, pipeline);
        assert_eq!(recorded.bindings.get("albedo"), Some(&b));
        assert_eq!(device.srbs_created(), 1);
        assert_eq!(device.srb_updates(), 1);
    }

    #[test]
    fn destroying_twice_is_an_error() {
        let device = HeadlessDevice::new();
        let vs = shader(&device, ShaderStage::Vertex);
        device.destroy_shader_module(vs).unwrap();
        assert!(matches!(
            device.destroy_shader_module(vs),
            Err(ResourceError::InvalidHandle { what: "shader", .. })
        ));
    }
}
