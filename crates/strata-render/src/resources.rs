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

//! Pools of backend resources addressed by typed generational handles.

use crate::config::RendererConfig;
use strata_core::renderer::api::*;
use strata_core::renderer::{GraphicsDevice, ResourceError};
use strata_data::{strata_handle, Entity, Pool};

strata_handle! {
    /// A GPU buffer owned by a [`ResourceRegistry`].
    pub struct BufferHandle(u32);
}

strata_handle! {
    /// A sampled texture owned by a [`ResourceRegistry`].
    pub struct TextureHandle(u32);
}

strata_handle! {
    /// A render target owned by a [`ResourceRegistry`].
    pub struct RenderTargetHandle(u32);
}

strata_handle! {
    /// A vertex + pixel shader program owned by a [`ResourceRegistry`].
    pub struct ProgramHandle(u16);
}

/// Texels of the dummy texture bound to declared-but-unbound texture slots.
const DUMMY_TEXEL: [u8; 4] = [0xff; 4];

/// Bookkeeping for a live buffer.
#[derive(Debug)]
pub struct BufferEntry {
    /// Backend object.
    pub id: BackendBufferId,
    /// Size in bytes.
    pub size: u64,
    /// Allowed usages.
    pub usage: BufferUsage,
    /// CPU copy handed out by `map_buffer`, uploaded on `unmap_buffer`.
    staging: Option<Vec<u8>>,
}

impl BufferEntry {
    /// `true` between `map_buffer` and `unmap_buffer`.
    pub fn is_mapped(&self) -> bool {
        self.staging.is_some()
    }
}

/// Bookkeeping for a live texture.
#[derive(Debug, Clone, Copy)]
pub struct TextureEntry {
    /// Backend object.
    pub id: BackendTextureId,
    /// Texel format.
    pub format: TextureFormat,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

/// Bookkeeping for a live render target.
#[derive(Debug, Clone, Copy)]
pub struct RenderTargetEntry {
    /// Backend object.
    pub id: BackendRenderTargetId,
    /// Pixel format; depth formats mark depth-stencil targets.
    pub format: TextureFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A linked vertex + pixel shader pair and what it reads.
#[derive(Debug, Clone)]
pub struct ShaderProgram {
    /// Program name, also the default pipeline name.
    pub name: String,
    /// Vertex stage module.
    pub vertex: BackendShaderId,
    /// Pixel stage module.
    pub pixel: BackendShaderId,
    /// Declared resources, in declaration order.
    pub resources: Vec<ShaderResourceDesc>,
    /// Vertex attributes consumed.
    pub vertex_inputs: VertexElementFlags,
}

fn creation_failed(what: &'static str) -> impl FnOnce(ResourceError) -> ResourceError {
    move |err| ResourceError::BackendCreationFailed {
        what,
        details: err.to_string(),
    }
}

/// Owns every buffer, texture, render target and program of a renderer.
///
/// Read accessors fail with [`ResourceError::InvalidHandle`] on a stale
/// handle. Destruction and unmapping log a warning and do nothing instead.
#[derive(Debug)]
pub struct ResourceRegistry {
    buffers: Pool<BufferHandle, BufferEntry>,
    textures: Pool<TextureHandle, TextureEntry>,
    render_targets: Pool<RenderTargetHandle, RenderTargetEntry>,
    programs: Pool<ProgramHandle, ShaderProgram>,
    dummy_texture: TextureHandle,
}

impl ResourceRegistry {
    /// Creates the pools and the 1x1 white dummy texture.
    pub fn new(device: &dyn GraphicsDevice, config: &RendererConfig) -> Result<Self, ResourceError> {
        let mut registry = Self {
            buffers: Pool::new("buffer", config.max_buffers),
            textures: Pool::new("texture", config.max_textures),
            render_targets: Pool::new("render target", config.max_render_targets),
            programs: Pool::new("program", config.max_programs),
            dummy_texture: TextureHandle::NULL,
        };
        registry.dummy_texture = registry.create_texture(
            device,
            &TextureDescriptor {
                label: Some("dummy white"),
                dimension: TextureDimension::D2,
                format: TextureFormat::Rgba8Unorm,
                width: 1,
                height: 1,
            },
            Some(&DUMMY_TEXEL),
        )?;
        Ok(registry)
    }

    /// The texture bound to texture slots a command leaves empty.
    pub fn dummy_texture(&self) -> TextureHandle {
        self.dummy_texture
    }

    // --- Buffers ---

    /// Creates a buffer, optionally uploading `initial_data` at offset 0.
    pub fn create_buffer(
        &mut self,
        device: &dyn GraphicsDevice,
        descriptor: &BufferDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<BufferHandle, ResourceError> {
        let id = device
            .create_buffer(descriptor)
            .map_err(creation_failed("buffer"))?;
        if let Some(data) = initial_data {
            if let Err(err) = device.write_buffer(id, 0, data) {
                Self::release(device.destroy_buffer(id), "buffer");
                return Err(err);
            }
        }
        let entry = BufferEntry {
            id,
            size: descriptor.size,
            usage: descriptor.usage,
            staging: None,
        };
        self.buffers.push_back(entry).inspect_err(|_| {
            Self::release(device.destroy_buffer(id), "buffer");
        })
    }

    /// The live buffer behind `handle`.
    pub fn buffer(&self, handle: BufferHandle) -> Result<&BufferEntry, ResourceError> {
        self.buffers.fetch(handle)
    }

    /// The backend object of a buffer.
    pub fn buffer_backend(&self, handle: BufferHandle) -> Result<BackendBufferId, ResourceError> {
        self.buffer(handle).map(|entry| entry.id)
    }

    /// Exposes a zeroed CPU copy of the buffer for writing.
    ///
    /// Mapping an already mapped buffer returns the same copy.
    pub fn map_buffer(&mut self, handle: BufferHandle) -> Result<&mut [u8], ResourceError> {
        let error = ResourceError::invalid("buffer", handle);
        let entry = self.buffers.get_mut(handle).ok_or(error)?;
        if !entry.usage.contains(BufferUsage::MAP_WRITE) {
            log::warn!(
                "ResourceRegistry: mapping buffer {:?} created without MAP_WRITE usage",
                handle
            );
        }
        let size = entry.size as usize;
        Ok(entry
            .staging
            .get_or_insert_with(|| vec![0; size])
            .as_mut_slice())
    }

    /// Uploads the mapped copy of a buffer and drops it.
    ///
    /// A stale handle or a buffer that is not mapped is logged and ignored.
    pub fn unmap_buffer(
        &mut self,
        device: &dyn GraphicsDevice,
        handle: BufferHandle,
    ) -> Result<(), ResourceError> {
        let Some(entry) = self.buffers.get_mut(handle) else {
            log::warn!("ResourceRegistry: unmap of stale buffer handle {:?}", handle);
            return Ok(());
        };
        let Some(staging) = entry.staging.take() else {
            log::warn!("ResourceRegistry: unmap of buffer {:?} that is not mapped", handle);
            return Ok(());
        };
        device.write_buffer(entry.id, 0, &staging)
    }

    /// Destroys a buffer. A stale handle is logged and ignored.
    pub fn destroy_buffer(&mut self, device: &dyn GraphicsDevice, handle: BufferHandle) -> bool {
        match self.buffers.erase(handle) {
            Some(entry) => {
                Self::release(device.destroy_buffer(entry.id), "buffer");
                true
            }
            None => {
                log::warn!("ResourceRegistry: destroy of stale buffer handle {:?}", handle);
                false
            }
        }
    }

    // --- Textures ---

    /// Creates a 2D texture.
    ///
    /// # Errors
    ///
    /// Cube and 3D textures are [`ResourceError::NotImplemented`].
    pub fn create_texture(
        &mut self,
        device: &dyn GraphicsDevice,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<TextureHandle, ResourceError> {
        match descriptor.dimension {
            TextureDimension::D2 | TextureDimension::D2Array => {}
            TextureDimension::Cube => return Err(ResourceError::NotImplemented("cube textures")),
            TextureDimension::D3 => return Err(ResourceError::NotImplemented("3D textures")),
        }
        let id = device
            .create_texture(descriptor, initial_data)
            .map_err(creation_failed("texture"))?;
        let entry = TextureEntry {
            id,
            format: descriptor.format,
            width: descriptor.width,
            height: descriptor.height,
        };
        self.textures.push_back(entry).inspect_err(|_| {
            Self::release(device.destroy_texture(id), "texture");
        })
    }

    /// The live texture behind `handle`.
    pub fn texture(&self, handle: TextureHandle) -> Result<&TextureEntry, ResourceError> {
        self.textures.fetch(handle)
    }

    /// The backend object of a texture.
    pub fn texture_backend(&self, handle: TextureHandle) -> Result<BackendTextureId, ResourceError> {
        self.texture(handle).map(|entry| entry.id)
    }

    /// Destroys a texture. Stale handles and the dummy texture are left alone.
    pub fn destroy_texture(&mut self, device: &dyn GraphicsDevice, handle: TextureHandle) -> bool {
        if handle == self.dummy_texture {
            log::warn!("ResourceRegistry: refusing to destroy the dummy texture");
            return false;
        }
        match self.textures.erase(handle) {
            Some(entry) => {
                Self::release(device.destroy_texture(entry.id), "texture");
                true
            }
            None => {
                log::warn!("ResourceRegistry: destroy of stale texture handle {:?}", handle);
                false
            }
        }
    }

    // --- Render targets ---

    /// Creates a color or depth-stencil render target.
    pub fn create_render_target(
        &mut self,
        device: &dyn GraphicsDevice,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetHandle, ResourceError> {
        let id = device
            .create_render_target(descriptor)
            .map_err(creation_failed("render target"))?;
        let entry = RenderTargetEntry {
            id,
            format: descriptor.format,
            width: descriptor.width,
            height: descriptor.height,
        };
        self.render_targets.push_back(entry).inspect_err(|_| {
            Self::release(device.destroy_render_target(id), "render target");
        })
    }

    /// The live render target behind `handle`.
    pub fn render_target(&self, handle: RenderTargetHandle) -> Result<&RenderTargetEntry, ResourceError> {
        self.render_targets.fetch(handle)
    }

    /// The backend object of a render target.
    pub fn render_target_backend(
        &self,
        handle: RenderTargetHandle,
    ) -> Result<BackendRenderTargetId, ResourceError> {
        self.render_target(handle).map(|entry| entry.id)
    }

    /// Destroys a render target. A stale handle is logged and ignored.
    pub fn destroy_render_target(
        &mut self,
        device: &dyn GraphicsDevice,
        handle: RenderTargetHandle,
    ) -> bool {
        match self.render_targets.erase(handle) {
            Some(entry) => {
                Self::release(device.destroy_render_target(entry.id), "render target");
                true
            }
            None => {
                log::warn!(
                    "ResourceRegistry: destroy of stale render target handle {:?}",
                    handle
                );
                false
            }
        }
    }

    // --- Programs ---

    /// Loads both stages of a program.
    pub fn create_program(
        &mut self,
        device: &dyn GraphicsDevice,
        descriptor: &ProgramDescriptor,
    ) -> Result<ProgramHandle, ResourceError> {
        let vertex = device
            .create_shader_module(&descriptor.vertex)
            .map_err(creation_failed("vertex shader"))?;
        let pixel = match device.create_shader_module(&descriptor.pixel) {
            Ok(pixel) => pixel,
            Err(err) => {
                Self::release(device.destroy_shader_module(vertex), "vertex shader");
                return Err(creation_failed("pixel shader")(err));
            }
        };
        let program = ShaderProgram {
            name: descriptor.name.to_string(),
            vertex,
            pixel,
            resources: descriptor.resources.clone(),
            vertex_inputs: descriptor.vertex_inputs,
        };
        self.programs.push_back(program).inspect_err(|_| {
            Self::release(device.destroy_shader_module(vertex), "vertex shader");
            Self::release(device.destroy_shader_module(pixel), "pixel shader");
        })
    }

    /// The live program behind `handle`.
    pub fn program(&self, handle: ProgramHandle) -> Result<&ShaderProgram, ResourceError> {
        self.programs.fetch(handle)
    }

    /// Destroys a program. A stale handle is logged and ignored.
    pub fn destroy_program(&mut self, device: &dyn GraphicsDevice, handle: ProgramHandle) -> bool {
        match self.programs.erase(handle) {
            Some(program) => {
                Self::release(device.destroy_shader_module(program.vertex), "vertex shader");
                Self::release(device.destroy_shader_module(program.pixel), "pixel shader");
                true
            }
            None => {
                log::warn!("ResourceRegistry: destroy of stale program handle {:?}", handle);
                false
            }
        }
    }

    /// Live object counts: buffers, textures, render targets, programs.
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.buffers.len(),
            self.textures.len(),
            self.render_targets.len(),
            self.programs.len(),
        )
    }

    /// Destroys every backend object, the dummy texture included.
    pub fn destroy_all(&mut self, device: &dyn GraphicsDevice) {
        for (_, entry) in self.buffers.drain() {
            Self::release(device.destroy_buffer(entry.id), "buffer");
        }
        for (_, entry) in self.textures.drain() {
            Self::release(device.destroy_texture(entry.id), "texture");
        }
        for (_, entry) in self.render_targets.drain() {
            Self::release(device.destroy_render_target(entry.id), "render target");
        }
        for (_, program) in self.programs.drain() {
            Self::release(device.destroy_shader_module(program.vertex), "vertex shader");
            Self::release(device.destroy_shader_module(program.pixel), "pixel shader");
        }
        self.dummy_texture = TextureHandle::NULL;
    }

    fn release(result: Result<(), ResourceError>, what: &str) {
        if let Err(e) = result {
            log::error!("ResourceRegistry: failed to destroy {}: {}", what, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_infra::HeadlessDevice;

    fn registry(device: &HeadlessDevice) -> ResourceRegistry {
        ResourceRegistry::new(device, &RendererConfig::default()).unwrap()
    }

    fn vertex_buffer(size: u64) -> BufferDescriptor<'static> {
        BufferDescriptor {
            label: None,
            size,
            usage: BufferUsage::VERTEX | BufferUsage::MAP_WRITE,
        }
    }

    #[test]
    fn dummy_texture_is_white() {
        let device = HeadlessDevice::new();
        let registry = registry(&device);
        let id = registry.texture_backend(registry.dummy_texture()).unwrap();
        assert_eq!(device.texture_contents(id), Some(vec![0xff; 4]));
    }

    #[test]
    fn stale_reads_fail_and_stale_destroys_do_not() {
        let device = HeadlessDevice::new();
        let mut registry = registry(&device);
        let buffer = registry.create_buffer(&device, &vertex_buffer(16), None).unwrap();

        assert!(registry.destroy_buffer(&device, buffer));
        assert!(matches!(
            registry.buffer_backend(buffer),
            Err(ResourceError::InvalidHandle { what: "buffer", .. })
        ));
        assert!(!registry.destroy_buffer(&device, buffer));
        assert!(registry.unmap_buffer(&device, buffer).is_ok());
    }

    #[test]
    fn map_then_unmap_uploads_the_copy() {
        let device = HeadlessDevice::new();
        let mut registry = registry(&device);
        let buffer = registry.create_buffer(&device, &vertex_buffer(4), None).unwrap();

        registry.map_buffer(buffer).unwrap().copy_from_slice(&[1, 2, 3, 4]);
        assert!(registry.buffer(buffer).unwrap().is_mapped());
        registry.unmap_buffer(&device, buffer).unwrap();

        let id = registry.buffer_backend(buffer).unwrap();
        assert_eq!(device.buffer_contents(id), Some(vec![1, 2, 3, 4]));
        assert!(!registry.buffer(buffer).unwrap().is_mapped());
    }

    #[test]
    fn unsupported_dimensions_are_not_implemented() {
        let device = HeadlessDevice::new();
        let mut registry = registry(&device);
        let descriptor = TextureDescriptor {
            label: None,
            dimension: TextureDimension::Cube,
            format: TextureFormat::Rgba8Unorm,
            width: 4,
            height: 4,
        };
        assert_eq!(
            registry.create_texture(&device, &descriptor, None),
            Err(ResourceError::NotImplemented("cube textures"))
        );
    }

    #[test]
    fn device_failure_becomes_backend_creation_failed() {
        let device = HeadlessDevice::new();
        let mut registry = registry(&device);
        device.fail_creations("buffer");

        assert!(matches!(
            registry.create_buffer(&device, &vertex_buffer(4), None),
            Err(ResourceError::BackendCreationFailed { what: "buffer", .. })
        ));
        assert_eq!(registry.counts().0, 0);
    }

    #[test]
    fn full_pool_releases_the_backend_object() {
        let device = HeadlessDevice::new();
        let config = RendererConfig {
            max_buffers: 1,
            ..Default::default()
        };
        let mut registry = ResourceRegistry::new(&device, &config).unwrap();
        registry.create_buffer(&device, &vertex_buffer(4), None).unwrap();
        let before = device.live_objects();

        assert!(matches!(
            registry.create_buffer(&device, &vertex_buffer(4), None),
            Err(ResourceError::CapacityExceeded { what: "buffer", .. })
        ));
        assert_eq!(device.live_objects(), before);
    }

    #[test]
    fn dummy_texture_survives_destroy() {
        let device = HeadlessDevice::new();
        let mut registry = registry(&device);
        let dummy = registry.dummy_texture();
        assert!(!registry.destroy_texture(&device, dummy));
        assert!(registry.texture(dummy).is_ok());
    }

    #[test]
    fn destroy_all_leaves_nothing_behind() {
        let device = HeadlessDevice::new();
        let mut registry = registry(&device);
        registry.create_buffer(&device, &vertex_buffer(4), None).unwrap();
        registry
            .create_render_target(
                &device,
                &RenderTargetDescriptor {
                    label: None,
                    format: TextureFormat::Depth32Float,
                    width: 8,
                    height: 8,
                },
            )
            .unwrap();

        registry.destroy_all(&device);
        assert_eq!(device.live_objects(), 0);
        assert_eq!(registry.counts(), (0, 0, 0, 0));
    }
}
