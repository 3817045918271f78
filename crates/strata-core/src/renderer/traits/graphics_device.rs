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
use crate::renderer::error::ResourceError;
use std::fmt::Debug;

/// Creates and destroys backend objects.
///
/// The caching layer never holds on to anything a device returns except the
/// opaque ids, and it is the sole owner of their lifetime: every id obtained
/// from a `create_*` call is eventually passed to the matching `destroy_*`.
pub trait GraphicsDevice: Send + Sync + Debug + 'static {
    /// Creates a new GPU buffer.
    /// ## Arguments
    /// * `descriptor` - Size, usage and label of the buffer.
    /// ## Returns
    /// The id of the created buffer.
    /// ## Errors
    /// * `ResourceError` - If the backend could not allocate the buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor) -> Result<BackendBufferId, ResourceError>;

    /// Writes `data` into a buffer at byte `offset`.
    fn write_buffer(&self, id: BackendBufferId, offset: u64, data: &[u8]) -> Result<(), ResourceError>;

    /// Destroys a GPU buffer.
    fn destroy_buffer(&self, id: BackendBufferId) -> Result<(), ResourceError>;

    /// Creates a new sampled texture.
    /// ## Arguments
    /// * `descriptor` - Layout, format and size of the texture.
    /// * `initial_data` - Optional tightly packed texel data for the first mip.
    /// ## Returns
    /// The id of the created texture.
    /// ## Errors
    /// * `ResourceError` - If the backend could not create the texture.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        initial_data: Option<&[u8]>,
    ) -> Result<BackendTextureId, ResourceError>;

    /// Uploads tightly packed texel data covering the whole first mip.
    fn write_texture(&self, id: BackendTextureId, data: &[u8]) -> Result<(), ResourceError>;

    /// Destroys a texture.
    fn destroy_texture(&self, id: BackendTextureId) -> Result<(), ResourceError>;

    /// Creates a color or depth-stencil render target.
    fn create_render_target(
        &self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<BackendRenderTargetId, ResourceError>;

    /// Destroys a render target.
    fn destroy_render_target(&self, id: BackendRenderTargetId) -> Result<(), ResourceError>;

    /// Loads a precompiled shader module.
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor,
    ) -> Result<BackendShaderId, ResourceError>;

    /// Destroys a shader module.
    fn destroy_shader_module(&self, id: BackendShaderId) -> Result<(), ResourceError>;

    /// Compiles a graphics pipeline state object.
    /// ## Arguments
    /// * `info` - The full pipeline description, including the input layout
    ///   and resource layout derived from the shader program.
    /// ## Returns
    /// The id of the compiled pipeline.
    /// ## Errors
    /// * `ResourceError` - If the backend produced no pipeline object.
    fn create_pipeline(&self, info: &PipelineCreateInfo) -> Result<BackendPipelineId, ResourceError>;

    /// Destroys a pipeline state object.
    fn destroy_pipeline(&self, id: BackendPipelineId) -> Result<(), ResourceError>;

    /// Creates a shader-resource-binding for `pipeline` and binds `resources`.
    /// ## Errors
    /// * `ResourceError` - If the backend produced no binding object.
    fn create_resource_binding(
        &self,
        pipeline: BackendPipelineId,
        resources: &[ResourceBinding],
    ) -> Result<BackendSrbId, ResourceError>;

    /// Rebinds the variables of an existing resource binding in place.
    ///
    /// Only the listed variables are touched; the binding object itself is kept.
    fn update_resource_binding(
        &self,
        srb: BackendSrbId,
        resources: &[ResourceBinding],
    ) -> Result<(), ResourceError>;

    /// Destroys a resource binding.
    fn destroy_resource_binding(&self, id: BackendSrbId) -> Result<(), ResourceError>;
}
