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

//! Buffer, texture and render-target descriptors.

use super::enums::{ResourceType, TextureDimension, TextureFormat};
use super::ids::{BackendBufferId, BackendRenderTargetId, BackendTextureId};
use crate::strata_bitflags;

strata_bitflags! {
    /// How a buffer is going to be used by the pipeline.
    pub struct BufferUsage: u32 {
        /// Bound as a vertex stream.
        const VERTEX = 1 << 0;
        /// Bound as an index stream.
        const INDEX = 1 << 1;
        /// Bound as a constant buffer.
        const UNIFORM = 1 << 2;
        /// Written by the CPU through map / unmap.
        const MAP_WRITE = 1 << 3;
    }
}

/// Describes a GPU buffer to create.
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// Size of the buffer in bytes.
    pub size: u64,
    /// Allowed usages.
    pub usage: BufferUsage,
}

/// Describes a sampled texture to create.
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// Texture layout.
    pub dimension: TextureDimension,
    /// Pixel format.
    pub format: TextureFormat,
    /// Width in texels.
    pub width: u32,
    /// Height in texels.
    pub height: u32,
}

/// Describes a color or depth-stencil render target to create.
#[derive(Debug, Clone)]
pub struct RenderTargetDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// Pixel format. Depth formats create a depth-stencil target.
    pub format: TextureFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// The backend object bound to a shader variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundObject {
    /// A sampled texture.
    Texture(BackendTextureId),
    /// A constant buffer.
    Buffer(BackendBufferId),
    /// A render target sampled as a texture.
    RenderTarget(BackendRenderTargetId),
}

impl BoundObject {
    /// The kind of resource this object is bound as.
    pub const fn resource_type(&self) -> ResourceType {
        match self {
            BoundObject::Texture(_) => ResourceType::Texture,
            BoundObject::Buffer(_) => ResourceType::ConstantBuffer,
            BoundObject::RenderTarget(_) => ResourceType::RenderTarget,
        }
    }

    /// Raw backend id, for hashing and logging.
    pub const fn raw(&self) -> u64 {
        match self {
            BoundObject::Texture(id) => id.0,
            BoundObject::Buffer(id) => id.0,
            BoundObject::RenderTarget(id) => id.0,
        }
    }
}

/// A single shader variable assignment inside a shader-resource-binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceBinding<'a> {
    /// The variable name declared by the shader program.
    pub name: &'a str,
    /// The object bound to it.
    pub object: BoundObject,
}
