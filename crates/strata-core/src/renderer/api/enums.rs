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

//! Generic rendering enums.
//!
//! Every enum here carries a stable [`code`](TextureFormat::code) used when the
//! value is folded into a content hash, so that reordering variants in source
//! never silently changes cache keys.

/// Defines the memory format of pixels in a texture or render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFormat {
    /// No format; used for absent render-target slots.
    #[default]
    Unknown,
    /// Four 8-bit unsigned normalized components (RGBA).
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA) in the sRGB color space.
    Rgba8UnormSrgb,
    /// Four 8-bit unsigned normalized components (BGRA) in the sRGB color space.
    Bgra8UnormSrgb,
    /// Four 16-bit float components.
    Rgba16Float,
    /// Four 32-bit float components.
    Rgba32Float,
    /// 32-bit float depth.
    Depth32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24PlusStencil8,
}

impl TextureFormat {
    /// Stable numeric code used in content hashes.
    pub const fn code(self) -> u32 {
        match self {
            TextureFormat::Unknown => 0,
            TextureFormat::Rgba8Unorm => 1,
            TextureFormat::Rgba8UnormSrgb => 2,
            TextureFormat::Bgra8UnormSrgb => 3,
            TextureFormat::Rgba16Float => 4,
            TextureFormat::Rgba32Float => 5,
            TextureFormat::Depth32Float => 6,
            TextureFormat::Depth24PlusStencil8 => 7,
        }
    }

    /// Returns `true` for depth and depth-stencil formats.
    pub const fn is_depth(self) -> bool {
        matches!(
            self,
            TextureFormat::Depth32Float | TextureFormat::Depth24PlusStencil8
        )
    }

    /// Size of one texel in bytes.
    pub const fn bytes_per_texel(self) -> u32 {
        match self {
            TextureFormat::Unknown => 0,
            TextureFormat::Rgba8Unorm
            | TextureFormat::Rgba8UnormSrgb
            | TextureFormat::Bgra8UnormSrgb
            | TextureFormat::Depth32Float
            | TextureFormat::Depth24PlusStencil8 => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }
}

/// The layout of a texture resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureDimension {
    /// A regular 2D texture.
    #[default]
    D2,
    /// An array of 2D layers.
    D2Array,
    /// A six-faced cube map.
    Cube,
    /// A volume texture.
    D3,
}

/// The type of primitives assembled from the vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Consecutive vertices form a connected line strip.
    LineStrip,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Consecutive vertices form a connected triangle strip.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Stable numeric code used in content hashes.
    pub const fn code(self) -> u32 {
        match self {
            PrimitiveTopology::PointList => 0,
            PrimitiveTopology::LineList => 1,
            PrimitiveTopology::LineStrip => 2,
            PrimitiveTopology::TriangleList => 3,
            PrimitiveTopology::TriangleStrip => 4,
        }
    }
}

/// Which triangle faces are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling.
    None,
    /// Discard front faces.
    Front,
    /// Discard back faces.
    #[default]
    Back,
}

impl CullMode {
    /// Stable numeric code used in content hashes.
    pub const fn code(self) -> u32 {
        match self {
            CullMode::None => 0,
            CullMode::Front => 1,
            CullMode::Back => 2,
        }
    }
}

/// Fixed-function blend presets applied to every color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Blending disabled.
    #[default]
    Opaque,
    /// Classic `src * a + dst * (1 - a)`.
    Alpha,
    /// `src + dst`.
    Additive,
    /// `src * (1) + dst * (1 - a)`.
    Premultiplied,
}

impl BlendMode {
    /// Stable numeric code used in content hashes.
    pub const fn code(self) -> u32 {
        match self {
            BlendMode::Opaque => 0,
            BlendMode::Alpha => 1,
            BlendMode::Additive => 2,
            BlendMode::Premultiplied => 3,
        }
    }
}

/// Specifies the data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    #[default]
    Uint32,
}

impl IndexFormat {
    /// Stable numeric code used in content hashes.
    pub const fn code(self) -> u32 {
        match self {
            IndexFormat::Uint16 => 0,
            IndexFormat::Uint32 => 1,
        }
    }
}

/// Defines the programmable stage a shader module is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex shader stage.
    Vertex,
    /// The pixel (fragment) shader stage.
    Pixel,
}

impl ShaderStage {
    /// Stable numeric code used in content hashes.
    pub const fn code(self) -> u32 {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Pixel => 1,
        }
    }
}

/// The kind of resource bound to a shader variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// A sampled texture.
    Texture,
    /// A constant (uniform) buffer.
    ConstantBuffer,
    /// A render target read back as a texture.
    RenderTarget,
}

impl ResourceType {
    /// Stable numeric code used in content hashes.
    pub const fn code(self) -> u32 {
        match self {
            ResourceType::Texture => 0,
            ResourceType::ConstantBuffer => 1,
            ResourceType::RenderTarget => 2,
        }
    }
}
