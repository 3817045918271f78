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

//! Vertex layouts and the pipeline creation record handed to the device.

use super::enums::{BlendMode, CullMode, PrimitiveTopology, TextureFormat};
use super::ids::BackendShaderId;
use crate::strata_bitflags;

/// The maximum number of simultaneously bound color targets.
pub const MAX_RENDER_TARGETS: usize = 8;

/// The maximum number of simultaneously bound vertex streams.
pub const MAX_VERTEX_BUFFERS: usize = 8;

strata_bitflags! {
    /// The vertex attributes a shader program consumes.
    ///
    /// Each attribute is fed from its own (non-interleaved) vertex stream; the
    /// stream slot is the rank of the flag among the set flags.
    pub struct VertexElementFlags: u32 {
        /// `float3` position.
        const POSITION = 1 << 0;
        /// `float3` normal.
        const NORMAL = 1 << 1;
        /// `float4` tangent.
        const TANGENT = 1 << 2;
        /// `float4` vertex color.
        const COLOR = 1 << 3;
        /// `float2` first texture coordinate set.
        const TEXCOORD0 = 1 << 4;
        /// `float2` second texture coordinate set.
        const TEXCOORD1 = 1 << 5;
        /// `uint4` skinning joint indices.
        const JOINTS = 1 << 6;
        /// `float4` skinning weights.
        const WEIGHTS = 1 << 7;
    }
}

impl VertexElementFlags {
    /// Number of 32-bit components of a single attribute flag.
    const fn components_of(flag: u32) -> u32 {
        match flag {
            0b0000_0001 | 0b0000_0010 => 3,
            0b0001_0000 | 0b0010_0000 => 2,
            _ => 4,
        }
    }

    /// Derives the input layout for this attribute set.
    ///
    /// Attributes are emitted in bit order; each gets its own buffer slot and
    /// the input index equals the bit position, so shader locations stay stable
    /// whatever subset is enabled.
    pub fn elements(self) -> impl Iterator<Item = VertexElement> {
        let bits = self.bits();
        (0..u32::BITS)
            .filter(move |bit| bits & (1 << bit) != 0)
            .enumerate()
            .map(|(slot, bit)| {
                let components = Self::components_of(1 << bit);
                VertexElement {
                    input_index: bit,
                    buffer_slot: slot as u32,
                    components,
                    offset: 0,
                    stride: components * 4,
                    per_instance: 0,
                }
            })
    }
}

/// One entry of a pipeline input layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexElement {
    /// Shader input location.
    pub input_index: u32,
    /// Vertex stream slot feeding this attribute.
    pub buffer_slot: u32,
    /// Number of 32-bit components.
    pub components: u32,
    /// Byte offset within one vertex of the stream.
    pub offset: u32,
    /// Byte distance between consecutive vertices.
    pub stride: u32,
    /// `1` if the stream advances per instance instead of per vertex.
    pub per_instance: u32,
}

/// One entry of a pipeline resource layout, derived from a program's
/// declared resources.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ResourceLayoutEntry {
    /// Content hash of the variable name.
    pub name_hash: u32,
    /// Binding slot declared by the program.
    pub slot: u32,
    /// [`ResourceType`](super::ResourceType) code.
    pub resource_type: u32,
    /// [`ShaderStage`](super::ShaderStage) code.
    pub stage: u32,
}

/// Everything the device needs to compile a graphics pipeline.
///
/// The layout slices usually point into the renderer's scratch arena and are
/// only valid for the duration of the `create_pipeline` call.
#[derive(Debug, Clone)]
pub struct PipelineCreateInfo<'a> {
    /// Debug name.
    pub label: &'a str,
    /// Vertex shader module.
    pub vertex_shader: BackendShaderId,
    /// Pixel shader module.
    pub pixel_shader: BackendShaderId,
    /// Formats of the bound color targets, in slot order.
    pub render_target_formats: &'a [TextureFormat],
    /// Depth-stencil format, `Unknown` when no depth target is bound.
    pub depth_stencil_format: TextureFormat,
    /// Primitive assembly.
    pub topology: PrimitiveTopology,
    /// Face culling.
    pub cull_mode: CullMode,
    /// Color blending.
    pub blend: BlendMode,
    /// Depth testing and writing.
    pub depth_enabled: bool,
    /// Stencil testing.
    pub stencil_enabled: bool,
    /// Line rasterization instead of solid fill.
    pub wireframe: bool,
    /// Input layout.
    pub input_layout: &'a [VertexElement],
    /// Resource layout.
    pub resource_layout: &'a [ResourceLayoutEntry],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elements_use_one_stream_per_attribute() {
        let flags = VertexElementFlags::POSITION
            | VertexElementFlags::TEXCOORD0
            | VertexElementFlags::WEIGHTS;
        let elements: Vec<_> = flags.elements().collect();

        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].input_index, 0);
        assert_eq!(elements[0].buffer_slot, 0);
        assert_eq!(elements[0].stride, 12);
        assert_eq!(elements[1].input_index, 4);
        assert_eq!(elements[1].buffer_slot, 1);
        assert_eq!(elements[1].components, 2);
        assert_eq!(elements[2].input_index, 7);
        assert_eq!(elements[2].buffer_slot, 2);
        assert_eq!(elements[2].stride, 16);
    }

    #[test]
    fn empty_flags_derive_no_elements() {
        assert_eq!(VertexElementFlags::EMPTY.elements().count(), 0);
    }
}
