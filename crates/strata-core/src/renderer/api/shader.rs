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

//! Shader modules and program declarations.
//!
//! Compiling shader source is out of scope: modules arrive as opaque bytecode,
//! and a program merely states which resources and vertex inputs it expects.

use super::enums::{ResourceType, ShaderStage};
use super::pipeline::VertexElementFlags;

/// Describes a shader module handed to the backend as precompiled bytecode.
#[derive(Debug, Clone)]
pub struct ShaderModuleDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// Stage the module is compiled for.
    pub stage: ShaderStage,
    /// Backend-specific bytecode.
    pub bytecode: &'a [u8],
}

/// A resource variable declared by a shader program.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderResourceDesc {
    /// Variable name, used to bind objects into a resource binding.
    pub name: String,
    /// Kind of resource expected.
    pub resource_type: ResourceType,
    /// Binding slot; texture setters on render commands address this slot.
    pub slot: u32,
    /// Stage that reads the variable.
    pub stage: ShaderStage,
}

impl ShaderResourceDesc {
    /// Declares a texture read by the pixel stage.
    pub fn texture(name: impl Into<String>, slot: u32) -> Self {
        Self {
            name: name.into(),
            resource_type: ResourceType::Texture,
            slot,
            stage: ShaderStage::Pixel,
        }
    }
}

/// Describes a vertex + pixel shader program.
#[derive(Debug, Clone)]
pub struct ProgramDescriptor<'a> {
    /// Program name, also used as the default pipeline name.
    pub name: &'a str,
    /// Vertex stage module.
    pub vertex: ShaderModuleDescriptor<'a>,
    /// Pixel stage module.
    pub pixel: ShaderModuleDescriptor<'a>,
    /// Resources the program reads.
    pub resources: Vec<ShaderResourceDesc>,
    /// Vertex attributes the program consumes.
    pub vertex_inputs: VertexElementFlags,
}
