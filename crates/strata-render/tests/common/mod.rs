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

//! Shared fixture: a renderer over the headless device with one target,
//! one two-texture program and one vertex buffer.

#![allow(dead_code)]

use std::sync::Arc;
use strata_core::renderer::api::*;
use strata_infra::{CallLog, HeadlessContext, HeadlessDevice};
use strata_render::{
    BufferHandle, CommandId, ProgramHandle, RenderCommandBuilder, RenderTargetHandle, Renderer,
    RendererConfig, TextureHandle,
};

pub struct Fixture {
    pub device: HeadlessDevice,
    pub calls: CallLog,
    pub renderer: Renderer,
    pub target: RenderTargetHandle,
    pub program: ProgramHandle,
    pub vertices: BufferHandle,
}

pub const TARGET_WIDTH: u32 = 1280;
pub const TARGET_HEIGHT: u32 = 720;

pub fn fixture() -> Fixture {
    fixture_with(RendererConfig::default())
}

pub fn fixture_with(config: RendererConfig) -> Fixture {
    let _ = env_logger::builder().is_test(true).try_init();

    let device = HeadlessDevice::new();
    let context = HeadlessContext::new();
    let calls = context.log();
    let mut renderer = Renderer::new(Arc::new(device.clone()), Box::new(context), config)
        .expect("renderer over the headless device");

    let target = renderer
        .create_render_target(&RenderTargetDescriptor {
            label: Some("backbuffer"),
            format: TextureFormat::Bgra8UnormSrgb,
            width: TARGET_WIDTH,
            height: TARGET_HEIGHT,
        })
        .unwrap();
    let program = renderer
        .create_program(&ProgramDescriptor {
            name: "lit",
            vertex: ShaderModuleDescriptor {
                label: Some("lit.vs"),
                stage: ShaderStage::Vertex,
                bytecode: &[0x03, 0x02, 0x23, 0x07],
            },
            pixel: ShaderModuleDescriptor {
                label: Some("lit.ps"),
                stage: ShaderStage::Pixel,
                bytecode: &[0x03, 0x02, 0x23, 0x07],
            },
            resources: vec![
                ShaderResourceDesc::texture("albedo", 0),
                ShaderResourceDesc::texture("normal", 1),
            ],
            vertex_inputs: VertexElementFlags::POSITION
                | VertexElementFlags::NORMAL
                | VertexElementFlags::TEXCOORD0,
        })
        .unwrap();
    let vertices = renderer
        .create_buffer(
            &BufferDescriptor {
                label: Some("quad"),
                size: 1024,
                usage: BufferUsage::VERTEX,
            },
            None,
        )
        .unwrap();
    renderer.set_default_render_targets(&[target], None);

    Fixture {
        device,
        calls,
        renderer,
        target,
        program,
        vertices,
    }
}

impl Fixture {
    /// Bakes a command using the fixture program and vertex buffer, after
    /// `edit` had its say.
    pub fn bake(&mut self, edit: impl FnOnce(&mut RenderCommandBuilder)) -> CommandId {
        let mut builder = self.renderer.begin();
        builder.set_program(self.program).set_vbuffers(&[self.vertices]);
        edit(&mut builder);
        self.renderer.end(builder).unwrap()
    }

    pub fn texture(&mut self, texel: u8) -> TextureHandle {
        self.renderer
            .create_texture(
                &TextureDescriptor {
                    label: None,
                    dimension: TextureDimension::D2,
                    format: TextureFormat::Rgba8Unorm,
                    width: 1,
                    height: 1,
                },
                Some(&[texel; 4]),
            )
            .unwrap()
    }
}
