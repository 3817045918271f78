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

// Strata sandbox
// Renders a few frames of two textured quads through the headless backend and
// prints how much state the caches and the differ saved.

use std::sync::Arc;

use anyhow::{Context, Result};
use strata_core::renderer::api::*;
use strata_infra::{HeadlessContext, HeadlessDevice};
use strata_render::{CommandId, Renderer, RendererConfig, TextureHandle};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 3],
    uv: [f32; 2],
}

const VERTICES: &[Vertex] = &[
    Vertex {
        position: [-0.5, -0.5, 0.0],
        uv: [0.0, 1.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        uv: [1.0, 1.0],
    },
    Vertex {
        position: [0.5, 0.5, 0.0],
        uv: [1.0, 0.0],
    },
    Vertex {
        position: [-0.5, 0.5, 0.0],
        uv: [0.0, 0.0],
    },
];

const INDICES: &[u16] = &[0, 1, 2, 0, 2, 3];

const FRAMES: u32 = 3;

/// Reads the renderer configuration from the RON file named by
/// `STRATA_CONFIG`, or falls back to the defaults.
fn load_config() -> Result<RendererConfig> {
    match std::env::var("STRATA_CONFIG") {
        Ok(path) => {
            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("reading renderer config '{path}'"))?;
            RendererConfig::from_ron_str(&source)
                .with_context(|| format!("parsing renderer config '{path}'"))
        }
        Err(_) => Ok(RendererConfig::default()),
    }
}

fn checker(renderer: &mut Renderer, texel: [u8; 4]) -> Result<TextureHandle> {
    let texels: Vec<u8> = texel.iter().copied().cycle().take(4 * 4 * 4).collect();
    Ok(renderer.create_texture(
        &TextureDescriptor {
            label: Some("checker"),
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            width: 4,
            height: 4,
        },
        Some(texels.as_slice()),
    )?)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let device = HeadlessDevice::new();
    let context = HeadlessContext::new();
    let calls = context.log();
    let mut renderer = Renderer::new(Arc::new(device.clone()), Box::new(context), load_config()?)?;

    let backbuffer = renderer.create_render_target(&RenderTargetDescriptor {
        label: Some("backbuffer"),
        format: TextureFormat::Bgra8UnormSrgb,
        width: 1280,
        height: 720,
    })?;
    let depth = renderer.create_render_target(&RenderTargetDescriptor {
        label: Some("depth"),
        format: TextureFormat::Depth32Float,
        width: 1280,
        height: 720,
    })?;

    let program = renderer.create_program(&ProgramDescriptor {
        name: "textured",
        vertex: ShaderModuleDescriptor {
            label: Some("textured.vs"),
            stage: ShaderStage::Vertex,
            bytecode: b"vs_main",
        },
        pixel: ShaderModuleDescriptor {
            label: Some("textured.ps"),
            stage: ShaderStage::Pixel,
            bytecode: b"ps_main",
        },
        resources: vec![
            ShaderResourceDesc::texture("base_color", 0),
            ShaderResourceDesc::texture("detail", 1),
        ],
        vertex_inputs: VertexElementFlags::POSITION | VertexElementFlags::TEXCOORD0,
    })?;

    let vertices = renderer.create_buffer(
        &BufferDescriptor {
            label: Some("quad vertices"),
            size: std::mem::size_of_val(VERTICES) as u64,
            usage: BufferUsage::VERTEX,
        },
        Some(bytemuck::cast_slice(VERTICES)),
    )?;
    let indices = renderer.create_buffer(
        &BufferDescriptor {
            label: Some("quad indices"),
            size: std::mem::size_of_val(INDICES) as u64,
            usage: BufferUsage::INDEX,
        },
        Some(bytemuck::cast_slice(INDICES)),
    )?;

    let red = checker(&mut renderer, [0xff, 0x20, 0x20, 0xff])?;
    let blue = checker(&mut renderer, [0x20, 0x20, 0xff, 0xff])?;

    let token = renderer.subscribe(|event| log::debug!("Sandbox: {:?}", event));

    for frame in 0..FRAMES {
        renderer.set_default_render_targets(&[backbuffer], Some(depth));

        let mut quads: Vec<CommandId> = Vec::new();
        for (texture, x) in [(red, 0), (blue, 640)] {
            let mut builder = renderer.begin();
            builder
                .set_program(program)
                .set_vbuffers(&[vertices])
                .set_ibuffer(indices, 0, IndexFormat::Uint16)
                .set_texture(0, texture)
                .set_viewport(Some(Viewport {
                    x: x as f32,
                    ..Viewport::full(640, 720)
                }));
            quads.push(renderer.end(builder)?);
        }

        for quad in &quads {
            renderer.use_command(*quad);
            renderer.draw_indexed(&DrawIndexedAttribs::indices(INDICES.len() as u32))?;
        }

        let stats = renderer.stats();
        log::info!(
            "Sandbox: frame {} drew {} quads with {} state calls ({} baked, {} reused, {} context calls)",
            frame,
            stats.draw_calls,
            stats.state_changes(),
            stats.commands_baked,
            stats.commands_reused,
            calls.take().len()
        );
        renderer.reset_stats();
        renderer.reset_states();
    }

    renderer.unsubscribe(token);
    log::info!(
        "Sandbox: {} pipelines, {} bindings, {} commands, {} backend objects alive",
        renderer.pipeline_count(),
        renderer.srb_count(),
        renderer.command_count(),
        device.live_objects()
    );

    drop(renderer);
    log::info!(
        "Sandbox: {} backend objects left after shutdown",
        device.live_objects()
    );
    Ok(())
}
