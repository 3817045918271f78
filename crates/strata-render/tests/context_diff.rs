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

//! Integration tests for the context differ, observed through the call log
//! of the headless context.

mod common;

use common::{fixture, TARGET_HEIGHT, TARGET_WIDTH};
use strata_core::renderer::api::*;
use strata_core::renderer::{RenderError, ResourceError};
use strata_infra::ContextCall;
use strata_render::DirtyFlags;

#[test]
fn test_first_draw_applies_state_in_dependency_order() {
    let mut f = fixture();
    let id = f.bake(|_| {});

    assert!(f.renderer.use_command(id));
    f.renderer.draw(&DrawAttribs::vertices(3)).unwrap();

    let calls = f.calls.take();
    assert_eq!(calls.len(), 6, "{calls:#?}");
    assert!(matches!(
        &calls[0],
        ContextCall::SetRenderTargets { color, depth_stencil: None } if color.len() == 1
    ));
    assert_eq!(
        calls[1],
        ContextCall::SetViewport(Viewport::full(TARGET_WIDTH, TARGET_HEIGHT))
    );
    assert!(matches!(calls[2], ContextCall::SetPipeline(_)));
    assert!(matches!(calls[3], ContextCall::CommitResources(_)));
    assert!(matches!(
        calls[4],
        ContextCall::SetVertexBuffers { start_slot: 0, .. }
    ));
    assert_eq!(calls[5], ContextCall::Draw(DrawAttribs::vertices(3)));
    assert_eq!(f.renderer.stats().state_changes(), 5);
}

#[test]
fn test_reusing_the_same_command_sends_no_state() {
    let mut f = fixture();
    let id = f.bake(|_| {});
    f.renderer.use_command(id);
    f.renderer.draw(&DrawAttribs::vertices(3)).unwrap();
    f.calls.clear();

    f.renderer.use_command(id);
    assert!(f.renderer.dirty().is_empty());
    f.renderer.draw(&DrawAttribs::vertices(3)).unwrap();

    assert_eq!(f.calls.take(), vec![ContextCall::Draw(DrawAttribs::vertices(3))]);
}

#[test]
fn test_viewport_only_difference_sends_only_the_viewport() {
    let mut f = fixture();
    let half = Viewport::full(TARGET_WIDTH / 2, TARGET_HEIGHT / 2);
    let a = f.bake(|_| {});
    let b = f.bake(|b| {
        b.set_viewport(Some(half));
    });

    f.renderer.use_command(a);
    f.renderer.draw(&DrawAttribs::vertices(3)).unwrap();
    f.calls.clear();

    f.renderer.use_command(b);
    assert_eq!(f.renderer.dirty(), DirtyFlags::VIEWPORT);
    f.renderer.draw(&DrawAttribs::vertices(3)).unwrap();

    assert_eq!(
        f.calls.take(),
        vec![
            ContextCall::SetViewport(half),
            ContextCall::Draw(DrawAttribs::vertices(3)),
        ]
    );
}

#[test]
fn test_offsets_alone_rebind_the_vertex_streams() {
    let mut f = fixture();
    let a = f.bake(|_| {});
    let b = f.bake(|b| {
        b.set_vbuffer_offsets(&[256]);
    });

    f.renderer.use_command(a);
    f.renderer.flush().unwrap();
    f.calls.clear();

    f.renderer.use_command(b);
    assert_eq!(f.renderer.dirty(), DirtyFlags::VERTEX_OFFSETS);
    f.renderer.flush().unwrap();

    let calls = f.calls.take();
    assert_eq!(calls.len(), 1);
    assert!(matches!(
        &calls[0],
        ContextCall::SetVertexBuffers { offsets, .. } if offsets == &[256]
    ));
}

#[test]
fn test_indexed_draw_binds_the_index_stream() {
    let mut f = fixture();
    let indices = f
        .renderer
        .create_buffer(
            &BufferDescriptor {
                label: Some("indices"),
                size: 64,
                usage: BufferUsage::INDEX,
            },
            None,
        )
        .unwrap();
    let plain = f.bake(|_| {});
    let indexed = f.bake(|b| {
        b.set_ibuffer(indices, 0, IndexFormat::Uint16);
    });

    f.renderer.use_command(plain);
    assert_eq!(
        f.renderer.draw_indexed(&DrawIndexedAttribs::indices(6)),
        Err(RenderError::IncompleteCommand("index buffer"))
    );

    f.renderer.use_command(indexed);
    f.renderer
        .draw_indexed(&DrawIndexedAttribs::indices(6))
        .unwrap();
    let calls = f.calls.take();
    assert!(calls.iter().any(|call| matches!(
        call,
        ContextCall::SetIndexBuffer {
            format: IndexFormat::Uint16,
            ..
        }
    )));
    assert_eq!(
        calls.last(),
        Some(&ContextCall::DrawIndexed(DrawIndexedAttribs::indices(6)))
    );
}

#[test]
fn test_reset_states_forces_a_full_resend() {
    let mut f = fixture();
    let id = f.bake(|_| {});
    f.renderer.use_command(id);
    f.renderer.draw(&DrawAttribs::vertices(3)).unwrap();
    f.calls.clear();

    f.renderer.reset_states();
    assert_eq!(
        f.renderer.draw(&DrawAttribs::vertices(3)),
        Err(RenderError::NoActiveCommand)
    );

    f.renderer.use_command(id);
    assert_eq!(f.renderer.dirty(), DirtyFlags::ALL);
    f.renderer.draw(&DrawAttribs::vertices(3)).unwrap();
    assert_eq!(f.calls.state_changes(), 5);
}

#[test]
fn test_stats_count_draws_and_reset_per_frame() {
    let mut f = fixture();
    let id = f.bake(|_| {});
    f.renderer.use_command(id);
    for _ in 0..3 {
        f.renderer.draw(&DrawAttribs::vertices(3)).unwrap();
    }

    let stats = f.renderer.stats().clone();
    assert_eq!(stats.draw_calls, 3);
    assert_eq!(stats.pipeline_changes, 1);

    f.renderer.reset_stats();
    assert_eq!(f.renderer.stats().draw_calls, 0);
    assert_eq!(f.renderer.stats().frame_number, stats.frame_number + 1);
}

#[test]
fn test_destroyed_texture_is_never_committed() {
    let mut f = fixture();
    let albedo = f.texture(0x40);
    let id = f.bake(|b| {
        b.set_texture(0, albedo);
    });
    assert!(f.renderer.destroy_texture(albedo));

    f.renderer.use_command(id);
    assert!(matches!(
        f.renderer.draw(&DrawAttribs::vertices(3)),
        Err(RenderError::ResourceError(ResourceError::InvalidHandle { what: "texture", .. }))
    ));
    assert!(f
        .calls
        .calls()
        .iter()
        .all(|call| !matches!(call, ContextCall::CommitResources(_)) && !call.is_draw()));
    assert!(f.renderer.dirty().contains(DirtyFlags::SRB));
}
