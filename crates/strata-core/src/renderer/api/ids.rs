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

//! Opaque handles to objects owned by the graphics backend.
//!
//! These are what a [`GraphicsDevice`](crate::renderer::GraphicsDevice) hands
//! back on creation. Callers of the renderer never see them: they hold pooled,
//! generation-checked handles instead, and the renderer resolves those to
//! backend ids right before talking to the device.

macro_rules! backend_id {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

backend_id!(
    /// An opaque handle to a GPU buffer.
    BackendBufferId
);
backend_id!(
    /// An opaque handle to a sampled GPU texture.
    BackendTextureId
);
backend_id!(
    /// An opaque handle to a render target (color or depth-stencil view).
    BackendRenderTargetId
);
backend_id!(
    /// An opaque handle to a compiled shader module.
    BackendShaderId
);
backend_id!(
    /// An opaque handle to a compiled graphics pipeline state object.
    BackendPipelineId
);
backend_id!(
    /// An opaque handle to a shader-resource-binding object.
    BackendSrbId
);
