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

//! Provides the backend-agnostic rendering contracts of the state-deduplication core.
//!
//! This module is the "common language" between the caching layer in
//! `strata-render` and whatever actually talks to the GPU. It contains the
//! abstract [`GraphicsDevice`] and [`DeviceContext`] traits, the descriptors
//! passed through them, and the error taxonomy. Concrete backends (the
//! headless recorder in `strata-infra`, or a real GPU API) implement the traits.

pub mod api;
pub mod error;
pub mod traits;

pub use self::api::*;
pub use self::error::{RenderError, ResourceError};
pub use self::traits::{DeviceContext, GraphicsDevice};
