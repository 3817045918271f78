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

//! Concrete implementations of the `strata-core` backend contracts.
//!
//! The only backend shipped here is a headless one: it creates no GPU objects
//! but keeps a faithful record of everything it was asked to do, which makes it
//! the reference device for tests, benches and the sandbox.

#![warn(missing_docs)]

pub mod graphics;

pub use graphics::headless::{CallLog, ContextCall, HeadlessContext, HeadlessDevice};
