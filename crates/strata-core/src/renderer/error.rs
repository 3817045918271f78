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

//! Defines the hierarchy of error types for the rendering subsystem.
//!
//! Propagation is deliberately asymmetric: operations that *mutate* through a
//! possibly stale handle (destroy, unmap, erase) log a warning and do nothing,
//! while operations that must *read* the underlying object report
//! [`ResourceError::InvalidHandle`], because a missing backend object cannot
//! be substituted silently.

use crate::memory::MemoryError;
use std::fmt;

/// An error related to the creation, lookup or use of a pooled resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A pool, cache or table already holds its maximum number of entries.
    CapacityExceeded {
        /// What kind of container overflowed.
        what: &'static str,
        /// Its fixed capacity.
        capacity: usize,
    },
    /// A handle or id is out of range, stale, or unknown to the container.
    InvalidHandle {
        /// What kind of resource the handle was supposed to reference.
        what: &'static str,
        /// The raw handle value, for diagnostics.
        raw: u64,
    },
    /// The graphics device refused to create a backend object.
    BackendCreationFailed {
        /// What kind of object was being created.
        what: &'static str,
        /// Details reported by the backend.
        details: String,
    },
    /// The requested resource kind is not supported yet.
    NotImplemented(&'static str),
    /// An arena allocation backing a temporary description failed.
    Memory(MemoryError),
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl ResourceError {
    /// Shorthand for [`ResourceError::InvalidHandle`].
    pub fn invalid(what: &'static str, raw: impl Into<u64>) -> Self {
        ResourceError::InvalidHandle {
            what,
            raw: raw.into(),
        }
    }
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::CapacityExceeded { what, capacity } => {
                write!(f, "{what} capacity exceeded (capacity {capacity})")
            }
            ResourceError::InvalidHandle { what, raw } => {
                write!(f, "Invalid {what} handle: {raw:#x}")
            }
            ResourceError::BackendCreationFailed { what, details } => {
                write!(f, "Backend failed to create {what}: {details}")
            }
            ResourceError::NotImplemented(what) => write!(f, "Not implemented: {what}"),
            ResourceError::Memory(err) => write!(f, "Arena error: {err}"),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Memory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MemoryError> for ResourceError {
    fn from(err: MemoryError) -> Self {
        ResourceError::Memory(err)
    }
}

/// A high-level error raised while submitting work through the renderer.
///
/// Any of these aborts the current draw; the caller decides whether the rest
/// of the frame is still worth rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A draw or flush was requested while no baked command is in use.
    NoActiveCommand,
    /// A command lacks state required for the requested operation.
    IncompleteCommand(&'static str),
    /// An error occurred while resolving or creating a resource.
    ResourceError(ResourceError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NoActiveCommand => {
                write!(f, "No render command is in use; call use_command first.")
            }
            RenderError::IncompleteCommand(missing) => {
                write!(f, "Render command has no {missing}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            RenderError::NoActiveCommand | RenderError::IncompleteCommand(_) => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

impl From<MemoryError> for RenderError {
    fn from(err: MemoryError) -> Self {
        RenderError::ResourceError(err.into())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn resource_error_display() {
        let err = ResourceError::CapacityExceeded {
            what: "buffer pool",
            capacity: 4,
        };
        assert_eq!(format!("{err}"), "buffer pool capacity exceeded (capacity 4)");

        let err = ResourceError::invalid("texture", 0x0102u32);
        assert_eq!(format!("{err}"), "Invalid texture handle: 0x102");
    }

    #[test]
    fn memory_error_is_wrapped_with_source() {
        let err: ResourceError = MemoryError::OutOfOrderRelease {
            offset: 0,
            expected: 64,
        }
        .into();
        assert_eq!(
            format!("{err}"),
            "Arena error: Scratch release out of order: got offset 0, expected 64"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn render_error_chains_to_resource_error() {
        let render_err: RenderError = ResourceError::BackendCreationFailed {
            what: "pipeline",
            details: "null object".to_string(),
        }
        .into();
        assert_eq!(
            format!("{render_err}"),
            "Graphics resource operation failed: Backend failed to create pipeline: null object"
        );
        assert!(render_err.source().is_some());
        assert!(RenderError::NoActiveCommand.source().is_none());
    }
}
