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

use super::{CommandId, RenderCommand};
use ahash::AHashMap;
use std::sync::Arc;
use strata_core::renderer::ResourceError;

/// Baked commands keyed by their content id.
#[derive(Debug)]
pub struct CommandTable {
    commands: AHashMap<CommandId, Arc<RenderCommand>>,
    capacity: usize,
}

impl CommandTable {
    /// Creates an empty table holding at most `capacity` commands.
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: AHashMap::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// The baked command behind `id`.
    pub fn get(&self, id: CommandId) -> Option<&Arc<RenderCommand>> {
        self.commands.get(&id)
    }

    /// Whether `id` is baked.
    pub fn contains(&self, id: CommandId) -> bool {
        self.commands.contains_key(&id)
    }

    /// Stores a baked command under its id.
    ///
    /// # Errors
    ///
    /// [`ResourceError::CapacityExceeded`] if the table is full.
    pub fn insert(&mut self, command: Arc<RenderCommand>) -> Result<CommandId, ResourceError> {
        let id = command.id();
        if !self.commands.contains_key(&id) && self.commands.len() >= self.capacity {
            return Err(ResourceError::CapacityExceeded {
                what: "render command table",
                capacity: self.capacity,
            });
        }
        self.commands.insert(id, command);
        Ok(id)
    }

    /// Removes a command, returning it if it was present.
    pub fn remove(&mut self, id: CommandId) -> Option<Arc<RenderCommand>> {
        self.commands.remove(&id)
    }

    /// Number of baked commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// `true` if no command is baked.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Removes every command.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::renderer::api::Viewport;

    fn baked(width: u32) -> Arc<RenderCommand> {
        let mut command = RenderCommand {
            viewport: Some(Viewport::full(width, width)),
            ..RenderCommand::default()
        };
        command.compute_hashes();
        Arc::new(command)
    }

    #[test]
    fn full_table_rejects_new_ids_only() {
        let mut table = CommandTable::new(1);
        let id = table.insert(baked(1)).unwrap();

        assert_eq!(table.insert(baked(1)), Ok(id));
        assert!(matches!(
            table.insert(baked(2)),
            Err(ResourceError::CapacityExceeded { capacity: 1, .. })
        ));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let mut table = CommandTable::new(4);
        let id = table.insert(baked(3)).unwrap();

        assert!(table.remove(id).is_some());
        assert!(table.remove(id).is_none());
        assert!(table.is_empty());
    }
}
