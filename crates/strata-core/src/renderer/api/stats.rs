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

//! Deduplication statistics for the rendering core.

/// Counters describing how much work the caches and the context differ saved.
///
/// All counters are cumulative until [`RenderStats::reset`] is called,
/// typically at a frame boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// A sequential counter for rendered frames.
    pub frame_number: u64,
    /// Draw calls issued to the device context.
    pub draw_calls: u32,
    /// `set_render_targets` calls issued.
    pub render_target_changes: u32,
    /// `set_viewport` calls issued.
    pub viewport_changes: u32,
    /// `set_pipeline` calls issued.
    pub pipeline_changes: u32,
    /// `commit_resources` calls issued.
    pub srb_commits: u32,
    /// `set_vertex_buffers` calls issued.
    pub vertex_buffer_changes: u32,
    /// `set_index_buffer` calls issued.
    pub index_buffer_changes: u32,
    /// Pipeline requests served from the cache.
    pub pipeline_cache_hits: u32,
    /// Pipelines compiled by the device.
    pub pipeline_cache_misses: u32,
    /// Resource-binding requests served from the cache.
    pub srb_cache_hits: u32,
    /// Resource bindings created by the device.
    pub srb_cache_misses: u32,
    /// Resource bindings patched in place.
    pub srb_updates: u32,
    /// Render commands baked into new records.
    pub commands_baked: u32,
    /// `end()` calls answered by an existing baked command.
    pub commands_reused: u32,
}

impl RenderStats {
    /// Total number of state-setting calls issued to the device context.
    pub fn state_changes(&self) -> u32 {
        self.render_target_changes
            + self.viewport_changes
            + self.pipeline_changes
            + self.srb_commits
            + self.vertex_buffer_changes
            + self.index_buffer_changes
    }

    /// Clears every counter and advances the frame number.
    pub fn reset(&mut self) {
        let frame_number = self.frame_number + 1;
        *self = Self {
            frame_number,
            ..Self::default()
        };
    }
}
