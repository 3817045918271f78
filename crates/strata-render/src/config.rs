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

//! Renderer configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Capacities and behaviour switches of a [`Renderer`](crate::Renderer).
///
/// Every pool and cache is sized once at construction. Missing fields in a
/// RON document fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Maximum number of live buffers.
    pub max_buffers: usize,
    /// Maximum number of live textures, including the dummy texture.
    pub max_textures: usize,
    /// Maximum number of live render targets.
    pub max_render_targets: usize,
    /// Maximum number of live shader programs.
    pub max_programs: usize,
    /// Maximum number of cached pipeline states.
    pub max_pipelines: usize,
    /// Maximum number of cached resource bindings.
    pub max_srbs: usize,
    /// Maximum number of baked render commands.
    pub max_commands: usize,
    /// Initial size of the scratch arena used while building pipelines.
    pub scratch_arena_bytes: usize,
    /// Whether the pipeline name participates in the pipeline content hash.
    ///
    /// When `true`, two pipelines that differ only by name are compiled twice.
    pub hash_pipeline_names: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            max_buffers: 4096,
            max_textures: 4096,
            max_render_targets: 256,
            max_programs: 255,
            max_pipelines: 1024,
            max_srbs: 4096,
            max_commands: 8192,
            scratch_arena_bytes: 16 * 1024,
            hash_pipeline_names: true,
        }
    }
}

/// Errors raised while loading or saving a [`RendererConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The document is not valid RON for this structure.
    Parse(String),
    /// The configuration could not be written as RON.
    Serialize(String),
    /// A value is out of its allowed range.
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(details) => write!(f, "Failed to parse renderer config: {details}"),
            ConfigError::Serialize(details) => {
                write!(f, "Failed to serialize renderer config: {details}")
            }
            ConfigError::Invalid { field, reason } => {
                write!(f, "Invalid renderer config field '{field}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl RendererConfig {
    /// Parses a configuration from a RON document and validates it.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self =
            ron::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Rejects capacities the renderer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let must_hold_one = [
            ("max_textures", self.max_textures),
            ("max_pipelines", self.max_pipelines),
            ("max_srbs", self.max_srbs),
            ("max_commands", self.max_commands),
        ];
        for (field, value) in must_hold_one {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_document_keeps_defaults() {
        let config =
            RendererConfig::from_ron_str("(max_commands: 16, hash_pipeline_names: false)").unwrap();
        assert_eq!(config.max_commands, 16);
        assert!(!config.hash_pipeline_names);
        assert_eq!(config.max_buffers, RendererConfig::default().max_buffers);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = RendererConfig::from_ron_str("(max_pipelines: 0)").unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                field: "max_pipelines",
                reason: "must be at least 1"
            }
        );
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(matches!(
            RendererConfig::from_ron_str("(max_commands: \"many\")"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_and_save_failures_are_told_apart() {
        let load = ConfigError::Parse("expected integer".into());
        let save = ConfigError::Serialize("writer closed".into());
        assert_ne!(load, save);
        assert!(load.to_string().starts_with("Failed to parse"));
        assert!(save.to_string().starts_with("Failed to serialize"));
    }

    #[test]
    fn pretty_output_parses_back() {
        let config = RendererConfig {
            max_srbs: 12,
            ..Default::default()
        };
        let text = config.to_ron_string().unwrap();
        assert_eq!(RendererConfig::from_ron_str(&text).unwrap(), config);
    }
}
