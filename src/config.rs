//! Registry configuration

use serde::{Deserialize, Serialize};

use crate::core::block::BUILTIN_PARAMS;

/// Settings for a [`BlockRegistry`](crate::core::registry::BlockRegistry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Constructor parameters never exposed as configurable
    pub builtin_params: Vec<String>,
    /// Whether `Any` outputs may be wired into concretely typed inputs
    pub any_as_source: bool,
}

impl RegistryConfig {
    /// Parse a configuration from JSON, filling omitted fields with defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replace the builtin parameter names
    pub fn with_builtin_params<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.builtin_params = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the `Any`-as-source policy
    pub fn with_any_as_source(mut self, enabled: bool) -> Self {
        self.any_as_source = enabled;
        self
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            builtin_params: BUILTIN_PARAMS.iter().map(|name| name.to_string()).collect(),
            any_as_source: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed
    #[error("Invalid registry configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
