//! Engine configuration (understudy.toml)
//!
//! ```toml
//! [naming]
//! mock_prefix = "MockObject_"
//! stub_prefix = "TestStub_"
//! intersection_prefix = "Intersection_"
//!
//! [defaults]
//! allow_unknown_types = false
//! autoload = true
//! return_value_generation = true
//!
//! [events]
//! report_deprecations = true
//! ```
//!
//! Every key is optional.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::naming::is_valid_identifier;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Validation error
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub naming: NamingConfig,
    pub defaults: DefaultsConfig,
    pub events: EventsConfig,
}

/// Prefixes of generated type names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NamingConfig {
    pub mock_prefix: String,
    pub stub_prefix: String,
    pub intersection_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            mock_prefix: "MockObject_".to_string(),
            stub_prefix: "TestStub_".to_string(),
            intersection_prefix: "Intersection_".to_string(),
        }
    }
}

/// Defaults applied to requests that do not override them
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Double names that resolve to no type instead of failing
    pub allow_unknown_types: bool,
    /// Let lookups load types through the registry's loader
    pub autoload: bool,
    /// Generate default return values for unconfigured methods
    pub return_value_generation: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            allow_unknown_types: false,
            autoload: true,
            return_value_generation: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EventsConfig {
    /// Emit deprecation notices to the event reporter
    pub report_deprecations: bool,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            report_deprecations: true,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefixes = [
            ("mock_prefix", &self.naming.mock_prefix),
            ("stub_prefix", &self.naming.stub_prefix),
            ("intersection_prefix", &self.naming.intersection_prefix),
        ];
        for (key, prefix) in prefixes {
            if !is_valid_identifier(prefix) {
                return Err(ConfigError::ValidationError(format!(
                    "naming.{} must be a non-empty identifier, got {:?}",
                    key, prefix
                )));
            }
        }
        if self.naming.mock_prefix == self.naming.stub_prefix {
            return Err(ConfigError::ValidationError(
                "naming.mock_prefix and naming.stub_prefix must differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Write configuration to a file
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
