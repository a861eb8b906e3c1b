//! # Engine Configuration
//!
//! Knobs that change how schemas are interpreted. Loaded from YAML; every
//! field has a default so an empty document (or no document) is valid.
//!
//! ```yaml
//! defaults:
//!   optional_properties: undefined   # or: fallback (the default)
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// How the default synthesizer treats object properties missing from
/// `required`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionalProperties {
    /// Such properties still receive their type's fallback value (`""`,
    /// `0`, ...). Only a caller-supplied `is_optional` yields `Undefined`.
    #[default]
    Fallback,
    /// Such properties are optional nodes and resolve to `Undefined`
    /// unless they carry a default or are nullable.
    Undefined,
}

/// Default synthesis settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DefaultsConfig {
    /// Treatment of non-required properties.
    pub optional_properties: OptionalProperties,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Default synthesis settings.
    pub defaults: DefaultsConfig,
}

impl EngineConfig {
    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, LoadError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| LoadError::Parse {
            origin: "<inline>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Read and parse a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            LoadError::Parse { reason, .. } => LoadError::Parse {
                origin: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Returns true when non-required properties default to `Undefined`.
    pub fn optional_properties_undefined(&self) -> bool {
        self.defaults.optional_properties == OptionalProperties::Undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(EngineConfig::from_yaml_str("").unwrap(), EngineConfig::default());
        assert_eq!(
            EngineConfig::default().defaults.optional_properties,
            OptionalProperties::Fallback
        );
    }

    #[test]
    fn test_parses_optional_properties() {
        let config = EngineConfig::from_yaml_str("defaults:\n  optional_properties: undefined\n").unwrap();
        assert!(config.optional_properties_undefined());
    }

    #[test]
    fn test_partial_document_keeps_defaults() {
        let config = EngineConfig::from_yaml_str("defaults: {}\n").unwrap();
        assert!(!config.optional_properties_undefined());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = EngineConfig::from_yaml_str("default:\n  optional_properties: undefined\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[test]
    fn test_loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "defaults:\n  optional_properties: undefined").unwrap();
        let config = EngineConfig::from_yaml_file(file.path()).unwrap();
        assert!(config.optional_properties_undefined());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = EngineConfig::from_yaml_file(Path::new("/nonexistent/formset.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
