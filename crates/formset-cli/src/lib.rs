//! # formset-cli: Formset Command-Line Interface
//!
//! Runs the schema layer over files so form artifacts can be inspected,
//! generated at build time, or checked in CI.
//!
//! ## Subcommands
//!
//! - `defaults`: synthesized initial form value
//! - `constraints`: HTML5-style input attributes
//! - `shape`: error-tree topology
//! - `digest`: content digest of a schema under the active configuration
//! - `validate`: validate a submission and print the error tree
//! - `diff`: paths at which two data documents differ
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the `render_*` functions, which are
//!   pure and return the text to print.
//! - Handler functions delegate to the domain crates; no business logic here.

pub mod diff;
pub mod schema;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use formset_schema::{load_schema_file, EngineConfig, Schema};
use serde_json::Value;

/// Output encoding for documents printed to stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

/// Encode `value` for printing.
pub fn render(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("failed to encode JSON"),
        OutputFormat::Yaml => {
            let text = serde_yaml::to_string(value).context("failed to encode YAML")?;
            Ok(text.trim_end().to_string())
        }
    }
}

/// Load the engine configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// Read a schema file, returning the raw document and the parsed model.
pub fn read_schema(path: &Path) -> Result<(Value, Schema)> {
    load_schema_file(path).with_context(|| format!("failed to load schema {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_render_json_is_pretty() {
        let text = render(&json!({"a": 1}), OutputFormat::Json).unwrap();
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_render_yaml_has_no_trailing_newline() {
        let text = render(&json!({"a": 1}), OutputFormat::Yaml).unwrap();
        assert_eq!(text, "a: 1");
    }

    #[test]
    fn test_missing_config_path_gives_defaults() {
        assert_eq!(load_config(None).unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_config_errors_name_the_file() {
        let err = load_config(Some(Path::new("/nonexistent/formset.yaml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/formset.yaml"));
    }

    #[test]
    fn test_read_schema_from_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "type: boolean").unwrap();
        let (document, schema) = read_schema(file.path()).unwrap();
        assert_eq!(document, json!({"type": "boolean"}));
        assert!(!schema.is_bool());
    }
}
