//! # Schema Loading
//!
//! Reads schema documents from JSON or YAML text. The format is chosen by
//! file extension (`.yaml`/`.yml` is YAML, anything else JSON). Documents
//! are expected to have every `$ref` already resolved.

use std::path::Path;

use serde_json::Value;

use crate::error::LoadError;
use crate::node::Schema;

/// Text format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Pick the format from a file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DocumentFormat::Yaml
            }
            _ => DocumentFormat::Json,
        }
    }
}

/// Parse document text into JSON. `origin` names the source in errors.
pub fn parse_document(text: &str, format: DocumentFormat, origin: &str) -> Result<Value, LoadError> {
    let parse_error = |reason: String| LoadError::Parse {
        origin: origin.to_string(),
        reason,
    };
    match format {
        DocumentFormat::Json => serde_json::from_str(text).map_err(|e| parse_error(e.to_string())),
        DocumentFormat::Yaml => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
            yaml_to_json_value(&yaml).map_err(parse_error)
        }
    }
}

/// Read and parse a document file.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_document(&text, DocumentFormat::from_path(path), &path.display().to_string())
}

/// Interpret a JSON document as a schema.
pub fn parse_schema(document: &Value, origin: &str) -> Result<Schema, LoadError> {
    serde_json::from_value::<Schema>(document.clone()).map_err(|e| LoadError::Parse {
        origin: origin.to_string(),
        reason: e.to_string(),
    })
}

/// Read a schema file, returning the raw document alongside the parsed model.
pub fn load_schema_file(path: &Path) -> Result<(Value, Schema), LoadError> {
    let document = load_document(path)?;
    let schema = parse_schema(&document, &path.display().to_string())?;
    Ok((document, schema))
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped; map keys must be strings, numbers or booleans.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
