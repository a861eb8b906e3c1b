//! # Default Value Synthesizer
//!
//! Produces the value a form field starts with when no user data exists.
//!
//! Precedence, highest first:
//!
//! 1. An explicit `default`. On an object node a plain-object default is a
//!    per-property override; any other literal is converted by the node's
//!    first type tag.
//! 2. Union branches: exactly one branch with a default wins; several is an
//!    error; none falls through to nullability, then optionality, then the
//!    first branch (object unions deep-merge every branch).
//! 3. Nullable yields `Null`; optional yields `Undefined`.
//! 4. Objects recurse into their properties.
//! 5. Enums yield their first value.
//! 6. The type's fallback (`""`, `0`, `false`, `[]`, `{}`, ...).
//!
//! Synthesis is pure: the same schema yields deep-equal values on every call,
//! except that each synthesized symbol is unique.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use formset_core::{deep_merge, Map, Path, Segment, Value};
use serde_json::Value as Json;

use crate::config::EngineConfig;
use crate::error::{display_path, SchemaError};
use crate::node::{Schema, SchemaNode, TypeTag};
use crate::resolve::{resolve_node, schema_info, SchemaInfo};

/// Default synthesis bound to an engine configuration.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    config: EngineConfig,
}

impl Synthesizer {
    /// A synthesizer using `config`.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Synthesize the default value of a schema position.
    pub fn default_value(
        &self,
        schema: &Schema,
        is_optional: bool,
        path: &Path,
    ) -> Result<Value, SchemaError> {
        let info = schema_info(schema, is_optional, path)?;
        self.synthesize(&info, path)
    }

    fn synthesize_node(
        &self,
        node: &SchemaNode,
        is_optional: bool,
        path: &Path,
    ) -> Result<Value, SchemaError> {
        self.synthesize(&resolve_node(node, is_optional), path)
    }

    fn synthesize(&self, info: &SchemaInfo, path: &Path) -> Result<Value, SchemaError> {
        let schema = &info.schema;

        let mut overrides: Option<&serde_json::Map<String, Json>> = None;
        if let Some(literal) = &schema.default {
            match literal {
                Json::Object(map) if info.has_type(&TypeTag::Object) => overrides = Some(map),
                _ => {
                    let mixes_date_and_number = info.types.len() > 1
                        && info.types.iter().any(TypeTag::is_date)
                        && info.types.iter().any(TypeTag::is_numeric);
                    if mixes_date_and_number {
                        return Err(raise(SchemaError::DateNumberUnion {
                            path: display_path(path),
                        }));
                    }
                    return convert_literal(info.primary_type(), literal, path);
                }
            }
        }

        let mut output: Option<Value> = None;

        if let (None, Some(union)) = (overrides, &info.union) {
            let with_default: Vec<&SchemaNode> =
                union.iter().filter(|branch| branch.default.is_some()).collect();
            match with_default.as_slice() {
                [single] => return self.synthesize_node(single, info.is_optional, path),
                [] => {
                    if info.is_nullable {
                        return Ok(Value::Null);
                    }
                    if info.is_optional {
                        return Ok(Value::Undefined);
                    }
                    if is_multi_type_union(info) {
                        return Err(raise(SchemaError::UnionWithoutDefault {
                            path: display_path(path),
                        }));
                    }
                    if info.primary_type() != Some(&TypeTag::Object) {
                        return self.synthesize_node(&union[0], info.is_optional, path);
                    }
                    let mut merged = Value::object();
                    for branch in union {
                        deep_merge(&mut merged, self.synthesize_node(branch, info.is_optional, path)?);
                    }
                    output = Some(merged);
                }
                many => {
                    return Err(raise(SchemaError::AmbiguousUnionDefault {
                        path: display_path(path),
                        count: many.len(),
                    }))
                }
            }
        }

        if overrides.is_none() {
            if info.is_nullable {
                return Ok(Value::Null);
            }
            if info.is_optional {
                return Ok(Value::Undefined);
            }
        }

        if let Some(properties) = &info.properties {
            let mut object = match output.take() {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            for (key, property) in properties {
                let value = match overrides.and_then(|literal| literal.get(key)) {
                    Some(literal) => Value::from(literal),
                    None => {
                        let optional =
                            self.config.optional_properties_undefined() && !info.is_required(key);
                        let child = path.child(Segment::key(key.as_str()));
                        self.default_value(property, optional, &child)?
                    }
                };
                object.insert(key.clone(), value);
            }
            output = Some(Value::Object(object));
        } else if let Some(literal) = overrides {
            return Ok(Value::from(&Json::Object(literal.clone())));
        }

        if let Some(first) = schema.enum_.as_ref().and_then(|values| values.first()) {
            return Ok(Value::from(first));
        }

        if output.is_none() {
            let basic = basic_types(info);
            if basic.len() > 1 {
                return Err(raise(SchemaError::MultipleTypes {
                    path: display_path(path),
                    types: basic.join(", "),
                }));
            }
        }

        match (output, info.primary_type()) {
            (_, None) => Ok(Value::Undefined),
            (Some(value), _) => Ok(value),
            (None, Some(tag)) => fallback(tag, path),
        }
    }
}

/// Synthesize a default with the default configuration.
pub fn default_value(schema: &Schema, is_optional: bool, path: &Path) -> Result<Value, SchemaError> {
    Synthesizer::default().default_value(schema, is_optional, path)
}

/// Synthesize a default with an explicit configuration.
pub fn default_value_with(
    schema: &Schema,
    is_optional: bool,
    path: &Path,
    config: &EngineConfig,
) -> Result<Value, SchemaError> {
    Synthesizer::new(config.clone()).default_value(schema, is_optional, path)
}

fn raise(err: SchemaError) -> SchemaError {
    tracing::debug!(error = %err, "default synthesis failed");
    err
}

/// Non-format basic types, with `integer` counted as `number`.
fn basic_types(info: &SchemaInfo) -> Vec<&'static str> {
    let mut basic = Vec::new();
    for tag in info.types.iter().filter(|t| !t.is_format()) {
        let name = match tag {
            TypeTag::Integer | TypeTag::Number => "number",
            TypeTag::String => "string",
            TypeTag::Boolean => "boolean",
            TypeTag::Object => "object",
            TypeTag::Array => "array",
            _ => continue,
        };
        if !basic.contains(&name) {
            basic.push(name);
        }
    }
    basic
}

fn is_multi_type_union(info: &SchemaInfo) -> bool {
    let Some(union) = &info.union else {
        return false;
    };
    if union.len() < 2 {
        return false;
    }
    if union.iter().any(|branch| branch.enum_.is_some()) {
        return true;
    }
    let mut kinds: Vec<&TypeTag> = Vec::new();
    for tag in &info.types {
        let kind = match tag {
            TypeTag::Integer | TypeTag::UnixTime => &TypeTag::Number,
            other => other,
        };
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds.len() > 1
}

fn fallback(tag: &TypeTag, path: &Path) -> Result<Value, SchemaError> {
    Ok(match tag {
        TypeTag::String => Value::String(String::new()),
        TypeTag::Number | TypeTag::Integer => Value::Number(0.0),
        TypeTag::Boolean => Value::Bool(false),
        TypeTag::Array => Value::array(),
        TypeTag::Object => Value::object(),
        TypeTag::Null => Value::Null,
        TypeTag::Date | TypeTag::UnixTime | TypeTag::Any => Value::Undefined,
        TypeTag::BigInt => Value::BigInt(0),
        TypeTag::Set => Value::set(Vec::new()),
        TypeTag::Symbol => Value::symbol(None),
        TypeTag::Other(name) => {
            return Err(raise(SchemaError::UnsupportedType {
                path: display_path(path),
                type_name: name.clone(),
            }))
        }
    })
}

/// Convert a default literal according to the node's first type tag.
fn convert_literal(tag: Option<&TypeTag>, literal: &Json, path: &Path) -> Result<Value, SchemaError> {
    let invalid = |reason: String| {
        raise(SchemaError::InvalidDefault {
            path: display_path(path),
            reason,
        })
    };
    match (tag, literal) {
        (Some(TypeTag::Set), Json::Array(items)) => Ok(Value::set(items.iter().map(Value::from))),
        (Some(TypeTag::Date | TypeTag::UnixTime), Json::String(text)) => parse_date(text)
            .map(Value::Date)
            .ok_or_else(|| invalid(format!("'{text}' is not an RFC 3339 date"))),
        (Some(TypeTag::Date | TypeTag::UnixTime), Json::Number(n)) => n
            .as_f64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms as i64).single())
            .map(Value::Date)
            .ok_or_else(|| invalid(format!("{n} is not a valid epoch timestamp"))),
        (Some(TypeTag::BigInt), Json::String(text)) => text
            .trim()
            .parse::<i128>()
            .map(Value::BigInt)
            .map_err(|_| invalid(format!("'{text}' is not an integer"))),
        (Some(TypeTag::BigInt), Json::Number(n)) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .map(Value::BigInt)
            .ok_or_else(|| invalid(format!("{n} is not an integer"))),
        (Some(TypeTag::Symbol), Json::String(text)) => Ok(Value::symbol(Some(text.clone()))),
        (Some(TypeTag::Symbol), Json::Number(n)) => Ok(Value::symbol(Some(n.to_string()))),
        _ => Ok(Value::from(literal)),
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}
