//! # Schema Model
//!
//! The raw, caller-owned schema vocabulary: a JSON-Schema-like subset
//! covering types, unions (`anyOf`), intersections (`allOf`), arrays,
//! objects, literals, formats and the usual numeric/string/array facets.
//!
//! Documents are expected to be `$ref`-resolved. Keywords outside the
//! vocabulary (`title`, `description`, `$schema`, ...) are ignored on input.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

/// A schema position: either a boolean literal or a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schema {
    /// `true` (anything) or `false` (nothing).
    Bool(bool),
    /// A schema definition.
    Node(Box<SchemaNode>),
}

impl Schema {
    /// The definition, or `None` for a boolean literal.
    pub fn as_node(&self) -> Option<&SchemaNode> {
        match self {
            Schema::Node(node) => Some(node),
            Schema::Bool(_) => None,
        }
    }

    /// Returns true for `true`/`false` literals.
    pub fn is_bool(&self) -> bool {
        matches!(self, Schema::Bool(_))
    }
}

impl From<SchemaNode> for Schema {
    fn from(node: SchemaNode) -> Self {
        Schema::Node(Box::new(node))
    }
}

/// A single schema definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<TypeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Items>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_: Option<Vec<serde_json::Value>>,
    /// `Some(Value::Null)` for an explicit `const: null`.
    #[serde(
        rename = "const",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub const_: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// `Some(Value::Null)` for an explicit `default: null`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,
}

/// Keeps an explicit JSON `null` as `Some(Null)`; absence stays `None`
/// through `#[serde(default)]`.
fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

impl SchemaNode {
    /// A node of a single type.
    pub fn typed(tag: TypeTag) -> Self {
        Self {
            type_: Some(TypeSpec::Single(tag)),
            ..Self::default()
        }
    }

    /// The declared types, in order.
    pub fn declared_types(&self) -> Vec<TypeTag> {
        match &self.type_ {
            None => Vec::new(),
            Some(TypeSpec::Single(tag)) => vec![tag.clone()],
            Some(TypeSpec::Many(tags)) => tags.clone(),
        }
    }

    /// Returns true when `type` is exactly the single tag `tag`.
    pub fn is_strictly(&self, tag: &TypeTag) -> bool {
        matches!(&self.type_, Some(TypeSpec::Single(t)) if t == tag)
    }

    /// Returns true when the node declares `const: null`.
    pub fn is_const_null(&self) -> bool {
        matches!(self.const_, Some(serde_json::Value::Null))
    }
}

/// `type` holds one tag or a list of tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeSpec {
    Single(TypeTag),
    Many(Vec<TypeTag>),
}

impl TypeSpec {
    /// Build from a tag list, collapsing a single tag.
    pub fn from_tags(mut tags: Vec<TypeTag>) -> Option<Self> {
        match tags.len() {
            0 => None,
            1 => tags.pop().map(TypeSpec::Single),
            _ => Some(TypeSpec::Many(tags)),
        }
    }
}

/// `items` holds one schema for every element, or one per position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Items {
    Tuple(Vec<Schema>),
    Single(Schema),
}

impl Items {
    /// The item schemas as a list.
    pub fn as_slice(&self) -> &[Schema] {
        match self {
            Items::Tuple(schemas) => schemas,
            Items::Single(schema) => std::slice::from_ref(schema),
        }
    }
}

/// A type tag: the JSON Schema basic types plus the format extensions the
/// form engine understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TypeTag {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
    Null,
    Date,
    UnixTime,
    BigInt,
    Symbol,
    Set,
    Any,
    /// Anything else; kept so it can be reported as unsupported.
    Other(String),
}

impl TypeTag {
    /// The wire name of the tag.
    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::String => "string",
            TypeTag::Number => "number",
            TypeTag::Integer => "integer",
            TypeTag::Boolean => "boolean",
            TypeTag::Object => "object",
            TypeTag::Array => "array",
            TypeTag::Null => "null",
            TypeTag::Date => "date",
            TypeTag::UnixTime => "unix-time",
            TypeTag::BigInt => "bigint",
            TypeTag::Symbol => "symbol",
            TypeTag::Set => "set",
            TypeTag::Any => "any",
            TypeTag::Other(name) => name,
        }
    }

    /// The tag a `format` string contributes, if it is a conversion format.
    /// `int64` is an alias of `bigint`.
    pub fn from_format(format: &str) -> Option<Self> {
        match format {
            "unix-time" => Some(TypeTag::UnixTime),
            "bigint" | "int64" => Some(TypeTag::BigInt),
            "symbol" => Some(TypeTag::Symbol),
            "set" => Some(TypeTag::Set),
            "any" => Some(TypeTag::Any),
            _ => None,
        }
    }

    /// The tag of a JSON literal's type.
    pub fn of_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => TypeTag::Null,
            serde_json::Value::Bool(_) => TypeTag::Boolean,
            serde_json::Value::Number(_) => TypeTag::Number,
            serde_json::Value::String(_) => TypeTag::String,
            serde_json::Value::Array(_) => TypeTag::Array,
            serde_json::Value::Object(_) => TypeTag::Object,
        }
    }

    /// Returns true for tags that come from `format` rather than `type`.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            TypeTag::Date
                | TypeTag::UnixTime
                | TypeTag::BigInt
                | TypeTag::Symbol
                | TypeTag::Set
                | TypeTag::Any
        )
    }

    /// Returns true for date-like tags.
    pub fn is_date(&self) -> bool {
        matches!(self, TypeTag::Date | TypeTag::UnixTime)
    }

    /// Returns true for `number` and `integer`.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TypeTag::Number | TypeTag::Integer)
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        match name.as_str() {
            "string" => TypeTag::String,
            "number" => TypeTag::Number,
            "integer" => TypeTag::Integer,
            "boolean" => TypeTag::Boolean,
            "object" => TypeTag::Object,
            "array" => TypeTag::Array,
            "null" => TypeTag::Null,
            "date" | "Date" => TypeTag::Date,
            "unix-time" => TypeTag::UnixTime,
            "bigint" | "int64" => TypeTag::BigInt,
            "symbol" => TypeTag::Symbol,
            "set" => TypeTag::Set,
            "any" => TypeTag::Any,
            _ => TypeTag::Other(name),
        }
    }
}

impl From<&str> for TypeTag {
    fn from(name: &str) -> Self {
        TypeTag::from(name.to_owned())
    }
}

impl From<TypeTag> for String {
    fn from(tag: TypeTag) -> Self {
        tag.as_str().to_owned()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(value: serde_json::Value) -> SchemaNode {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_explicit_null_default_is_kept() {
        assert_eq!(node(json!({"default": null})).default, Some(serde_json::Value::Null));
        assert_eq!(node(json!({})).default, None);
        assert!(node(json!({"const": null})).is_const_null());
        assert!(!node(json!({})).is_const_null());
    }

    #[test]
    fn test_type_accepts_string_or_list() {
        assert_eq!(node(json!({"type": "string"})).declared_types(), vec![TypeTag::String]);
        assert_eq!(
            node(json!({"type": ["string", "null"]})).declared_types(),
            vec![TypeTag::String, TypeTag::Null]
        );
    }

    #[test]
    fn test_unknown_keywords_are_ignored() {
        let parsed = node(json!({"type": "string", "title": "Name", "$schema": "x"}));
        assert!(parsed.is_strictly(&TypeTag::String));
    }

    #[test]
    fn test_boolean_and_node_positions() {
        let schema: Schema = serde_json::from_value(json!({
            "type": "object",
            "properties": {"any": true, "name": {"type": "string"}}
        }))
        .unwrap();
        let props = schema.as_node().unwrap().properties.as_ref().unwrap();
        assert!(props["any"].is_bool());
        assert!(!props["name"].is_bool());
        let literal: Schema = serde_json::from_value(json!(false)).unwrap();
        assert_eq!(literal, Schema::Bool(false));
    }

    #[test]
    fn test_items_single_or_tuple() {
        let single = node(json!({"items": {"type": "string"}}));
        assert_eq!(single.items.unwrap().as_slice().len(), 1);
        let tuple = node(json!({"items": [{"type": "string"}, {"type": "number"}]}));
        assert_eq!(tuple.items.unwrap().as_slice().len(), 2);
    }

    #[test]
    fn test_camel_case_facets() {
        let parsed = node(json!({
            "exclusiveMinimum": 1, "multipleOf": 0.5, "minLength": 2,
            "uniqueItems": true, "anyOf": [], "allOf": []
        }));
        assert_eq!(parsed.exclusive_minimum, Some(Number::from(1)));
        assert_eq!(parsed.multiple_of.unwrap().as_f64(), Some(0.5));
        assert_eq!(parsed.min_length, Some(2));
        assert_eq!(parsed.unique_items, Some(true));
    }

    #[test]
    fn test_serializes_back_to_wire_names() {
        let parsed = node(json!({"type": "integer", "format": "unix-time", "const": null}));
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            json!({"type": "integer", "format": "unix-time", "const": null})
        );
    }

    #[test]
    fn test_format_tags() {
        assert_eq!(TypeTag::from_format("int64"), Some(TypeTag::BigInt));
        assert_eq!(TypeTag::from_format("email"), None);
        assert_eq!(TypeTag::from("tuple"), TypeTag::Other("tuple".into()));
        assert_eq!(TypeTag::UnixTime.to_string(), "unix-time");
    }
}
