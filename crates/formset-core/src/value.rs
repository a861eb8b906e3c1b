//! # Value: The Form Data Tree
//!
//! [`Value`] is the concrete data the engine produces and walks: synthesized
//! defaults, submitted form data, and mapped error trees. It is a superset of
//! JSON that keeps the distinctions form state needs:
//!
//! - `Undefined` (an unset optional field) is separate from `Null`.
//! - Dates, big integers, sets and opaque symbols are first-class leaves.
//!
//! Arrays and objects are the only containers. Every other variant is a
//! leaf, which is what the traversal engine and diff engine key off.
//!
//! Objects are ordered maps, so iteration order (and therefore visiting and
//! diff order) is deterministic.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::path::Segment;

/// Object storage for [`Value::Object`].
pub type Map = BTreeMap<String, Value>;

/// Writing past the end of an array pads with `Undefined`; indices further
/// than this beyond the current length are refused.
pub const MAX_ARRAY_GAP: usize = 1 << 16;

/// A unique, opaque value. Two symbols are equal only if one is a clone of
/// the other, whatever their descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: Uuid,
    description: Option<String>,
}

impl Symbol {
    /// Mint a fresh symbol.
    pub fn new(description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description,
        }
    }

    /// The description given at creation.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A node in a form data tree.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent / unset.
    #[default]
    Undefined,
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Double-precision number.
    Number(f64),
    /// Arbitrary-size integer (bounded to `i128`).
    BigInt(i128),
    /// UTF-8 string.
    String(String),
    /// Point in time.
    Date(DateTime<Utc>),
    /// Opaque unique value.
    Symbol(Symbol),
    /// Unordered collection of distinct values. Not addressable by path.
    Set(Vec<Value>),
    /// Ordered list.
    Array(Vec<Value>),
    /// String-keyed map.
    Object(Map),
}

impl Value {
    /// An empty object.
    pub fn object() -> Self {
        Value::Object(Map::new())
    }

    /// An empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    /// A set holding the distinct members of `items`, first occurrence kept.
    pub fn set(items: impl IntoIterator<Item = Value>) -> Self {
        let mut members: Vec<Value> = Vec::new();
        for item in items {
            if !members.contains(&item) {
                members.push(item);
            }
        }
        Value::Set(members)
    }

    /// A fresh symbol.
    pub fn symbol(description: Option<String>) -> Self {
        Value::Symbol(Symbol::new(description))
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Symbol(_) => "symbol",
            Value::Set(_) => "set",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Returns true for `Undefined`.
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for `Null` or `Undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    /// Returns true for arrays and objects.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }

    /// Returns true for everything that is not an array or object.
    pub fn is_leaf(&self) -> bool {
        !self.is_container()
    }

    /// Borrow as an object map.
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Mutably borrow as an object map.
    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as an array.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Mutably borrow as an array.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value of a `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Value of a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Leaf identity: primitives compare by value, dates by instant, sets by
    /// membership. Containers are never identical to anything, since two
    /// trees never share a container.
    pub fn same_leaf(&self, other: &Value) -> bool {
        if self.is_container() || other.is_container() {
            return false;
        }
        self == other
    }

    /// The child addressed by `segment`.
    ///
    /// Objects are looked up by the segment's string form (so index segments
    /// reach `"0"`-style keys); arrays only by index.
    pub fn child(&self, segment: &Segment) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(segment.as_str().as_ref()),
            Value::Array(items) => segment.as_index().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Mutable form of [`Value::child`].
    pub fn child_mut(&mut self, segment: &Segment) -> Option<&mut Value> {
        match self {
            Value::Object(map) => map.get_mut(segment.as_str().as_ref()),
            Value::Array(items) => segment.as_index().and_then(move |i| items.get_mut(i)),
            _ => None,
        }
    }

    /// Store `value` under `segment`. Returns false when this value cannot
    /// hold the segment (a leaf, a key on an array, or an index too far past
    /// the end of an array).
    pub fn set_child(&mut self, segment: &Segment, value: Value) -> bool {
        match self {
            Value::Object(map) => {
                map.insert(segment.as_str().into_owned(), value);
                true
            }
            Value::Array(items) => {
                let Some(index) = segment.as_index() else {
                    return false;
                };
                if index >= items.len() {
                    if index - items.len() > MAX_ARRAY_GAP {
                        return false;
                    }
                    items.resize(index + 1, Value::Undefined);
                }
                items[index] = value;
                true
            }
            _ => false,
        }
    }

    /// Segments of the direct children, in iteration order.
    pub fn child_segments(&self) -> Vec<Segment> {
        match self {
            Value::Object(map) => map.keys().map(|k| Segment::parse(k)).collect(),
            Value::Array(items) => (0..items.len()).map(Segment::Index).collect(),
            _ => Vec::new(),
        }
    }

    /// Plain JSON projection.
    ///
    /// `Undefined` and symbols are dropped from objects and become `null`
    /// inside arrays. Dates render as RFC 3339 with milliseconds, big
    /// integers as decimal strings, sets as arrays.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Undefined | Value::Null | Value::Symbol(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::BigInt(n) => Json::String(n.to_string()),
            Value::String(s) => Json::String(s.clone()),
            Value::Date(d) => Json::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Value::Set(items) | Value::Array(items) => {
                Json::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Object(map) => Json::Object(
                map.iter()
                    .filter(|(_, v)| !matches!(v, Value::Undefined | Value::Symbol(_)))
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Integral numbers inside the exactly-representable range serialize as
/// JSON integers; non-finite numbers become `null`.
fn number_to_json(n: f64) -> serde_json::Value {
    const MAX_SAFE: f64 = 9_007_199_254_740_992.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_SAFE {
        return serde_json::Value::from(n as i64);
    }
    serde_json::Number::from_f64(n)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

fn set_eq(a: &[Value], b: &[Value]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x)) && b.iter().all(|y| a.contains(y))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => set_eq(a, b),
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::BigInt(n) => write!(f, "{n}n"),
            Value::Symbol(s) => write!(f, "Symbol({})", s.description().unwrap_or_default()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from(json.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Object(map)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
