//! # Constraint Deriver
//!
//! Maps a schema onto HTML5-style input attributes (`required`, `min`,
//! `max`, `pattern`, `minlength`, `maxlength`, `step`) so a client can
//! validate before submitting.
//!
//! Objects produce a [`Constraints::Tree`] keyed by property name; every
//! other node produces a [`Constraints::Leaf`]. Union branches and array
//! item schemas are merged with later entries overriding earlier ones.
//!
//! `required: true` is emitted exactly when a node is neither nullable nor
//! optional. A union drops it when the union or any of its branches accepts
//! `null` or `undefined`.

use std::collections::BTreeMap;

use chrono::{SecondsFormat, TimeZone, Utc};
use formset_core::{Path, Segment};
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::error::SchemaError;
use crate::node::{Schema, TypeTag};
use crate::resolve::{resolve_node, schema_info, SchemaInfo};

/// A `min`/`max` attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    /// Numeric bound (numbers, integers, item counts).
    Number(Number),
    /// RFC 3339 timestamp bound for dates.
    Date(String),
}

/// Validation attributes for a single input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Bound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Bound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minlength: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxlength: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<Number>,
}

impl Constraint {
    /// Returns true when no attribute is set.
    pub fn is_empty(&self) -> bool {
        *self == Constraint::default()
    }

    /// Field-wise merge; attributes set on `later` win.
    pub fn merge(self, later: Constraint) -> Constraint {
        Constraint {
            required: later.required.or(self.required),
            min: later.min.or(self.min),
            max: later.max.or(self.max),
            pattern: later.pattern.or(self.pattern),
            minlength: later.minlength.or(self.minlength),
            maxlength: later.maxlength.or(self.maxlength),
            step: later.step.or(self.step),
        }
    }
}

/// Derived constraints for a schema position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Constraints {
    /// Attributes of a single input.
    Leaf(Constraint),
    /// Per-property constraints of an object.
    Tree(BTreeMap<String, Constraints>),
}

impl Constraints {
    /// Returns true for an empty leaf or an empty tree.
    pub fn is_empty(&self) -> bool {
        match self {
            Constraints::Leaf(leaf) => leaf.is_empty(),
            Constraints::Tree(tree) => tree.is_empty(),
        }
    }

    /// The leaf attributes, if this is a leaf.
    pub fn as_leaf(&self) -> Option<&Constraint> {
        match self {
            Constraints::Leaf(leaf) => Some(leaf),
            Constraints::Tree(_) => None,
        }
    }

    /// The constraints of property `key`, if this is a tree.
    pub fn get(&self, key: &str) -> Option<&Constraints> {
        match self {
            Constraints::Tree(tree) => tree.get(key),
            Constraints::Leaf(_) => None,
        }
    }

    /// Merge `later` into `self`, `later` winning. Leaves merge per
    /// attribute and trees per key; an empty side yields the other, and a
    /// leaf meeting a tree is replaced by `later`.
    pub fn merge(self, later: Constraints) -> Constraints {
        match (self, later) {
            (Constraints::Leaf(a), Constraints::Leaf(b)) => Constraints::Leaf(a.merge(b)),
            (Constraints::Tree(mut a), Constraints::Tree(b)) => {
                for (key, incoming) in b {
                    let combined = match a.remove(&key) {
                        Some(existing) => existing.merge(incoming),
                        None => incoming,
                    };
                    a.insert(key, combined);
                }
                Constraints::Tree(a)
            }
            (earlier, later) if later.is_empty() => earlier,
            (_, later) => later,
        }
    }
}

fn merge_all(output: Option<Constraints>, parts: impl IntoIterator<Item = Option<Constraints>>) -> Option<Constraints> {
    parts.into_iter().flatten().fold(output, |acc, part| match acc {
        Some(acc) => Some(acc.merge(part)),
        None => Some(part),
    })
}

/// Derive the constraints of a schema position.
///
/// Returns `None` when the node yields no attributes at all, including an
/// object none of whose properties is constrained.
pub fn constraints(schema: &Schema, is_optional: bool, path: &Path) -> Result<Option<Constraints>, SchemaError> {
    let info = schema_info(schema, is_optional, path)?;
    Ok(derive(&info, path)?.filter(|derived| !derived.is_empty()))
}

fn derive(info: &SchemaInfo, path: &Path) -> Result<Option<Constraints>, SchemaError> {
    let mut output: Option<Constraints> = None;

    if let Some(union) = &info.union {
        let branches: Vec<SchemaInfo> = union
            .iter()
            .map(|branch| resolve_node(branch, info.is_optional))
            .collect();
        let derived = branches
            .iter()
            .map(|branch| derive(branch, path))
            .collect::<Result<Vec<_>, _>>()?;
        output = merge_all(output, derived);
        let loosened = info.is_nullable
            || info.is_optional
            || branches.iter().any(|b| b.is_nullable || b.is_optional);
        if loosened {
            if let Some(Constraints::Leaf(leaf)) = output.as_mut() {
                leaf.required = None;
            }
        }
    }

    if let Some(items) = &info.array {
        let derived = items
            .iter()
            .map(|item| derive(&resolve_node(item, info.is_optional), path))
            .collect::<Result<Vec<_>, _>>()?;
        output = merge_all(output, derived);
    }

    if let Some(properties) = &info.properties {
        let mut tree = BTreeMap::new();
        for (key, property) in properties {
            let optional = !info.is_required(key);
            let child = path.child(Segment::key(key.as_str()));
            let property = schema_info(property, optional, &child)?;
            if let Some(derived) = derive(&property, &child)? {
                if !derived.is_empty() {
                    tree.insert(key.clone(), derived);
                }
            }
        }
        let tree = Constraints::Tree(tree);
        output = Some(match output {
            Some(existing) => existing.merge(tree),
            None => tree,
        });
    }

    Ok(output.or_else(|| leaf(info).map(Constraints::Leaf)))
}

fn leaf(info: &SchemaInfo) -> Option<Constraint> {
    let schema = &info.schema;
    let mut out = Constraint::default();

    match info.primary_type() {
        Some(TypeTag::UnixTime) => {
            out.min = schema.minimum.as_ref().and_then(epoch_bound);
            out.max = schema.maximum.as_ref().and_then(epoch_bound);
        }
        Some(TypeTag::String) => {
            out.pattern = schema.pattern.clone();
            out.minlength = schema.min_length.filter(|n| *n > 0);
            out.maxlength = schema.max_length.filter(|n| *n > 0);
        }
        Some(tag @ (TypeTag::Number | TypeTag::Integer)) => {
            let integer = *tag == TypeTag::Integer;
            out.min = schema
                .minimum
                .clone()
                .or_else(|| schema.exclusive_minimum.as_ref().and_then(|n| offset(n, integer, 1)))
                .map(Bound::Number);
            out.max = schema
                .maximum
                .clone()
                .or_else(|| schema.exclusive_maximum.as_ref().and_then(|n| offset(n, integer, -1)))
                .map(Bound::Number);
            out.step = schema.multiple_of.clone();
        }
        Some(TypeTag::Array) => {
            out.min = schema.min_items.map(|n| Bound::Number(n.into()));
            out.max = schema.max_items.map(|n| Bound::Number(n.into()));
        }
        _ => {}
    }

    if !info.is_nullable && !info.is_optional {
        out.required = Some(true);
    }

    (!out.is_empty()).then_some(out)
}

/// Exclusive bounds are tightened by one for integers only.
fn offset(bound: &Number, integer: bool, delta: i64) -> Option<Number> {
    if !integer {
        return Some(bound.clone());
    }
    if let Some(n) = bound.as_i64() {
        return n.checked_add(delta).map(Number::from);
    }
    bound.as_f64().and_then(|n| Number::from_f64(n + delta as f64))
}

fn epoch_bound(ms: &Number) -> Option<Bound> {
    let ms = ms.as_f64()?;
    let at = Utc.timestamp_millis_opt(ms as i64).single()?;
    Some(Bound::Date(at.to_rfc3339_opts(SecondsFormat::Millis, true)))
}
