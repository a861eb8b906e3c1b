//! # Schema Info Resolver
//!
//! Normalizes a raw [`SchemaNode`] into a [`SchemaInfo`]: the flattened type
//! set, nullability, union branches, array item schemas and object
//! properties. Every other schema component works from `SchemaInfo` rather
//! than the raw node.
//!
//! Type collection, in order:
//!
//! 1. `const: null` contributes `null`; `type` (one tag or a list) comes
//!    before it.
//! 2. Types of `anyOf` branches are collected recursively and placed first.
//! 3. `uniqueItems: true` on an array turns the `array` tag into `set`.
//!    Otherwise a conversion `format` is prepended, and `unix-time`/`int64`
//!    drop the redundant `integer`.
//! 4. A non-null `const` adds the tag of its JSON type.
//!
//! The result is deduplicated in first-seen order; `null` is then removed
//! from `types` and reported as `is_nullable` instead.
//!
//! `allOf` branches are resolved first and deep-merged into the node (see
//! [`flatten_all_of`]), so the rest of the resolver never sees `allOf`.

use std::collections::BTreeMap;

use formset_core::Path;

use crate::error::{display_path, SchemaError};
use crate::node::{Schema, SchemaNode, TypeSpec, TypeTag};

/// Normalized view of a schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaInfo {
    /// The node with `allOf` flattened in.
    pub schema: SchemaNode,
    /// Non-null type tags in first-seen order.
    pub types: Vec<TypeTag>,
    /// Whether `undefined` is acceptable (decided by the caller).
    pub is_optional: bool,
    /// Whether `null` is acceptable.
    pub is_nullable: bool,
    /// Non-null `anyOf` branches; `None` when there are none.
    pub union: Option<Vec<SchemaNode>>,
    /// Item schemas when the node is an array or set.
    pub array: Option<Vec<SchemaNode>>,
    /// Property schemas when the node is an object, boolean literals
    /// included; resolving one of those is an error.
    pub properties: Option<BTreeMap<String, Schema>>,
    /// Required property names, verbatim.
    pub required: Option<Vec<String>>,
}

impl SchemaInfo {
    /// Returns true when `tag` is among the node's types.
    pub fn has_type(&self, tag: &TypeTag) -> bool {
        self.types.contains(tag)
    }

    /// The first type tag, which drives literal conversion and fallbacks.
    pub fn primary_type(&self) -> Option<&TypeTag> {
        self.types.first()
    }

    /// Returns true when `key` is listed in `required`.
    pub fn is_required(&self, key: &str) -> bool {
        self.required
            .as_ref()
            .map_or(false, |required| required.iter().any(|r| r == key))
    }
}

/// Resolve a schema position. Boolean literals are rejected.
pub fn schema_info(schema: &Schema, is_optional: bool, path: &Path) -> Result<SchemaInfo, SchemaError> {
    match schema {
        Schema::Node(node) => Ok(resolve_node(node, is_optional)),
        Schema::Bool(_) => {
            let err = SchemaError::BooleanSchema {
                path: display_path(path),
            };
            tracing::debug!(error = %err, "schema info rejected");
            Err(err)
        }
    }
}

/// Resolve a schema definition.
pub fn resolve_node(node: &SchemaNode, is_optional: bool) -> SchemaInfo {
    let schema = flatten_all_of(node);
    let mut types = collect_types(&schema);
    let is_nullable = types.contains(&TypeTag::Null);
    types.retain(|t| *t != TypeTag::Null);

    let union = schema.any_of.as_ref().and_then(|branches| {
        let kept: Vec<SchemaNode> = branches
            .iter()
            .filter_map(Schema::as_node)
            .filter(|branch| !branch.is_strictly(&TypeTag::Null) && !branch.is_const_null())
            .cloned()
            .collect();
        (!kept.is_empty()).then_some(kept)
    });

    let array = match &schema.items {
        Some(items) if types.contains(&TypeTag::Array) || types.contains(&TypeTag::Set) => Some(
            items
                .as_slice()
                .iter()
                .filter_map(Schema::as_node)
                .cloned()
                .collect(),
        ),
        _ => None,
    };

    let properties = match &schema.properties {
        Some(props) if types.contains(&TypeTag::Object) => Some(props.clone()),
        _ => None,
    };

    SchemaInfo {
        required: schema.required.clone(),
        schema,
        types,
        is_optional,
        is_nullable,
        union,
        array,
        properties,
    }
}

/// Collect the type tags of a node, `null` included.
pub fn collect_types(node: &SchemaNode) -> Vec<TypeTag> {
    let mut types = node.declared_types();
    if node.is_const_null() {
        types.push(TypeTag::Null);
    }
    if let Some(branches) = &node.any_of {
        let mut from_branches: Vec<TypeTag> = branches
            .iter()
            .filter_map(Schema::as_node)
            .flat_map(|branch| collect_types(&flatten_all_of(branch)))
            .collect();
        from_branches.append(&mut types);
        types = from_branches;
    }

    let unique_array = node.unique_items == Some(true) && types.contains(&TypeTag::Array);
    if unique_array {
        for tag in types.iter_mut().filter(|t| **t == TypeTag::Array) {
            *tag = TypeTag::Set;
        }
    } else if let Some(format) = node.format.as_deref() {
        if let Some(tag) = TypeTag::from_format(format) {
            types.insert(0, tag);
            if format == "unix-time" || format == "int64" {
                if let Some(i) = types.iter().position(|t| *t == TypeTag::Integer) {
                    types.remove(i);
                }
            }
        }
    }

    if let Some(value) = &node.const_ {
        if !value.is_null() {
            types.push(TypeTag::of_json(value));
        }
    }

    let mut seen = Vec::with_capacity(types.len());
    for tag in types {
        if !seen.contains(&tag) {
            seen.push(tag);
        }
    }
    seen
}

/// Deep-merge `allOf` branches into the node.
///
/// Branches are flattened recursively and merged in order, each overriding
/// what came before, except that the first `pattern` found wins. Type and
/// `required` lists are unioned, properties merge per key, `anyOf` branch
/// lists are concatenated.
pub fn flatten_all_of(node: &SchemaNode) -> SchemaNode {
    let Some(branches) = &node.all_of else {
        return node.clone();
    };
    let mut merged = node.clone();
    merged.all_of = None;
    for branch in branches.iter().filter_map(Schema::as_node) {
        merge_from(&mut merged, flatten_all_of(branch));
    }
    merged
}

fn merge_from(base: &mut SchemaNode, branch: SchemaNode) {
    let SchemaNode {
        type_,
        any_of,
        all_of: _,
        items,
        properties,
        required,
        enum_,
        const_,
        format,
        default,
        minimum,
        maximum,
        exclusive_minimum,
        exclusive_maximum,
        multiple_of,
        min_length,
        max_length,
        pattern,
        min_items,
        max_items,
        unique_items,
    } = branch;

    if let Some(spec) = type_ {
        let incoming = match spec {
            TypeSpec::Single(tag) => vec![tag],
            TypeSpec::Many(tags) => tags,
        };
        let mut tags = base.declared_types();
        for tag in incoming {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        base.type_ = TypeSpec::from_tags(tags);
    }

    if let Some(mut more) = any_of {
        base.any_of.get_or_insert_with(Vec::new).append(&mut more);
    }

    if let Some(extra) = required {
        let list = base.required.get_or_insert_with(Vec::new);
        for key in extra {
            if !list.contains(&key) {
                list.push(key);
            }
        }
    }

    if let Some(props) = properties {
        let target = base.properties.get_or_insert_with(BTreeMap::new);
        for (key, prop) in props {
            let combined = match (target.remove(&key), prop) {
                (Some(Schema::Node(mut existing)), Schema::Node(incoming)) => {
                    merge_from(&mut existing, *incoming);
                    Schema::Node(existing)
                }
                (_, incoming) => incoming,
            };
            target.insert(key, combined);
        }
    }

    if base.pattern.is_none() {
        base.pattern = pattern;
    }

    fn take<T>(slot: &mut Option<T>, value: Option<T>) {
        if value.is_some() {
            *slot = value;
        }
    }
    take(&mut base.items, items);
    take(&mut base.enum_, enum_);
    take(&mut base.const_, const_);
    take(&mut base.format, format);
    take(&mut base.default, default);
    take(&mut base.minimum, minimum);
    take(&mut base.maximum, maximum);
    take(&mut base.exclusive_minimum, exclusive_minimum);
    take(&mut base.exclusive_maximum, exclusive_maximum);
    take(&mut base.multiple_of, multiple_of);
    take(&mut base.min_length, min_length);
    take(&mut base.max_length, max_length);
    take(&mut base.min_items, min_items);
    take(&mut base.max_items, max_items);
    take(&mut base.unique_items, unique_items);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(value: serde_json::Value) -> SchemaInfo {
        let schema: Schema = serde_json::from_value(value).unwrap();
        schema_info(&schema, false, &Path::root()).unwrap()
    }

    #[test]
    fn test_boolean_schema_is_an_error() {
        let err = schema_info(&Schema::Bool(true), false, &Path::from(["a"])).unwrap_err();
        assert_eq!(err, SchemaError::BooleanSchema { path: "a".into() });
    }

    #[test]
    fn test_nullable_type_list() {
        let i = info(json!({"type": ["string", "null"]}));
        assert_eq!(i.types, vec![TypeTag::String]);
        assert!(i.is_nullable);
        assert!(i.union.is_none());
    }

    #[test]
    fn test_const_null_contributes_null() {
        let i = info(json!({"const": null}));
        assert!(i.types.is_empty());
        assert!(i.is_nullable);
    }

    #[test]
    fn test_union_strips_null_branches() {
        let i = info(json!({"anyOf": [
            {"type": "string"}, {"type": "null"}, {"const": null}, true
        ]}));
        assert!(i.is_nullable);
        assert_eq!(i.types, vec![TypeTag::String]);
        let union = i.union.unwrap();
        assert_eq!(union.len(), 1);
        assert!(union[0].is_strictly(&TypeTag::String));
    }

    #[test]
    fn test_union_of_only_null_has_no_branches() {
        let i = info(json!({"anyOf": [{"type": "null"}]}));
        assert!(i.union.is_none());
        assert!(i.is_nullable);
    }

    #[test]
    fn test_branch_types_come_first() {
        let i = info(json!({"type": "object", "anyOf": [{"type": "string"}, {"type": "number"}]}));
        assert_eq!(i.types, vec![TypeTag::String, TypeTag::Number, TypeTag::Object]);
    }

    #[test]
    fn test_unix_time_replaces_integer() {
        let i = info(json!({"type": "integer", "format": "unix-time"}));
        assert_eq!(i.types, vec![TypeTag::UnixTime]);
    }

    #[test]
    fn test_int64_maps_to_bigint() {
        let i = info(json!({"type": "integer", "format": "int64"}));
        assert_eq!(i.types, vec![TypeTag::BigInt]);
    }

    #[test]
    fn test_bigint_format_keeps_declared_type() {
        let i = info(json!({"type": "string", "format": "bigint"}));
        assert_eq!(i.types, vec![TypeTag::BigInt, TypeTag::String]);
    }

    #[test]
    fn test_unique_items_array_is_a_set() {
        let i = info(json!({"type": "array", "uniqueItems": true, "format": "any", "items": {"type": "string"}}));
        assert_eq!(i.types, vec![TypeTag::Set]);
        assert_eq!(i.array.unwrap().len(), 1);
    }

    #[test]
    fn test_const_adds_literal_type() {
        let i = info(json!({"const": "fixed"}));
        assert_eq!(i.types, vec![TypeTag::String]);
        assert!(!i.is_nullable);
    }

    #[test]
    fn test_array_items_drop_boolean_literals() {
        let i = info(json!({"type": "array", "items": [{"type": "string"}, false]}));
        assert_eq!(i.array.unwrap().len(), 1);
    }

    #[test]
    fn test_items_ignored_without_array_type() {
        let i = info(json!({"type": "string", "items": {"type": "string"}}));
        assert!(i.array.is_none());
    }

    #[test]
    fn test_object_exposes_properties_verbatim() {
        let i = info(json!({
            "type": "object",
            "required": ["a", "c"],
            "properties": {"a": {"type": "string"}, "b": {"type": "number"}, "c": true}
        }));
        let props = i.properties.as_ref().unwrap();
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert!(props["c"].is_bool());
        assert!(i.is_required("a"));
        assert!(!i.is_required("b"));

        let path = Path::root().key("c");
        let err = schema_info(&props["c"], false, &path).unwrap_err();
        assert_eq!(err, SchemaError::BooleanSchema { path: "c".into() });
    }

    #[test]
    fn test_all_of_merges_with_first_pattern_winning() {
        let i = info(json!({
            "type": "string",
            "allOf": [
                {"pattern": "^a", "minLength": 1},
                {"pattern": "^b", "minLength": 3, "maxLength": 9}
            ]
        }));
        assert_eq!(i.schema.pattern.as_deref(), Some("^a"));
        assert_eq!(i.schema.min_length, Some(3));
        assert_eq!(i.schema.max_length, Some(9));
        assert!(i.schema.all_of.is_none());
    }

    #[test]
    fn test_all_of_merges_objects() {
        let i = info(json!({
            "allOf": [
                {"type": "object", "required": ["a"], "properties": {"a": {"type": "string"}}},
                {"type": "object", "required": ["b"], "properties": {
                    "a": {"minLength": 2},
                    "b": {"type": "number"}
                }}
            ]
        }));
        assert_eq!(i.types, vec![TypeTag::Object]);
        assert_eq!(i.required, Some(vec!["a".to_string(), "b".to_string()]));
        let props = i.properties.unwrap();
        let a = props["a"].as_node().unwrap();
        assert!(a.is_strictly(&TypeTag::String));
        assert_eq!(a.min_length, Some(2));
    }

    #[test]
    fn test_nested_all_of_is_flattened() {
        let i = info(json!({"allOf": [{"allOf": [{"type": "number", "minimum": 1}]}]}));
        assert_eq!(i.types, vec![TypeTag::Number]);
        assert_eq!(i.schema.minimum, Some(serde_json::Number::from(1)));
    }
}
