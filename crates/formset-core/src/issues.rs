//! # Error Tree Mapper
//!
//! Turns the flat issue list produced by a validator into a nested error tree
//! that mirrors the form's shape.
//!
//! Placement rules:
//!
//! - An issue with an empty path is a form-level error, appended to the
//!   root's `_errors` list.
//! - An issue whose path names a branch node of the [`ErrorShape`] (an
//!   object, or an array of objects) is appended to that node's `_errors`.
//! - Any other issue is a leaf error: its message is appended to the list
//!   stored at the issue's path.
//!
//! Intermediate containers are always created as objects, so an index
//! segment becomes an object key (`items.0.name`). When a message list
//! already sits where a container is needed, the issue cannot be placed and
//! becomes a form-level error instead. Mapping never fails.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::path::{Path, Segment};
use crate::traverse::{traverse_mut, visit_all_ref, Flow, Step, StepData};
use crate::value::{Map, Value};

/// Key under which branch and form-level messages are collected.
pub const FORM_ERRORS_KEY: &str = "_errors";

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Location of the failing value; empty for form-level issues.
    #[serde(default)]
    pub path: Path,
    /// Human-readable message.
    pub message: String,
}

impl Issue {
    /// An issue at `path`.
    pub fn new(path: Path, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// A form-level issue.
    pub fn form(message: impl Into<String>) -> Self {
        Self::new(Path::root(), message)
    }
}

/// Tree marking the branch nodes of a form: every key present in the shape is
/// an object (or array-of-objects) node whose own errors go to `_errors`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorShape(BTreeMap<String, ErrorShape>);

impl ErrorShape {
    /// An empty shape: every issue is a leaf.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a branch child, returning the shape for chaining.
    pub fn with(mut self, key: impl Into<String>, child: ErrorShape) -> Self {
        self.0.insert(key.into(), child);
        self
    }

    /// Insert a branch child.
    pub fn insert(&mut self, key: impl Into<String>, child: ErrorShape) {
        self.0.insert(key.into(), child);
    }

    /// The branch node at `path`, if the whole path names one.
    pub fn lookup(&self, path: &Path) -> Option<&ErrorShape> {
        path.iter()
            .try_fold(self, |shape, segment| shape.0.get(segment.as_str().as_ref()))
    }

    /// Direct child branches.
    pub fn children(&self) -> impl Iterator<Item = (&str, &ErrorShape)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if the shape has no branches.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Map issues into a nested error tree shaped by `shape`.
pub fn map_errors(issues: &[Issue], shape: &ErrorShape) -> Value {
    let mut tree = Value::object();
    for issue in issues {
        if issue.path.is_empty() {
            push_form_error(&mut tree, &issue.message);
            continue;
        }
        let is_branch = shape.lookup(&issue.path).is_some();
        if !place(&mut tree, &issue.path, &issue.message, is_branch) {
            tracing::debug!(
                path = %issue.path,
                "issue could not be placed in the error tree, reporting at form level"
            );
            push_form_error(&mut tree, &issue.message);
        }
    }
    tree
}

fn object_step(step: &StepData<'_>) -> Step {
    match step.value {
        Some(Value::Object(_)) => Step::Descend,
        None | Some(Value::Undefined) => Step::Replace(Value::object()),
        Some(_) => Step::Abort,
    }
}

fn place(tree: &mut Value, path: &Path, message: &str, is_branch: bool) -> bool {
    let Some(mut node) = traverse_mut(tree, path, object_step) else {
        return false;
    };
    if node.parent().as_object().is_none() {
        return false;
    }
    let message = Value::from(message);
    let updated = match (node.value().cloned(), is_branch) {
        (None | Some(Value::Undefined), false) => Value::Array(vec![message]),
        (None | Some(Value::Undefined), true) => branch_errors(Vec::new(), message),
        (Some(Value::Array(mut list)), false) => {
            list.push(message);
            Value::Array(list)
        }
        (Some(Value::Array(list)), true) => branch_errors(list, message),
        (Some(Value::Object(mut map)), _) => {
            append_errors(&mut map, message);
            Value::Object(map)
        }
        (Some(_), _) => return false,
    };
    node.set(updated)
}

fn branch_errors(existing: Vec<Value>, message: Value) -> Value {
    let mut map = Map::new();
    let mut list = existing;
    list.push(message);
    map.insert(FORM_ERRORS_KEY.to_owned(), Value::Array(list));
    Value::Object(map)
}

fn append_errors(map: &mut Map, message: Value) {
    let slot = map
        .entry(FORM_ERRORS_KEY.to_owned())
        .or_insert_with(Value::array);
    match slot {
        Value::Array(list) => list.push(message),
        other => {
            let previous = std::mem::take(other);
            let mut list = Vec::new();
            if !previous.is_nullish() {
                list.push(previous);
            }
            list.push(message);
            *other = Value::Array(list);
        }
    }
}

fn push_form_error(tree: &mut Value, message: &str) {
    if let Some(map) = tree.as_object_mut() {
        append_errors(map, Value::from(message));
    }
}

/// One entry of a flattened error tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatError {
    /// Dotted path of the field (empty for form-level errors).
    pub path: String,
    /// Messages at that path, in insertion order.
    pub messages: Vec<String>,
}

/// Flatten an error tree into a list suitable for rendering, in tree order.
pub fn flatten_errors(tree: &Value) -> Vec<FlatError> {
    let mut flat = Vec::new();
    visit_all_ref(tree, &Path::root(), |node| {
        let Value::Array(items) = node.value else {
            return Flow::Continue;
        };
        let owner = match node.key {
            Segment::Key(key) if key == FORM_ERRORS_KEY => node.path.parent().unwrap_or_default(),
            _ => node.path.clone(),
        };
        let messages = items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_owned))
            .collect();
        flat.push(FlatError {
            path: owner.to_string(),
            messages,
        });
        Flow::Skip
    });
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(segments: &[&str]) -> Path {
        Path::from_strs(segments)
    }

    #[test]
    fn test_index_segments_become_object_keys() {
        let shape = ErrorShape::new().with("items", ErrorShape::new().with("name", ErrorShape::new()));
        let issues = vec![Issue::new(path(&["items", "0", "name"]), "too short")];
        let tree = map_errors(&issues, &shape);
        assert_eq!(tree.to_json(), json!({"items": {"0": {"name": ["too short"]}}}));
    }

    #[test]
    fn test_empty_path_is_form_level() {
        let tree = map_errors(&[Issue::form("passwords differ")], &ErrorShape::new());
        assert_eq!(tree.to_json(), json!({"_errors": ["passwords differ"]}));
    }

    #[test]
    fn test_branch_issues_go_to_errors_key() {
        let shape = ErrorShape::new().with("address", ErrorShape::new());
        let issues = vec![
            Issue::new(path(&["address"]), "incomplete"),
            Issue::new(path(&["address", "zip"]), "required"),
        ];
        let tree = map_errors(&issues, &shape);
        assert_eq!(
            tree.to_json(),
            json!({"address": {"_errors": ["incomplete"], "zip": ["required"]}})
        );
    }

    #[test]
    fn test_leaf_messages_accumulate() {
        let issues = vec![
            Issue::new(path(&["email"]), "required"),
            Issue::new(path(&["email"]), "invalid"),
        ];
        let tree = map_errors(&issues, &ErrorShape::new());
        assert_eq!(tree.to_json(), json!({"email": ["required", "invalid"]}));
    }

    #[test]
    fn test_unplaceable_issue_falls_back_to_form_level() {
        let issues = vec![
            Issue::new(path(&["name"]), "required"),
            Issue::new(path(&["name", "first"]), "too short"),
        ];
        let tree = map_errors(&issues, &ErrorShape::new());
        assert_eq!(
            tree.to_json(),
            json!({"_errors": ["too short"], "name": ["required"]})
        );
    }

    #[test]
    fn test_branch_after_leaf_list_keeps_messages() {
        let issues = vec![
            Issue::new(path(&["tags"]), "first"),
            Issue::new(path(&["tags"]), "second"),
        ];
        let shape = ErrorShape::new();
        let leaf_tree = map_errors(&issues[..1], &shape);
        assert_eq!(leaf_tree.to_json(), json!({"tags": ["first"]}));

        let mut tree = leaf_tree;
        assert!(place(&mut tree, &path(&["tags"]), "second", true));
        assert_eq!(tree.to_json(), json!({"tags": {"_errors": ["first", "second"]}}));
    }

    #[test]
    fn test_shape_lookup_requires_whole_path() {
        let shape = ErrorShape::new().with("items", ErrorShape::new().with("meta", ErrorShape::new()));
        assert!(shape.lookup(&path(&["items"])).is_some());
        assert!(shape.lookup(&path(&["items", "meta"])).is_some());
        assert!(shape.lookup(&path(&["items", "0", "meta"])).is_none());
        assert!(shape.lookup(&Path::root()).is_some());
    }

    #[test]
    fn test_shape_serializes_as_nested_objects() {
        let shape = ErrorShape::new().with("a", ErrorShape::new().with("b", ErrorShape::new()));
        assert_eq!(serde_json::to_value(&shape).unwrap(), json!({"a": {"b": {}}}));
        let back: ErrorShape = serde_json::from_value(json!({"a": {"b": {}}})).unwrap();
        assert_eq!(back, shape);
    }

    #[test]
    fn test_issues_deserialize_from_wire_form() {
        let issue: Issue =
            serde_json::from_value(json!({"path": ["items", "0"], "message": "bad"})).unwrap();
        assert_eq!(issue.path, Path::from(vec![Segment::key("items"), Segment::Index(0)]));
        let form: Issue = serde_json::from_value(json!({"message": "bad"})).unwrap();
        assert!(form.path.is_empty());
    }

    #[test]
    fn test_flatten_lists_every_message_bucket() {
        let shape = ErrorShape::new().with("address", ErrorShape::new());
        let issues = vec![
            Issue::form("form"),
            Issue::new(path(&["address"]), "incomplete"),
            Issue::new(path(&["address", "zip"]), "required"),
            Issue::new(path(&["items", "0", "name"]), "too short"),
        ];
        let flat = flatten_errors(&map_errors(&issues, &shape));
        assert_eq!(
            flat,
            vec![
                FlatError { path: String::new(), messages: vec!["form".into()] },
                FlatError { path: "address".into(), messages: vec!["incomplete".into()] },
                FlatError { path: "address.zip".into(), messages: vec!["required".into()] },
                FlatError { path: "items[0].name".into(), messages: vec!["too short".into()] },
            ]
        );
    }
}
