//! # Structural Diff
//!
//! [`diff`] reports the leaf paths at which two value trees differ. A node is
//! reported when it is a leaf on one side and either absent on the other side
//! or not leaf-identical to its counterpart (see [`Value::same_leaf`]). Once a
//! node is reported its descendants are skipped, so a scalar replaced by an
//! object shows up as a single path.
//!
//! The roots themselves are compared first: two differing leaves, a leaf
//! against a container, or an object against an array yield just the root
//! path.
//!
//! Paths appear in discovery order: first everything found walking `a`, then
//! anything new found walking `b`. Each distinct path appears once.

use std::collections::BTreeSet;

use crate::path::Path;
use crate::traverse::{traverse, visit_all_ref, Flow};
use crate::value::Value;

/// Leaf paths at which `a` and `b` differ.
pub fn diff(a: &Value, b: &Value) -> Vec<Path> {
    if roots_differ(a, b) {
        return vec![Path::root()];
    }
    let mut seen = BTreeSet::new();
    let mut paths = Vec::new();
    collect_changes(a, b, &mut seen, &mut paths);
    collect_changes(b, a, &mut seen, &mut paths);
    paths
}

/// Returns true if the trees have no differing leaves.
pub fn is_unchanged(a: &Value, b: &Value) -> bool {
    diff(a, b).is_empty()
}

fn roots_differ(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_)) => false,
        _ => !a.same_leaf(b),
    }
}

fn collect_changes(from: &Value, other: &Value, seen: &mut BTreeSet<String>, out: &mut Vec<Path>) {
    visit_all_ref(from, &Path::root(), |node| {
        let counterpart = traverse(other, node.path).and_then(|found| found.value);
        let changed = match counterpart {
            None => node.is_leaf,
            Some(theirs) => {
                (node.is_leaf || theirs.is_leaf()) && !node.value.same_leaf(theirs)
            }
        };
        if !changed {
            return Flow::Continue;
        }
        if seen.insert(node.path.joined()) {
            out.push(node.path.clone());
        }
        Flow::Skip
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    fn rendered(paths: &[Path]) -> Vec<String> {
        paths.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_identical_trees_have_no_diff() {
        let a = tree(json!({"a": 1, "b": {"c": [1, 2]}}));
        assert!(diff(&a, &a.clone()).is_empty());
        assert!(is_unchanged(&a, &a.clone()));
    }

    #[test]
    fn test_reports_changed_added_and_removed_leaves() {
        let a = tree(json!({"a": 1, "b": {"c": 2}, "gone": true}));
        let b = tree(json!({"a": 1, "b": {"c": 3}, "new": "x"}));
        assert_eq!(rendered(&diff(&a, &b)), vec!["b.c", "gone", "new"]);
    }

    #[test]
    fn test_scalar_replaced_by_container_is_one_path() {
        let a = tree(json!({"a": 1}));
        let b = tree(json!({"a": {"x": 1, "y": 2}}));
        assert_eq!(rendered(&diff(&a, &b)), vec!["a"]);
        assert_eq!(rendered(&diff(&b, &a)), vec!["a"]);
    }

    #[test]
    fn test_array_growth_reports_new_indices() {
        let a = tree(json!({"tags": ["a"]}));
        let b = tree(json!({"tags": ["a", "b", "c"]}));
        assert_eq!(rendered(&diff(&a, &b)), vec!["tags[1]", "tags[2]"]);
    }

    #[test]
    fn test_empty_containers_are_not_leaves() {
        let a = tree(json!({"a": {}}));
        let b = tree(json!({}));
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn test_dates_compare_by_instant() {
        let when = chrono::DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let mut a = Value::object();
        let mut b = Value::object();
        crate::traverse::set_path(&mut a, &Path::from(["at"]), Value::Date(when));
        crate::traverse::set_path(&mut b, &Path::from(["at"]), Value::Date(when));
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn test_differing_roots_report_the_root() {
        assert_eq!(diff(&tree(json!("x")), &tree(json!("y"))), vec![Path::root()]);
        assert_eq!(diff(&tree(json!({})), &tree(json!([]))), vec![Path::root()]);
        assert_eq!(diff(&tree(json!(1)), &tree(json!({"a": 1}))), vec![Path::root()]);
        assert!(!is_unchanged(&tree(json!(null)), &Value::Undefined));
    }

    #[test]
    fn test_equal_root_leaves_are_unchanged() {
        assert!(diff(&tree(json!("x")), &tree(json!("x"))).is_empty());
        assert!(is_unchanged(&tree(json!(null)), &tree(json!(null))));
    }

    #[test]
    fn test_undefined_differs_from_absent() {
        let mut a = Value::object();
        crate::traverse::set_path(&mut a, &Path::from(["x"]), Value::Undefined);
        let b = Value::object();
        assert_eq!(rendered(&diff(&a, &b)), vec!["x"]);
    }
}
