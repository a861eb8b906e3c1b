//! # Path Traversal Engine
//!
//! Generic, path-addressable access into [`Value`] trees.
//!
//! - [`traverse`] / [`traverse_mut`] walk a path segment by segment. The
//!   final segment always yields a leaf descriptor, whatever the shape of the
//!   value found there. A miss on an intermediate segment returns `None`;
//!   that is ordinary control flow meaning "this path does not exist (yet)".
//! - [`traverse_mut`] hands every intermediate step to an `on_step` callback
//!   that may descend, substitute a new container, or abort. This is how
//!   containers are created on demand ([`create_on_demand`]).
//! - [`visit_all`] walks every node depth-first, pre-order; the visitor can
//!   continue, skip a subtree, abort the walk, or replace the node.
//! - The `*_async` variants have identical semantics, but await the
//!   callback's future before proceeding. Suspension happens only at the
//!   callback; ordering is unaffected by how long a callback takes.
//!
//! A present key holding `Undefined` and an absent key are different: the
//! descriptor's `value` is `Some(&Value::Undefined)` for the former and
//! `None` for the latter.
//!
//! The engine does not synchronize concurrent mutation. Mutable traversals
//! borrow the tree exclusively, so the borrow checker enforces a single
//! writer.

use std::future::Future;

use crate::path::{Path, Segment};
use crate::value::Value;

static UNDEFINED: Value = Value::Undefined;

/// Descriptor for the final segment of a read-only traversal.
#[derive(Debug, Clone)]
pub struct Node<'a> {
    /// The container (or, if the path ran into a scalar, that scalar).
    pub parent: &'a Value,
    /// The final segment.
    pub key: Segment,
    /// The value under `key`, or `None` when the key is absent.
    pub value: Option<&'a Value>,
    /// The full requested path.
    pub path: Path,
}

impl<'a> Node<'a> {
    /// Returns true when the key is present (even if its value is `Undefined`).
    pub fn exists(&self) -> bool {
        self.value.is_some()
    }

    /// The value, treating an absent key as `Undefined`.
    pub fn value_or_undefined(&self) -> &'a Value {
        self.value.unwrap_or(&UNDEFINED)
    }
}

/// What an intermediate step of [`traverse_mut`] sees.
#[derive(Debug)]
pub struct StepData<'a> {
    /// The current container.
    pub parent: &'a Value,
    /// The segment about to be descended.
    pub key: &'a Segment,
    /// The segment that will be looked up inside the child.
    pub next: &'a Segment,
    /// The current child, `None` when absent.
    pub value: Option<&'a Value>,
    /// Path from the root up to and including `key`.
    pub path: &'a Path,
}

/// Owned form of [`StepData`] for async callbacks.
#[derive(Debug, Clone)]
pub struct StepInfo {
    /// The segment about to be descended.
    pub key: Segment,
    /// The segment that will be looked up inside the child.
    pub next: Segment,
    /// A copy of the current child, `None` when absent.
    pub value: Option<Value>,
    /// Path from the root up to and including `key`.
    pub path: Path,
}

/// Decision returned by an `on_step` callback.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Descend into the existing child. A missing, `Undefined` or `Null`
    /// child aborts the traversal.
    Descend,
    /// Store this value under the current key, then descend into it.
    Replace(Value),
    /// Abandon the traversal; the call returns `None`.
    Abort,
}

impl Step {
    /// The identity step: never creates anything.
    pub fn descend(_: &StepData<'_>) -> Step {
        Step::Descend
    }
}

/// Step callback that creates missing containers: an array when the next
/// segment is an index, an object otherwise. Existing scalars in the way
/// are replaced too.
pub fn create_on_demand(step: &StepData<'_>) -> Step {
    match step.value {
        Some(value) if value.is_container() => Step::Descend,
        _ => Step::Replace(empty_container_for(step.next)),
    }
}

fn empty_container_for(next: &Segment) -> Value {
    if next.is_index() {
        Value::array()
    } else {
        Value::object()
    }
}

/// Descriptor for the final segment of a mutable traversal.
#[derive(Debug)]
pub struct NodeMut<'a> {
    parent: &'a mut Value,
    key: Segment,
    path: Path,
}

impl<'a> NodeMut<'a> {
    /// The container holding the final key.
    pub fn parent(&self) -> &Value {
        self.parent
    }

    /// The final segment.
    pub fn key(&self) -> &Segment {
        &self.key
    }

    /// The full requested path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The value under the key, `None` when absent.
    pub fn value(&self) -> Option<&Value> {
        self.parent.child(&self.key)
    }

    /// Mutable access to the value under the key.
    pub fn value_mut(&mut self) -> Option<&mut Value> {
        self.parent.child_mut(&self.key)
    }

    /// Consume the descriptor, keeping the mutable borrow of the value.
    pub fn into_value_mut(self) -> Option<&'a mut Value> {
        self.parent.child_mut(&self.key)
    }

    /// Returns true when the key is present.
    pub fn exists(&self) -> bool {
        self.value().is_some()
    }

    /// Store `value` under the key. Returns false if the parent cannot hold
    /// it (see [`Value::set_child`]).
    pub fn set(&mut self, value: Value) -> bool {
        self.parent.set_child(&self.key, value)
    }
}

/// Read-only traversal.
///
/// Returns `None` for the empty path, or when an intermediate segment is
/// absent, `Undefined` or `Null`.
pub fn traverse<'a>(tree: &'a Value, path: &Path) -> Option<Node<'a>> {
    let (last, intermediate) = path.segments().split_last()?;
    let mut parent = tree;
    for segment in intermediate {
        match parent.child(segment) {
            Some(next) if !next.is_nullish() => parent = next,
            _ => return None,
        }
    }
    Some(Node {
        parent,
        key: last.clone(),
        value: parent.child(last),
        path: path.clone(),
    })
}

/// Mutable traversal with a step callback at every intermediate segment.
///
/// Pass [`Step::descend`] for a plain lookup, [`create_on_demand`] to build
/// missing containers, or any closure for custom behavior.
pub fn traverse_mut<'a, F>(tree: &'a mut Value, path: &Path, mut on_step: F) -> Option<NodeMut<'a>>
where
    F: FnMut(&StepData<'_>) -> Step,
{
    let (last, intermediate) = path.segments().split_last()?;
    let mut parent = tree;
    let mut walked = Path::root();
    for (i, segment) in intermediate.iter().enumerate() {
        walked.push(segment.clone());
        let next = intermediate.get(i + 1).unwrap_or(last);
        let step = on_step(&StepData {
            parent: &*parent,
            key: segment,
            next,
            value: parent.child(segment),
            path: &walked,
        });
        if !apply_step(parent, segment, step) {
            return None;
        }
        let child = parent.child_mut(segment)?;
        if child.is_nullish() {
            return None;
        }
        parent = child;
    }
    Some(NodeMut {
        parent,
        key: last.clone(),
        path: path.clone(),
    })
}

/// Async form of [`traverse_mut`]. The callback receives an owned
/// [`StepInfo`] so its future does not borrow the tree.
pub async fn traverse_async<'a, F, Fut>(
    tree: &'a mut Value,
    path: &Path,
    mut on_step: F,
) -> Option<NodeMut<'a>>
where
    F: FnMut(StepInfo) -> Fut,
    Fut: Future<Output = Step>,
{
    let (last, intermediate) = path.segments().split_last()?;
    let mut parent = tree;
    let mut walked = Path::root();
    for (i, segment) in intermediate.iter().enumerate() {
        walked.push(segment.clone());
        let next = intermediate.get(i + 1).unwrap_or(last);
        let info = StepInfo {
            key: segment.clone(),
            next: next.clone(),
            value: parent.child(segment).cloned(),
            path: walked.clone(),
        };
        let step = on_step(info).await;
        if !apply_step(parent, segment, step) {
            return None;
        }
        let child = parent.child_mut(segment)?;
        if child.is_nullish() {
            return None;
        }
        parent = child;
    }
    Some(NodeMut {
        parent,
        key: last.clone(),
        path: path.clone(),
    })
}

fn apply_step(parent: &mut Value, segment: &Segment, step: Step) -> bool {
    match step {
        Step::Descend => true,
        Step::Replace(value) => parent.set_child(segment, value),
        Step::Abort => false,
    }
}

/// Look up the value at `path`. The root path returns the tree itself.
pub fn get_path<'a>(tree: &'a Value, path: &Path) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(tree);
    }
    traverse(tree, path)?.value
}

/// Store `value` at `path`, creating intermediate containers as needed.
///
/// The root path replaces the whole tree. Returns false when the final
/// parent cannot hold the key.
pub fn set_path(tree: &mut Value, path: &Path, value: Value) -> bool {
    if path.is_empty() {
        *tree = value;
        return true;
    }
    if !tree.is_container() {
        *tree = empty_container_for(&path.segments()[0]);
    }
    match traverse_mut(tree, path, create_on_demand) {
        Some(mut node) => node.set(value),
        None => false,
    }
}

/// Store a copy of `value` at each of `paths`. Returns how many were set.
pub fn set_paths(tree: &mut Value, paths: &[Path], value: &Value) -> usize {
    paths
        .iter()
        .filter(|path| set_path(tree, path, value.clone()))
        .count()
}

/// Like [`traverse`], but also treats a path as missing when traversal ran
/// into a scalar before the requested path was consumed.
pub fn path_exists<'a>(tree: &'a Value, path: &Path) -> Option<Node<'a>> {
    let node = traverse(tree, path)?;
    if node.value.is_none() && path.len() > 1 && !node.parent.is_container() {
        return None;
    }
    Some(node)
}

/// Result of a visitor call in [`visit_all`].
#[derive(Debug, Clone, PartialEq)]
pub enum Visit {
    /// Keep going; containers are descended into.
    Continue,
    /// Do not descend into this node.
    Skip,
    /// Stop the whole walk.
    Abort,
    /// Replace this node with the value. The replacement is not visited.
    Replace(Value),
}

/// Result of a visitor call in [`visit_all_ref`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep going; containers are descended into.
    Continue,
    /// Do not descend into this node.
    Skip,
    /// Stop the whole walk.
    Abort,
}

/// How a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Every node was offered to the visitor (subject to skips).
    Completed,
    /// The visitor aborted.
    Aborted,
}

/// What a visitor sees for each node.
#[derive(Debug)]
pub struct VisitNode<'a> {
    /// Full path of the node (base path included).
    pub path: &'a Path,
    /// The node's own segment.
    pub key: &'a Segment,
    /// The node's value.
    pub value: &'a Value,
    /// True unless the value is an array or object.
    pub is_leaf: bool,
}

/// Owned form of [`VisitNode`] for async visitors.
#[derive(Debug, Clone)]
pub struct VisitEntry {
    /// Full path of the node (base path included).
    pub path: Path,
    /// The node's own segment.
    pub key: Segment,
    /// A copy of the node's value.
    pub value: Value,
    /// True unless the value is an array or object.
    pub is_leaf: bool,
}

/// Depth-first, pre-order walk over every node below the root.
///
/// Paths handed to the visitor are prefixed with `base`, which lets a caller
/// walk a subtree while reporting paths relative to an enclosing tree.
pub fn visit_all<F>(tree: &mut Value, base: &Path, mut visitor: F) -> Walk
where
    F: FnMut(&VisitNode<'_>) -> Visit,
{
    let mut path = base.clone();
    walk_mut(tree, &mut path, &mut visitor)
}

fn walk_mut<F>(container: &mut Value, path: &mut Path, visitor: &mut F) -> Walk
where
    F: FnMut(&VisitNode<'_>) -> Visit,
{
    for key in container.child_segments() {
        let Some(child) = container.child_mut(&key) else {
            continue;
        };
        path.push(key.clone());
        let action = visitor(&VisitNode {
            path,
            key: &key,
            value: child,
            is_leaf: child.is_leaf(),
        });
        let outcome = match action {
            Visit::Abort => Walk::Aborted,
            Visit::Skip => Walk::Completed,
            Visit::Replace(value) => {
                *child = value;
                Walk::Completed
            }
            Visit::Continue if child.is_container() => walk_mut(child, path, visitor),
            Visit::Continue => Walk::Completed,
        };
        path.pop();
        if outcome == Walk::Aborted {
            return Walk::Aborted;
        }
    }
    Walk::Completed
}

/// Read-only form of [`visit_all`].
pub fn visit_all_ref<F>(tree: &Value, base: &Path, mut visitor: F) -> Walk
where
    F: FnMut(&VisitNode<'_>) -> Flow,
{
    let mut path = base.clone();
    walk_ref(tree, &mut path, &mut visitor)
}

fn walk_ref<F>(container: &Value, path: &mut Path, visitor: &mut F) -> Walk
where
    F: FnMut(&VisitNode<'_>) -> Flow,
{
    for key in container.child_segments() {
        let Some(child) = container.child(&key) else {
            continue;
        };
        path.push(key.clone());
        let flow = visitor(&VisitNode {
            path,
            key: &key,
            value: child,
            is_leaf: child.is_leaf(),
        });
        let outcome = match flow {
            Flow::Abort => Walk::Aborted,
            Flow::Continue if child.is_container() => walk_ref(child, path, visitor),
            Flow::Continue | Flow::Skip => Walk::Completed,
        };
        path.pop();
        if outcome == Walk::Aborted {
            return Walk::Aborted;
        }
    }
    Walk::Completed
}

/// Async form of [`visit_all`].
///
/// Uses an explicit stack rather than recursion; each node's children are
/// read after its visitor future resolves, so a replacement or a skip takes
/// effect exactly as in the sync walk.
pub async fn visit_all_async<F, Fut>(tree: &mut Value, base: &Path, mut visitor: F) -> Walk
where
    F: FnMut(VisitEntry) -> Fut,
    Fut: Future<Output = Visit>,
{
    let mut stack: Vec<Path> = children_of(tree, &Path::root());
    while let Some(relative) = stack.pop() {
        let Some(value) = get_path(tree, &relative) else {
            continue;
        };
        let Some(key) = relative.last().cloned() else {
            continue;
        };
        let entry = VisitEntry {
            path: base.concat(&relative),
            key,
            value: value.clone(),
            is_leaf: value.is_leaf(),
        };
        match visitor(entry).await {
            Visit::Abort => return Walk::Aborted,
            Visit::Skip => continue,
            Visit::Replace(replacement) => {
                if let Some(node) = traverse_mut(tree, &relative, Step::descend) {
                    if let Some(slot) = node.into_value_mut() {
                        *slot = replacement;
                    }
                }
                continue;
            }
            Visit::Continue => {}
        }
        if let Some(value) = get_path(tree, &relative) {
            stack.extend(children_of(value, &relative));
        }
    }
    Walk::Completed
}

/// Child paths of `value` under `prefix`, reversed so that popping from the
/// stack yields them in iteration order.
fn children_of(value: &Value, prefix: &Path) -> Vec<Path> {
    value
        .child_segments()
        .into_iter()
        .rev()
        .map(|segment| prefix.child(segment))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn test_traverse_finds_nested_leaf() {
        let data = tree(json!({"user": {"tags": ["a", "b"]}}));
        let node = traverse(&data, &Path::from(["user", "tags", "1"])).unwrap();
        assert_eq!(node.value, Some(&Value::from("b")));
        assert_eq!(node.key, Segment::Index(1));
        assert!(node.parent.as_array().is_some());
    }

    #[test]
    fn test_traverse_final_segment_always_yields_descriptor() {
        let data = tree(json!({"user": {}}));
        let node = traverse(&data, &Path::from(["user", "missing"])).unwrap();
        assert!(!node.exists());
        assert_eq!(node.value_or_undefined(), &Value::Undefined);
    }

    #[test]
    fn test_traverse_distinguishes_undefined_from_absent() {
        let mut map = crate::value::Map::new();
        map.insert("set".into(), Value::Undefined);
        let data = Value::Object(map);
        assert!(traverse(&data, &Path::from(["set"])).unwrap().exists());
        assert!(!traverse(&data, &Path::from(["unset"])).unwrap().exists());
    }

    #[test]
    fn test_traverse_misses_on_intermediate_gaps() {
        let data = tree(json!({"a": null, "b": {}}));
        assert!(traverse(&data, &Path::from(["a", "x"])).is_none());
        assert!(traverse(&data, &Path::from(["b", "c", "d"])).is_none());
        assert!(traverse(&data, &Path::root()).is_none());
    }

    #[test]
    fn test_identity_step_never_creates() {
        let mut data = tree(json!({}));
        assert!(traverse_mut(&mut data, &Path::from(["a", "b"]), Step::descend).is_none());
        assert_eq!(data, tree(json!({})));
    }

    #[test]
    fn test_created_containers_persist() {
        let mut data = tree(json!({}));
        let path = Path::from(["items", "0", "name"]);
        {
            let mut node = traverse_mut(&mut data, &path, create_on_demand).unwrap();
            assert!(!node.exists());
            assert!(node.set("x".into()));
        }
        assert_eq!(data, tree(json!({"items": [{"name": "x"}]})));
        // A later lookup without a step callback succeeds.
        let node = traverse(&data, &path).unwrap();
        assert_eq!(node.value, Some(&Value::from("x")));
    }

    #[test]
    fn test_step_callback_can_abort() {
        let mut data = tree(json!({"a": {"b": {"c": 1}}}));
        let mut seen = Vec::new();
        let result = traverse_mut(&mut data, &Path::from(["a", "b", "c"]), |step| {
            seen.push(step.path.to_string());
            if step.key.as_str() == "b" {
                Step::Abort
            } else {
                Step::Descend
            }
        });
        assert!(result.is_none());
        assert_eq!(seen, vec!["a".to_string(), "a.b".to_string()]);
    }

    #[test]
    fn test_step_sees_next_segment() {
        let mut data = tree(json!({}));
        let mut nexts = Vec::new();
        traverse_mut(&mut data, &Path::from(["a", "0", "b"]), |step| {
            nexts.push(step.next.clone());
            create_on_demand(step)
        });
        assert_eq!(nexts, vec![Segment::Index(0), Segment::key("b")]);
    }

    #[test]
    fn test_set_path_and_get_path() {
        let mut data = Value::Undefined;
        assert!(set_path(&mut data, &Path::from(["a", "b"]), 1.into()));
        assert!(set_path(&mut data, &Path::from(["a", "list", "1"]), true.into()));
        // The gap before index 1 is padded with `Undefined`.
        assert_eq!(
            data.to_json(),
            json!({"a": {"b": 1, "list": [null, true]}})
        );
        assert_eq!(
            get_path(&data, &Path::from(["a", "list", "0"])),
            Some(&Value::Undefined)
        );
        assert_eq!(get_path(&data, &Path::from(["a", "b"])), Some(&Value::Number(1.0)));
        assert_eq!(get_path(&data, &Path::root()), Some(&data));
    }

    #[test]
    fn test_set_path_replaces_scalars_in_the_way() {
        let mut data = tree(json!({"a": "text"}));
        assert!(set_path(&mut data, &Path::from(["a", "b"]), 2.into()));
        assert_eq!(data, tree(json!({"a": {"b": 2}})));
    }

    #[test]
    fn test_set_paths_counts_successes() {
        let mut data = tree(json!({}));
        let paths = vec![Path::from(["a"]), Path::from(["b", "c"])];
        assert_eq!(set_paths(&mut data, &paths, &Value::Bool(true)), 2);
        assert_eq!(data, tree(json!({"a": true, "b": {"c": true}})));
    }

    #[test]
    fn test_path_exists_rejects_paths_through_scalars() {
        let data = tree(json!({"name": "Ada", "address": {}}));
        assert!(path_exists(&data, &Path::from(["name", "first"])).is_none());
        assert!(path_exists(&data, &Path::from(["name"])).is_some());
        let slot = path_exists(&data, &Path::from(["address", "zip"])).unwrap();
        assert!(!slot.exists());
    }

    #[test]
    fn test_visit_all_is_preorder() {
        let mut data = tree(json!({"a": {"b": 1, "c": [2, 3]}, "d": 4}));
        let mut order = Vec::new();
        let walk = visit_all(&mut data, &Path::root(), |node| {
            order.push((node.path.to_string(), node.is_leaf));
            Visit::Continue
        });
        assert_eq!(walk, Walk::Completed);
        assert_eq!(
            order,
            vec![
                ("a".to_string(), false),
                ("a.b".to_string(), true),
                ("a.c".to_string(), false),
                ("a.c[0]".to_string(), true),
                ("a.c[1]".to_string(), true),
                ("d".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_visit_all_skip_abort_replace() {
        let mut data = tree(json!({"a": {"b": 1}, "c": {"d": 2}, "e": 3}));
        let mut seen = Vec::new();
        let walk = visit_all(&mut data, &Path::root(), |node| {
            seen.push(node.path.to_string());
            match node.path.to_string().as_str() {
                "a" => Visit::Skip,
                "c" => Visit::Replace(Value::from("replaced")),
                "e" => Visit::Abort,
                _ => Visit::Continue,
            }
        });
        assert_eq!(walk, Walk::Aborted);
        assert_eq!(seen, vec!["a", "c", "e"]);
        assert_eq!(data, tree(json!({"a": {"b": 1}, "c": "replaced", "e": 3})));
    }

    #[test]
    fn test_visit_all_prefixes_base_path() {
        let mut data = tree(json!({"x": 1}));
        let mut paths = Vec::new();
        visit_all(&mut data, &Path::from(["outer", "0"]), |node| {
            paths.push(node.path.clone());
            Visit::Continue
        });
        assert_eq!(paths, vec![Path::from(["outer", "0", "x"])]);
    }

    #[test]
    fn test_visit_all_ref_matches_mutable_order() {
        let data = tree(json!({"a": [1, {"b": 2}], "c": null}));
        let mut order = Vec::new();
        visit_all_ref(&data, &Path::root(), |node| {
            order.push(node.path.to_string());
            Flow::Continue
        });
        assert_eq!(order, vec!["a", "a[0]", "a[1]", "a[1].b", "c"]);
    }

    #[tokio::test]
    async fn test_async_visit_matches_sync_order() {
        let source = tree(json!({"a": {"b": 1, "c": [2, 3]}, "d": 4}));

        let mut sync_tree = source.clone();
        let mut sync_order = Vec::new();
        visit_all(&mut sync_tree, &Path::root(), |node| {
            sync_order.push(node.path.clone());
            Visit::Continue
        });

        let mut async_tree = source.clone();
        let mut async_order = Vec::new();
        let walk = visit_all_async(&mut async_tree, &Path::root(), |entry| {
            async_order.push(entry.path.clone());
            async {
                tokio::task::yield_now().await;
                Visit::Continue
            }
        })
        .await;

        assert_eq!(walk, Walk::Completed);
        assert_eq!(sync_order, async_order);
    }

    #[tokio::test]
    async fn test_async_visit_replaces_and_skips() {
        let mut data = tree(json!({"a": {"b": 1}, "c": 2, "d": 3}));
        let mut seen = Vec::new();
        let walk = visit_all_async(&mut data, &Path::root(), |entry| {
            seen.push(entry.path.to_string());
            let action = match entry.path.to_string().as_str() {
                "a" => Visit::Skip,
                "c" => Visit::Replace(Value::Number(20.0)),
                "d" => Visit::Abort,
                _ => Visit::Continue,
            };
            async move { action }
        })
        .await;
        assert_eq!(walk, Walk::Aborted);
        assert_eq!(seen, vec!["a", "c", "d"]);
        assert_eq!(data, tree(json!({"a": {"b": 1}, "c": 20, "d": 3})));
    }

    #[tokio::test]
    async fn test_async_traverse_creates_on_demand() {
        let mut data = tree(json!({}));
        let path = Path::from(["profile", "emails", "0"]);
        let mut node = traverse_async(&mut data, &path, |step| async move {
            match step.value {
                Some(value) if value.is_container() => Step::Descend,
                _ if step.next.is_index() => Step::Replace(Value::array()),
                _ => Step::Replace(Value::object()),
            }
        })
        .await
        .unwrap();
        assert!(node.set("a@b.c".into()));
        assert_eq!(data, tree(json!({"profile": {"emails": ["a@b.c"]}})));
    }
}
