//! # formset-core: Data Engine for Schema-Driven Forms
//!
//! The schema-independent half of Formset. Everything here operates on plain
//! data trees and paths; the `formset-schema` crate builds on it.
//!
//! ## Contents
//!
//! - **[`Value`]**: the form data tree. Unlike JSON it distinguishes
//!   `Undefined` from `Null` and carries dates, big integers, symbols and sets.
//! - **[`Path`] / [`Segment`]**: addresses into a tree. Index segments reach
//!   arrays, key segments reach objects; both are strings on the wire.
//! - **[`traverse`](mod@traverse)**: sync and async path traversal, on-demand container
//!   creation, and depth-first visiting with skip/abort/replace control.
//! - **[`diff()`]**: leaf paths at which two trees differ (tainted fields).
//! - **[`issues`]**: mapping a flat validator issue list into a nested error
//!   tree, guided by an [`ErrorShape`].
//! - **[`merge_defaults`]**: filling user data from synthesized defaults.
//! - **[`CanonicalBytes`] / [`ContentDigest`]**: content addressing for
//!   derived-artifact caches.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `formset-*` crates.
//! - A traversal that does not reach its target is `None`, never an error.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod diff;
pub mod digest;
pub mod error;
pub mod issues;
pub mod merge;
pub mod path;
pub mod traverse;
pub mod value;

pub use canonical::CanonicalBytes;
pub use diff::{diff, is_unchanged};
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, PathError};
pub use issues::{flatten_errors, map_errors, ErrorShape, FlatError, Issue, FORM_ERRORS_KEY};
pub use merge::{deep_merge, merge_defaults, with_defaults};
pub use path::{Path, Segment};
pub use traverse::{
    create_on_demand, get_path, path_exists, set_path, set_paths, traverse, traverse_async,
    traverse_mut, visit_all, visit_all_async, visit_all_ref, Flow, Node, NodeMut, Step, StepData,
    StepInfo, Visit, VisitEntry, VisitNode, Walk,
};
pub use value::{Map, Symbol, Value};
