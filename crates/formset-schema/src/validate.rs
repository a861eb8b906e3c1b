//! # Form Data Validation
//!
//! Adapter from the `jsonschema` crate (Draft 2020-12) to the flat
//! [`Issue`] list that [`formset_core::map_errors`] consumes.
//!
//! Instance paths arrive as JSON pointers and are converted to [`Path`]s
//! segment by segment, unescaping `~1` and `~0`. A missing required
//! property is reported at the property's own path rather than at the
//! object that lacks it, so the message lands next to the input.

use std::fmt;

use formset_core::{Issue, Path, Segment};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Retrieve, Uri, Validator};
use serde_json::Value;

use crate::error::LoadError;

/// Retriever that refuses every external reference.
///
/// Schemas reach this crate with `$ref`s already resolved; anything left
/// pointing outside the document is a configuration error, never a fetch.
struct NoRemoteRefs;

impl Retrieve for NoRemoteRefs {
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external reference '{}' is not resolvable", uri.as_str()).into())
    }
}

/// A compiled validator for one schema document.
pub struct JsonSchemaValidator {
    validator: Validator,
}

impl fmt::Debug for JsonSchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSchemaValidator").finish_non_exhaustive()
    }
}

impl JsonSchemaValidator {
    /// Compile `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::ValidatorBuild`] when the document is not a valid
    /// Draft 2020-12 schema or references an external resource.
    pub fn new(schema: &Value) -> Result<Self, LoadError> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(NoRemoteRefs);
        let validator = opts
            .build(schema)
            .map_err(|e| LoadError::ValidatorBuild(e.to_string()))?;
        Ok(Self { validator })
    }

    /// Returns true when `instance` satisfies the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Every violation in `instance`, as issues.
    pub fn issues(&self, instance: &Value) -> Vec<Issue> {
        self.validator
            .iter_errors(instance)
            .map(|e| {
                let mut path = pointer_to_path(&e.instance_path.to_string());
                if let ValidationErrorKind::Required { property } = &e.kind {
                    if let Some(name) = property.as_str() {
                        path.push(Segment::key(name));
                    }
                }
                Issue::new(path, e.to_string())
            })
            .collect()
    }
}

/// Convert a JSON pointer (`/items/0/name`) into a [`Path`].
pub fn pointer_to_path(pointer: &str) -> Path {
    pointer
        .split('/')
        .skip(1)
        .map(|token| Segment::parse(&token.replace("~1", "/").replace("~0", "~")))
        .collect()
}
