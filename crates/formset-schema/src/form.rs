//! # Form Schema Facade
//!
//! [`FormSchema`] ties the schema layer together: parse a document once,
//! derive (or fetch from a cache) its defaults, constraints and error shape,
//! compile a validator, then validate any number of submissions.
//!
//! Validation merges the submission with the defaults first, so a partial
//! submission is checked as the form would actually hold it. Issues are
//! mapped through the error shape into a nested error tree.

use std::path::Path as FsPath;
use std::sync::Arc;

use formset_core::{map_errors, merge_defaults, ContentDigest, ErrorShape, Issue, Value};
use serde_json::Value as Json;

use crate::cache::{derive, derive_cached, Derived, DerivedCache};
use crate::config::EngineConfig;
use crate::constraints::Constraints;
use crate::error::FormsetError;
use crate::load::{load_document, parse_schema};
use crate::node::Schema;
use crate::validate::JsonSchemaValidator;

/// Outcome of validating one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FormValidation {
    /// True when no issue was found.
    pub valid: bool,
    /// The submission merged with the form defaults.
    pub data: Value,
    /// Nested error tree; an empty object when valid.
    pub errors: Value,
    /// The flat issue list the tree was built from.
    pub issues: Vec<Issue>,
}

/// A parsed schema with its derived artifacts and compiled validator.
#[derive(Debug)]
pub struct FormSchema {
    document: Json,
    schema: Schema,
    config: EngineConfig,
    derived: Arc<Derived>,
    validator: JsonSchemaValidator,
}

impl FormSchema {
    /// Build from a JSON document with the default configuration.
    pub fn new(document: Json) -> Result<Self, FormsetError> {
        Self::with_config(document, EngineConfig::default())
    }

    /// Build from a JSON document.
    pub fn with_config(document: Json, config: EngineConfig) -> Result<Self, FormsetError> {
        let schema = parse_schema(&document, "<inline>")?;
        let derived = Arc::new(derive(&document, &schema, &config)?);
        Self::assemble(document, schema, config, derived)
    }

    /// Build from a JSON document, sharing derived artifacts through `cache`.
    pub fn with_cache(
        document: Json,
        config: EngineConfig,
        cache: &dyn DerivedCache,
    ) -> Result<Self, FormsetError> {
        let schema = parse_schema(&document, "<inline>")?;
        let derived = derive_cached(cache, &document, &schema, &config)?;
        Self::assemble(document, schema, config, derived)
    }

    /// Load a JSON or YAML schema file.
    pub fn from_file(path: &FsPath, config: EngineConfig) -> Result<Self, FormsetError> {
        let document = load_document(path)?;
        let schema = parse_schema(&document, &path.display().to_string())?;
        let derived = Arc::new(derive(&document, &schema, &config)?);
        Self::assemble(document, schema, config, derived)
    }

    fn assemble(
        document: Json,
        schema: Schema,
        config: EngineConfig,
        derived: Arc<Derived>,
    ) -> Result<Self, FormsetError> {
        let validator = JsonSchemaValidator::new(&document)?;
        tracing::debug!(digest = %derived.digest, "form schema ready");
        Ok(Self {
            document,
            schema,
            config,
            derived,
            validator,
        })
    }

    /// The source document.
    pub fn document(&self) -> &Json {
        &self.document
    }

    /// The parsed schema model.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The configuration the artifacts were derived under.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Content digest of the schema and configuration.
    pub fn digest(&self) -> ContentDigest {
        self.derived.digest
    }

    /// Default value of the whole form.
    pub fn defaults(&self) -> &Value {
        &self.derived.defaults
    }

    /// Input constraints, if any.
    pub fn constraints(&self) -> Option<&Constraints> {
        self.derived.constraints.as_ref()
    }

    /// Error shape of the form.
    pub fn shape(&self) -> &ErrorShape {
        &self.derived.shape
    }

    /// Validate a submission.
    pub fn validate(&self, submission: &Json) -> FormValidation {
        let mut data = Value::from(submission);
        merge_defaults(&mut data, &self.derived.defaults);
        let issues = self.validator.issues(&data.to_json());
        let errors = map_errors(&issues, &self.derived.shape);
        if !issues.is_empty() {
            tracing::debug!(count = issues.len(), "submission failed validation");
        }
        FormValidation {
            valid: issues.is_empty(),
            data,
            errors,
            issues,
        }
    }
}
