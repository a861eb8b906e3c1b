//! # Error Types
//!
//! `SchemaError` covers schemas that are well-formed JSON but cannot drive a
//! form: boolean nodes where a definition is needed, unions that leave the
//! default ambiguous, types the synthesizer has no fallback for. Every
//! variant carries the dotted path of the offending node.
//!
//! `LoadError` covers reading and compiling schema documents.

use formset_core::{CanonicalizationError, Path};
use thiserror::Error;

/// Render a schema path for error messages.
pub(crate) fn display_path(path: &Path) -> String {
    if path.is_empty() {
        "(root)".to_owned()
    } else {
        path.to_string()
    }
}

/// A schema cannot be used to synthesize defaults or derive constraints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A `true`/`false` literal where a schema definition is required.
    #[error("schema at {path} is a boolean literal, expected a definition")]
    BooleanSchema {
        /// Location of the node.
        path: String,
    },

    /// More than one union branch declares a default.
    #[error(
        "union at {path} has {count} branches with a default; only one may have a default, \
         or set a default for the whole union"
    )]
    AmbiguousUnionDefault {
        /// Location of the union.
        path: String,
        /// Number of branches carrying a default.
        count: usize,
    },

    /// A union mixing basic types, none of whose branches has a default.
    #[error(
        "multi-type union at {path} needs a default value, or exactly one branch with a default"
    )]
    UnionWithoutDefault {
        /// Location of the union.
        path: String,
    },

    /// A node declares several basic types and has no default.
    #[error("default value at {path} cannot have more than one type: {types}")]
    MultipleTypes {
        /// Location of the node.
        path: String,
        /// The conflicting types, comma separated.
        types: String,
    },

    /// No fallback exists for the node's type.
    #[error("type or format '{type_name}' at {path} is not supported, an explicit default is required")]
    UnsupportedType {
        /// Location of the node.
        path: String,
        /// The unsupported type tag.
        type_name: String,
    },

    /// A default on a node whose types mix a date with a number.
    #[error("cannot resolve a default at {path} for a union of a date and a number/integer")]
    DateNumberUnion {
        /// Location of the node.
        path: String,
    },

    /// A default literal that cannot be converted to the node's type.
    #[error("invalid default at {path}: {reason}")]
    InvalidDefault {
        /// Location of the node.
        path: String,
        /// What went wrong.
        reason: String,
    },
}

/// A schema document could not be read, parsed, or compiled.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be read.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// The file being read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid JSON or YAML, or does not match the schema model.
    #[error("cannot parse '{origin}': {reason}")]
    Parse {
        /// File path or `<inline>`.
        origin: String,
        /// Parser message.
        reason: String,
    },

    /// The JSON Schema validator could not be built.
    #[error("validator build error: {0}")]
    ValidatorBuild(String),
}

/// Top-level error type for the schema layer.
#[derive(Error, Debug)]
pub enum FormsetError {
    /// Schema configuration error.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Loading error.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Canonicalization failed while computing a cache key.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_path_renders_as_root() {
        assert_eq!(display_path(&Path::root()), "(root)");
        assert_eq!(display_path(&Path::from(["a", "0", "b"])), "a[0].b");
    }

    #[test]
    fn test_messages_name_the_path() {
        let err = SchemaError::AmbiguousUnionDefault {
            path: "(root)".into(),
            count: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("(root)"));
        assert!(msg.contains("2 branches"));
    }

    #[test]
    fn test_schema_errors_convert_into_top_level() {
        let err: FormsetError = SchemaError::BooleanSchema { path: "x".into() }.into();
        assert!(matches!(err, FormsetError::Schema(_)));
        assert!(err.to_string().starts_with("schema error:"));
    }
}
