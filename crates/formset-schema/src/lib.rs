//! # formset-schema: Schema Layer for Forms
//!
//! Turns a `$ref`-resolved JSON Schema document into everything a form
//! needs: initial values, client-side input constraints, the error-tree
//! topology, and server-side validation of submissions.
//!
//! ## Pipeline
//!
//! - **[`node`]**: the raw schema model ([`Schema`], [`SchemaNode`],
//!   [`TypeTag`]), deserialized with serde.
//! - **[`resolve`]**: [`schema_info`] normalizes a node into a
//!   [`SchemaInfo`]: flattened types, nullability, union branches, items and
//!   properties. Everything below reads `SchemaInfo`, never the raw node.
//! - **[`defaults`]**: [`default_value`] synthesizes the initial form value.
//! - **[`constraints`](mod@constraints)**: HTML5-style attributes per input.
//! - **[`shape`]**: [`error_shape`] marks branch nodes for error mapping.
//! - **[`cache`]**: derived artifacts keyed by content digest, shared
//!   through a caller-owned [`DerivedCache`].
//! - **[`validate`]**: Draft 2020-12 validation producing flat
//!   [`formset_core::Issue`]s.
//! - **[`form`]**: the [`FormSchema`] facade over all of the above.
//!
//! ## Crate Policy
//!
//! - Depends only on `formset-core` internally.
//! - Schema problems are [`SchemaError`]s carrying the offending path;
//!   nothing in this crate panics on user input.
//! - Derived artifacts are immutable once computed and `Send + Sync`.

pub mod cache;
pub mod config;
pub mod constraints;
pub mod defaults;
pub mod error;
pub mod form;
pub mod load;
pub mod node;
pub mod resolve;
pub mod shape;
pub mod validate;

pub use cache::{cache_key, derive, derive_cached, Derived, DerivedCache, MemoryCache};
pub use config::{DefaultsConfig, EngineConfig, OptionalProperties};
pub use constraints::{constraints, Bound, Constraint, Constraints};
pub use defaults::{default_value, default_value_with, Synthesizer};
pub use error::{FormsetError, LoadError, SchemaError};
pub use form::{FormSchema, FormValidation};
pub use load::{load_document, load_schema_file, parse_document, parse_schema, DocumentFormat};
pub use node::{Items, Schema, SchemaNode, TypeSpec, TypeTag};
pub use resolve::{collect_types, flatten_all_of, resolve_node, schema_info, SchemaInfo};
pub use shape::error_shape;
pub use validate::{pointer_to_path, JsonSchemaValidator};
