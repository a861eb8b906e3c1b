//! # Derived Artifact Cache
//!
//! Defaults, constraints and error shape are pure functions of the schema
//! document and the engine configuration, so they are derived once and
//! shared. Entries are keyed by the [`ContentDigest`] of the canonical
//! `(schema, config)` pair; two documents differing only in key order or
//! number spelling share an entry.
//!
//! The cache is owned by the caller. [`MemoryCache`] is a process-local
//! implementation; anything implementing [`DerivedCache`] can stand in.

use std::collections::HashMap;
use std::sync::Arc;

use formset_core::{ContentDigest, ErrorShape, Path, Value};
use parking_lot::RwLock;
use serde_json::Value as Json;

use crate::config::EngineConfig;
use crate::constraints::{constraints, Constraints};
use crate::defaults::Synthesizer;
use crate::error::FormsetError;
use crate::node::Schema;
use crate::shape::error_shape;

/// Everything derived from one schema under one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    /// Cache key.
    pub digest: ContentDigest,
    /// Default value of the whole form.
    pub defaults: Value,
    /// Input constraints; `None` when the schema yields none.
    pub constraints: Option<Constraints>,
    /// Branch-node topology for error mapping.
    pub shape: ErrorShape,
}

/// Storage for derived artifacts.
pub trait DerivedCache: Send + Sync {
    /// Look up an entry.
    fn get(&self, digest: &ContentDigest) -> Option<Arc<Derived>>;

    /// Store an entry under its own digest.
    fn insert(&self, derived: Arc<Derived>);
}

/// Thread-safe, cloneable in-memory cache. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<RwLock<HashMap<ContentDigest, Arc<Derived>>>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl DerivedCache for MemoryCache {
    fn get(&self, digest: &ContentDigest) -> Option<Arc<Derived>> {
        self.entries.read().get(digest).cloned()
    }

    fn insert(&self, derived: Arc<Derived>) {
        self.entries.write().insert(derived.digest, derived);
    }
}

/// Cache key for a schema document under a configuration.
pub fn cache_key(document: &Json, config: &EngineConfig) -> Result<ContentDigest, FormsetError> {
    Ok(ContentDigest::of(&(document, config))?)
}

/// Derive every artifact without consulting a cache.
pub fn derive(document: &Json, schema: &Schema, config: &EngineConfig) -> Result<Derived, FormsetError> {
    let root = Path::root();
    Ok(Derived {
        digest: cache_key(document, config)?,
        defaults: Synthesizer::new(config.clone()).default_value(schema, false, &root)?,
        constraints: constraints(schema, false, &root)?,
        shape: error_shape(schema)?,
    })
}

/// Derive through `cache`, computing and storing on a miss.
pub fn derive_cached(
    cache: &dyn DerivedCache,
    document: &Json,
    schema: &Schema,
    config: &EngineConfig,
) -> Result<Arc<Derived>, FormsetError> {
    let digest = cache_key(document, config)?;
    if let Some(hit) = cache.get(&digest) {
        tracing::trace!(%digest, "derived cache hit");
        return Ok(hit);
    }
    tracing::trace!(%digest, "derived cache miss");
    let derived = Arc::new(derive(document, schema, config)?);
    cache.insert(Arc::clone(&derived));
    Ok(derived)
}
