//! Record type registry.

use crate::error::{CacheError, CacheResult};
use crate::record::Schema;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves cache-entry type identifiers to record schemas.
///
/// Deserialize looks the entry's declared type up here. The registry is
/// shared across threads; lookups take a read lock only.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    schemas: RwLock<HashMap<String, Arc<Schema>>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its type identifier.
    ///
    /// Re-registering a type replaces the previous schema; records already
    /// reconstructed keep the schema they were built with.
    pub fn register(&self, schema: Schema) -> Arc<Schema> {
        let schema = Arc::new(schema);
        let previous = self
            .schemas
            .write()
            .insert(schema.type_name().to_string(), Arc::clone(&schema));
        if previous.is_some() {
            tracing::debug!(type_name = schema.type_name(), "replaced registered schema");
        }
        schema
    }

    /// Resolves a type identifier.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if nothing is registered under `type_name`.
    pub fn resolve(&self, type_name: &str) -> CacheResult<Arc<Schema>> {
        self.schemas
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| CacheError::unknown_type(type_name))
    }

    /// Checks whether a type identifier is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.read().contains_key(type_name)
    }

    /// Returns the registered type identifiers, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}
