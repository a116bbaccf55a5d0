//! Engine facade.

use crate::config::Config;
use crate::error::CacheResult;
use crate::filter::{filter_with, Predicates};
use crate::record::{FromSnapshot, Record};
use crate::registry::TypeRegistry;
use crate::serializer::{deserialize_with, serialize, CacheEntry};
use crate::sort::{sort_with, SortOrder};
use std::sync::Arc;

/// The main cache-engine handle.
///
/// `Engine` bundles a [`TypeRegistry`] with a [`Config`] and exposes the
/// four cache operations:
/// - serialize a record into a [`CacheEntry`]
/// - deserialize an entry back into a record
/// - filter records by attribute predicates
/// - sort records by a multi-key sort spec
///
/// The free functions in this crate do the same work with default settings.
/// The engine is cheap to clone and can be shared across threads.
///
/// ```
/// use recache_core::{Engine, Predicates, Row, Schema, StorageType, TypeRegistry};
/// use std::sync::Arc;
///
/// let registry = Arc::new(TypeRegistry::new());
/// let schema = registry.register(Schema::new("Apple").column("name", StorageType::String));
/// let engine = Engine::new(registry);
///
/// let apple = Row::from_pairs(schema, [("name", "Fuji")]).unwrap();
/// let bytes = engine.store(&apple).unwrap();
/// let mut cached: Vec<Row> = vec![engine.load(&bytes).unwrap()];
///
/// engine.filter(&mut cached, &Predicates::new().eq("name", "FUJI")).unwrap();
/// assert_eq!(cached, vec![apple]);
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<TypeRegistry>,
    config: Config,
}

impl Engine {
    /// Creates an engine with the default configuration.
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(registry, Config::default())
    }

    /// Creates an engine with a custom configuration.
    pub fn with_config(registry: Arc<TypeRegistry>, config: Config) -> Self {
        Self { registry, config }
    }

    /// Returns the type registry.
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Serializes a record into a cache entry.
    pub fn serialize<R: Record + ?Sized>(&self, record: &R) -> CacheEntry {
        serialize(record)
    }

    /// Deserializes a cache entry into a record.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` for an unregistered type, or `DecodeFailed` for
    /// a malformed encoded attribute.
    pub fn deserialize<R: FromSnapshot>(&self, entry: &CacheEntry) -> CacheResult<R> {
        deserialize_with(&self.registry, entry, self.config.decode_encoded_attributes)
    }

    /// Serializes a record straight to the bytes kept by the cache store.
    ///
    /// # Errors
    ///
    /// Returns a codec error if an attribute cannot be encoded.
    pub fn store<R: Record + ?Sized>(&self, record: &R) -> CacheResult<Vec<u8>> {
        serialize(record).to_bytes()
    }

    /// Rebuilds a record from bytes read from the cache store.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`CacheEntry::from_bytes`] and
    /// [`Engine::deserialize`].
    pub fn load<R: FromSnapshot>(&self, bytes: &[u8]) -> CacheResult<R> {
        self.deserialize(&CacheEntry::from_bytes(bytes)?)
    }

    /// Removes the records that do not satisfy every predicate.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAttribute` if a predicate names an undeclared attribute.
    pub fn filter<R: Record>(&self, records: &mut Vec<R>, predicates: &Predicates) -> CacheResult<()> {
        filter_with(records, predicates, self.config.case_insensitive)
    }

    /// Sorts records in place.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAttribute` or `TypeMismatch`; records keep their
    /// order on error.
    pub fn sort<R: Record>(&self, records: &mut [R], orders: &[SortOrder]) -> CacheResult<()> {
        sort_with(records, orders, self.config.collate_text)
    }

    /// Sorts records by an SQL-style clause such as `"price DESC, name"`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSortOrder` for a malformed clause, otherwise the
    /// errors of [`Engine::sort`].
    pub fn sort_by_clause<R: Record>(&self, records: &mut [R], clause: &str) -> CacheResult<()> {
        self.sort(records, &SortOrder::parse_list(clause)?)
    }
}
