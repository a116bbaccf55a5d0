//! Cache entry serialization.
//!
//! A [`CacheEntry`] is the shallow snapshot of a record that the cache
//! store keeps: the type identifier and a copy of the declared attributes.
//! Nothing else travels with it, so reading an entry back never loads
//! related records.

use crate::error::{CacheError, CacheResult};
use crate::record::{Attributes, FromSnapshot, Record, Schema};
use crate::registry::TypeRegistry;
use recache_codec::{from_cbor, to_canonical_cbor, Value};
use tracing::{debug, trace};

/// Version of the binary entry envelope written by [`CacheEntry::to_bytes`].
pub const ENTRY_FORMAT_VERSION: u64 = 1;

const VERSION_KEY: &str = "v";
const TYPE_KEY: &str = "c";
const ATTRIBUTES_KEY: &str = "a";

/// A serialized, association-free snapshot of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Type identifier of the record.
    pub type_name: String,
    /// Declared attributes at the time of serialization.
    pub attributes: Attributes,
}

impl CacheEntry {
    /// Creates an entry.
    pub fn new(type_name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            type_name: type_name.into(),
            attributes,
        }
    }

    /// Converts the entry to its envelope value `{v, c, a}`.
    #[allow(clippy::cast_possible_wrap)]
    pub fn to_value(&self) -> Value {
        let attributes = self
            .attributes
            .iter()
            .map(|(k, v)| (Value::Text(k.clone()), v.clone()))
            .collect();
        Value::map(vec![
            (Value::from(VERSION_KEY), Value::Integer(ENTRY_FORMAT_VERSION as i64)),
            (Value::from(TYPE_KEY), Value::Text(self.type_name.clone())),
            (Value::from(ATTRIBUTES_KEY), Value::map(attributes)),
        ])
    }

    /// Reads an entry from its envelope value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEntry` if the envelope is malformed and
    /// `UnsupportedVersion` if it was written by another format version.
    pub fn from_value(value: &Value) -> CacheResult<Self> {
        if value.as_map().is_none() {
            return Err(CacheError::invalid_entry("envelope is not a map"));
        }

        let version = value
            .get(VERSION_KEY)
            .and_then(Value::as_integer)
            .and_then(|v| u64::try_from(v).ok())
            .ok_or_else(|| CacheError::invalid_entry("missing version"))?;
        if version != ENTRY_FORMAT_VERSION {
            return Err(CacheError::UnsupportedVersion {
                expected: ENTRY_FORMAT_VERSION,
                actual: version,
            });
        }

        let type_name = value
            .get(TYPE_KEY)
            .and_then(Value::as_text)
            .ok_or_else(|| CacheError::invalid_entry("missing type identifier"))?;

        let pairs = value
            .get(ATTRIBUTES_KEY)
            .and_then(Value::as_map)
            .ok_or_else(|| CacheError::invalid_entry("missing attributes"))?;

        let mut attributes = Attributes::new();
        for (key, attr) in pairs {
            let name = key
                .as_text()
                .ok_or_else(|| CacheError::invalid_entry("attribute name is not text"))?;
            attributes.insert(name.to_string(), attr.clone());
        }

        Ok(Self::new(type_name, attributes))
    }

    /// Encodes the entry for the cache store.
    ///
    /// # Errors
    ///
    /// Returns a codec error if an attribute cannot be encoded (NaN floats).
    pub fn to_bytes(&self) -> CacheResult<Vec<u8>> {
        Ok(to_canonical_cbor(&self.to_value())?)
    }

    /// Decodes an entry read from the cache store.
    ///
    /// # Errors
    ///
    /// Returns a codec error for malformed bytes, otherwise the errors of
    /// [`CacheEntry::from_value`].
    pub fn from_bytes(bytes: &[u8]) -> CacheResult<Self> {
        Self::from_value(&from_cbor(bytes)?)
    }
}

/// Serializes a record into a cache entry.
///
/// Only declared attributes are copied; the entry owns its copy and shares
/// nothing with the live record. Declared attributes the record has no
/// value for are stored as null.
pub fn serialize<R: Record + ?Sized>(record: &R) -> CacheEntry {
    let schema = record.schema();
    let current = record.attributes();
    let attributes = schema
        .columns()
        .iter()
        .map(|c| {
            let value = current.get(&c.name).cloned().unwrap_or(Value::Null);
            (c.name.clone(), value)
        })
        .collect();
    CacheEntry::new(schema.type_name(), attributes)
}

/// Deserializes a cache entry into a record.
///
/// # Errors
///
/// Returns `UnknownType` if the entry's type is not registered,
/// `DecodeFailed` if an encoded attribute is malformed, or whatever the
/// record type's [`FromSnapshot`] implementation reports.
pub fn deserialize<R: FromSnapshot>(registry: &TypeRegistry, entry: &CacheEntry) -> CacheResult<R> {
    deserialize_with(registry, entry, true)
}

pub(crate) fn deserialize_with<R: FromSnapshot>(
    registry: &TypeRegistry,
    entry: &CacheEntry,
    decode_encoded: bool,
) -> CacheResult<R> {
    let schema = registry.resolve(&entry.type_name)?;
    let attributes = restore_attributes(&schema, entry, decode_encoded)?;
    trace!(type_name = %entry.type_name, attributes = attributes.len(), "restored cache entry");
    R::from_snapshot(schema, attributes)
}

fn restore_attributes(
    schema: &Schema,
    entry: &CacheEntry,
    decode_encoded: bool,
) -> CacheResult<Attributes> {
    let mut attributes = Attributes::new();
    for column in schema.columns() {
        let raw = entry.attributes.get(&column.name).cloned().unwrap_or(Value::Null);
        let value = match column.encoding {
            Some(format) if decode_encoded => format.decode(&column.name, &raw)?.unwrap_or(raw),
            _ => raw,
        };
        attributes.insert(column.name.clone(), value);
    }

    let dropped = entry
        .attributes
        .keys()
        .filter(|k| !schema.has_attribute(k))
        .count();
    if dropped > 0 {
        debug!(type_name = %entry.type_name, dropped, "ignored undeclared attributes in cache entry");
    }

    Ok(attributes)
}
