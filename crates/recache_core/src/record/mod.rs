//! Record abstraction.
//!
//! The engine never looks inside a concrete record type. Everything it
//! needs goes through [`Record`]: the schema (type identifier and declared
//! columns) and the current attribute mapping. Record types that can be
//! rebuilt from a cache entry also implement [`FromSnapshot`].

mod row;
mod schema;

pub use row::Row;
pub use schema::{Column, EncodedFormat, Schema, StorageType};

use crate::error::CacheResult;
use recache_codec::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Attribute name to value mapping of a record.
pub type Attributes = BTreeMap<String, Value>;

static NULL: Value = Value::Null;

/// Attribute access for a cached record.
///
/// Implementors only provide [`schema`](Record::schema) and
/// [`attributes`](Record::attributes); lookups by name are derived from
/// those two and check the name against the schema.
pub trait Record {
    /// Returns the record type's schema.
    fn schema(&self) -> &Schema;

    /// Returns the current attribute mapping.
    fn attributes(&self) -> &Attributes;

    /// Returns the record type identifier.
    fn type_name(&self) -> &str {
        self.schema().type_name()
    }

    /// Returns the value of a declared attribute.
    ///
    /// A declared attribute without a stored value reads as `Null`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAttribute` if the schema does not declare `attribute`.
    fn get(&self, attribute: &str) -> CacheResult<&Value> {
        self.schema().require(attribute)?;
        Ok(self.attributes().get(attribute).unwrap_or(&NULL))
    }

    /// Returns the declared storage type of an attribute.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAttribute` if the schema does not declare `attribute`.
    fn declared_type(&self, attribute: &str) -> CacheResult<StorageType> {
        Ok(self.schema().require(attribute)?.storage)
    }
}

/// Rebuilds a record from a cache snapshot.
///
/// This is the low-level constructor used on cache reads. It must not run
/// any of the type's normal construction logic: no defaults, no
/// validation, no callbacks, no loading of related records. The attribute
/// map has already been restricted to declared columns and encoded
/// attributes have been decoded.
pub trait FromSnapshot: Record + Sized {
    /// Builds the record from its schema and attribute snapshot.
    fn from_snapshot(schema: Arc<Schema>, attributes: Attributes) -> CacheResult<Self>;
}

impl<R: Record + ?Sized> Record for &R {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn attributes(&self) -> &Attributes {
        (**self).attributes()
    }
}

impl<R: Record + ?Sized> Record for Box<R> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn attributes(&self) -> &Attributes {
        (**self).attributes()
    }
}

impl<R: Record + ?Sized> Record for Arc<R> {
    fn schema(&self) -> &Schema {
        (**self).schema()
    }

    fn attributes(&self) -> &Attributes {
        (**self).attributes()
    }
}
