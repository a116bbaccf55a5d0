//! Schema-driven generic record.

use super::{Attributes, FromSnapshot, Record, Schema};
use crate::error::CacheResult;
use recache_codec::Value;
use std::sync::Arc;

/// A record of any type, described entirely by its schema.
///
/// `Row` is what the engine reconstructs when the caller has no dedicated
/// Rust type for a record. It shares its schema with every other row of
/// the same type.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    schema: Arc<Schema>,
    attributes: Attributes,
}

impl Row {
    /// Creates a row with every declared attribute set to null.
    pub fn new(schema: Arc<Schema>) -> Self {
        let attributes = schema
            .columns()
            .iter()
            .map(|c| (c.name.clone(), Value::Null))
            .collect();
        Self { schema, attributes }
    }

    /// Creates a row from attribute pairs; unset attributes are null.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAttribute` if a pair names an undeclared attribute.
    pub fn from_pairs<K, V>(
        schema: Arc<Schema>,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> CacheResult<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut row = Self::new(schema);
        for (name, value) in pairs {
            row.set(name, value)?;
        }
        Ok(row)
    }

    /// Sets an attribute value.
    ///
    /// # Errors
    ///
    /// Returns `UnknownAttribute` if the attribute is not declared.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> CacheResult<()> {
        let attribute = attribute.into();
        self.schema.require(&attribute)?;
        self.attributes.insert(attribute, value.into());
        Ok(())
    }
}

impl Record for Row {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl FromSnapshot for Row {
    fn from_snapshot(schema: Arc<Schema>, attributes: Attributes) -> CacheResult<Self> {
        Ok(Self { schema, attributes })
    }
}
