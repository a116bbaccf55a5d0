//! Record type schemas.

use crate::error::{CacheError, CacheResult};
use recache_codec::{from_cbor, Value};
use serde::{Deserialize, Serialize};

/// Declared storage type of a column.
///
/// Mirrors the column types a relational table would declare. Only the
/// textual types change behavior (they sort by collation key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Short string (`VARCHAR`).
    String,
    /// Long text (`TEXT`).
    Text,
    /// Integer.
    Integer,
    /// Floating point.
    Float,
    /// Fixed-point decimal, held as a float in memory.
    Decimal,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Date and time.
    DateTime,
    /// Raw bytes.
    Binary,
}

impl StorageType {
    /// Returns true for string-like columns.
    pub fn is_textual(self) -> bool {
        matches!(self, StorageType::String | StorageType::Text)
    }
}

/// Secondary encoding of an attribute whose stored value packs a
/// structured payload (JSON columns, CBOR blobs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodedFormat {
    /// CBOR carried in a byte string.
    Cbor,
    /// JSON carried in a text string.
    Json,
}

impl EncodedFormat {
    /// Decodes a raw attribute value.
    ///
    /// Returns `Ok(None)` when the raw value is not in this format's encoded
    /// form (already decoded, or null); the caller keeps it unchanged.
    pub fn decode(self, attribute: &str, raw: &Value) -> CacheResult<Option<Value>> {
        match (self, raw) {
            (EncodedFormat::Cbor, Value::Bytes(bytes)) => from_cbor(bytes)
                .map(Some)
                .map_err(|e| CacheError::decode_failed(attribute, e.to_string())),
            (EncodedFormat::Json, Value::Text(text)) => serde_json::from_str(text)
                .map(|json| Some(json_to_value(json)))
                .map_err(|e| CacheError::decode_failed(attribute, e.to_string())),
            _ => Ok(None),
        }
    }
}

fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => n.as_f64().map_or(Value::Null, Value::Float),
        },
        serde_json::Value::String(s) => Value::Text(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(fields) => Value::map(
            fields
                .into_iter()
                .map(|(k, v)| (Value::Text(k), json_to_value(v)))
                .collect(),
        ),
    }
}

/// A declared attribute of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Attribute name.
    pub name: String,
    /// Declared storage type.
    pub storage: StorageType,
    /// Secondary encoding, if the stored value packs a structured payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<EncodedFormat>,
}

impl Column {
    /// Creates a plain column.
    pub fn new(name: impl Into<String>, storage: StorageType) -> Self {
        Self {
            name: name.into(),
            storage,
            encoding: None,
        }
    }

    /// Marks this column as secondarily encoded.
    #[must_use]
    pub fn encoded(mut self, format: EncodedFormat) -> Self {
        self.encoding = Some(format);
        self
    }
}

/// The shape of a record type: its stable type identifier and its columns.
///
/// # Example
///
/// ```
/// use recache_core::{Schema, StorageType, EncodedFormat};
///
/// let schema = Schema::new("Apple")
///     .column("name", StorageType::String)
///     .column("price", StorageType::Decimal)
///     .encoded_column("details", StorageType::Text, EncodedFormat::Json);
///
/// assert!(schema.has_attribute("price"));
/// assert_eq!(schema.encoded_columns().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    type_name: String,
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema without columns.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a plain column. A column of the same name is replaced.
    #[must_use]
    pub fn column(self, name: impl Into<String>, storage: StorageType) -> Self {
        self.with_column(Column::new(name, storage))
    }

    /// Adds a secondarily encoded column.
    #[must_use]
    pub fn encoded_column(
        self,
        name: impl Into<String>,
        storage: StorageType,
        format: EncodedFormat,
    ) -> Self {
        self.with_column(Column::new(name, storage).encoded(format))
    }

    /// Adds a column. A column of the same name is replaced.
    #[must_use]
    pub fn with_column(mut self, column: Column) -> Self {
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        self
    }

    /// Returns the type identifier.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns all columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by attribute name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks up a column, failing with `UnknownAttribute` if it is not declared.
    pub fn require(&self, name: &str) -> CacheResult<&Column> {
        self.get_column(name)
            .ok_or_else(|| CacheError::unknown_attribute(&self.type_name, name))
    }

    /// Checks whether an attribute is declared.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    /// Iterates the secondarily encoded columns.
    pub fn encoded_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.encoding.is_some())
    }
}
