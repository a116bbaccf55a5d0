//! Test fixtures: sample record types and data.
//!
//! The fixtures model a small shop: `Apple` records belonging to `Store`
//! records. Apples carry a JSON-encoded `details` column so that the
//! secondary decode step is exercised.

use chrono::{DateTime, TimeZone, Utc};
use recache_codec::Value;
use recache_core::{
    Attributes, CacheError, CacheResult, EncodedFormat, FromSnapshot, Record, Row, Schema,
    StorageType, TypeRegistry,
};
use std::sync::Arc;

/// Type identifier of the apple fixture.
pub const APPLE: &str = "Apple";

/// Type identifier of the store fixture.
pub const STORE: &str = "Store";

/// Schema of the apple fixture.
pub fn apple_schema() -> Schema {
    Schema::new(APPLE)
        .column("id", StorageType::Integer)
        .column("name", StorageType::String)
        .column("price", StorageType::Decimal)
        .column("store_id", StorageType::Integer)
        .column("updated_at", StorageType::DateTime)
        .encoded_column("details", StorageType::Text, EncodedFormat::Json)
}

/// Schema of the store fixture.
pub fn store_schema() -> Schema {
    Schema::new(STORE)
        .column("id", StorageType::Integer)
        .column("name", StorageType::String)
}

/// Creates a registry with both fixture types registered.
pub fn registry() -> Arc<TypeRegistry> {
    let registry = TypeRegistry::new();
    registry.register(apple_schema());
    registry.register(store_schema());
    Arc::new(registry)
}

/// A fixed instant on day `day` of January 2024.
pub fn timestamp(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0)
        .single()
        .expect("valid fixture date")
}

/// Field values of one apple.
#[derive(Debug, Clone, PartialEq)]
pub struct AppleFields {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Price, if known.
    pub price: Option<f64>,
    /// Owning store, if any.
    pub store_id: Option<i64>,
    /// Last update time, if recorded.
    pub updated_at: Option<DateTime<Utc>>,
}

impl AppleFields {
    /// Builds a generic row for these fields.
    pub fn to_row(&self, schema: &Arc<Schema>) -> Row {
        Row::from_pairs(
            Arc::clone(schema),
            [
                ("id", Value::Integer(self.id)),
                ("name", Value::from(self.name.as_str())),
                ("price", Value::from(self.price)),
                ("store_id", Value::from(self.store_id)),
                ("updated_at", Value::from(self.updated_at)),
            ],
        )
        .expect("apple fields match the apple schema")
    }
}

/// The sample apples used across the integration tests.
///
/// | id | name        | price | store | updated |
/// |----|-------------|-------|-------|---------|
/// | 1  | Green Apple | 0.49  | 1     | day 1   |
/// | 2  | APPLE       | 0.59  | 2     | day 3   |
/// | 3  | apple       | 0.69  | 1     | null    |
/// | 4  | Äpfel       | 0.59  | 3     | day 2   |
/// | 5  | Red Apple   | null  | 2     | day 4   |
pub fn sample_apple_fields() -> Vec<AppleFields> {
    let rows: [(i64, &str, Option<f64>, i64, Option<u32>); 5] = [
        (1, "Green Apple", Some(0.49), 1, Some(1)),
        (2, "APPLE", Some(0.59), 2, Some(3)),
        (3, "apple", Some(0.69), 1, None),
        (4, "Äpfel", Some(0.59), 3, Some(2)),
        (5, "Red Apple", None, 2, Some(4)),
    ];
    rows.into_iter()
        .map(|(id, name, price, store_id, day)| AppleFields {
            id,
            name: name.to_string(),
            price,
            store_id: Some(store_id),
            updated_at: day.map(timestamp),
        })
        .collect()
}

/// The sample apples as generic rows.
pub fn sample_apples(registry: &TypeRegistry) -> Vec<Row> {
    let schema = registry.resolve(APPLE).expect("apple schema registered");
    let mut rows: Vec<Row> = sample_apple_fields()
        .iter()
        .map(|fields| fields.to_row(&schema))
        .collect();
    rows[0]
        .set("details", serde_json::json!({"origin": "NZ", "organic": true}).to_string())
        .expect("details is declared");
    rows
}

/// Returns the `id` attribute of each record, in order.
pub fn ids<R: Record>(records: &[R]) -> Vec<i64> {
    records
        .iter()
        .map(|r| r.get("id").ok().and_then(Value::as_integer).unwrap_or(-1))
        .collect()
}

/// A dedicated record type for apples.
///
/// Unlike [`Row`], `Apple` refuses snapshots of any other type.
#[derive(Debug, Clone, PartialEq)]
pub struct Apple {
    schema: Arc<Schema>,
    attributes: Attributes,
}

impl Apple {
    /// Returns the primary key.
    pub fn id(&self) -> Option<i64> {
        self.attributes.get("id").and_then(Value::as_integer)
    }

    /// Returns the display name.
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_text)
    }

    /// Returns the price.
    pub fn price(&self) -> Option<f64> {
        self.attributes.get("price").and_then(Value::as_float)
    }

    /// Returns the decoded details payload.
    pub fn details(&self) -> Option<&Value> {
        self.attributes.get("details").filter(|v| !v.is_null())
    }
}

impl Record for Apple {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

impl FromSnapshot for Apple {
    fn from_snapshot(schema: Arc<Schema>, attributes: Attributes) -> CacheResult<Self> {
        if schema.type_name() != APPLE {
            return Err(CacheError::invalid_entry(format!(
                "expected an {APPLE} entry, got {}",
                schema.type_name()
            )));
        }
        Ok(Self { schema, attributes })
    }
}
