//! Property-based test generators using proptest.
//!
//! Generated apples draw their names from a small pool of case and accent
//! variants so that ties under collation and case folding are common.

use crate::fixtures::AppleFields;
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use recache_codec::Value;
use recache_core::{Predicate, Predicates, SortOrder};

/// Names that collide under case folding or collation.
pub static NAMES: &[&str] = &[
    "apple", "Apple", "APPLE", "Äpfel", "apfel", "résumé", "Resume", "RESUME", "crème", "Creme",
    "pear", "Pear", "zebra",
];

/// Prices used by generated apples and membership predicates.
pub static PRICES: &[f64] = &[0.49, 0.59, 0.69, 1.25];

/// Attributes of the apple fixture that can be sorted on.
pub static SORTABLE: &[&str] = &["id", "name", "price", "store_id", "updated_at"];

/// Strategy for timestamps with whole-second precision.
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_102_444_800).prop_map(|secs| Utc.timestamp_opt(secs, 0).single().unwrap_or_default())
}

/// Strategy for scalar values of every kind except NaN floats.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e9..1.0e9f64).prop_map(Value::Float),
        "[ -~]{0,16}".prop_map(Value::Text),
        "\\PC{0,8}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
        timestamp_strategy().prop_map(Value::Timestamp),
    ]
}

/// Strategy for apple names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(NAMES).prop_map(|name| name.to_string())
}

/// Strategy for apple prices.
pub fn price_strategy() -> impl Strategy<Value = f64> {
    prop::sample::select(PRICES)
}

/// Strategy for a list of apples with ids `0..n` in order.
pub fn apples_strategy(max_len: usize) -> impl Strategy<Value = Vec<AppleFields>> {
    let apple = (
        name_strategy(),
        prop::option::of(price_strategy()),
        prop::option::of(1i64..4),
        prop::option::weighted(0.7, timestamp_strategy()),
    );
    prop::collection::vec(apple, 0..=max_len).prop_map(|apples| {
        apples
            .into_iter()
            .zip(0i64..)
            .map(|((name, price, store_id, updated_at), id)| AppleFields {
                id,
                name,
                price,
                store_id,
                updated_at,
            })
            .collect()
    })
}

/// Strategy for one condition on an apple attribute.
pub fn predicate_strategy() -> impl Strategy<Value = (String, Predicate)> {
    prop_oneof![
        name_strategy().prop_map(|name| ("name".to_string(), Predicate::equals(name))),
        prop::collection::vec(price_strategy(), 1..3)
            .prop_map(|prices| ("price".to_string(), Predicate::any_of(prices))),
        (1i64..4).prop_map(|store| ("store_id".to_string(), Predicate::equals(store))),
    ]
}

/// Strategy for predicate sets of up to three conditions.
pub fn predicates_strategy() -> impl Strategy<Value = Predicates> {
    prop::collection::vec(predicate_strategy(), 0..=3)
        .prop_map(|conditions| conditions.into_iter().collect())
}

/// Strategy for sort specs of one to three distinct apple attributes.
pub fn sort_orders_strategy() -> impl Strategy<Value = Vec<SortOrder>> {
    (
        prop::sample::subsequence(SORTABLE.to_vec(), 1..=3).prop_shuffle(),
        prop::collection::vec(any::<bool>(), 3),
    )
        .prop_map(|(attributes, directions)| {
            attributes
                .into_iter()
                .zip(directions)
                .map(|(attribute, ascending)| SortOrder::new(attribute, ascending))
                .collect()
        })
}

/// Configuration for property-based tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
