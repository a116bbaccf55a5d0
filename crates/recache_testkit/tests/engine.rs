//! End-to-end tests for the engine: a cache miss stores records, a cache
//! hit loads, filters and sorts them.

use recache_core::{
    CacheError, Config, Engine, Predicates, Row, SortOrder, Value, ValueKind,
};
use recache_testkit::prelude::*;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Stores the sample apples and reads them back as the given record type.
fn cached<R: recache_core::FromSnapshot>(engine: &Engine) -> Vec<R> {
    sample_apples(engine.registry())
        .iter()
        .map(|apple| engine.store(apple).unwrap())
        .map(|bytes| engine.load(&bytes).unwrap())
        .collect()
}

#[test]
fn typed_records_survive_the_cache() {
    init_tracing();
    let engine = Engine::new(registry());
    let apples: Vec<Apple> = cached(&engine);

    assert_eq!(ids(&apples), vec![1, 2, 3, 4, 5]);
    assert_eq!(apples[0].name(), Some("Green Apple"));
    assert_eq!(apples[0].price(), Some(0.49));
    assert_eq!(apples[4].price(), None);
    assert_eq!(
        apples[0].details().and_then(|d| d.get("origin")),
        Some(&Value::from("NZ"))
    );
    assert_eq!(apples[1].details(), None);
}

#[test]
fn store_entries_do_not_load_as_apples() {
    let engine = Engine::new(registry());
    let schema = engine.registry().resolve(STORE).unwrap();
    let store = Row::from_pairs(schema, [("id", Value::Integer(1)), ("name", Value::from("Corner"))])
        .unwrap();

    let bytes = engine.store(&store).unwrap();
    let result: Result<Apple, _> = engine.load(&bytes);
    assert!(matches!(result, Err(CacheError::InvalidEntry { .. })));

    let row: Row = engine.load(&bytes).unwrap();
    assert_eq!(row, store);
}

#[test]
fn unregistered_type_is_reported() {
    let engine = Engine::new(registry());
    let other = Engine::new(std::sync::Arc::new(recache_core::TypeRegistry::new()));

    let bytes = engine.store(&sample_apples(engine.registry())[0]).unwrap();
    let result: Result<Row, _> = other.load(&bytes);
    assert_eq!(result.unwrap_err(), CacheError::unknown_type(APPLE));
}

#[test]
fn where_then_order_by() {
    init_tracing();
    let engine = Engine::new(registry());
    let mut apples: Vec<Apple> = cached(&engine);

    engine
        .filter(&mut apples, &Predicates::new().any_of("price", [0.49, 0.59]))
        .unwrap();
    assert_eq!(ids(&apples), vec![1, 2, 4]);

    engine.sort_by_clause(&mut apples, "price DESC, name").unwrap();
    // "Äpfel" and "APPLE" share a price; "apfel" collates before "apple"
    assert_eq!(ids(&apples), vec![4, 2, 1]);
}

#[test]
fn string_predicate_matches_integer_column() {
    let engine = Engine::new(registry());
    let mut apples: Vec<Row> = cached(&engine);
    engine
        .filter(&mut apples, &Predicates::new().eq("store_id", "2"))
        .unwrap();
    assert_eq!(ids(&apples), vec![2, 5]);
}

#[test]
fn case_sensitive_engine() {
    let engine = Engine::with_config(registry(), Config::new().case_insensitive(false));
    let mut apples: Vec<Row> = cached(&engine);
    engine
        .filter(&mut apples, &Predicates::new().eq("name", "apple"))
        .unwrap();
    assert_eq!(ids(&apples), vec![3]);
}

#[test]
fn null_timestamps_follow_direction() {
    let engine = Engine::new(registry());
    let mut apples: Vec<Row> = cached(&engine);

    engine.sort(&mut apples, &[SortOrder::asc("updated_at")]).unwrap();
    assert_eq!(ids(&apples), vec![3, 1, 4, 2, 5]);

    engine.sort(&mut apples, &[SortOrder::desc("updated_at")]).unwrap();
    assert_eq!(ids(&apples), vec![5, 2, 4, 1, 3]);
}

#[test]
fn sorting_on_json_payloads_is_rejected() {
    let engine = Engine::new(registry());
    let mut apples: Vec<Row> = cached(&engine);
    apples[1].set("details", r#"{"origin":"AU"}"#).unwrap();
    let mut apples: Vec<Row> = apples
        .iter()
        .map(|a| engine.load(&engine.store(a).unwrap()).unwrap())
        .collect();

    let err = engine
        .sort(&mut apples, &[SortOrder::asc("details")])
        .unwrap_err();
    assert_eq!(
        err,
        CacheError::type_mismatch("details", ValueKind::Map, ValueKind::Map)
    );
    assert_eq!(ids(&apples), vec![1, 2, 3, 4, 5]);
}

#[test]
fn unknown_sort_attribute() {
    let engine = Engine::new(registry());
    let mut apples: Vec<Row> = cached(&engine);
    let err = engine.sort_by_clause(&mut apples, "color").unwrap_err();
    assert_eq!(err, CacheError::unknown_attribute(APPLE, "color"));
    assert_eq!(ids(&apples), vec![1, 2, 3, 4, 5]);
}
