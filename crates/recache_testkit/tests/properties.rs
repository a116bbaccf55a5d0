//! Property tests for serialize, filter and sort.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use recache_core::{
    collation_key, deserialize, filter, serialize, sort, CacheEntry, Predicate, Predicates,
    Record, Row, Schema, SortOrder, StorageType, TypeRegistry, Value,
};
use recache_testkit::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn rows(apples: &[AppleFields]) -> Vec<Row> {
    let schema = Arc::new(apple_schema());
    apples.iter().map(|a| a.to_row(&schema)).collect()
}

fn filtered(records: &[Row], predicates: &Predicates) -> Vec<Row> {
    let mut records = records.to_vec();
    filter(&mut records, predicates).unwrap();
    records
}

fn sorted(records: &[Row], orders: &[SortOrder]) -> Vec<Row> {
    let mut records = records.to_vec();
    sort(&mut records, orders).unwrap();
    records
}

fn name(record: &Row) -> String {
    record.get("name").unwrap().to_string()
}

fn price(record: &Row) -> Option<f64> {
    record.get("price").unwrap().as_float()
}

fn updated_at(record: &Row) -> Option<DateTime<Utc>> {
    record.get("updated_at").unwrap().as_timestamp()
}

fn single(condition: (String, Predicate)) -> Predicates {
    std::iter::once(condition).collect()
}

fn all_ids(len: usize) -> Vec<i64> {
    (0..len as i64).collect()
}

fn sorted_ids(records: &[Row]) -> Vec<i64> {
    let mut ids = ids(records);
    ids.sort_unstable();
    ids
}

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn serialize_roundtrip_preserves_attributes(apples in apples_strategy(16)) {
        let registry = registry();
        for record in rows(&apples) {
            let bytes = serialize(&record).to_bytes().unwrap();
            let entry = CacheEntry::from_bytes(&bytes).unwrap();
            let restored: Row = deserialize(&registry, &entry).unwrap();
            prop_assert_eq!(restored, record);
        }
    }

    #[test]
    fn any_scalar_survives_the_cache(value in scalar_value_strategy()) {
        let registry = TypeRegistry::new();
        let schema = registry.register(Schema::new("Blob").column("payload", StorageType::Binary));
        let record = Row::from_pairs(schema, [("payload", value)]).unwrap();

        let bytes = serialize(&record).to_bytes().unwrap();
        let restored: Row = deserialize(&registry, &CacheEntry::from_bytes(&bytes).unwrap()).unwrap();
        prop_assert_eq!(restored, record);
    }

    #[test]
    fn filter_is_idempotent(apples in apples_strategy(24), predicates in predicates_strategy()) {
        let records = rows(&apples);
        let once = filtered(&records, &predicates);
        let twice = filtered(&once, &predicates);
        prop_assert_eq!(ids(&once), ids(&twice));
    }

    #[test]
    fn filter_is_conjunctive(
        apples in apples_strategy(24),
        first in predicate_strategy(),
        second in predicate_strategy(),
    ) {
        prop_assume!(first.0 != second.0);
        let records = rows(&apples);

        let combined: Predicates = [first.clone(), second.clone()].into_iter().collect();
        let both = ids(&filtered(&records, &combined));
        let chained = ids(&filtered(&filtered(&records, &single(first.clone())), &single(second.clone())));
        prop_assert_eq!(&both, &chained);

        let left: HashSet<i64> = ids(&filtered(&records, &single(first))).into_iter().collect();
        let right: HashSet<i64> = ids(&filtered(&records, &single(second))).into_iter().collect();
        let intersection: Vec<i64> = ids(&records)
            .into_iter()
            .filter(|id| left.contains(id) && right.contains(id))
            .collect();
        prop_assert_eq!(both, intersection);
    }

    #[test]
    fn equality_ignores_case(apples in apples_strategy(24), target in name_strategy()) {
        let records = rows(&apples);
        let upper = filtered(&records, &Predicates::new().eq("name", target.to_uppercase()));
        let lower = filtered(&records, &Predicates::new().eq("name", target.to_lowercase()));
        prop_assert_eq!(ids(&upper), ids(&lower));

        let expected: Vec<i64> = records
            .iter()
            .filter(|r| name(r).to_lowercase() == target.to_lowercase())
            .map(|r| r.get("id").unwrap().as_integer().unwrap())
            .collect();
        prop_assert_eq!(ids(&upper), expected);
    }

    #[test]
    fn membership_keeps_listed_prices(
        apples in apples_strategy(24),
        prices in prop::collection::vec(price_strategy(), 1..3),
    ) {
        let records = rows(&apples);
        let kept = filtered(&records, &Predicates::new().any_of("price", prices.clone()));

        let expected: Vec<i64> = apples
            .iter()
            .filter(|a| a.price.is_some_and(|p| prices.contains(&p)))
            .map(|a| a.id)
            .collect();
        prop_assert_eq!(ids(&kept), expected);
    }

    #[test]
    fn equal_prices_are_ordered_by_name(apples in apples_strategy(24)) {
        let records = sorted(&rows(&apples), &[SortOrder::desc("price"), SortOrder::asc("name")]);
        prop_assert_eq!(sorted_ids(&records), all_ids(apples.len()));

        for pair in records.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            match (price(a), price(b)) {
                (Some(x), Some(y)) => prop_assert!(x >= y),
                (None, Some(_)) => prop_assert!(false, "null price sorted before a price"),
                _ => {}
            }
            if price(a) == price(b) {
                prop_assert!(collation_key(&name(a)) <= collation_key(&name(b)));
            }
        }
    }

    #[test]
    fn nulls_lead_ascending_and_trail_descending(apples in apples_strategy(24)) {
        let records = rows(&apples);

        let ascending: Vec<_> = sorted(&records, &[SortOrder::asc("updated_at")])
            .iter()
            .map(updated_at)
            .collect();
        let nulls = ascending.iter().take_while(|t| t.is_none()).count();
        prop_assert!(ascending[nulls..].iter().all(Option::is_some));
        prop_assert!(ascending[nulls..].windows(2).all(|w| w[0] <= w[1]));

        let descending: Vec<_> = sorted(&records, &[SortOrder::desc("updated_at")])
            .iter()
            .map(updated_at)
            .collect();
        let present = descending.iter().take_while(|t| t.is_some()).count();
        prop_assert!(descending[present..].iter().all(Option::is_none));
        prop_assert!(descending[..present].windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn collation_variants_sort_adjacently(apples in apples_strategy(24)) {
        let records = sorted(&rows(&apples), &[SortOrder::asc("name")]);
        prop_assert_eq!(sorted_ids(&records), all_ids(apples.len()));

        let keys: Vec<String> = records.iter().map(|r| collation_key(&name(r))).collect();
        let mut finished = HashSet::new();
        for pair in keys.windows(2) {
            if pair[0] != pair[1] {
                prop_assert!(finished.insert(pair[0].clone()), "{} is split", pair[0]);
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }

    #[test]
    fn sort_is_a_permutation(apples in apples_strategy(24), orders in sort_orders_strategy()) {
        let records = sorted(&rows(&apples), &orders);
        prop_assert_eq!(sorted_ids(&records), all_ids(apples.len()));
    }

    #[test]
    fn empty_sort_spec_keeps_order(apples in apples_strategy(24)) {
        let records = sorted(&rows(&apples), &[]);
        prop_assert_eq!(ids(&records), all_ids(apples.len()));
    }
}

#[test]
fn empty_inputs() {
    let mut records: Vec<Row> = Vec::new();
    filter(&mut records, &Predicates::new().eq("name", "apple")).unwrap();
    sort(&mut records, &[SortOrder::desc("price")]).unwrap();
    assert!(records.is_empty());
}

#[test]
fn null_filter_value_matches_null_attributes() {
    let registry = registry();
    let mut apples = sample_apples(&registry);
    filter(&mut apples, &Predicates::new().eq("price", Value::Null)).unwrap();
    assert_eq!(ids(&apples), vec![5]);
}
