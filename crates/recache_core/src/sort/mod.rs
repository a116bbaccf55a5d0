//! In-memory ORDER BY.
//!
//! Records are ordered by a list of [`SortOrder`]s, compared as a tuple from
//! left to right. Textual columns compare by collation key, so case and
//! accents do not affect the order.
//!
//! Null handling follows the database: for an ascending key nulls come
//! first, for a descending key they come last. Descending is implemented by
//! swapping which record occupies the left operand slot of the comparison,
//! and a null in the left slot is always the lesser value; the null rule
//! therefore flips together with the direction.
//!
//! ```
//! use recache_core::{sort, Record, Row, Schema, SortOrder, StorageType};
//! use recache_codec::Value;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(
//!     Schema::new("Apple")
//!         .column("name", StorageType::String)
//!         .column("price", StorageType::Decimal),
//! );
//! let apple = |name: &str, price: f64| {
//!     Row::from_pairs(schema.clone(), [("name", Value::from(name)), ("price", Value::Float(price))]).unwrap()
//! };
//! let mut apples = vec![apple("fuji", 0.49), apple("Braeburn", 0.59), apple("Ambrosia", 0.49)];
//!
//! sort(&mut apples, &[SortOrder::desc("price"), SortOrder::asc("name")]).unwrap();
//! let names: Vec<_> = apples.iter().map(|a| a.get("name").unwrap().to_string()).collect();
//! assert_eq!(names, ["Braeburn", "Ambrosia", "fuji"]);
//! ```

mod collation;
mod order;

pub use collation::{collation_key, collation_key_bytes, Collator};
pub use order::SortOrder;

use crate::error::{CacheError, CacheResult};
use crate::record::Record;
use recache_codec::{Value, ValueKind};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, trace};

/// Sorts records in place by the given sort spec.
///
/// An empty collection or an empty sort spec leaves the records untouched.
/// Records that tie on every key have no guaranteed relative order.
///
/// # Errors
///
/// Returns `UnknownAttribute` if a key is not declared by the record type,
/// or `TypeMismatch` if two values under one key cannot be ordered against
/// each other. On error the records keep their original order.
pub fn sort<R: Record>(records: &mut [R], orders: &[SortOrder]) -> CacheResult<()> {
    sort_with(records, orders, true)
}

pub(crate) fn sort_with<R: Record>(
    records: &mut [R],
    orders: &[SortOrder],
    collate_text: bool,
) -> CacheResult<()> {
    if records.is_empty() || orders.is_empty() {
        return Ok(());
    }

    let mut collator = Collator::new();
    let positions = sorted_positions(records, orders, collate_text, &mut collator);
    let cleared = collator.clear();
    trace!(cleared, "cleared collation keys");

    apply_permutation(records, positions?);
    debug!(records = records.len(), keys = orders.len(), "sorted cached records");
    Ok(())
}

/// Per-record comparison value for one key.
#[derive(Debug, Clone)]
enum SortValue<'a> {
    Null,
    Collated(Arc<str>),
    Raw(&'a Value),
}

impl SortValue<'_> {
    fn kind(&self) -> ValueKind {
        match self {
            SortValue::Null => ValueKind::Null,
            SortValue::Collated(_) => ValueKind::Text,
            SortValue::Raw(value) => value.kind(),
        }
    }
}

/// Composite comparator built from a sort spec.
#[derive(Debug, Clone)]
struct Comparator {
    ascending: Vec<bool>,
}

impl Comparator {
    fn new(orders: &[SortOrder]) -> Self {
        Self {
            ascending: orders.iter().map(|o| o.ascending).collect(),
        }
    }

    fn compare(&self, x: &[SortValue<'_>], y: &[SortValue<'_>]) -> Ordering {
        for (i, &ascending) in self.ascending.iter().enumerate() {
            let (left, right) = if ascending { (&x[i], &y[i]) } else { (&y[i], &x[i]) };
            match compare_slots(left, right) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        // Full tie: the first operand counts as greater
        Ordering::Greater
    }
}

/// Compares one key of two records, left and right already swapped for
/// descending keys.
///
/// Two nulls tie so that the next key decides; a left null is lesser only
/// against a present value.
fn compare_slots(left: &SortValue<'_>, right: &SortValue<'_>) -> Ordering {
    match (left, right) {
        (SortValue::Null, SortValue::Null) => Ordering::Equal,
        (SortValue::Null, _) => Ordering::Less,
        (_, SortValue::Null) => Ordering::Greater,
        (SortValue::Collated(a), SortValue::Collated(b)) => a.cmp(b),
        (SortValue::Raw(a), SortValue::Raw(b)) => compare_values(a, b),
        // Rejected by check_comparable
        _ => Ordering::Equal,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Bytes(x), Value::Bytes(y)) => x.cmp(y),
        _ => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
    }
}

fn comparable(a: ValueKind, b: ValueKind) -> bool {
    match (a, b) {
        (ValueKind::Array | ValueKind::Map, _) | (_, ValueKind::Array | ValueKind::Map) => false,
        _ => a == b || (a.is_numeric() && b.is_numeric()),
    }
}

fn sorted_positions<R: Record>(
    records: &[R],
    orders: &[SortOrder],
    collate_text: bool,
    collator: &mut Collator,
) -> CacheResult<Vec<usize>> {
    let rows = extract_keys(records, orders, collate_text, collator)?;
    check_comparable(&rows, orders)?;
    let comparator = Comparator::new(orders);
    Ok(merge_sort_by(rows.len(), |x, y| {
        comparator.compare(&rows[x], &rows[y])
    }))
}

fn extract_keys<'a, R: Record>(
    records: &'a [R],
    orders: &[SortOrder],
    collate_text: bool,
    collator: &mut Collator,
) -> CacheResult<Vec<Vec<SortValue<'a>>>> {
    let mut rows = Vec::with_capacity(records.len());
    for record in records {
        let mut keys = Vec::with_capacity(orders.len());
        for order in orders {
            let value = record.get(&order.attribute)?;
            let textual = collate_text && record.declared_type(&order.attribute)?.is_textual();
            keys.push(match value {
                Value::Null => SortValue::Null,
                Value::Text(text) if textual => SortValue::Collated(collator.collate(text)),
                Value::Bytes(bytes) if textual => {
                    SortValue::Collated(collator.collate_bytes(bytes))
                }
                other => SortValue::Raw(other),
            });
        }
        rows.push(keys);
    }
    Ok(rows)
}

fn check_comparable(rows: &[Vec<SortValue<'_>>], orders: &[SortOrder]) -> CacheResult<()> {
    for (i, order) in orders.iter().enumerate() {
        let mut seen: Option<ValueKind> = None;
        let kinds = rows
            .iter()
            .map(|keys| keys[i].kind())
            .filter(|k| *k != ValueKind::Null);
        for kind in kinds {
            match seen {
                None => seen = Some(kind),
                Some(first) if comparable(first, kind) => {}
                Some(first) => {
                    return Err(CacheError::type_mismatch(&order.attribute, first, kind));
                }
            }
        }
    }
    Ok(())
}

/// Bottom-up merge sort over positions `0..len`.
///
/// Takes from the right run only when the comparator reports the left
/// element as greater. Works with comparators that are not a total order,
/// such as one that never reports a tie.
fn merge_sort_by(len: usize, mut compare: impl FnMut(usize, usize) -> Ordering) -> Vec<usize> {
    let mut positions: Vec<usize> = (0..len).collect();
    let mut merged = Vec::with_capacity(len);
    let mut width = 1;

    while width < len {
        merged.clear();
        let mut start = 0;
        while start < len {
            let mid = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut i, mut j) = (start, mid);
            while i < mid && j < end {
                if compare(positions[i], positions[j]) == Ordering::Greater {
                    merged.push(positions[j]);
                    j += 1;
                } else {
                    merged.push(positions[i]);
                    i += 1;
                }
            }
            merged.extend_from_slice(&positions[i..mid]);
            merged.extend_from_slice(&positions[j..end]);
            start = end;
        }
        std::mem::swap(&mut positions, &mut merged);
        width *= 2;
    }

    positions
}

/// Reorders `items` so that `items[i]` becomes the old `items[positions[i]]`.
fn apply_permutation<T>(items: &mut [T], mut positions: Vec<usize>) {
    for start in 0..positions.len() {
        let mut current = start;
        while positions[current] != start {
            let next = positions[current];
            items.swap(current, next);
            positions[current] = current;
            current = next;
        }
        positions[current] = current;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Row, Schema, StorageType};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn schema() -> Arc<Schema> {
        Arc::new(
            Schema::new("Apple")
                .column("id", StorageType::Integer)
                .column("name", StorageType::String)
                .column("price", StorageType::Decimal)
                .column("stock", StorageType::Integer)
                .column("updated_at", StorageType::DateTime),
        )
    }

    fn apple(id: i64, name: &str, price: Option<f64>) -> Row {
        Row::from_pairs(
            schema(),
            [
                ("id", Value::Integer(id)),
                ("name", Value::from(name)),
                ("price", Value::from(price)),
            ],
        )
        .unwrap()
    }

    fn at(day: u32) -> Value {
        Value::Timestamp(Utc.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap())
    }

    fn ids(records: &[Row]) -> Vec<i64> {
        records
            .iter()
            .map(|r| r.get("id").unwrap().as_integer().unwrap())
            .collect()
    }

    #[test]
    fn names_sort_by_collation() {
        let mut records = vec![
            apple(1, "banana", None),
            apple(2, "Apple", None),
            apple(3, "Éclair", None),
            apple(4, "cherry", None),
            apple(5, "apple pie", None),
        ];
        sort(&mut records, &["name".into()]).unwrap();
        assert_eq!(ids(&records), vec![2, 5, 1, 4, 3]);
    }

    #[test]
    fn raw_comparison_when_collation_disabled() {
        let mut records = vec![apple(1, "apple", None), apple(2, "Banana", None)];
        sort_with(&mut records, &["name".into()], false).unwrap();
        assert_eq!(ids(&records), vec![2, 1]);

        sort_with(&mut records, &["name".into()], true).unwrap();
        assert_eq!(ids(&records), vec![1, 2]);
    }

    #[test]
    fn descending_price_then_ascending_name() {
        let mut records = vec![
            apple(1, "b", Some(0.59)),
            apple(2, "a", Some(0.59)),
            apple(3, "c", Some(0.49)),
            apple(4, "d", Some(0.69)),
        ];
        sort(&mut records, &[("price", false).into(), "name".into()]).unwrap();
        assert_eq!(ids(&records), vec![4, 2, 1, 3]);
    }

    #[test]
    fn nulls_first_ascending_last_descending() {
        let mut records = vec![apple(1, "a", None), apple(2, "b", None), apple(3, "c", None)];
        records[0].set("updated_at", at(2)).unwrap();
        records[2].set("updated_at", at(1)).unwrap();

        sort(&mut records, &[SortOrder::asc("updated_at")]).unwrap();
        assert_eq!(ids(&records), vec![2, 3, 1]);

        sort(&mut records, &[SortOrder::desc("updated_at")]).unwrap();
        assert_eq!(ids(&records), vec![1, 3, 2]);
    }

    #[test]
    fn both_null_falls_through_to_next_key() {
        let mut records = vec![apple(1, "b", None), apple(2, "a", None), apple(3, "c", Some(0.1))];
        sort(&mut records, &["price".into(), "name".into()]).unwrap();
        assert_eq!(ids(&records), vec![2, 1, 3]);
    }

    #[test]
    fn accent_variants_sort_adjacently() {
        let mut records = vec![
            apple(1, "zebra", None),
            apple(2, "resume", None),
            apple(3, "apple", None),
            apple(4, "Résumé", None),
            apple(5, "RESUME", None),
        ];
        sort(&mut records, &["name".into()]).unwrap();

        let sorted = ids(&records);
        assert_eq!(sorted[0], 3);
        assert_eq!(sorted[4], 1);
        let mut middle = sorted[1..4].to_vec();
        middle.sort_unstable();
        assert_eq!(middle, vec![2, 4, 5]);

        // Values are not merged or rewritten
        let mut names: Vec<String> = records
            .iter()
            .map(|r| r.get("name").unwrap().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["RESUME", "Résumé", "apple", "resume", "zebra"]);
    }

    #[test]
    fn untransliterable_case_is_kept() {
        let mut records = vec![apple(1, "ωa", None), apple(2, "Ωb", None)];
        sort(&mut records, &["name".into()]).unwrap();
        assert_eq!(ids(&records), vec![2, 1]);
    }

    #[test]
    fn malformed_bytes_in_textual_column_are_collated() {
        let mut records = vec![apple(1, "zebra", None), apple(2, "apple", None)];
        records[1]
            .set("name", Value::Bytes(b"Caf\xc3\xa9 \xff".to_vec()))
            .unwrap();
        sort(&mut records, &["name".into()]).unwrap();
        assert_eq!(ids(&records), vec![2, 1]);

        // Raw comparison cannot order text against bytes
        let err = sort_with(&mut records, &["name".into()], false).unwrap_err();
        assert!(matches!(err, CacheError::TypeMismatch { .. }));
    }

    #[test]
    fn integers_and_floats_compare_numerically() {
        let mut records = vec![apple(1, "a", None), apple(2, "b", None), apple(3, "c", None)];
        records[0].set("price", Value::Integer(2)).unwrap();
        records[1].set("price", Value::Float(1.5)).unwrap();
        records[2].set("price", Value::Integer(1)).unwrap();

        sort(&mut records, &["price".into()]).unwrap();
        assert_eq!(ids(&records), vec![3, 2, 1]);
    }

    #[test]
    fn unknown_attribute_leaves_order_untouched() {
        let mut records = vec![apple(2, "b", None), apple(1, "a", None)];
        let err = sort(&mut records, &["name".into(), "color".into()]).unwrap_err();
        assert_eq!(err, CacheError::unknown_attribute("Apple", "color"));
        assert_eq!(ids(&records), vec![2, 1]);
    }

    #[test]
    fn mixed_kinds_are_a_type_mismatch() {
        let mut records = vec![apple(2, "b", None), apple(1, "a", None), apple(3, "c", None)];
        records[0].set("stock", 5).unwrap();
        records[2].set("stock", "five").unwrap();

        let err = sort(&mut records, &["stock".into()]).unwrap_err();
        assert_eq!(
            err,
            CacheError::type_mismatch("stock", ValueKind::Integer, ValueKind::Text)
        );
        assert_eq!(ids(&records), vec![2, 1, 3]);
    }

    #[test]
    fn empty_input_and_empty_spec_are_noops() {
        let mut empty: Vec<Row> = Vec::new();
        sort(&mut empty, &["color".into()]).unwrap();
        assert!(empty.is_empty());

        let mut records = vec![apple(3, "c", None), apple(1, "a", None), apple(2, "b", None)];
        sort(&mut records, &[]).unwrap();
        assert_eq!(ids(&records), vec![3, 1, 2]);
    }

    #[test]
    fn full_ties_never_panic() {
        let mut records: Vec<Row> = (0..200).map(|i| apple(i, "same", Some(1.0))).collect();
        sort(&mut records, &["name".into(), "price".into()]).unwrap();

        let mut sorted = ids(&records);
        sorted.sort_unstable();
        assert_eq!(sorted, (0..200).collect::<Vec<_>>());
    }

    #[test]
    fn left_null_slot_is_lesser_in_both_directions() {
        let value = Value::Integer(1);
        let null = [SortValue::Null];
        let present = [SortValue::Raw(&value)];

        let asc = Comparator::new(&[SortOrder::asc("k")]);
        assert_eq!(asc.compare(&null, &present), Ordering::Less);
        assert_eq!(asc.compare(&present, &null), Ordering::Greater);

        // Descending puts the second record in the left slot
        let desc = Comparator::new(&[SortOrder::desc("k")]);
        assert_eq!(desc.compare(&present, &null), Ordering::Less);
        assert_eq!(desc.compare(&null, &present), Ordering::Greater);
    }

    #[test]
    fn tie_reports_first_operand_greater() {
        let value = Value::from("x");
        let a = [SortValue::Raw(&value)];
        let b = [SortValue::Raw(&value)];
        let comparator = Comparator::new(&[SortOrder::asc("k")]);
        assert_eq!(comparator.compare(&a, &b), Ordering::Greater);
        assert_eq!(comparator.compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn merge_sort_orders_positions() {
        let values = [5, 3, 9, 1, 7, 3, 0];
        let positions = merge_sort_by(values.len(), |x, y| values[x].cmp(&values[y]));
        let sorted: Vec<_> = positions.iter().map(|&p| values[p]).collect();
        assert_eq!(sorted, vec![0, 1, 3, 3, 5, 7, 9]);
    }

    #[test]
    fn permutation_is_applied_in_place() {
        let mut items = vec!['a', 'b', 'c', 'd', 'e'];
        apply_permutation(&mut items, vec![3, 0, 4, 1, 2]);
        assert_eq!(items, vec!['d', 'a', 'e', 'b', 'c']);
    }

    proptest! {
        #[test]
        fn merge_sort_agrees_with_std(values in prop::collection::vec(-50i32..50, 0..64)) {
            let positions = merge_sort_by(values.len(), |x, y| values[x].cmp(&values[y]));
            let mut items = values.clone();
            apply_permutation(&mut items, positions);

            let mut expected = values;
            expected.sort_unstable();
            prop_assert_eq!(items, expected);
        }
    }
}
