//! In-memory WHERE filtering.
//!
//! Only `attribute = value` and `attribute IN (a, b, c)` are supported,
//! ANDed together. Text comparison is case-insensitive, the way the
//! database's default collation compares.
//!
//! ```
//! use recache_core::{filter, Predicates, Row, Schema, StorageType};
//! use recache_codec::Value;
//! use std::sync::Arc;
//!
//! let schema = Arc::new(
//!     Schema::new("Apple")
//!         .column("name", StorageType::String)
//!         .column("price", StorageType::Decimal),
//! );
//! let mut apples = vec![
//!     Row::from_pairs(schema.clone(), [("name", Value::from("Green Apple")), ("price", Value::Float(0.49))]).unwrap(),
//!     Row::from_pairs(schema.clone(), [("name", Value::from("Red Apple")), ("price", Value::Float(0.59))]).unwrap(),
//! ];
//!
//! let wheres = Predicates::new()
//!     .any_of("price", [0.49, 0.59, 0.69])
//!     .eq("name", "green apple");
//! filter(&mut apples, &wheres).unwrap();
//! assert_eq!(apples.len(), 1);
//! ```

use crate::error::CacheResult;
use crate::record::Record;
use recache_codec::Value;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::debug;

/// A single condition on one attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `attribute = value`
    Equals(Value),
    /// `attribute IN (values)`
    AnyOf(Vec<Value>),
}

impl Predicate {
    /// Creates an equality predicate.
    pub fn equals(value: impl Into<Value>) -> Self {
        Self::Equals(value.into())
    }

    /// Creates a membership predicate.
    pub fn any_of<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Self::AnyOf(values.into_iter().map(Into::into).collect())
    }
}

/// A predicate set: attribute conditions applied conjunctively.
///
/// Conditions are kept in insertion order, one per attribute. Adding a
/// second condition for an attribute replaces the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicates {
    conditions: Vec<(String, Predicate)>,
}

impl Predicates {
    /// Creates an empty predicate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `attribute = value`.
    #[must_use]
    pub fn eq(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(attribute, Predicate::equals(value));
        self
    }

    /// Adds `attribute IN (values)`.
    #[must_use]
    pub fn any_of<T: Into<Value>>(
        mut self,
        attribute: impl Into<String>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        self.insert(attribute, Predicate::any_of(values));
        self
    }

    /// Sets the condition for an attribute.
    pub fn insert(&mut self, attribute: impl Into<String>, predicate: Predicate) {
        let attribute = attribute.into();
        match self.conditions.iter_mut().find(|(a, _)| *a == attribute) {
            Some((_, existing)) => *existing = predicate,
            None => self.conditions.push((attribute, predicate)),
        }
    }

    /// Iterates the conditions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Predicate)> {
        self.conditions.iter().map(|(a, p)| (a.as_str(), p))
    }

    /// Returns the number of conditions.
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Returns true if there are no conditions.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Predicate)> for Predicates {
    fn from_iter<I: IntoIterator<Item = (K, Predicate)>>(iter: I) -> Self {
        let mut predicates = Self::new();
        for (attribute, predicate) in iter {
            predicates.insert(attribute, predicate);
        }
        predicates
    }
}

/// Removes the records that do not satisfy every predicate.
///
/// Text is compared case-insensitively. Record contents are never touched.
///
/// # Errors
///
/// Returns `UnknownAttribute` if a predicate names an attribute the records
/// do not declare. Predicates before the failing one remain applied.
pub fn filter<R: Record>(records: &mut Vec<R>, predicates: &Predicates) -> CacheResult<()> {
    filter_with(records, predicates, true)
}

pub(crate) fn filter_with<R: Record>(
    records: &mut Vec<R>,
    predicates: &Predicates,
    case_insensitive: bool,
) -> CacheResult<()> {
    for (attribute, predicate) in predicates.iter() {
        let before = records.len();
        let keep = match predicate {
            Predicate::Equals(target) => {
                let target = fold_case(target, case_insensitive);
                matching(records, attribute, |value| {
                    equals(&fold_case(value, case_insensitive), &target)
                })?
            }
            Predicate::AnyOf(targets) => {
                let fold_targets =
                    case_insensitive && targets.first().is_some_and(Value::is_text);
                let targets: HashSet<Cow<'_, Value>> = targets
                    .iter()
                    .map(|t| fold_case(t, fold_targets))
                    .collect();
                matching(records, attribute, |value| {
                    targets.contains(&fold_case(value, case_insensitive))
                })?
            }
        };

        let mut keep = keep.into_iter();
        records.retain(|_| keep.next().unwrap_or(false));
        debug!(attribute, before, after = records.len(), "filtered cached records");
    }
    Ok(())
}

/// Evaluates one condition over every record before anything is removed.
fn matching<R: Record>(
    records: &[R],
    attribute: &str,
    mut matches: impl FnMut(&Value) -> bool,
) -> CacheResult<Vec<bool>> {
    records
        .iter()
        .map(|record| record.get(attribute).map(&mut matches))
        .collect()
}

fn fold_case(value: &Value, enabled: bool) -> Cow<'_, Value> {
    match value {
        Value::Text(s) if enabled => Cow::Owned(Value::Text(s.to_lowercase())),
        _ => Cow::Borrowed(value),
    }
}

/// Scalar equality with the database's loose integer handling.
#[allow(clippy::cast_precision_loss)]
fn equals(value: &Value, target: &Value) -> bool {
    match (value, target) {
        // Integers stored as strings, or strings stored as integers
        (Value::Integer(n), Value::Text(s)) | (Value::Text(s), Value::Integer(n)) => {
            n.to_string() == *s
        }
        (Value::Integer(n), Value::Float(f)) | (Value::Float(f), Value::Integer(n)) => {
            *n as f64 == *f
        }
        _ => value == target,
    }
}
