//! Sort orders.

use crate::error::{CacheError, CacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One key of a sort spec: an attribute and its direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOrder {
    /// Attribute to order by.
    pub attribute: String,
    /// True for ascending order.
    #[serde(default = "ascending_default")]
    pub ascending: bool,
}

fn ascending_default() -> bool {
    true
}

impl SortOrder {
    /// Creates a sort order.
    pub fn new(attribute: impl Into<String>, ascending: bool) -> Self {
        Self {
            attribute: attribute.into(),
            ascending,
        }
    }

    /// Ascending order on `attribute`.
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self::new(attribute, true)
    }

    /// Descending order on `attribute`.
    pub fn desc(attribute: impl Into<String>) -> Self {
        Self::new(attribute, false)
    }

    /// Parses an `ORDER BY` fragment such as `"price DESC"` or `"name"`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSortOrder` for an empty fragment, an unknown
    /// direction, or trailing words.
    pub fn parse(fragment: &str) -> CacheResult<Self> {
        let mut words = fragment.split_whitespace();
        let attribute = words
            .next()
            .ok_or_else(|| CacheError::invalid_sort_order(fragment))?;
        let ascending = match words.next() {
            None => true,
            Some(dir) if dir.eq_ignore_ascii_case("asc") => true,
            Some(dir) if dir.eq_ignore_ascii_case("desc") => false,
            Some(_) => return Err(CacheError::invalid_sort_order(fragment)),
        };
        if words.next().is_some() {
            return Err(CacheError::invalid_sort_order(fragment));
        }
        Ok(Self::new(attribute, ascending))
    }

    /// Parses a comma-separated `ORDER BY` clause.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSortOrder` if any fragment fails to parse.
    pub fn parse_list(clause: &str) -> CacheResult<Vec<Self>> {
        clause
            .split(',')
            .filter(|f| !f.trim().is_empty())
            .map(Self::parse)
            .collect()
    }
}

impl FromStr for SortOrder {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.ascending { "ASC" } else { "DESC" };
        write!(f, "{} {direction}", self.attribute)
    }
}

/// A bare attribute name sorts ascending.
impl From<&str> for SortOrder {
    fn from(attribute: &str) -> Self {
        Self::asc(attribute)
    }
}

impl From<String> for SortOrder {
    fn from(attribute: String) -> Self {
        Self::asc(attribute)
    }
}

impl<S: Into<String>> From<(S, bool)> for SortOrder {
    fn from((attribute, ascending): (S, bool)) -> Self {
        Self::new(attribute, ascending)
    }
}
