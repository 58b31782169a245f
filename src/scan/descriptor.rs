//! Range scan planner
//!
//! Every scan shape (full, equality, one-sided comparison, two-sided range)
//! is normalized into one immutable `ScanDescriptor`. Traversal code only
//! ever sees normalized bounds plus a direction.
//!
//! # Ordering contract
//!
//! - Ascending: keys low to high, entries in insertion order
//! - Descending: keys high to low, entries in reverse insertion order

use std::cmp::Ordering;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use super::cursor::Cursor;
use crate::index::{IndexError, IndexResult};

/// Scan direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Lowest key first, entries in insertion order
    #[default]
    Ascending,
    /// Highest key first, entries in reverse insertion order
    Descending,
}

impl Direction {
    /// Maps a `descending` flag to a direction
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            Direction::Descending
        } else {
            Direction::Ascending
        }
    }

    /// Returns true for descending scans
    pub fn is_descending(self) -> bool {
        self == Direction::Descending
    }
}

/// One-sided comparison against a single value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// key > value
    Greater,
    /// key >= value
    GreaterOrEqual,
    /// key < value
    Less,
    /// key <= value
    LessOrEqual,
}

impl Comparison {
    /// Translates the comparison into `(lower, upper)` bounds
    pub fn into_bounds<K>(self, value: K) -> (Option<ScanBound<K>>, Option<ScanBound<K>>) {
        match self {
            Comparison::Greater => (Some(ScanBound::exclusive(value)), None),
            Comparison::GreaterOrEqual => (Some(ScanBound::inclusive(value)), None),
            Comparison::Less => (None, Some(ScanBound::exclusive(value))),
            Comparison::LessOrEqual => (None, Some(ScanBound::inclusive(value))),
        }
    }
}

/// A single range bound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBound<K> {
    /// Bound value
    pub value: K,
    /// Whether the value itself is part of the range
    pub inclusive: bool,
}

impl<K> ScanBound<K> {
    /// Bound that includes `value`
    pub fn inclusive(value: K) -> Self {
        Self {
            value,
            inclusive: true,
        }
    }

    /// Bound that excludes `value`
    pub fn exclusive(value: K) -> Self {
        Self {
            value,
            inclusive: false,
        }
    }

    /// Borrowed `std::ops::Bound`
    pub fn as_bound(&self) -> Bound<&K> {
        if self.inclusive {
            Bound::Included(&self.value)
        } else {
            Bound::Excluded(&self.value)
        }
    }
}

fn optional_bound<K>(bound: &Option<ScanBound<K>>) -> Bound<&K> {
    bound.as_ref().map_or(Bound::Unbounded, ScanBound::as_bound)
}

/// Normalized, immutable scan request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanDescriptor<K> {
    lower: Option<ScanBound<K>>,
    upper: Option<ScanBound<K>>,
    direction: Direction,
    cursor: Option<Cursor>,
}

impl<K: Ord> ScanDescriptor<K> {
    /// Full scan
    pub fn all(direction: Direction) -> Self {
        Self {
            lower: None,
            upper: None,
            direction,
            cursor: None,
        }
    }

    /// Equality scan: lower = upper = value, both inclusive
    pub fn equality(value: K, direction: Direction) -> Self
    where
        K: Clone,
    {
        Self {
            lower: Some(ScanBound::inclusive(value.clone())),
            upper: Some(ScanBound::inclusive(value)),
            direction,
            cursor: None,
        }
    }

    /// One-sided inequality scan
    pub fn comparison(comparison: Comparison, value: K, direction: Direction) -> Self {
        let (lower, upper) = comparison.into_bounds(value);
        Self {
            lower,
            upper,
            direction,
            cursor: None,
        }
    }

    /// Two-sided range scan
    pub fn range(
        lower: K,
        lower_inclusive: bool,
        upper: K,
        upper_inclusive: bool,
        direction: Direction,
    ) -> Self {
        Self {
            lower: Some(ScanBound {
                value: lower,
                inclusive: lower_inclusive,
            }),
            upper: Some(ScanBound {
                value: upper,
                inclusive: upper_inclusive,
            }),
            direction,
            cursor: None,
        }
    }

    /// Range scan from explicit optional bounds
    pub fn bounded(
        lower: Option<ScanBound<K>>,
        upper: Option<ScanBound<K>>,
        direction: Direction,
    ) -> Self {
        Self {
            lower,
            upper,
            direction,
            cursor: None,
        }
    }

    /// Resume after the entry named by `cursor`
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Same bounds and direction, optional cursor replaced
    pub fn resumed(&self, cursor: Option<Cursor>) -> Self
    where
        K: Clone,
    {
        Self {
            lower: self.lower.clone(),
            upper: self.upper.clone(),
            direction: self.direction,
            cursor,
        }
    }

    /// Lower bound, if any
    pub fn lower(&self) -> Option<&ScanBound<K>> {
        self.lower.as_ref()
    }

    /// Upper bound, if any
    pub fn upper(&self) -> Option<&ScanBound<K>> {
        self.upper.as_ref()
    }

    /// Scan direction
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Resumption cursor, if any
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Rejects argument combinations that are never traversed.
    ///
    /// A cursor together with two exclusive bounds is refused.
    pub fn validate(&self) -> IndexResult<()> {
        if self.cursor.is_some() {
            if let (Some(lower), Some(upper)) = (&self.lower, &self.upper) {
                if !lower.inclusive && !upper.inclusive {
                    return Err(IndexError::cursor_with_open_range());
                }
            }
        }
        Ok(())
    }

    /// True when no key can satisfy both bounds
    pub fn is_empty_range(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Some(lower), Some(upper)) => match lower.value.cmp(&upper.value) {
                Ordering::Greater => true,
                Ordering::Equal => !(lower.inclusive && upper.inclusive),
                Ordering::Less => false,
            },
            _ => false,
        }
    }

    /// Both bounds as a range usable with `BTreeMap::range`.
    ///
    /// `None` when the range is empty.
    pub fn key_range(&self) -> Option<(Bound<&K>, Bound<&K>)> {
        if self.is_empty_range() {
            return None;
        }
        Some((optional_bound(&self.lower), optional_bound(&self.upper)))
    }

    /// True if `key` satisfies both bounds
    pub fn contains(&self, key: &K) -> bool {
        !self.before_lower(key) && !self.after_upper(key)
    }

    /// The bound a traversal starts from, in scan order
    pub fn near_bound(&self) -> Bound<&K> {
        match self.direction {
            Direction::Ascending => optional_bound(&self.lower),
            Direction::Descending => optional_bound(&self.upper),
        }
    }

    /// True once `key` lies beyond the bound a traversal ends at
    pub fn is_past_far_bound(&self, key: &K) -> bool {
        match self.direction {
            Direction::Ascending => self.after_upper(key),
            Direction::Descending => self.before_lower(key),
        }
    }

    fn before_lower(&self, key: &K) -> bool {
        match &self.lower {
            Some(lower) if lower.inclusive => *key < lower.value,
            Some(lower) => *key <= lower.value,
            None => false,
        }
    }

    fn after_upper(&self, key: &K) -> bool {
        match &self.upper {
            Some(upper) if upper.inclusive => *key > upper.value,
            Some(upper) => *key >= upper.value,
            None => false,
        }
    }
}

/// The tighter of two starting bounds for a traversal in `direction`.
///
/// Ascending keeps the larger bound, descending the smaller; on equal values
/// an exclusive bound wins over an inclusive one.
pub(crate) fn tighter_start<K: Ord + Clone>(
    a: Bound<&K>,
    b: Bound<&K>,
    direction: Direction,
) -> Bound<K> {
    let chosen = match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other,
        (
            Bound::Included(va) | Bound::Excluded(va),
            Bound::Included(vb) | Bound::Excluded(vb),
        ) => {
            let ord = match direction {
                Direction::Ascending => va.cmp(vb),
                Direction::Descending => vb.cmp(va),
            };
            match ord {
                Ordering::Greater => a,
                Ordering::Less => b,
                Ordering::Equal if matches!(a, Bound::Excluded(_)) => a,
                Ordering::Equal => b,
            }
        }
    };
    chosen.cloned()
}
