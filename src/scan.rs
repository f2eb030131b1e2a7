//! Clustering ranges used by queries and compaction to select rows.
//!
//! Bounds are clustering prefixes with owned [`Bound`]s. A bound on a prefix
//! covers every key that starts with it, so `Included([1])..=Included([1])`
//! selects all rows whose first component is `1`.

use std::{cmp::Ordering, ops::Bound};

use crate::key::{ClusteringComparator, ClusteringKey, ClusteringPrefix, ClusteringValue};

/// A range of clustering keys with owned prefix bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusteringRange {
    /// Start bound (inclusive/exclusive/unbounded).
    pub start: Bound<ClusteringPrefix>,
    /// End bound (inclusive/exclusive/unbounded).
    pub end: Bound<ClusteringPrefix>,
}

impl ClusteringRange {
    /// The unbounded range (all rows).
    pub fn full() -> Self {
        Self {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// The rows starting with `prefix`; with a full key, exactly one row.
    pub fn singular(prefix: impl Into<ClusteringPrefix>) -> Self {
        let prefix = prefix.into();
        Self {
            start: Bound::Included(prefix.clone()),
            end: Bound::Included(prefix),
        }
    }

    /// Create a range from explicit bounds.
    pub fn new(start: Bound<ClusteringPrefix>, end: Bound<ClusteringPrefix>) -> Self {
        Self { start, end }
    }

    /// Whether both bounds are unbounded.
    pub fn is_full(&self) -> bool {
        matches!((&self.start, &self.end), (Bound::Unbounded, Bound::Unbounded))
    }

    /// Whether the range is `[p, p]` for a single prefix `p`.
    pub fn is_singular(&self) -> bool {
        match (&self.start, &self.end) {
            (Bound::Included(a), Bound::Included(b)) => a == b,
            _ => false,
        }
    }

    /// Whether a key positioned at `key` lies after the start bound.
    pub(crate) fn after_start(&self, cmp: &ClusteringComparator, key: &[ClusteringValue]) -> bool {
        match &self.start {
            Bound::Unbounded => true,
            Bound::Included(p) => cmp.compare_prefix_equal(key, p.components()) != Ordering::Less,
            Bound::Excluded(p) => {
                cmp.compare_prefix_equal(key, p.components()) == Ordering::Greater
            }
        }
    }

    /// Whether a key positioned at `key` lies before the end bound.
    pub(crate) fn before_end(&self, cmp: &ClusteringComparator, key: &[ClusteringValue]) -> bool {
        match &self.end {
            Bound::Unbounded => true,
            Bound::Included(p) => {
                cmp.compare_prefix_equal(key, p.components()) != Ordering::Greater
            }
            Bound::Excluded(p) => cmp.compare_prefix_equal(key, p.components()) == Ordering::Less,
        }
    }

    /// Whether this range contains `key` under `cmp`.
    pub fn contains(&self, cmp: &ClusteringComparator, key: &ClusteringKey) -> bool {
        self.after_start(cmp, key.components()) && self.before_end(cmp, key.components())
    }
}

impl From<ClusteringKey> for ClusteringPrefix {
    fn from(key: ClusteringKey) -> Self {
        key.into_prefix()
    }
}

impl From<&ClusteringKey> for ClusteringPrefix {
    fn from(key: &ClusteringKey) -> Self {
        key.as_prefix().clone()
    }
}
