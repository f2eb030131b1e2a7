//! Deletion markers.

use crate::mvcc::{GcTime, Timestamp};

/// A deletion marker shadowing every write with an equal or lower timestamp.
///
/// Ordering is by timestamp, then by deletion time; merging two tombstones
/// keeps the greater one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tombstone {
    /// Write timestamp of the deletion.
    pub timestamp: Timestamp,
    /// Time point at which the deletion was issued, used for gc grace.
    pub deletion_time: GcTime,
}

impl Tombstone {
    /// The empty tombstone: deletes nothing.
    pub const NONE: Self = Self {
        timestamp: Timestamp::MISSING,
        deletion_time: GcTime::MIN,
    };

    /// Build a tombstone.
    pub const fn new(timestamp: Timestamp, deletion_time: GcTime) -> Self {
        Self {
            timestamp,
            deletion_time,
        }
    }

    /// Whether this tombstone deletes anything.
    #[inline]
    pub fn is_some(&self) -> bool {
        !self.timestamp.is_missing()
    }

    /// Merge `other` in, keeping the greater of the two.
    #[inline]
    pub fn apply(&mut self, other: Tombstone) {
        if other > *self {
            *self = other;
        }
    }

    /// Whether a write at `timestamp` is shadowed by this tombstone.
    #[inline]
    pub fn covers(&self, timestamp: Timestamp) -> bool {
        timestamp <= self.timestamp
    }

    /// Whether this tombstone may be forgotten cluster-wide: it was issued
    /// before `gc_before` and is older than `max_purgeable`.
    #[inline]
    pub fn is_purgeable(&self, max_purgeable: Timestamp, gc_before: GcTime) -> bool {
        self.is_some() && self.deletion_time < gc_before && self.timestamp < max_purgeable
    }
}

impl Default for Tombstone {
    fn default() -> Self {
        Self::NONE
    }
}
