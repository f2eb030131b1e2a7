//! Row markers: liveness of a clustering row independent of its cells.

use std::cmp::Ordering;

use crate::{
    cell::{compare_expiry_for_merge, compare_ttl_for_merge, Expiry},
    mvcc::{GcTime, Timestamp, Ttl},
    tombstone::Tombstone,
};

/// Tri-state liveness marker written by row-creating statements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum RowMarker {
    /// No marker was ever written.
    #[default]
    Missing,
    /// The row was created, optionally with a ttl.
    Live {
        /// Write timestamp of the creating statement.
        timestamp: Timestamp,
        /// Set when the row was created with a ttl.
        expiry: Option<Expiry>,
    },
    /// An expired marker, kept as a tombstone until it can be purged.
    Dead {
        /// Write timestamp of the creating statement.
        timestamp: Timestamp,
        /// Time point at which the marker stopped being live.
        deletion_time: GcTime,
    },
}

impl RowMarker {
    /// A non-expiring live marker.
    pub const fn live(timestamp: Timestamp) -> Self {
        RowMarker::Live {
            timestamp,
            expiry: None,
        }
    }

    /// A live marker expiring at `expiry`.
    pub const fn expiring(timestamp: Timestamp, expiry: GcTime, ttl: Ttl) -> Self {
        RowMarker::Live {
            timestamp,
            expiry: Some(Expiry { expiry, ttl }),
        }
    }

    /// A live marker written at `written_at` with the given ttl.
    pub const fn with_ttl(timestamp: Timestamp, written_at: GcTime, ttl: Ttl) -> Self {
        Self::expiring(timestamp, written_at.saturating_add(ttl), ttl)
    }

    /// A dead marker.
    pub const fn dead(timestamp: Timestamp, deletion_time: GcTime) -> Self {
        RowMarker::Dead {
            timestamp,
            deletion_time,
        }
    }

    /// Write timestamp, [`Timestamp::MISSING`] for a missing marker.
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        match self {
            RowMarker::Missing => Timestamp::MISSING,
            RowMarker::Live { timestamp, .. } | RowMarker::Dead { timestamp, .. } => *timestamp,
        }
    }

    /// Whether no marker is present.
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, RowMarker::Missing)
    }

    /// Whether the marker keeps its row alive under `tomb` at `now`.
    pub fn is_live(&self, tomb: Tombstone, now: GcTime) -> bool {
        match self {
            RowMarker::Live { timestamp, expiry } => {
                !tomb.covers(*timestamp) && expiry.map_or(true, |e| now < e.expiry)
            }
            RowMarker::Missing | RowMarker::Dead { .. } => false,
        }
    }

    /// Merge `other` in, keeping the winner under [`compare_row_marker_for_merge`].
    #[inline]
    pub fn apply(&mut self, other: RowMarker) {
        if compare_row_marker_for_merge(&other, self) == Ordering::Greater {
            *self = other;
        }
    }

    /// Drop the marker when `tomb` shadows it, turn an expired marker into a
    /// dead one, and forget a dead marker that is purgeable. Returns whether
    /// the marker is still live.
    pub fn compact_and_expire(
        &mut self,
        tomb: Tombstone,
        now: GcTime,
        max_purgeable: Timestamp,
        gc_before: GcTime,
    ) -> bool {
        if self.is_missing() {
            return false;
        }
        if tomb.covers(self.timestamp()) {
            *self = RowMarker::Missing;
            return false;
        }
        if let RowMarker::Live {
            timestamp,
            expiry: Some(e),
        } = *self
        {
            if now >= e.expiry {
                *self = RowMarker::dead(timestamp, e.deletion_time());
            }
        }
        if let RowMarker::Dead {
            timestamp,
            deletion_time,
        } = *self
        {
            if deletion_time < gc_before && timestamp < max_purgeable {
                *self = RowMarker::Missing;
            }
        }
        matches!(self, RowMarker::Live { .. })
    }
}

/// Reconciliation order between two markers of the same row.
///
/// Higher timestamp wins; on a tie a live marker beats a dead one, an
/// expiring marker beats a non-expiring one, the earlier expiry wins and
/// then the shorter ttl; between dead markers the later deletion time wins.
pub fn compare_row_marker_for_merge(left: &RowMarker, right: &RowMarker) -> Ordering {
    let by_ts = left.timestamp().cmp(&right.timestamp());
    if by_ts != Ordering::Equal {
        return by_ts;
    }
    match (left, right) {
        (RowMarker::Missing, RowMarker::Missing) => Ordering::Equal,
        (RowMarker::Missing, _) => Ordering::Less,
        (_, RowMarker::Missing) => Ordering::Greater,
        (RowMarker::Live { .. }, RowMarker::Dead { .. }) => Ordering::Greater,
        (RowMarker::Dead { .. }, RowMarker::Live { .. }) => Ordering::Less,
        (RowMarker::Live { expiry: le, .. }, RowMarker::Live { expiry: re, .. }) => {
            compare_expiry_for_merge(le.map(|e| e.expiry), re.map(|e| e.expiry))
                .then_with(|| compare_ttl_for_merge(*le, *re))
        }
        (
            RowMarker::Dead {
                deletion_time: ld, ..
            },
            RowMarker::Dead {
                deletion_time: rd, ..
            },
        ) => ld.cmp(rd),
    }
}
