//! Atomic cells, collection cells and the reconciliation order between them.

mod collection;

use std::cmp::Ordering;

use bytes::Bytes;
pub use collection::{CollectionKind, CollectionMutation, CollectionType};

use crate::{
    mvcc::{GcTime, Timestamp, Ttl},
    tombstone::Tombstone,
};

/// Expiry attached to a live cell written with a ttl.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Expiry {
    /// Time point at which the cell stops being live.
    pub expiry: GcTime,
    /// Ttl the cell was written with.
    pub ttl: Ttl,
}

impl Expiry {
    /// Deletion time an expired cell carries once it is turned into a
    /// tombstone: the moment it was written.
    #[inline]
    pub fn deletion_time(&self) -> GcTime {
        self.expiry.saturating_sub_secs(self.ttl.as_secs())
    }
}

/// A single versioned value, or the deletion of one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AtomicCell {
    /// A written value, optionally expiring.
    Live {
        /// Write timestamp.
        timestamp: Timestamp,
        /// Serialized value.
        value: Bytes,
        /// Set when the value was written with a ttl.
        expiry: Option<Expiry>,
    },
    /// A cell-level tombstone.
    Dead {
        /// Write timestamp of the deletion.
        timestamp: Timestamp,
        /// Time point the deletion was issued.
        deletion_time: GcTime,
    },
}

impl AtomicCell {
    /// A live, non-expiring cell.
    pub fn live(timestamp: Timestamp, value: impl Into<Bytes>) -> Self {
        AtomicCell::Live {
            timestamp,
            value: value.into(),
            expiry: None,
        }
    }

    /// A live cell expiring at `expiry`.
    pub fn live_expiring(
        timestamp: Timestamp,
        value: impl Into<Bytes>,
        expiry: GcTime,
        ttl: Ttl,
    ) -> Self {
        AtomicCell::Live {
            timestamp,
            value: value.into(),
            expiry: Some(Expiry { expiry, ttl }),
        }
    }

    /// A live cell written at `written_at` on the gc clock with the given ttl.
    pub fn live_with_ttl(
        timestamp: Timestamp,
        value: impl Into<Bytes>,
        written_at: GcTime,
        ttl: Ttl,
    ) -> Self {
        Self::live_expiring(timestamp, value, written_at.saturating_add(ttl), ttl)
    }

    /// A cell tombstone.
    pub fn dead(timestamp: Timestamp, deletion_time: GcTime) -> Self {
        AtomicCell::Dead {
            timestamp,
            deletion_time,
        }
    }

    /// Write timestamp of the cell.
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        match self {
            AtomicCell::Live { timestamp, .. } | AtomicCell::Dead { timestamp, .. } => *timestamp,
        }
    }

    /// Value of a live cell.
    pub fn value(&self) -> Option<&Bytes> {
        match self {
            AtomicCell::Live { value, .. } => Some(value),
            AtomicCell::Dead { .. } => None,
        }
    }

    /// Expiry of a live expiring cell.
    pub fn expiry(&self) -> Option<Expiry> {
        match self {
            AtomicCell::Live { expiry, .. } => *expiry,
            AtomicCell::Dead { .. } => None,
        }
    }

    /// Whether the cell holds a value (ignoring expiry and tombstones).
    #[inline]
    pub fn is_live_variant(&self) -> bool {
        matches!(self, AtomicCell::Live { .. })
    }

    /// Whether the cell is a live value that has not expired at `now`.
    #[inline]
    pub fn is_live_at(&self, now: GcTime) -> bool {
        match self {
            AtomicCell::Live { expiry, .. } => expiry.map_or(true, |e| now < e.expiry),
            AtomicCell::Dead { .. } => false,
        }
    }

    /// Whether the cell is live at `now` and not shadowed by `tomb`.
    #[inline]
    pub fn is_live(&self, tomb: Tombstone, now: GcTime) -> bool {
        !self.is_covered_by(tomb) && self.is_live_at(now)
    }

    /// Whether `tomb` shadows this cell.
    #[inline]
    pub fn is_covered_by(&self, tomb: Tombstone) -> bool {
        tomb.covers(self.timestamp())
    }

    /// Whether this is an expiring cell whose expiry has passed at `now`.
    #[inline]
    pub fn has_expired(&self, now: GcTime) -> bool {
        matches!(self, AtomicCell::Live { expiry: Some(e), .. } if now >= e.expiry)
    }

    /// Deletion time used for purging: the tombstone's own time for a dead
    /// cell, the write time for an expiring cell, and `GcTime::MAX` for a
    /// non-expiring live cell, which is never purged.
    pub fn deletion_time(&self) -> GcTime {
        match self {
            AtomicCell::Dead { deletion_time, .. } => *deletion_time,
            AtomicCell::Live {
                expiry: Some(e), ..
            } => e.deletion_time(),
            AtomicCell::Live { expiry: None, .. } => GcTime::MAX,
        }
    }

    /// Whether this cell, once dead, may be dropped cluster-wide.
    #[inline]
    pub(crate) fn is_purgeable(&self, max_purgeable: Timestamp, gc_before: GcTime) -> bool {
        self.deletion_time() < gc_before && self.timestamp() < max_purgeable
    }

    /// Tombstone-shaped replacement for an expired cell.
    pub(crate) fn to_expired_tombstone(&self) -> AtomicCell {
        AtomicCell::dead(self.timestamp(), self.deletion_time())
    }
}

/// Reconciliation order between two versions of the same cell.
///
/// `Greater` means `left` wins. Higher timestamp wins. On equal timestamps
/// a live cell beats a dead one; between two live cells an expiring cell
/// beats a non-expiring one and the earlier expiry wins, then the larger
/// value, then the shorter ttl; between two dead cells the later deletion
/// time wins.
pub fn compare_atomic_cell_for_merge(left: &AtomicCell, right: &AtomicCell) -> Ordering {
    let by_ts = left.timestamp().cmp(&right.timestamp());
    if by_ts != Ordering::Equal {
        return by_ts;
    }
    match (left, right) {
        (AtomicCell::Live { .. }, AtomicCell::Dead { .. }) => Ordering::Greater,
        (AtomicCell::Dead { .. }, AtomicCell::Live { .. }) => Ordering::Less,
        (
            AtomicCell::Live {
                value: lv,
                expiry: le,
                ..
            },
            AtomicCell::Live {
                value: rv,
                expiry: re,
                ..
            },
        ) => compare_expiry_for_merge(le.map(|e| e.expiry), re.map(|e| e.expiry))
            .then_with(|| lv.as_ref().cmp(rv.as_ref()))
            .then_with(|| compare_ttl_for_merge(*le, *re)),
        (
            AtomicCell::Dead {
                deletion_time: ld, ..
            },
            AtomicCell::Dead {
                deletion_time: rd, ..
            },
        ) => ld.cmp(rd),
    }
}

/// Tie-break between two live writes carrying the same timestamp: expiring
/// beats non-expiring, and the earlier expiry beats the later one.
pub(crate) fn compare_expiry_for_merge(left: Option<GcTime>, right: Option<GcTime>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (Some(l), Some(r)) => r.cmp(&l),
    }
}

/// Last tie-break between two live writes with the same timestamp and
/// expiry: the later deletion time, i.e. the shorter ttl, wins.
pub(crate) fn compare_ttl_for_merge(left: Option<Expiry>, right: Option<Expiry>) -> Ordering {
    left.map(|e| e.deletion_time()).cmp(&right.map(|e| e.deletion_time()))
}

/// Content stored under one column of a row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellOrCollection {
    /// Value of an atomic column.
    Atomic(AtomicCell),
    /// Mutation form of a collection column.
    Collection(CollectionMutation),
}

impl CellOrCollection {
    /// Borrow as an atomic cell.
    pub fn as_atomic(&self) -> Option<&AtomicCell> {
        match self {
            CellOrCollection::Atomic(cell) => Some(cell),
            CellOrCollection::Collection(_) => None,
        }
    }

    /// Borrow as a collection mutation.
    pub fn as_collection(&self) -> Option<&CollectionMutation> {
        match self {
            CellOrCollection::Atomic(_) => None,
            CellOrCollection::Collection(m) => Some(m),
        }
    }
}

impl From<AtomicCell> for CellOrCollection {
    fn from(cell: AtomicCell) -> Self {
        CellOrCollection::Atomic(cell)
    }
}

impl From<CollectionMutation> for CellOrCollection {
    fn from(m: CollectionMutation) -> Self {
        CellOrCollection::Collection(m)
    }
}
