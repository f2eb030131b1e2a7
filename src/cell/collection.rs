use std::cmp::Ordering;

use bytes::{Bytes, BytesMut};

use super::{compare_atomic_cell_for_merge, AtomicCell};
use crate::{
    error::CodecError,
    mvcc::{GcTime, Timestamp},
    serdes::{Decode, Encode},
    tombstone::Tombstone,
};

/// Mutation form of a collection column: a collection-wide tombstone plus
/// element cells sorted by element key.
///
/// Cells never carry a timestamp covered by `tomb`; merge, difference and
/// compaction all preserve this.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CollectionMutation {
    /// Tombstone covering every element written at or before it.
    pub tomb: Tombstone,
    /// Element cells, strictly ordered by key.
    pub cells: Vec<(Bytes, AtomicCell)>,
}

impl CollectionMutation {
    /// A mutation deleting the whole collection.
    pub fn deleted(tomb: Tombstone) -> Self {
        Self {
            tomb,
            cells: Vec::new(),
        }
    }

    /// Add an element cell, reconciling with an existing cell under the same key.
    pub fn with_cell(mut self, key: impl Into<Bytes>, cell: AtomicCell) -> Self {
        self.insert(key.into(), cell);
        self
    }

    /// Insert or reconcile one element cell. A cell shadowed by the
    /// collection's own tombstone is not stored.
    pub fn insert(&mut self, key: Bytes, cell: AtomicCell) {
        if cell.is_covered_by(self.tomb) {
            return;
        }
        match self
            .cells
            .binary_search_by(|(k, _)| k.as_ref().cmp(key.as_ref()))
        {
            Ok(pos) => {
                if compare_atomic_cell_for_merge(&cell, &self.cells[pos].1) == Ordering::Greater {
                    self.cells[pos].1 = cell;
                }
            }
            Err(pos) => self.cells.insert(pos, (key, cell)),
        }
    }

    /// Whether neither a tombstone nor any element is present.
    pub fn is_empty(&self) -> bool {
        !self.tomb.is_some() && self.cells.is_empty()
    }

    /// Elements live under `tomb` (merged with the collection's own) at `now`.
    pub fn live_cells(
        &self,
        tomb: Tombstone,
        now: GcTime,
    ) -> impl Iterator<Item = &(Bytes, AtomicCell)> {
        let mut effective = self.tomb;
        effective.apply(tomb);
        self.cells
            .iter()
            .filter(move |(_, cell)| cell.is_live(effective, now))
    }
}

/// Declared flavour of a collection column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Element keys are the set members; values are empty.
    Set,
    /// Element keys are time-ordered positions.
    List,
    /// Element keys are map keys.
    Map,
}

/// Codec and merge rules for one collection column type.
///
/// Rows treat collection content as opaque and route every operation on it
/// through this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CollectionType {
    kind: CollectionKind,
}

impl CollectionType {
    /// Collection type of the given kind.
    pub const fn new(kind: CollectionKind) -> Self {
        Self { kind }
    }

    /// Declared kind.
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Merge two mutation forms. Elements shadowed by the opposite side's
    /// tombstone are dropped; elements present on both sides reconcile by
    /// the atomic cell order.
    pub fn merge(&self, a: &CollectionMutation, b: &CollectionMutation) -> CollectionMutation {
        self.merge_owned(a.clone(), b.clone())
    }

    /// Merge two owned mutation forms without cloning element values.
    pub fn merge_owned(
        &self,
        a: CollectionMutation,
        b: CollectionMutation,
    ) -> CollectionMutation {
        let a_tomb = a.tomb;
        let b_tomb = b.tomb;
        let left = a
            .cells
            .into_iter()
            .filter(|(_, cell)| !cell.is_covered_by(b_tomb));
        let mut right = b
            .cells
            .into_iter()
            .filter(|(_, cell)| !cell.is_covered_by(a_tomb))
            .peekable();

        let mut cells = Vec::new();
        for (key, cell) in left {
            while let Some((rk, _)) = right.peek() {
                if rk.as_ref() >= key.as_ref() {
                    break;
                }
                cells.extend(right.next());
            }
            let collides = matches!(right.peek(), Some((rk, _)) if rk.as_ref() == key.as_ref());
            match right.next_if(|_| collides) {
                Some((rk, rc)) if compare_atomic_cell_for_merge(&cell, &rc) == Ordering::Less => {
                    cells.push((rk, rc));
                }
                _ => cells.push((key, cell)),
            }
        }
        cells.extend(right);

        CollectionMutation {
            tomb: a_tomb.max(b_tomb),
            cells,
        }
    }

    /// What `a` holds that `b` lacks or that wins over `b`'s version.
    pub fn difference(&self, a: &CollectionMutation, b: &CollectionMutation) -> CollectionMutation {
        let tomb = if a.tomb > b.tomb {
            a.tomb
        } else {
            Tombstone::NONE
        };
        let mut cells = Vec::new();
        let mut other = b.cells.iter().peekable();
        for (key, cell) in &a.cells {
            while other
                .peek()
                .is_some_and(|(ok, _)| ok.as_ref() < key.as_ref())
            {
                other.next();
            }
            match other.peek() {
                Some((ok, oc)) if ok.as_ref() == key.as_ref() => {
                    if compare_atomic_cell_for_merge(cell, oc) == Ordering::Greater {
                        cells.push((key.clone(), cell.clone()));
                    }
                }
                _ => cells.push((key.clone(), cell.clone())),
            }
        }
        CollectionMutation { tomb, cells }
    }

    /// Whether the mutation form carries nothing.
    pub fn is_empty(&self, m: &CollectionMutation) -> bool {
        m.is_empty()
    }

    /// Whether any element is live under `tomb` at `now`.
    pub fn is_any_live(&self, m: &CollectionMutation, tomb: Tombstone, now: GcTime) -> bool {
        m.live_cells(tomb, now).next().is_some()
    }

    /// Serialize the full mutation form.
    pub fn serialize_mutation_form(&self, m: &CollectionMutation) -> Bytes {
        let mut buf = BytesMut::with_capacity(m.size());
        m.encode(&mut buf);
        buf.freeze()
    }

    /// Serialize only the elements live under `tomb` at `now`, dropping the
    /// collection tombstone.
    pub fn serialize_mutation_form_only_live(
        &self,
        m: &CollectionMutation,
        tomb: Tombstone,
        now: GcTime,
    ) -> Bytes {
        let live = CollectionMutation {
            tomb: Tombstone::NONE,
            cells: m.live_cells(tomb, now).cloned().collect(),
        };
        self.serialize_mutation_form(&live)
    }

    /// Decode a mutation form produced by [`CollectionType::serialize_mutation_form`].
    pub fn deserialize_mutation_form(&self, mut bytes: &[u8]) -> Result<CollectionMutation, CodecError> {
        let m = CollectionMutation::decode(&mut bytes)?;
        if !bytes.is_empty() {
            return Err(CodecError::TrailingBytes(bytes.len()));
        }
        Ok(m)
    }

    /// Expire and purge elements under `tomb`. Elements shadowed by the
    /// effective tombstone are dropped, expired elements turn into element
    /// tombstones, and purgeable element tombstones are forgotten. The
    /// collection's own tombstone is cleared when `tomb` dominates it or it is
    /// purgeable. Returns whether any element remains live.
    pub fn compact_and_expire(
        &self,
        m: &mut CollectionMutation,
        tomb: Tombstone,
        now: GcTime,
        max_purgeable: Timestamp,
        gc_before: GcTime,
    ) -> bool {
        let mut effective = m.tomb;
        effective.apply(tomb);
        let mut any_live = false;
        m.cells.retain_mut(|(_, cell)| {
            if cell.is_covered_by(effective) {
                false
            } else if cell.has_expired(now) {
                if cell.is_purgeable(max_purgeable, gc_before) {
                    false
                } else {
                    *cell = cell.to_expired_tombstone();
                    true
                }
            } else if !cell.is_live_variant() {
                !cell.is_purgeable(max_purgeable, gc_before)
            } else {
                any_live = true;
                true
            }
        });
        if m.tomb <= tomb || m.tomb.is_purgeable(max_purgeable, gc_before) {
            m.tomb = Tombstone::NONE;
        }
        any_live
    }
}
