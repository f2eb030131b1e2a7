//! Rows: the cells of one clustering row or of the static row.
//!
//! A [`Row`] maps column ids to cells. Small rows keep a positional slot
//! vector indexed by column id; once a column id at or past
//! [`MAX_DENSE_COLUMNS`] is written the row is promoted to an ordered map.
//! Both layouts iterate in ascending column-id order and compare equal when
//! they hold the same cells.

mod deletable;

use std::{
    cmp::Ordering,
    collections::{btree_map, BTreeMap},
    iter::Enumerate,
    mem, slice, vec,
};

pub use deletable::DeletableRow;

use crate::{
    cell::{compare_atomic_cell_for_merge, AtomicCell, CellOrCollection, CollectionType},
    error::{PartitionError, Result},
    mvcc::{GcTime, Timestamp},
    observability::log_trace,
    schema::{ColumnDefinition, ColumnId, ColumnKind, Schema},
    tombstone::Tombstone,
};

/// Highest column count kept in the dense layout.
pub const MAX_DENSE_COLUMNS: usize = 32;

#[derive(Clone, Debug)]
enum Storage {
    Dense(Vec<Option<CellOrCollection>>),
    Sparse(BTreeMap<ColumnId, CellOrCollection>),
}

/// Cells of a row keyed by column id.
#[derive(Clone, Debug)]
pub struct Row {
    storage: Storage,
    len: usize,
}

impl Default for Row {
    fn default() -> Self {
        Self {
            storage: Storage::Dense(Vec::new()),
            len: 0,
        }
    }
}

impl Row {
    /// An empty row in the dense layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cells.
    pub fn size(&self) -> usize {
        self.len
    }

    /// Whether the row holds no cell.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the row has been promoted to the sparse layout.
    pub fn is_sparse(&self) -> bool {
        matches!(self.storage, Storage::Sparse(_))
    }

    /// Cells in ascending column-id order.
    pub fn iter(&self) -> Iter<'_> {
        match &self.storage {
            Storage::Dense(slots) => Iter(IterInner::Dense(slots.iter().enumerate())),
            Storage::Sparse(map) => Iter(IterInner::Sparse(map.iter())),
        }
    }

    /// Cell stored under `id`, if any.
    pub fn find_cell(&self, id: ColumnId) -> Option<&CellOrCollection> {
        match &self.storage {
            Storage::Dense(slots) => slots.get(id as usize).and_then(Option::as_ref),
            Storage::Sparse(map) => map.get(&id),
        }
    }

    /// Cell stored under `id`; absence is an error.
    pub fn cell_at(&self, id: ColumnId) -> Result<&CellOrCollection> {
        self.find_cell(id)
            .ok_or(PartitionError::NoSuchCell { id })
    }

    fn find_cell_mut(&mut self, id: ColumnId) -> Option<&mut CellOrCollection> {
        match &mut self.storage {
            Storage::Dense(slots) => slots.get_mut(id as usize).and_then(Option::as_mut),
            Storage::Sparse(map) => map.get_mut(&id),
        }
    }

    fn promote(&mut self) {
        if let Storage::Dense(slots) = &mut self.storage {
            let map: BTreeMap<_, _> = mem::take(slots)
                .into_iter()
                .enumerate()
                .filter_map(|(idx, slot)| slot.map(|cell| (idx as ColumnId, cell)))
                .collect();
            log_trace!(
                component = "row",
                event = "row_promoted",
                cells = map.len(),
            );
            self.storage = Storage::Sparse(map);
        }
    }

    /// Store `value` under `id`, which must be vacant.
    fn insert_vacant(&mut self, id: ColumnId, value: CellOrCollection) {
        if id as usize >= MAX_DENSE_COLUMNS {
            self.promote();
        }
        match &mut self.storage {
            Storage::Dense(slots) => {
                let idx = id as usize;
                if slots.len() <= idx {
                    slots.resize_with(idx + 1, || None);
                }
                slots[idx] = Some(value);
            }
            Storage::Sparse(map) => {
                map.insert(id, value);
            }
        }
        self.len += 1;
    }

    /// Merge `value` into the cell for `column`, keeping the winner under
    /// the reconciliation order.
    pub fn apply(&mut self, column: &ColumnDefinition, value: impl Into<CellOrCollection>) {
        let value = value.into();
        match self.find_cell_mut(column.id()) {
            Some(existing) => merge_into(column, existing, value),
            None => self.insert_vacant(column.id(), value),
        }
    }

    /// Like [`Row::apply`], cloning `value` only when it is stored.
    pub fn apply_ref(&mut self, column: &ColumnDefinition, value: &CellOrCollection) {
        match self.find_cell_mut(column.id()) {
            Some(existing) => merge_ref_into(column, existing, value),
            None => self.insert_vacant(column.id(), value.clone()),
        }
    }

    /// Append a cell under an id greater than every id already present.
    ///
    /// Used when building a row from an already sorted source; the
    /// ordering is only checked in debug builds.
    pub fn append_cell(&mut self, id: ColumnId, value: CellOrCollection) {
        debug_assert!(
            self.iter().next_back().map_or(true, |(last, _)| last < id),
            "append_cell: column {id} is not past the last stored column"
        );
        self.insert_vacant(id, value);
    }

    /// Merge every cell of `other` into this row.
    pub fn merge(&mut self, schema: &Schema, kind: ColumnKind, other: &Row) {
        for (id, value) in other.iter() {
            self.apply_ref(schema.column(kind, id), value);
        }
    }

    /// Merge every cell of `other` into this row, consuming it.
    pub fn merge_owned(&mut self, schema: &Schema, kind: ColumnKind, other: Row) {
        if self.is_empty() {
            *self = other;
            return;
        }
        for (id, value) in other {
            self.apply(schema.column(kind, id), value);
        }
    }

    /// Cells of this row that `other` lacks or that win over `other`'s
    /// version.
    pub fn difference(&self, schema: &Schema, kind: ColumnKind, other: &Row) -> Row {
        let mut out = Row::new();
        for (id, value) in self.iter() {
            let Some(theirs) = other.find_cell(id) else {
                out.append_cell(id, value.clone());
                continue;
            };
            match (value, theirs) {
                (CellOrCollection::Atomic(mine), CellOrCollection::Atomic(theirs)) => {
                    if compare_atomic_cell_for_merge(mine, theirs) == Ordering::Greater {
                        out.append_cell(id, value.clone());
                    }
                }
                (CellOrCollection::Collection(mine), CellOrCollection::Collection(theirs)) => {
                    let ct = collection_type(schema.column(kind, id));
                    let diff = ct.difference(mine, theirs);
                    if !ct.is_empty(&diff) {
                        out.append_cell(id, diff.into());
                    }
                }
                _ => mismatch(schema.column(kind, id)),
            }
        }
        out
    }

    /// Expire and purge cells under `tomb`. Returns whether any live cell
    /// remains.
    ///
    /// Cells covered by `tomb` are dropped. Expired cells become cell
    /// tombstones. Dead cells issued before `gc_before` and older than
    /// `max_purgeable` are dropped. Collection columns are compacted
    /// element-wise and removed once nothing is left of them.
    pub fn compact_and_expire(
        &mut self,
        schema: &Schema,
        kind: ColumnKind,
        tomb: Tombstone,
        now: GcTime,
        max_purgeable: Timestamp,
        gc_before: GcTime,
    ) -> bool {
        let mut any_live = false;
        self.retain_mut(|id, value| match value {
            CellOrCollection::Atomic(cell) => {
                if cell.is_covered_by(tomb) {
                    return false;
                }
                if cell.has_expired(now) {
                    *cell = cell.to_expired_tombstone();
                }
                if cell.is_live_variant() {
                    any_live = true;
                    true
                } else {
                    !cell.is_purgeable(max_purgeable, gc_before)
                }
            }
            CellOrCollection::Collection(m) => {
                let ct = collection_type(schema.column(kind, id));
                any_live |= ct.compact_and_expire(m, tomb, now, max_purgeable, gc_before);
                !ct.is_empty(m)
            }
        });
        any_live
    }

    /// Whether any cell is live under `tomb` at `now`.
    pub fn is_live(&self, schema: &Schema, kind: ColumnKind, tomb: Tombstone, now: GcTime) -> bool {
        self.iter().any(|(id, value)| match value {
            CellOrCollection::Atomic(cell) => cell.is_live(tomb, now),
            CellOrCollection::Collection(m) => {
                collection_type(schema.column(kind, id)).is_any_live(m, tomb, now)
            }
        })
    }

    /// Drop live cells and live collection elements, keeping cell and
    /// collection tombstones.
    pub fn drop_live_cells(&mut self) {
        self.retain_mut(|_, value| match value {
            CellOrCollection::Atomic(cell) => !cell.is_live_variant(),
            CellOrCollection::Collection(m) => {
                m.cells.retain(|(_, cell)| !cell.is_live_variant());
                !m.is_empty()
            }
        });
    }

    fn retain_mut(&mut self, mut keep: impl FnMut(ColumnId, &mut CellOrCollection) -> bool) {
        match &mut self.storage {
            Storage::Dense(slots) => {
                for (idx, slot) in slots.iter_mut().enumerate() {
                    if let Some(value) = slot {
                        if !keep(idx as ColumnId, value) {
                            *slot = None;
                        }
                    }
                }
                while matches!(slots.last(), Some(None)) {
                    slots.pop();
                }
                self.len = slots.iter().filter(|slot| slot.is_some()).count();
            }
            Storage::Sparse(map) => {
                map.retain(|id, value| keep(*id, value));
                self.len = map.len();
            }
        }
    }
}

fn collection_type(column: &ColumnDefinition) -> &CollectionType {
    match column.collection_type() {
        Some(ct) => ct,
        None => mismatch(column),
    }
}

fn mismatch(column: &ColumnDefinition) -> ! {
    panic!(
        "{} column {} ({}) holds a cell that does not match its declared type",
        column.kind(),
        column.id(),
        column.name()
    )
}

fn merge_into(column: &ColumnDefinition, existing: &mut CellOrCollection, incoming: CellOrCollection) {
    match (existing, incoming) {
        (CellOrCollection::Atomic(mine), CellOrCollection::Atomic(theirs)) => {
            if compare_atomic_cell_for_merge(&theirs, mine) == Ordering::Greater {
                *mine = theirs;
            }
        }
        (CellOrCollection::Collection(mine), CellOrCollection::Collection(theirs)) => {
            let current = mem::take(mine);
            *mine = collection_type(column).merge_owned(current, theirs);
        }
        _ => mismatch(column),
    }
}

fn merge_ref_into(column: &ColumnDefinition, existing: &mut CellOrCollection, incoming: &CellOrCollection) {
    match (existing, incoming) {
        (CellOrCollection::Atomic(mine), CellOrCollection::Atomic(theirs)) => {
            if compare_atomic_cell_for_merge(theirs, mine) == Ordering::Greater {
                *mine = theirs.clone();
            }
        }
        (CellOrCollection::Collection(mine), CellOrCollection::Collection(theirs)) => {
            let current = mem::take(mine);
            *mine = collection_type(column).merge_owned(current, theirs.clone());
        }
        _ => mismatch(column),
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl Eq for Row {}

impl FromIterator<(ColumnId, AtomicCell)> for Row {
    fn from_iter<I: IntoIterator<Item = (ColumnId, AtomicCell)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (id, cell) in iter {
            match row.find_cell_mut(id) {
                Some(CellOrCollection::Atomic(existing)) => {
                    if compare_atomic_cell_for_merge(&cell, existing) == Ordering::Greater {
                        *existing = cell;
                    }
                }
                Some(_) => panic!("column {id} mixes atomic and collection cells"),
                None => row.insert_vacant(id, cell.into()),
            }
        }
        row
    }
}

/// Borrowing iterator over a row's cells.
pub struct Iter<'a>(IterInner<'a>);

enum IterInner<'a> {
    Dense(Enumerate<slice::Iter<'a, Option<CellOrCollection>>>),
    Sparse(btree_map::Iter<'a, ColumnId, CellOrCollection>),
}

impl<'a> Iterator for Iter<'a> {
    type Item = (ColumnId, &'a CellOrCollection);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.0 {
            IterInner::Dense(slots) => slots
                .find_map(|(idx, slot)| slot.as_ref().map(|value| (idx as ColumnId, value))),
            IterInner::Sparse(map) => map.next().map(|(id, value)| (*id, value)),
        }
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match &mut self.0 {
            IterInner::Dense(slots) => loop {
                let (idx, slot) = slots.next_back()?;
                if let Some(value) = slot {
                    return Some((idx as ColumnId, value));
                }
            },
            IterInner::Sparse(map) => map.next_back().map(|(id, value)| (*id, value)),
        }
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = (ColumnId, &'a CellOrCollection);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Owning iterator over a row's cells.
pub struct IntoIter(IntoIterInner);

enum IntoIterInner {
    Dense(Enumerate<vec::IntoIter<Option<CellOrCollection>>>),
    Sparse(btree_map::IntoIter<ColumnId, CellOrCollection>),
}

impl Iterator for IntoIter {
    type Item = (ColumnId, CellOrCollection);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.0 {
            IntoIterInner::Dense(slots) => {
                slots.find_map(|(idx, slot)| slot.map(|value| (idx as ColumnId, value)))
            }
            IntoIterInner::Sparse(map) => map.next(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (ColumnId, CellOrCollection);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter(match self.storage {
            Storage::Dense(slots) => IntoIterInner::Dense(slots.into_iter().enumerate()),
            Storage::Sparse(map) => IntoIterInner::Sparse(map.into_iter()),
        })
    }
}
