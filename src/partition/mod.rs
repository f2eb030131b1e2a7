//! The mutation partition: every row, tombstone and static cell held for one
//! partition key.
//!
//! Clustering rows and range tombstones are kept in vectors sorted by the
//! schema's [`ClusteringComparator`](crate::key::ClusteringComparator) and
//! searched by bisection. Range tombstones are keyed by strict prefixes of
//! the clustering key; a full key is never stored there.

mod apply;
mod compact;
mod difference;
mod query;

use std::cmp::Ordering;

use crate::{
    error::{Result, SchemaError},
    key::{ClusteringComparator, ClusteringKey, ClusteringPrefix, ClusteringValue},
    marker::RowMarker,
    mvcc::{GcTime, Timestamp},
    row::{DeletableRow, Row},
    scan::ClusteringRange,
    schema::{ColumnKind, Schema},
    tombstone::Tombstone,
};

/// A clustering row with its key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowsEntry {
    key: ClusteringKey,
    row: DeletableRow,
}

impl RowsEntry {
    /// Pair a key with its row.
    pub fn new(key: ClusteringKey, row: DeletableRow) -> Self {
        Self { key, row }
    }

    /// Clustering key.
    pub fn key(&self) -> &ClusteringKey {
        &self.key
    }

    /// The row.
    pub fn row(&self) -> &DeletableRow {
        &self.row
    }

    /// The row, mutably.
    pub fn row_mut(&mut self) -> &mut DeletableRow {
        &mut self.row
    }
}

/// A range tombstone keyed by a strict clustering prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowTombstonesEntry {
    prefix: ClusteringPrefix,
    tomb: Tombstone,
}

impl RowTombstonesEntry {
    /// Prefix whose rows the tombstone covers.
    pub fn prefix(&self) -> &ClusteringPrefix {
        &self.prefix
    }

    /// The tombstone.
    pub fn tomb(&self) -> Tombstone {
        self.tomb
    }
}

/// In-memory contents of one partition.
///
/// Cloning deep-copies every row and tombstone.
#[derive(Clone, Debug, Default)]
pub struct MutationPartition {
    tombstone: Tombstone,
    static_row: Row,
    rows: Vec<RowsEntry>,
    row_tombstones: Vec<RowTombstonesEntry>,
}

fn search_rows(
    rows: &[RowsEntry],
    cmp: &ClusteringComparator,
    key: &[ClusteringValue],
) -> std::result::Result<usize, usize> {
    rows.binary_search_by(|e| cmp.compare(e.key.components(), key))
}

fn search_row_tombstones(
    entries: &[RowTombstonesEntry],
    cmp: &ClusteringComparator,
    prefix: &[ClusteringValue],
) -> std::result::Result<usize, usize> {
    entries.binary_search_by(|e| cmp.compare(e.prefix.components(), prefix))
}

impl MutationPartition {
    /// An empty partition.
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition-level tombstone.
    pub fn partition_tombstone(&self) -> Tombstone {
        self.tombstone
    }

    /// Static row.
    pub fn static_row(&self) -> &Row {
        &self.static_row
    }

    /// Static row, mutably.
    pub fn static_row_mut(&mut self) -> &mut Row {
        &mut self.static_row
    }

    /// Clustering rows in clustering order.
    pub fn clustered_rows(&self) -> &[RowsEntry] {
        &self.rows
    }

    /// Range tombstones in prefix order.
    pub fn row_tombstones(&self) -> &[RowTombstonesEntry] {
        &self.row_tombstones
    }

    /// Merge a partition-level tombstone in.
    pub fn apply_tombstone(&mut self, tomb: Tombstone) {
        self.tombstone.apply(tomb);
    }

    /// Merge a range tombstone for a strict prefix in.
    ///
    /// # Panics
    ///
    /// When `prefix` is as long as the clustering key (or longer).
    pub fn apply_row_tombstone(&mut self, schema: &Schema, prefix: ClusteringPrefix, tomb: Tombstone) {
        assert!(
            prefix.len() < schema.clustering_key_size(),
            "range tombstone prefix {prefix:?} is not a strict clustering prefix"
        );
        let cmp = schema.comparator();
        match search_row_tombstones(&self.row_tombstones, cmp, prefix.components()) {
            Ok(idx) => self.row_tombstones[idx].tomb.apply(tomb),
            Err(idx) => self
                .row_tombstones
                .insert(idx, RowTombstonesEntry { prefix, tomb }),
        }
    }

    /// Delete what `prefix` addresses: the whole partition for the empty
    /// prefix, one row for a full key, a range otherwise.
    pub fn apply_delete(&mut self, schema: &Schema, prefix: ClusteringPrefix, tomb: Tombstone) -> Result<()> {
        let size = schema.clustering_key_size();
        if prefix.len() > size {
            return Err(SchemaError::PrefixTooLong {
                max: size,
                got: prefix.len(),
            }
            .into());
        }
        if prefix.is_empty() {
            self.apply_tombstone(tomb);
        } else if prefix.is_full(schema) {
            let key = ClusteringKey::from_prefix(schema, prefix)?;
            self.apply_delete_key(schema, key, tomb);
        } else {
            self.apply_row_tombstone(schema, prefix, tomb);
        }
        Ok(())
    }

    /// Delete the row under `key`.
    pub fn apply_delete_key(&mut self, schema: &Schema, key: ClusteringKey, tomb: Tombstone) {
        self.clustered_row(schema, key).apply_tombstone(tomb);
    }

    /// Record the row marker written by an insert of `key` at `timestamp`.
    pub fn apply_insert(&mut self, schema: &Schema, key: ClusteringKey, timestamp: Timestamp) {
        self.clustered_row(schema, key)
            .apply_marker(RowMarker::live(timestamp));
    }

    /// Insert `row` under `key`, merging with an existing row.
    pub fn insert_row(&mut self, schema: &Schema, key: ClusteringKey, row: DeletableRow) {
        match search_rows(&self.rows, schema.comparator(), key.components()) {
            Ok(idx) => self.rows[idx].row.merge_owned(schema, row),
            Err(idx) => self.rows.insert(idx, RowsEntry { key, row }),
        }
    }

    pub(crate) fn clustered_row_index(&mut self, schema: &Schema, key: ClusteringKey) -> usize {
        match search_rows(&self.rows, schema.comparator(), key.components()) {
            Ok(idx) => idx,
            Err(idx) => {
                self.rows.insert(
                    idx,
                    RowsEntry {
                        key,
                        row: DeletableRow::new(),
                    },
                );
                idx
            }
        }
    }

    pub(crate) fn row_at_mut(&mut self, idx: usize) -> &mut DeletableRow {
        &mut self.rows[idx].row
    }

    /// The row under `key`, created empty when absent.
    pub fn clustered_row(&mut self, schema: &Schema, key: ClusteringKey) -> &mut DeletableRow {
        let idx = self.clustered_row_index(schema, key);
        &mut self.rows[idx].row
    }

    /// The entry under `key`.
    pub fn find_entry(&self, schema: &Schema, key: &ClusteringKey) -> Option<&RowsEntry> {
        search_rows(&self.rows, schema.comparator(), key.components())
            .ok()
            .map(|idx| &self.rows[idx])
    }

    /// Cells of the row under `key`.
    pub fn find_row(&self, schema: &Schema, key: &ClusteringKey) -> Option<&Row> {
        self.find_entry(schema, key).map(|e| e.row.cells())
    }

    /// Index bounds of the rows inside `range`.
    pub(crate) fn range_bounds(&self, cmp: &ClusteringComparator, range: &ClusteringRange) -> (usize, usize) {
        let lo = self
            .rows
            .partition_point(|e| !range.after_start(cmp, e.key.components()));
        let hi = self
            .rows
            .partition_point(|e| range.before_end(cmp, e.key.components()));
        (lo, hi.max(lo))
    }

    /// Rows inside `range`, in clustering order.
    pub fn range(&self, schema: &Schema, range: &ClusteringRange) -> &[RowsEntry] {
        let (lo, hi) = self.range_bounds(schema.comparator(), range);
        &self.rows[lo..hi]
    }

    /// Partition tombstone merged with every range tombstone whose prefix
    /// `key` starts with.
    pub fn range_tombstone_for_row(&self, schema: &Schema, key: &ClusteringKey) -> Tombstone {
        let mut tomb = self.tombstone;
        if self.row_tombstones.is_empty() {
            return tomb;
        }
        let cmp = schema.comparator();
        for len in 0..key.components().len() {
            if let Ok(idx) = search_row_tombstones(&self.row_tombstones, cmp, key.prefix_view(len)) {
                tomb.apply(self.row_tombstones[idx].tomb);
            }
        }
        tomb
    }

    /// [`range_tombstone_for_row`](Self::range_tombstone_for_row) merged
    /// with the row's own tombstone.
    pub fn tombstone_for_row(&self, schema: &Schema, key: &ClusteringKey) -> Tombstone {
        let mut tomb = self.range_tombstone_for_row(schema, key);
        if let Some(entry) = self.find_entry(schema, key) {
            tomb.apply(entry.row.deleted_at());
        }
        tomb
    }

    fn tombstone_for_entry(&self, schema: &Schema, entry: &RowsEntry) -> Tombstone {
        let mut tomb = self.range_tombstone_for_row(schema, &entry.key);
        tomb.apply(entry.row.deleted_at());
        tomb
    }

    /// Tombstone shadowing the static row.
    pub fn tombstone_for_static_row(&self) -> Tombstone {
        self.tombstone
    }

    /// Whether any static cell is live at `now`.
    pub fn is_static_row_live(&self, schema: &Schema, now: GcTime) -> bool {
        self.static_row
            .is_live(schema, ColumnKind::Static, self.tombstone_for_static_row(), now)
    }

    /// Number of live clustering rows at `now`; a partition whose only
    /// live data is static counts as one row.
    pub fn live_row_count(&self, schema: &Schema, now: GcTime) -> usize {
        let count = self
            .rows
            .iter()
            .filter(|e| {
                let base = self.range_tombstone_for_row(schema, &e.key);
                e.row.is_live(schema, base, now)
            })
            .count();
        if count == 0 && self.is_static_row_live(schema, now) {
            return 1;
        }
        count
    }

    /// Whether the partition holds nothing at all.
    pub fn is_empty(&self) -> bool {
        !self.tombstone.is_some()
            && self.static_row.is_empty()
            && self.rows.is_empty()
            && self.row_tombstones.is_empty()
    }

    /// Value equality under `schema`'s clustering comparator.
    pub fn equal(&self, schema: &Schema, other: &MutationPartition) -> bool {
        let cmp = schema.comparator();
        self.tombstone == other.tombstone
            && self.static_row == other.static_row
            && self.rows.len() == other.rows.len()
            && self.row_tombstones.len() == other.row_tombstones.len()
            && self
                .rows
                .iter()
                .zip(&other.rows)
                .all(|(a, b)| cmp.equal(a.key.components(), b.key.components()) && a.row == b.row)
            && self
                .row_tombstones
                .iter()
                .zip(&other.row_tombstones)
                .all(|(a, b)| {
                    cmp.equal(a.prefix.components(), b.prefix.components()) && a.tomb == b.tomb
                })
    }
}

/// Whether `a` sorts before `b` under `cmp`.
pub(crate) fn key_order(cmp: &ClusteringComparator, a: &ClusteringKey, b: &ClusteringKey) -> Ordering {
    cmp.compare(a.components(), b.components())
}
