use std::cmp::Ordering;

use super::Row;
use crate::{
    marker::{compare_row_marker_for_merge, RowMarker},
    mvcc::{GcTime, Timestamp},
    schema::{ColumnKind, Schema},
    tombstone::Tombstone,
};

/// One clustering row: its marker, its own tombstone and its cells.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeletableRow {
    marker: RowMarker,
    deleted_at: Tombstone,
    cells: Row,
}

impl DeletableRow {
    /// An empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Row marker.
    pub fn marker(&self) -> RowMarker {
        self.marker
    }

    /// Row-level tombstone.
    pub fn deleted_at(&self) -> Tombstone {
        self.deleted_at
    }

    /// Regular cells.
    pub fn cells(&self) -> &Row {
        &self.cells
    }

    /// Mutable regular cells.
    pub fn cells_mut(&mut self) -> &mut Row {
        &mut self.cells
    }

    /// Merge a row tombstone in.
    pub fn apply_tombstone(&mut self, tomb: Tombstone) {
        self.deleted_at.apply(tomb);
    }

    /// Merge a row marker in.
    pub fn apply_marker(&mut self, marker: RowMarker) {
        self.marker.apply(marker);
    }

    /// Forget the row tombstone.
    pub fn remove_tombstone(&mut self) {
        self.deleted_at = Tombstone::NONE;
    }

    /// Whether the row carries no marker, tombstone or cell.
    pub fn is_empty(&self) -> bool {
        self.marker.is_missing() && !self.deleted_at.is_some() && self.cells.is_empty()
    }

    /// Whether the row is live under `base` (the range and partition
    /// tombstones covering it) at `now`.
    pub fn is_live(&self, schema: &Schema, base: Tombstone, now: GcTime) -> bool {
        let tomb = base.max(self.deleted_at);
        self.marker.is_live(tomb, now) || self.cells.is_live(schema, ColumnKind::Regular, tomb, now)
    }

    /// Merge `other` in: tombstone, marker and cells.
    pub fn merge(&mut self, schema: &Schema, other: &DeletableRow) {
        self.apply_tombstone(other.deleted_at);
        self.apply_marker(other.marker);
        self.cells.merge(schema, ColumnKind::Regular, &other.cells);
    }

    /// Merge `other` in, consuming it.
    pub fn merge_owned(&mut self, schema: &Schema, other: DeletableRow) {
        self.apply_tombstone(other.deleted_at);
        self.apply_marker(other.marker);
        self.cells
            .merge_owned(schema, ColumnKind::Regular, other.cells);
    }

    /// What this row holds that `other` lacks or that wins over it.
    pub fn difference(&self, schema: &Schema, other: &DeletableRow) -> DeletableRow {
        let deleted_at = if self.deleted_at > other.deleted_at {
            self.deleted_at
        } else {
            Tombstone::NONE
        };
        let marker = match compare_row_marker_for_merge(&self.marker, &other.marker) {
            Ordering::Greater => self.marker,
            _ => RowMarker::Missing,
        };
        DeletableRow {
            marker,
            deleted_at,
            cells: self.cells.difference(schema, ColumnKind::Regular, &other.cells),
        }
    }

    /// Expire and purge the marker and cells under `tomb`, dropping the row
    /// tombstone once purgeable. Returns whether the row is still live.
    pub(crate) fn compact_and_expire(
        &mut self,
        schema: &Schema,
        tomb: Tombstone,
        now: GcTime,
        max_purgeable: Timestamp,
        gc_before: GcTime,
    ) -> bool {
        let cells_live = self.cells.compact_and_expire(
            schema,
            ColumnKind::Regular,
            tomb,
            now,
            max_purgeable,
            gc_before,
        );
        let marker_live = self
            .marker
            .compact_and_expire(tomb, now, max_purgeable, gc_before);
        if self.deleted_at.is_purgeable(max_purgeable, gc_before) {
            self.remove_tombstone();
        }
        cells_live || marker_live
    }

    /// Drop the live marker and live cells, keeping every tombstone.
    pub(crate) fn drop_live_data(&mut self) {
        if matches!(self.marker, RowMarker::Live { .. }) {
            self.marker = RowMarker::Missing;
        }
        self.cells.drop_live_cells();
    }
}
