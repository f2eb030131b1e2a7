//! Read-path contract: what a query selects and where its output goes.
//!
//! A partition answers a query by driving a [`PartitionWriter`]: at most one
//! static row, then clustering rows in key order, then exactly one of
//! [`PartitionWriter::finish`] or [`PartitionWriter::retract`].

mod result;

use bytes::Bytes;
pub use result::{QueryResultBuilder, ResultCell, ResultPartition, ResultPartitionWriter, ResultRow, ResultRowWriter};

use crate::{
    cell::AtomicCell,
    key::ClusteringKey,
    scan::ClusteringRange,
    schema::ColumnId,
};

/// Selection applied to one partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionSlice {
    /// Clustering ranges to read, in request order.
    pub row_ranges: Vec<ClusteringRange>,
    /// Static columns to emit, in output order.
    pub static_columns: Vec<ColumnId>,
    /// Regular columns to emit, in output order.
    pub regular_columns: Vec<ColumnId>,
    /// Read ranges last to first and rows in descending order.
    pub reversed: bool,
}

impl PartitionSlice {
    /// Every row, no columns.
    pub fn full() -> Self {
        Self {
            row_ranges: vec![ClusteringRange::full()],
            static_columns: Vec::new(),
            regular_columns: Vec::new(),
            reversed: false,
        }
    }

    /// Replace the clustering ranges.
    pub fn with_ranges(self, row_ranges: Vec<ClusteringRange>) -> Self {
        Self { row_ranges, ..self }
    }

    /// Replace the selected static columns.
    pub fn with_static_columns(self, static_columns: Vec<ColumnId>) -> Self {
        Self {
            static_columns,
            ..self
        }
    }

    /// Replace the selected regular columns.
    pub fn with_regular_columns(self, regular_columns: Vec<ColumnId>) -> Self {
        Self {
            regular_columns,
            ..self
        }
    }

    /// Set the reversed flag.
    pub fn reversed(self, reversed: bool) -> Self {
        Self { reversed, ..self }
    }
}

impl Default for PartitionSlice {
    fn default() -> Self {
        Self::full()
    }
}

/// Receives the columns of one output row, in slice order.
pub trait RowWriter {
    /// A live atomic cell.
    fn add(&mut self, cell: &AtomicCell);

    /// A collection in its live-only serialized form.
    fn add_collection(&mut self, serialized: Bytes);

    /// A selected column with nothing live.
    fn add_empty(&mut self);

    /// Close the row.
    fn finish(self);
}

/// Receives one partition's query output.
pub trait PartitionWriter {
    /// Writer for a single row.
    type RowWriter<'a>: RowWriter
    where
        Self: 'a;

    /// Open the static row.
    fn add_static_row(&mut self) -> Self::RowWriter<'_>;

    /// Open the clustering row under `key`.
    fn add_row(&mut self, key: &ClusteringKey) -> Self::RowWriter<'_>;

    /// Close the partition and keep its output.
    fn finish(self);

    /// Drop everything written for this partition: nothing matched.
    fn retract(self);
}
