use bytes::Bytes;

use super::{PartitionWriter, RowWriter};
use crate::{
    cell::{AtomicCell, Expiry},
    key::ClusteringKey,
    mvcc::Timestamp,
};

/// One output column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultCell {
    /// Nothing live under the column.
    Empty,
    /// A live atomic value.
    Atomic {
        /// Write timestamp.
        timestamp: Timestamp,
        /// Value.
        value: Bytes,
        /// Expiry, for values written with a ttl.
        expiry: Option<Expiry>,
    },
    /// Live elements of a collection, serialized.
    Collection(Bytes),
}

/// One output row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRow {
    /// Clustering key; `None` for the static row.
    pub key: Option<ClusteringKey>,
    /// Selected columns in slice order.
    pub cells: Vec<ResultCell>,
}

/// Output for one partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultPartition {
    /// Partition key.
    pub key: Bytes,
    /// Static row, when static columns were selected.
    pub static_row: Option<ResultRow>,
    /// Clustering rows in output order.
    pub rows: Vec<ResultRow>,
}

/// Collects query output for any number of partitions.
#[derive(Debug, Default)]
pub struct QueryResultBuilder {
    partitions: Vec<ResultPartition>,
}

impl QueryResultBuilder {
    /// An empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start writing the partition under `key`.
    pub fn add_partition(&mut self, key: impl Into<Bytes>) -> ResultPartitionWriter<'_> {
        ResultPartitionWriter {
            builder: self,
            partition: ResultPartition {
                key: key.into(),
                static_row: None,
                rows: Vec::new(),
            },
        }
    }

    /// Finished partitions so far.
    pub fn partitions(&self) -> &[ResultPartition] {
        &self.partitions
    }

    /// Total clustering rows across finished partitions.
    pub fn row_count(&self) -> usize {
        self.partitions.iter().map(|p| p.rows.len()).sum()
    }

    /// Take the finished partitions.
    pub fn build(self) -> Vec<ResultPartition> {
        self.partitions
    }
}

/// [`PartitionWriter`] appending into a [`QueryResultBuilder`].
#[derive(Debug)]
pub struct ResultPartitionWriter<'a> {
    builder: &'a mut QueryResultBuilder,
    partition: ResultPartition,
}

#[derive(Debug)]
enum Destination<'a> {
    Static(&'a mut Option<ResultRow>),
    Clustered(&'a mut Vec<ResultRow>),
}

/// [`RowWriter`] for a [`ResultPartitionWriter`].
#[derive(Debug)]
pub struct ResultRowWriter<'a> {
    row: ResultRow,
    destination: Destination<'a>,
}

impl RowWriter for ResultRowWriter<'_> {
    fn add(&mut self, cell: &AtomicCell) {
        let cell = match cell {
            AtomicCell::Live {
                timestamp,
                value,
                expiry,
            } => ResultCell::Atomic {
                timestamp: *timestamp,
                value: value.clone(),
                expiry: *expiry,
            },
            AtomicCell::Dead { .. } => ResultCell::Empty,
        };
        self.row.cells.push(cell);
    }

    fn add_collection(&mut self, serialized: Bytes) {
        self.row.cells.push(ResultCell::Collection(serialized));
    }

    fn add_empty(&mut self) {
        self.row.cells.push(ResultCell::Empty);
    }

    fn finish(self) {
        match self.destination {
            Destination::Static(slot) => *slot = Some(self.row),
            Destination::Clustered(rows) => rows.push(self.row),
        }
    }
}

impl<'p> PartitionWriter for ResultPartitionWriter<'p> {
    type RowWriter<'a> = ResultRowWriter<'a> where Self: 'a;

    fn add_static_row(&mut self) -> Self::RowWriter<'_> {
        ResultRowWriter {
            row: ResultRow {
                key: None,
                cells: Vec::new(),
            },
            destination: Destination::Static(&mut self.partition.static_row),
        }
    }

    fn add_row(&mut self, key: &ClusteringKey) -> Self::RowWriter<'_> {
        ResultRowWriter {
            row: ResultRow {
                key: Some(key.clone()),
                cells: Vec::new(),
            },
            destination: Destination::Clustered(&mut self.partition.rows),
        }
    }

    fn finish(self) {
        self.builder.partitions.push(self.partition);
    }

    fn retract(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{ck, two_level_schema};

    #[test]
    fn retracted_partition_leaves_no_trace() {
        let schema = two_level_schema();
        let mut builder = QueryResultBuilder::new();

        let mut pw = builder.add_partition("gone");
        let mut rw = pw.add_row(&ck(&schema, 1, "a"));
        rw.add_empty();
        rw.finish();
        pw.retract();
        assert!(builder.partitions().is_empty());

        let mut pw = builder.add_partition("kept");
        let mut rw = pw.add_static_row();
        rw.add(&AtomicCell::live(Timestamp::new(1), "s"));
        rw.finish();
        let mut rw = pw.add_row(&ck(&schema, 1, "a"));
        rw.add_collection(Bytes::from_static(b"c"));
        rw.finish();
        pw.finish();

        let result = builder.build();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].key, Bytes::from_static(b"kept"));
        let static_row = result[0].static_row.as_ref().expect("static row");
        assert!(matches!(static_row.cells[0], ResultCell::Atomic { .. }));
        assert_eq!(result[0].rows[0].cells, vec![ResultCell::Collection(Bytes::from_static(b"c"))]);
    }
}
