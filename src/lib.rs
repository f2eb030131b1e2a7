#![deny(missing_docs)]
//! In-memory partition model for a column-family store.
//!
//! A [`MutationPartition`] holds one partition's rows, range tombstones,
//! partition tombstone and static row. Partitions merge under
//! timestamp-based reconciliation, answer row-limited queries through a
//! [`PartitionWriter`], and compact away expired and purgeable data.
//! Everything here is synchronous and single-owner; callers serialize
//! writers themselves.

mod observability;

#[cfg(test)]
mod test_util;

/// Error types and the crate result alias.
pub mod error;

/// Time primitives shared across modules.
pub mod mvcc;

/// Deletion markers.
pub mod tombstone;

/// Atomic and collection cells.
pub mod cell;

/// Row markers.
pub mod marker;

/// Clustering keys, prefixes and their comparator.
pub mod key;

/// Per-table options.
pub mod option;

/// Table schema and column definitions.
pub mod schema;

/// Byte codec shared by views and collections.
mod serdes;

/// Clustering ranges.
pub mod scan;

/// Rows and deletable rows.
pub mod row;

/// The mutation partition.
pub mod partition;

/// Query slice and writer contract.
pub mod query;

/// Serialized partition views.
pub mod view;

/// Partition plus schema and partition key.
pub mod mutation;

pub use crate::{
    cell::{AtomicCell, CellOrCollection, CollectionKind, CollectionMutation, CollectionType},
    error::{CodecError, PartitionError, Result, SchemaError},
    key::{ClusteringKey, ClusteringPrefix, ClusteringValue},
    marker::RowMarker,
    mutation::Mutation,
    mvcc::{GcTime, Timestamp, Ttl},
    option::TableOption,
    partition::MutationPartition,
    query::{PartitionSlice, PartitionWriter, QueryResultBuilder, RowWriter},
    row::{DeletableRow, Row},
    scan::ClusteringRange,
    schema::{ClusteringOrder, ColumnKind, ColumnType, Schema, SchemaRef},
    tombstone::Tombstone,
    view::{MutationPartitionVisitor, PartitionView},
};
