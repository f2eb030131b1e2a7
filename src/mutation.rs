//! A partition paired with its schema and partition key.

use std::fmt;

use bytes::Bytes;

use crate::{
    cell::CellOrCollection,
    error::{PartitionError, Result},
    key::{ClusteringKey, ClusteringPrefix},
    mvcc::GcTime,
    partition::MutationPartition,
    query::{PartitionSlice, QueryResultBuilder},
    schema::{ColumnDefinition, ColumnId, ColumnKind, Schema, SchemaRef},
};

fn checked_column<'s>(
    schema: &'s Schema,
    kind: ColumnKind,
    id: ColumnId,
    value: &CellOrCollection,
) -> Result<&'s ColumnDefinition> {
    let def = schema.column_at(kind, id)?;
    if def.is_atomic() != matches!(value, CellOrCollection::Atomic(_)) {
        return Err(PartitionError::ColumnTypeMismatch { kind, id });
    }
    Ok(def)
}

/// Writes and reads against one partition of one table.
#[derive(Clone)]
pub struct Mutation {
    schema: SchemaRef,
    key: Bytes,
    partition: MutationPartition,
}

impl fmt::Debug for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutation")
            .field("key", &self.key)
            .field("partition", &self.partition)
            .finish()
    }
}

impl Mutation {
    /// An empty mutation for partition `key`.
    pub fn new(schema: SchemaRef, key: impl Into<Bytes>) -> Self {
        Self {
            schema,
            key: key.into(),
            partition: MutationPartition::new(),
        }
    }

    /// Table schema.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Partition key.
    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// The partition.
    pub fn partition(&self) -> &MutationPartition {
        &self.partition
    }

    /// The partition, mutably.
    pub fn partition_mut(&mut self) -> &mut MutationPartition {
        &mut self.partition
    }

    /// Take the partition.
    pub fn into_partition(self) -> MutationPartition {
        self.partition
    }

    /// Write a static cell.
    pub fn set_static_cell(&mut self, id: ColumnId, value: impl Into<CellOrCollection>) -> Result<()> {
        let value = value.into();
        let def = checked_column(&self.schema, ColumnKind::Static, id, &value)?;
        self.partition.static_row_mut().apply(def, value);
        Ok(())
    }

    /// Write a cell of the clustering row under `key`.
    pub fn set_clustered_cell(
        &mut self,
        key: ClusteringKey,
        id: ColumnId,
        value: impl Into<CellOrCollection>,
    ) -> Result<()> {
        let value = value.into();
        let def = checked_column(&self.schema, ColumnKind::Regular, id, &value)?;
        self.partition
            .clustered_row(&self.schema, key)
            .cells_mut()
            .apply(def, value);
        Ok(())
    }

    /// Write a static cell or a clustering cell, depending on `kind`. For a
    /// regular column `prefix` must be a full clustering key.
    pub fn set_cell(
        &mut self,
        prefix: ClusteringPrefix,
        kind: ColumnKind,
        id: ColumnId,
        value: impl Into<CellOrCollection>,
    ) -> Result<()> {
        match kind {
            ColumnKind::Static => self.set_static_cell(id, value),
            ColumnKind::Regular => {
                let key = ClusteringKey::from_prefix(&self.schema, prefix)?;
                self.set_clustered_cell(key, id, value)
            }
        }
    }

    /// Merge another mutation of the same partition in.
    ///
    /// # Panics
    ///
    /// When `other` belongs to a different partition key.
    pub fn apply(&mut self, other: Mutation) {
        assert_eq!(self.key, other.key, "merging mutations of different partitions");
        self.partition.apply_owned(&self.schema, other.partition);
    }

    /// Query the partition into `out`. Returns the number of clustering
    /// rows emitted.
    pub fn query(
        &self,
        out: &mut QueryResultBuilder,
        slice: &PartitionSlice,
        now: GcTime,
        row_limit: usize,
    ) -> usize {
        self.partition.query(
            out.add_partition(self.key.clone()),
            &self.schema,
            slice,
            now,
            row_limit,
        )
    }
}
