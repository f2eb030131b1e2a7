//! Serialized partition views.
//!
//! A [`PartitionView`] is the byte form of a [`MutationPartition`]. Readers
//! never materialise it directly; [`PartitionView::accept`] replays its
//! contents as events to a [`MutationPartitionVisitor`].
//!
//! Layout (big-endian):
//!
//! ```text
//! u8 version
//! tombstone                          partition tombstone
//! u32 n, n * (u32 id, value)         static cells
//! u32 n, n * (prefix, tombstone)     range tombstones
//! u32 n, n * row                     clustering rows
//! row = prefix key, tombstone, marker, u32 n, n * (u32 id, value)
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    cell::CellOrCollection,
    error::{CodecError, PartitionError, Result, SchemaError},
    key::{ClusteringKey, ClusteringPrefix},
    marker::RowMarker,
    observability::log_warn,
    partition::MutationPartition,
    row::Row,
    schema::{ColumnId, ColumnKind, Schema},
    serdes::{decode_seq, Decode, Encode},
    tombstone::Tombstone,
};

/// Current view format version.
pub const VIEW_VERSION: u8 = 1;

/// Receives the contents of a partition view, in storage order.
///
/// Row cells always follow the [`accept_row`](Self::accept_row) call of the
/// row they belong to.
pub trait MutationPartitionVisitor {
    /// The partition-level tombstone.
    fn accept_partition_tombstone(&mut self, tomb: Tombstone);

    /// One static cell.
    fn accept_static_cell(&mut self, id: ColumnId, value: CellOrCollection);

    /// One range tombstone.
    fn accept_row_tombstone(&mut self, prefix: ClusteringPrefix, tomb: Tombstone);

    /// Start of a clustering row.
    fn accept_row(&mut self, key: ClusteringKey, deleted_at: Tombstone, marker: RowMarker);

    /// One cell of the most recently accepted row.
    fn accept_row_cell(&mut self, id: ColumnId, value: CellOrCollection);
}

/// Byte form of a partition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionView {
    bytes: Bytes,
}

impl PartitionView {
    /// Serialize `partition`.
    pub fn encode(partition: &MutationPartition) -> Self {
        let mut buf = BytesMut::new();
        buf.put_u8(VIEW_VERSION);
        partition.partition_tombstone().encode(&mut buf);
        encode_row(partition.static_row(), &mut buf);

        buf.put_u32(partition.row_tombstones().len() as u32);
        for entry in partition.row_tombstones() {
            entry.prefix().encode(&mut buf);
            entry.tomb().encode(&mut buf);
        }

        buf.put_u32(partition.clustered_rows().len() as u32);
        for entry in partition.clustered_rows() {
            let row = entry.row();
            entry.key().as_prefix().encode(&mut buf);
            row.deleted_at().encode(&mut buf);
            row.marker().encode(&mut buf);
            encode_row(row.cells(), &mut buf);
        }
        Self { bytes: buf.freeze() }
    }

    /// Wrap bytes produced by [`PartitionView::encode`].
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The encoded bytes.
    pub fn as_bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the view holds no bytes at all (never true for an encoded view).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decode the view, check it against `schema` and replay it to
    /// `visitor`. Nothing is replayed unless the whole view is valid.
    pub fn accept<V: MutationPartitionVisitor>(&self, schema: &Schema, visitor: &mut V) -> Result<()> {
        let decoded = match DecodedPartition::decode(schema, &self.bytes) {
            Ok(decoded) => decoded,
            Err(err) => {
                log_warn!(
                    component = "view",
                    event = "view_rejected",
                    bytes = self.bytes.len(),
                    error = %err,
                );
                return Err(err);
            }
        };
        decoded.replay(visitor);
        Ok(())
    }
}

fn encode_row<B: BufMut>(row: &Row, buf: &mut B) {
    buf.put_u32(row.size() as u32);
    for (id, value) in row.iter() {
        id.encode(buf);
        value.encode(buf);
    }
}

struct DecodedRow {
    key: ClusteringKey,
    deleted_at: Tombstone,
    marker: RowMarker,
    cells: Vec<(ColumnId, CellOrCollection)>,
}

struct DecodedPartition {
    tomb: Tombstone,
    static_cells: Vec<(ColumnId, CellOrCollection)>,
    row_tombstones: Vec<(ClusteringPrefix, Tombstone)>,
    rows: Vec<DecodedRow>,
}

impl DecodedPartition {
    fn decode(schema: &Schema, mut buf: &[u8]) -> Result<Self> {
        let version = u8::decode(&mut buf)?;
        if version != VIEW_VERSION {
            return Err(CodecError::UnsupportedVersion(version).into());
        }
        let tomb = Tombstone::decode(&mut buf)?;
        let static_cells = decode_cells(schema, ColumnKind::Static, &mut buf)?;

        let row_tombstones: Vec<(ClusteringPrefix, Tombstone)> = decode_seq(&mut buf)?;
        for (prefix, _) in &row_tombstones {
            if prefix.len() >= schema.clustering_key_size() {
                return Err(CodecError::from(SchemaError::PrefixTooLong {
                    max: schema.clustering_key_size().saturating_sub(1),
                    got: prefix.len(),
                })
                .into());
            }
        }

        let count = u32::decode(&mut buf)? as usize;
        let mut rows = Vec::with_capacity(count.min(buf.remaining()));
        for _ in 0..count {
            let prefix = ClusteringPrefix::decode(&mut buf)?;
            let key = ClusteringKey::from_prefix(schema, prefix).map_err(CodecError::from)?;
            let deleted_at = Tombstone::decode(&mut buf)?;
            let marker = RowMarker::decode(&mut buf)?;
            let cells = decode_cells(schema, ColumnKind::Regular, &mut buf)?;
            rows.push(DecodedRow {
                key,
                deleted_at,
                marker,
                cells,
            });
        }

        if buf.has_remaining() {
            return Err(CodecError::TrailingBytes(buf.remaining()).into());
        }
        Ok(Self {
            tomb,
            static_cells,
            row_tombstones,
            rows,
        })
    }

    fn replay<V: MutationPartitionVisitor>(self, visitor: &mut V) {
        visitor.accept_partition_tombstone(self.tomb);
        for (id, value) in self.static_cells {
            visitor.accept_static_cell(id, value);
        }
        for (prefix, tomb) in self.row_tombstones {
            visitor.accept_row_tombstone(prefix, tomb);
        }
        for row in self.rows {
            visitor.accept_row(row.key, row.deleted_at, row.marker);
            for (id, value) in row.cells {
                visitor.accept_row_cell(id, value);
            }
        }
    }
}

fn decode_cells(
    schema: &Schema,
    kind: ColumnKind,
    buf: &mut &[u8],
) -> Result<Vec<(ColumnId, CellOrCollection)>> {
    let cells: Vec<(ColumnId, CellOrCollection)> = decode_seq(buf)?;
    for (id, value) in &cells {
        let def = schema.column_at(kind, *id)?;
        if def.is_atomic() != matches!(value, CellOrCollection::Atomic(_)) {
            return Err(PartitionError::ColumnTypeMismatch { kind, id: *id });
        }
    }
    Ok(cells)
}

/// Visitor merging replayed events into a partition.
pub(crate) struct PartitionApplier<'a> {
    schema: &'a Schema,
    partition: &'a mut MutationPartition,
    current_row: Option<usize>,
    events: usize,
}

impl<'a> PartitionApplier<'a> {
    pub(crate) fn new(schema: &'a Schema, partition: &'a mut MutationPartition) -> Self {
        Self {
            schema,
            partition,
            current_row: None,
            events: 0,
        }
    }

    /// Events replayed so far.
    pub(crate) fn events(&self) -> usize {
        self.events
    }
}

impl MutationPartitionVisitor for PartitionApplier<'_> {
    fn accept_partition_tombstone(&mut self, tomb: Tombstone) {
        self.events += 1;
        self.partition.apply_tombstone(tomb);
    }

    fn accept_static_cell(&mut self, id: ColumnId, value: CellOrCollection) {
        self.events += 1;
        let def = self.schema.column(ColumnKind::Static, id);
        self.partition.static_row_mut().apply(def, value);
    }

    fn accept_row_tombstone(&mut self, prefix: ClusteringPrefix, tomb: Tombstone) {
        self.events += 1;
        self.partition.apply_row_tombstone(self.schema, prefix, tomb);
    }

    fn accept_row(&mut self, key: ClusteringKey, deleted_at: Tombstone, marker: RowMarker) {
        self.events += 1;
        let idx = self.partition.clustered_row_index(self.schema, key);
        let row = self.partition.row_at_mut(idx);
        row.apply_tombstone(deleted_at);
        row.apply_marker(marker);
        self.current_row = Some(idx);
    }

    fn accept_row_cell(&mut self, id: ColumnId, value: CellOrCollection) {
        self.events += 1;
        let Some(idx) = self.current_row else {
            panic!("row cell for column {id} replayed before its row");
        };
        let def = self.schema.column(ColumnKind::Regular, id);
        self.partition.row_at_mut(idx).cells_mut().apply(def, value);
    }
}
