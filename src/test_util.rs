//! Test-only helpers for building schemas, keys and cells.

use bytes::Bytes;

use crate::{
    cell::{AtomicCell, CellOrCollection, CollectionKind, CollectionMutation},
    key::ClusteringKey,
    mvcc::{GcTime, Timestamp},
    schema::{ClusteringOrder, ColumnType, Schema, SchemaRef},
    tombstone::Tombstone,
};

/// Regular column ids of [`two_level_schema`].
pub(crate) const R0: u32 = 0;
pub(crate) const R1: u32 = 1;
pub(crate) const TAGS: u32 = 2;
/// Static column id of [`two_level_schema`].
pub(crate) const S0: u32 = 0;

/// Clustering `(ck1 int asc, ck2 text asc)`, one static column and two
/// atomic regular columns followed by a set column.
pub(crate) fn two_level_schema() -> SchemaRef {
    Schema::builder()
        .clustering_column("ck1", ClusteringOrder::Asc)
        .clustering_column("ck2", ClusteringOrder::Asc)
        .static_column("s0", ColumnType::Atomic)
        .regular_column("r0", ColumnType::Atomic)
        .regular_column("r1", ColumnType::Atomic)
        .regular_column("tags", ColumnType::collection(CollectionKind::Set))
        .build()
        .expect("schema")
}

pub(crate) fn ck(schema: &Schema, a: i64, b: &str) -> ClusteringKey {
    ClusteringKey::new(schema, vec![a.into(), b.into()]).expect("key")
}

pub(crate) fn ts(v: i64) -> Timestamp {
    Timestamp::new(v)
}

pub(crate) fn secs(v: u32) -> GcTime {
    GcTime::from_secs(v)
}

pub(crate) fn tomb(t: i64, d: u32) -> Tombstone {
    Tombstone::new(ts(t), secs(d))
}

pub(crate) fn live(t: i64, value: &'static str) -> CellOrCollection {
    AtomicCell::live(ts(t), Bytes::from_static(value.as_bytes())).into()
}

pub(crate) fn dead(t: i64, d: u32) -> CellOrCollection {
    AtomicCell::dead(ts(t), secs(d)).into()
}

pub(crate) fn set_of(t: i64, members: &[&'static str]) -> CellOrCollection {
    members
        .iter()
        .fold(CollectionMutation::default(), |m, member| {
            m.with_cell(
                Bytes::from_static(member.as_bytes()),
                AtomicCell::live(ts(t), Bytes::new()),
            )
        })
        .into()
}
