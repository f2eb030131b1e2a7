//! Shared fixtures for the integration tests: a two-column clustering schema,
//! a seeded random partition generator and a writer that records calls.

#![allow(dead_code)]

use bytes::Bytes;
use partition_core::{
    AtomicCell, ClusteringKey, ClusteringOrder, ClusteringPrefix, CollectionKind,
    CollectionMutation, ColumnType, GcTime, Mutation, MutationPartition, PartitionWriter,
    RowMarker, RowWriter, Schema, SchemaRef, TableOption, Timestamp, Tombstone, Ttl,
};

pub const S0: u32 = 0;
pub const R0: u32 = 0;
pub const R1: u32 = 1;
pub const TAGS: u32 = 2;

/// `(bucket int asc, seq int desc)`, one static column, two atomic regular
/// columns and a set.
pub fn schema_with_grace(gc_grace_seconds: u32) -> SchemaRef {
    Schema::builder()
        .clustering_column("bucket", ClusteringOrder::Asc)
        .clustering_column("seq", ClusteringOrder::Desc)
        .static_column("owner", ColumnType::Atomic)
        .regular_column("r0", ColumnType::Atomic)
        .regular_column("r1", ColumnType::Atomic)
        .regular_column("tags", ColumnType::collection(CollectionKind::Set))
        .option(TableOption::default().gc_grace_seconds(gc_grace_seconds))
        .build()
        .expect("schema")
}

pub fn schema() -> SchemaRef {
    schema_with_grace(100)
}

pub fn key(schema: &Schema, bucket: i64, seq: i64) -> ClusteringKey {
    ClusteringKey::new(schema, vec![bucket.into(), seq.into()]).expect("key")
}

pub fn ts(v: i64) -> Timestamp {
    Timestamp::new(v)
}

pub fn secs(v: u32) -> GcTime {
    GcTime::from_secs(v)
}

pub fn tomb(t: i64, d: u32) -> Tombstone {
    Tombstone::new(ts(t), secs(d))
}

pub fn live(t: i64, value: &'static str) -> AtomicCell {
    AtomicCell::live(ts(t), Bytes::from_static(value.as_bytes()))
}

pub fn dead(t: i64, d: u32) -> AtomicCell {
    AtomicCell::dead(ts(t), secs(d))
}

const VALUES: [&str; 3] = ["a", "b", "c"];

fn random_ts(rng: &mut fastrand::Rng) -> i64 {
    rng.i64(1..=6)
}

fn random_secs(rng: &mut fastrand::Rng) -> u32 {
    rng.u32(10..=14)
}

/// Few distinct expiries and ttls, so equal expiries with different ttls meet.
fn random_expiry(rng: &mut fastrand::Rng) -> GcTime {
    secs(rng.u32(13..=15))
}

fn random_ttl(rng: &mut fastrand::Rng) -> Ttl {
    Ttl::from_secs(rng.u32(1..=3))
}

fn random_tomb(rng: &mut fastrand::Rng) -> Tombstone {
    tomb(random_ts(rng), random_secs(rng))
}

fn random_cell(rng: &mut fastrand::Rng) -> AtomicCell {
    let t = random_ts(rng);
    match rng.u8(0..4) {
        0 => dead(t, random_secs(rng)),
        1 => AtomicCell::live_expiring(
            ts(t),
            Bytes::from_static(VALUES[rng.usize(..VALUES.len())].as_bytes()),
            random_expiry(rng),
            random_ttl(rng),
        ),
        _ => live(t, VALUES[rng.usize(..VALUES.len())]),
    }
}

fn random_set(rng: &mut fastrand::Rng) -> CollectionMutation {
    let mut set = if rng.bool() {
        CollectionMutation::deleted(random_tomb(rng))
    } else {
        CollectionMutation::default()
    };
    for member in VALUES {
        if rng.bool() {
            set.insert(Bytes::from_static(member.as_bytes()), random_cell(rng));
        }
    }
    set
}

fn random_marker(rng: &mut fastrand::Rng) -> RowMarker {
    let t = ts(random_ts(rng));
    match rng.u8(0..4) {
        0 => RowMarker::Missing,
        1 => RowMarker::live(t),
        2 => RowMarker::expiring(t, random_expiry(rng), random_ttl(rng)),
        _ => RowMarker::dead(t, secs(random_secs(rng))),
    }
}

/// A partition with a handful of rows drawn from a small key space, so two
/// partitions from nearby seeds overlap on keys and timestamps.
pub fn random_partition(schema: &SchemaRef, seed: u64) -> MutationPartition {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut m = Mutation::new(schema.clone(), "pk");

    if rng.u8(0..4) == 0 {
        m.partition_mut().apply_tombstone(random_tomb(&mut rng));
    }
    if rng.bool() {
        m.set_static_cell(S0, random_cell(&mut rng)).expect("static cell");
    }
    for _ in 0..rng.usize(0..3) {
        let prefix: ClusteringPrefix = if rng.u8(0..4) == 0 {
            ClusteringPrefix::empty()
        } else {
            [rng.i64(0..3)].into_iter().collect()
        };
        m.partition_mut()
            .apply_row_tombstone(schema, prefix, random_tomb(&mut rng));
    }
    for _ in 0..rng.usize(0..8) {
        let k = key(schema, rng.i64(0..3), rng.i64(0..3));
        let marker = random_marker(&mut rng);
        if !marker.is_missing() {
            m.partition_mut()
                .clustered_row(schema, k.clone())
                .apply_marker(marker);
        }
        if rng.u8(0..4) == 0 {
            m.partition_mut()
                .apply_delete_key(schema, k.clone(), random_tomb(&mut rng));
        }
        for id in [R0, R1] {
            if rng.bool() {
                m.set_clustered_cell(k.clone(), id, random_cell(&mut rng))
                    .expect("regular cell");
            }
        }
        if rng.bool() {
            m.set_clustered_cell(k, TAGS, random_set(&mut rng))
                .expect("set cell");
        }
    }
    m.into_partition()
}

/// What a [`Recorder`] saw, in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    StaticRow(Vec<Option<Bytes>>),
    Row(ClusteringKey, Vec<Option<Bytes>>),
    Finish,
    Retract,
}

/// Writer that logs every call; collections are recorded by their
/// serialized form.
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<Event>,
}

pub struct RecordingRow<'a> {
    target: &'a mut Vec<Event>,
    key: Option<ClusteringKey>,
    cells: Vec<Option<Bytes>>,
}

impl RowWriter for RecordingRow<'_> {
    fn add(&mut self, cell: &AtomicCell) {
        self.cells.push(cell.value().cloned());
    }

    fn add_collection(&mut self, serialized: Bytes) {
        self.cells.push(Some(serialized));
    }

    fn add_empty(&mut self) {
        self.cells.push(None);
    }

    fn finish(self) {
        let event = match self.key {
            Some(key) => Event::Row(key, self.cells),
            None => Event::StaticRow(self.cells),
        };
        self.target.push(event);
    }
}

impl PartitionWriter for &mut Recorder {
    type RowWriter<'a> = RecordingRow<'a> where Self: 'a;

    fn add_static_row(&mut self) -> Self::RowWriter<'_> {
        RecordingRow {
            target: &mut self.events,
            key: None,
            cells: Vec::new(),
        }
    }

    fn add_row(&mut self, key: &ClusteringKey) -> Self::RowWriter<'_> {
        RecordingRow {
            target: &mut self.events,
            key: Some(key.clone()),
            cells: Vec::new(),
        }
    }

    fn finish(self) {
        self.events.push(Event::Finish);
    }

    fn retract(self) {
        self.events.push(Event::Retract);
    }
}

impl Recorder {
    pub fn rows(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Row(..)))
            .count()
    }

    pub fn retracted(&self) -> bool {
        self.events.last() == Some(&Event::Retract)
    }

    pub fn finished(&self) -> bool {
        self.events.last() == Some(&Event::Finish)
    }
}
