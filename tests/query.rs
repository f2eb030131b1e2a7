mod common;

use std::ops::Bound;

use bytes::Bytes;
use common::*;
use partition_core::{
    AtomicCell, ClusteringRange, GcTime, Mutation, PartitionSlice, QueryResultBuilder, Ttl,
};

fn populated(rows: i64) -> Mutation {
    let schema = schema();
    let mut m = Mutation::new(schema.clone(), "pk");
    for seq in 0..rows {
        m.set_clustered_cell(key(&schema, 1, seq), R0, live(10, "v"))
            .expect("cell");
    }
    m
}

fn regular_slice() -> PartitionSlice {
    PartitionSlice::full().with_regular_columns(vec![R0])
}

#[test]
fn limit_bounds_emitted_rows() {
    let m = populated(5);
    let now = secs(1_000);

    let mut out = QueryResultBuilder::new();
    assert_eq!(m.query(&mut out, &regular_slice(), now, 3), 3);
    assert_eq!(out.row_count(), 3);

    let mut recorder = Recorder::default();
    let emitted = m
        .partition()
        .query(&mut recorder, m.schema(), &regular_slice(), now, 1);
    assert_eq!(emitted, 1);
    assert_eq!(recorder.rows(), 1);
    assert!(recorder.finished());
}

#[test]
fn rows_come_out_in_clustering_order() {
    let m = populated(3);
    let schema = m.schema().clone();
    let mut out = QueryResultBuilder::new();
    m.query(&mut out, &regular_slice(), secs(1_000), usize::MAX);
    let keys: Vec<_> = out.partitions()[0]
        .rows
        .iter()
        .map(|r| r.key.clone().expect("key"))
        .collect();
    // `seq` sorts descending.
    assert_eq!(
        keys,
        vec![key(&schema, 1, 2), key(&schema, 1, 1), key(&schema, 1, 0)]
    );

    let mut out = QueryResultBuilder::new();
    m.query(&mut out, &regular_slice().reversed(true), secs(1_000), 2);
    let keys: Vec<_> = out.partitions()[0]
        .rows
        .iter()
        .map(|r| r.key.clone().expect("key"))
        .collect();
    assert_eq!(keys, vec![key(&schema, 1, 0), key(&schema, 1, 1)]);
}

#[test]
fn partition_without_live_data_is_retracted() {
    let schema = schema();
    let now = secs(1_000);
    let mut m = Mutation::new(schema.clone(), "pk");
    m.set_static_cell(S0, dead(5, 900)).expect("static");
    m.set_clustered_cell(key(&schema, 1, 1), R0, live(5, "x"))
        .expect("cell");
    m.partition_mut()
        .apply_row_tombstone(&schema, [1i64].into_iter().collect(), tomb(6, 900));

    let slice = regular_slice().with_static_columns(vec![S0]);
    let mut recorder = Recorder::default();
    assert_eq!(m.partition().query(&mut recorder, &schema, &slice, now, 10), 0);
    assert!(recorder.retracted());
    assert!(!recorder.events.contains(&Event::Finish));

    let mut out = QueryResultBuilder::new();
    m.query(&mut out, &slice, now, 10);
    assert!(out.build().is_empty());
}

#[test]
fn live_static_row_alone_finishes_the_partition() {
    let schema = schema();
    let mut m = Mutation::new(schema.clone(), "pk");
    m.set_static_cell(S0, live(5, "owner")).expect("static");

    let slice = regular_slice().with_static_columns(vec![S0]);
    let mut recorder = Recorder::default();
    assert_eq!(
        m.partition()
            .query(&mut recorder, &schema, &slice, secs(1_000), 10),
        0
    );
    assert_eq!(
        recorder.events,
        vec![
            Event::StaticRow(vec![Some(Bytes::from_static(b"owner"))]),
            Event::Finish
        ]
    );
}

#[test]
fn expired_cells_are_filtered() {
    let schema = schema();
    let t0 = 1_000;
    let ttl = 60;
    let mut m = Mutation::new(schema.clone(), "pk");
    m.set_clustered_cell(
        key(&schema, 1, 1),
        R0,
        AtomicCell::live_with_ttl(ts(1), "short-lived", secs(t0), Ttl::from_secs(ttl)),
    )
    .expect("cell");

    let mut before = Recorder::default();
    m.partition()
        .query(&mut before, &schema, &regular_slice(), secs(t0 + ttl - 1), 10);
    assert_eq!(before.rows(), 1);

    let mut after = Recorder::default();
    m.partition()
        .query(&mut after, &schema, &regular_slice(), GcTime::from_secs(t0 + ttl + 1), 10);
    assert_eq!(after.rows(), 0);
    assert!(after.retracted());
}

#[test]
fn unselected_or_dead_columns_are_written_empty() {
    let schema = schema();
    let k = key(&schema, 1, 1);
    let mut m = Mutation::new(schema.clone(), "pk");
    m.partition_mut().apply_insert(&schema, k.clone(), ts(1));
    m.set_clustered_cell(k.clone(), R1, dead(2, 900)).expect("cell");

    let slice = PartitionSlice::full().with_regular_columns(vec![R1, R0]);
    let mut recorder = Recorder::default();
    m.partition()
        .query(&mut recorder, &schema, &slice, secs(1_000), 10);
    assert_eq!(
        recorder.events,
        vec![Event::Row(k, vec![None, None]), Event::Finish]
    );
}

#[test]
fn ranges_select_rows_and_share_the_limit() {
    let m = populated(6);
    let schema = m.schema().clone();
    let slice = regular_slice().with_ranges(vec![
        ClusteringRange::singular(key(&schema, 1, 5)),
        ClusteringRange::new(
            Bound::Included(key(&schema, 1, 3).into()),
            Bound::Excluded(key(&schema, 1, 0).into()),
        ),
    ]);

    let mut out = QueryResultBuilder::new();
    assert_eq!(m.query(&mut out, &slice, secs(1_000), 10), 4);
    let mut out = QueryResultBuilder::new();
    assert_eq!(m.query(&mut out, &slice, secs(1_000), 2), 2);
    let rows = &out.partitions()[0].rows;
    assert_eq!(rows[0].key, Some(key(&schema, 1, 5)));
    assert_eq!(rows[1].key, Some(key(&schema, 1, 3)));
}

#[test]
#[should_panic(expected = "row_limit must be positive")]
fn zero_limit_is_a_contract_violation() {
    let m = populated(1);
    let mut out = QueryResultBuilder::new();
    m.query(&mut out, &regular_slice(), secs(1_000), 0);
}
