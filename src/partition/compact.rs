use std::mem;

use super::{query::ordered, MutationPartition};
use crate::{
    mvcc::{GcTime, Timestamp},
    observability::log_debug,
    scan::ClusteringRange,
    schema::{ColumnKind, Schema},
    tombstone::Tombstone,
};

impl MutationPartition {
    /// Compact ahead of serving a query: drop rows outside `ranges`, expire
    /// cells and drop dead data. Tombstones are never purged here.
    ///
    /// Returns the number of live rows counted, at most `row_limit`; a
    /// partition with only static data live counts as one row.
    ///
    /// # Panics
    ///
    /// When `row_limit` is zero.
    pub fn compact_for_query(
        &mut self,
        schema: &Schema,
        now: GcTime,
        ranges: &[ClusteringRange],
        reversed: bool,
        row_limit: usize,
    ) -> usize {
        self.do_compact(schema, now, ranges, reversed, row_limit, Timestamp::MISSING)
    }

    /// Compact for storage: expire cells and purge tombstones issued before
    /// the schema's gc grace period and older than `max_purgeable`.
    pub fn compact_for_compaction(&mut self, schema: &Schema, now: GcTime, max_purgeable: Timestamp) {
        self.do_compact(
            schema,
            now,
            &[ClusteringRange::full()],
            false,
            usize::MAX,
            max_purgeable,
        );
    }

    fn do_compact(
        &mut self,
        schema: &Schema,
        now: GcTime,
        ranges: &[ClusteringRange],
        reversed: bool,
        row_limit: usize,
        max_purgeable: Timestamp,
    ) -> usize {
        assert!(row_limit > 0, "compaction row_limit must be positive");
        let gc_before = schema.gc_before(now);

        let static_live = self.static_row.compact_and_expire(
            schema,
            ColumnKind::Static,
            self.tombstone,
            now,
            max_purgeable,
            gc_before,
        );

        // Indices in visiting order; rows in no range stay unvisited and are erased.
        let cmp = schema.comparator();
        let mut visited = vec![false; self.rows.len()];
        let mut order = Vec::new();
        for range in ordered(ranges, reversed) {
            let (lo, hi) = self.range_bounds(cmp, range);
            let indices: Vec<usize> = (lo..hi).collect();
            for &idx in ordered(&indices, reversed) {
                if !mem::replace(&mut visited[idx], true) {
                    order.push(idx);
                }
            }
        }

        let mut keep = vec![false; self.rows.len()];
        let mut live_rows = 0;
        for idx in order {
            let base = self.range_tombstone_for_row(schema, &self.rows[idx].key);
            let row = &mut self.rows[idx].row;
            let tomb = base.max(row.deleted_at());
            let live = row.compact_and_expire(schema, tomb, now, max_purgeable, gc_before);
            if live_rows >= row_limit {
                // Past the limit only tombstones are kept.
                row.drop_live_data();
            } else if live {
                live_rows += 1;
            }
            keep[idx] = !row.is_empty();
        }

        let scanned = self.rows.len();
        self.rows = mem::take(&mut self.rows)
            .into_iter()
            .zip(keep)
            .filter_map(|(entry, keep)| keep.then_some(entry))
            .collect();

        // Range tombstones are filtered against the partition tombstone left
        // after its own purge.
        let partition_tombstone_purged = self.tombstone.is_purgeable(max_purgeable, gc_before);
        if partition_tombstone_purged {
            self.tombstone = Tombstone::NONE;
        }
        let partition_tomb = self.tombstone;
        let before = self.row_tombstones.len();
        self.row_tombstones.retain(|e| {
            !(e.tomb.is_purgeable(max_purgeable, gc_before) || e.tomb <= partition_tomb)
        });

        log_debug!(
            component = "compaction",
            event = "partition_compacted",
            rows_scanned = scanned,
            rows_erased = scanned - self.rows.len(),
            live_rows,
            row_tombstones_purged = before - self.row_tombstones.len(),
            partition_tombstone_purged,
        );

        if live_rows == 0 && static_live {
            1
        } else {
            live_rows
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cell::AtomicCell,
        key::ClusteringPrefix,
        marker::RowMarker,
        mvcc::Ttl,
        option::TableOption,
        schema::{ClusteringOrder, ColumnType},
        test_util::{ck, dead, live, secs, tomb, ts, two_level_schema, R0, R1, S0},
    };

    fn short_grace_schema() -> crate::schema::SchemaRef {
        Schema::builder()
            .clustering_column("ck1", ClusteringOrder::Asc)
            .clustering_column("ck2", ClusteringOrder::Asc)
            .static_column("s0", ColumnType::Atomic)
            .regular_column("r0", ColumnType::Atomic)
            .regular_column("r1", ColumnType::Atomic)
            .option(TableOption::default().gc_grace_seconds(100))
            .build()
            .expect("schema")
    }

    #[test]
    fn compaction_purges_old_dead_cells_below_max_purgeable() {
        let schema = short_grace_schema();
        let key = ck(&schema, 1, "a");
        let mut p = MutationPartition::new();
        let row = p.clustered_row(&schema, key.clone());
        row.cells_mut()
            .apply(schema.column(ColumnKind::Regular, R0), dead(50, 10));
        row.cells_mut()
            .apply(schema.column(ColumnKind::Regular, R1), live(50, "v"));
        let mut retained = p.clone();

        // gc_before = 1000 - 100 = 900 > deletion time 10
        p.compact_for_compaction(&schema, secs(1_000), ts(51));
        let cells = p.find_row(&schema, &key).expect("row");
        assert!(cells.find_cell(R0).is_none());
        assert!(cells.find_cell(R1).is_some());

        retained.compact_for_compaction(&schema, secs(1_000), ts(50));
        let cells = retained.find_row(&schema, &key).expect("row");
        assert_eq!(cells.find_cell(R0), Some(&dead(50, 10)));
    }

    #[test]
    fn compaction_erases_shadowed_rows_and_purges_tombstones() {
        let schema = short_grace_schema();
        let mut p = MutationPartition::new();
        p.apply_tombstone(tomb(10, 5));
        p.apply_row_tombstone(&schema, ClusteringPrefix::new(vec![1.into()]), tomb(8, 5));
        p.apply_row_tombstone(&schema, ClusteringPrefix::new(vec![2.into()]), tomb(20, 950));
        p.apply_insert(&schema, ck(&schema, 1, "a"), ts(7));
        p.apply_insert(&schema, ck(&schema, 2, "a"), ts(30));
        p.apply_delete_key(&schema, ck(&schema, 3, "a"), tomb(40, 10));

        p.compact_for_compaction(&schema, secs(1_000), Timestamp::MAX);

        let keys: Vec<_> = p.clustered_rows().iter().map(|e| e.key().clone()).collect();
        assert_eq!(keys, vec![ck(&schema, 2, "a")]);
        let prefixes: Vec<_> = p.row_tombstones().iter().map(|e| e.prefix().clone()).collect();
        assert_eq!(prefixes, vec![ClusteringPrefix::new(vec![2.into()])]);
        assert_eq!(p.partition_tombstone(), Tombstone::NONE);
    }

    #[test]
    fn query_compaction_keeps_tombstones() {
        let schema = short_grace_schema();
        let mut p = MutationPartition::new();
        p.apply_tombstone(tomb(10, 5));
        p.apply_delete_key(&schema, ck(&schema, 3, "a"), tomb(40, 10));
        p.apply_insert(&schema, ck(&schema, 4, "a"), ts(50));

        let live = p.compact_for_query(&schema, secs(1_000), &[ClusteringRange::full()], false, 10);
        assert_eq!(live, 1);
        assert_eq!(p.partition_tombstone(), tomb(10, 5));
        assert_eq!(p.clustered_rows().len(), 2);
    }

    #[test]
    fn rows_outside_ranges_are_trimmed() {
        let schema = two_level_schema();
        let mut p = MutationPartition::new();
        for a in 0..5 {
            p.apply_insert(&schema, ck(&schema, a, "x"), ts(1));
        }
        let range = ClusteringRange::singular(ClusteringPrefix::new(vec![2.into()]));
        let live = p.compact_for_query(&schema, secs(0), &[range], false, 10);
        assert_eq!(live, 1);
        assert_eq!(p.clustered_rows().len(), 1);
        assert_eq!(p.clustered_rows()[0].key(), &ck(&schema, 2, "x"));
    }

    #[test]
    fn rows_past_limit_keep_only_their_tombstones() {
        let schema = two_level_schema();
        let mut p = MutationPartition::new();
        for a in 0..4 {
            p.apply_insert(&schema, ck(&schema, a, "x"), ts(5));
        }
        p.apply_delete_key(&schema, ck(&schema, 3, "x"), tomb(2, 0));

        let live = p.compact_for_query(&schema, secs(0), &[ClusteringRange::full()], true, 2);
        assert_eq!(live, 2);
        let keys: Vec<_> = p.clustered_rows().iter().map(|e| e.key().clone()).collect();
        // reversed: rows 3 and 2 are counted, row 1 and 0 are past the limit
        // and carry no tombstone, so they are erased
        assert_eq!(keys, vec![ck(&schema, 2, "x"), ck(&schema, 3, "x")]);
        assert_eq!(
            p.find_entry(&schema, &ck(&schema, 3, "x")).map(|e| e.row().deleted_at()),
            Some(tomb(2, 0))
        );
    }

    #[test]
    fn trailing_row_tombstones_survive_the_limit() {
        let schema = two_level_schema();
        let mut p = MutationPartition::new();
        p.apply_insert(&schema, ck(&schema, 0, "x"), ts(5));
        p.apply_insert(&schema, ck(&schema, 1, "x"), ts(5));
        p.apply_delete_key(&schema, ck(&schema, 1, "x"), tomb(3, 0));

        p.compact_for_query(&schema, secs(0), &[ClusteringRange::full()], false, 1);
        let row = p.find_entry(&schema, &ck(&schema, 1, "x")).expect("row").row();
        assert_eq!(row.marker(), RowMarker::Missing);
        assert_eq!(row.deleted_at(), tomb(3, 0));
    }

    #[test]
    fn expired_data_becomes_tombstones() {
        let schema = two_level_schema();
        let key = ck(&schema, 0, "x");
        let mut p = MutationPartition::new();
        p.clustered_row(&schema, key.clone())
            .apply_marker(RowMarker::with_ttl(ts(5), secs(100), Ttl::from_secs(10)));
        p.clustered_row(&schema, key.clone()).cells_mut().apply(
            schema.column(ColumnKind::Regular, R0),
            AtomicCell::live_with_ttl(ts(5), "v", secs(100), Ttl::from_secs(10)),
        );
        p.static_row_mut()
            .apply(schema.column(ColumnKind::Static, S0), live(1, "s"));

        let live_rows = p.compact_for_query(&schema, secs(200), &[ClusteringRange::full()], false, 5);
        assert_eq!(live_rows, 1, "static row counts when no clustering row is live");
        let row = p.find_entry(&schema, &key).expect("row").row();
        assert_eq!(row.marker(), RowMarker::dead(ts(5), secs(100)));
        assert_eq!(row.cells().find_cell(R0), Some(&dead(5, 100)));
    }
}
