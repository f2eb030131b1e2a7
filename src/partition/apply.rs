use std::{cmp::Ordering, mem};

use super::{key_order, MutationPartition, RowTombstonesEntry, RowsEntry};
use crate::{
    error::Result,
    observability::log_debug,
    schema::{ColumnKind, Schema},
    view::{PartitionApplier, PartitionView},
};

/// Merge the sorted `theirs` into the sorted `mine`. Entries comparing
/// equal are combined with `collide`; entries only in `theirs` are turned
/// into ours with `adopt`.
fn merge_sorted<T, U>(
    mine: Vec<T>,
    theirs: impl IntoIterator<Item = U>,
    mut compare: impl FnMut(&T, &U) -> Ordering,
    mut collide: impl FnMut(&mut T, U),
    mut adopt: impl FnMut(U) -> T,
) -> Vec<T> {
    let mut theirs = theirs.into_iter().peekable();
    if theirs.peek().is_none() {
        return mine;
    }
    let mut out = Vec::with_capacity(mine.len() + theirs.size_hint().0);
    let mut mine = mine.into_iter().peekable();
    loop {
        let ord = match (mine.peek(), theirs.peek()) {
            (Some(m), Some(t)) => compare(m, t),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match ord {
            Ordering::Less => out.extend(mine.next()),
            Ordering::Greater => out.extend(theirs.next().map(&mut adopt)),
            Ordering::Equal => {
                if let (Some(mut m), Some(t)) = (mine.next(), theirs.next()) {
                    collide(&mut m, t);
                    out.push(m);
                }
            }
        }
    }
    out
}

impl MutationPartition {
    /// Merge `other` into this partition, copying what is inserted.
    ///
    /// Every step keeps the maximum under the reconciliation order, so the
    /// merge is commutative and applying the same partition twice changes
    /// nothing.
    pub fn apply(&mut self, schema: &Schema, other: &MutationPartition) {
        let cmp = schema.comparator();
        self.tombstone.apply(other.tombstone);
        self.row_tombstones = merge_sorted(
            mem::take(&mut self.row_tombstones),
            &other.row_tombstones,
            |m, t| cmp.compare(m.prefix.components(), t.prefix.components()),
            |m, t| m.tomb.apply(t.tomb),
            RowTombstonesEntry::clone,
        );
        self.static_row
            .merge(schema, ColumnKind::Static, &other.static_row);
        self.rows = merge_sorted(
            mem::take(&mut self.rows),
            &other.rows,
            |m, t| key_order(cmp, &m.key, &t.key),
            |m, t| m.row.merge(schema, &t.row),
            RowsEntry::clone,
        );
    }

    /// Merge `other` into this partition, consuming it. Entries missing here
    /// are moved over as they are; colliding entries are merged cell by cell.
    pub fn apply_owned(&mut self, schema: &Schema, other: MutationPartition) {
        if self.is_empty() {
            *self = other;
            return;
        }
        let cmp = schema.comparator();
        let MutationPartition {
            tombstone,
            static_row,
            rows,
            row_tombstones,
        } = other;
        self.tombstone.apply(tombstone);
        self.row_tombstones = merge_sorted(
            mem::take(&mut self.row_tombstones),
            row_tombstones,
            |m, t| cmp.compare(m.prefix.components(), t.prefix.components()),
            |m, t| m.tomb.apply(t.tomb),
            |t| t,
        );
        self.static_row
            .merge_owned(schema, ColumnKind::Static, static_row);
        self.rows = merge_sorted(
            mem::take(&mut self.rows),
            rows,
            |m, t| key_order(cmp, &m.key, &t.key),
            |m, t| m.row.merge_owned(schema, t.row),
            |t| t,
        );
    }

    /// Merge a serialized partition view in.
    ///
    /// The view is decoded and checked against `schema` before anything is
    /// applied; on error the partition is left unchanged.
    pub fn apply_view(&mut self, schema: &Schema, view: &PartitionView) -> Result<()> {
        let mut applier = PartitionApplier::new(schema, self);
        view.accept(schema, &mut applier)?;
        let events = applier.events();
        log_debug!(
            component = "view",
            event = "view_applied",
            events,
            bytes = view.len(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        key::ClusteringPrefix,
        marker::RowMarker,
        test_util::{ck, live, set_of, tomb, ts, two_level_schema, R0, R1, S0, TAGS},
    };

    #[test]
    fn merge_sorted_interleaves_and_collides() {
        let merged = merge_sorted(
            vec![1, 3, 5],
            vec![2, 3, 6],
            |a: &i32, b: &i32| a.cmp(b),
            |a, b| *a += b,
            |b| b,
        );
        assert_eq!(merged, vec![1, 2, 6, 5, 6]);
        assert_eq!(
            merge_sorted(vec![1], Vec::<i32>::new(), |a: &i32, b| a.cmp(b), |_, _| {}, |b| b),
            vec![1]
        );
    }

    fn prefix(a: i64) -> ClusteringPrefix {
        ClusteringPrefix::new(vec![a.into()])
    }

    fn sample(schema: &Schema, stamp: i64, value: &'static str) -> MutationPartition {
        let mut p = MutationPartition::new();
        let key = ck(schema, 1, "a");
        p.apply_insert(schema, key.clone(), ts(stamp));
        p.clustered_row(schema, key)
            .cells_mut()
            .apply(schema.column(ColumnKind::Regular, R0), live(stamp, value));
        p
    }

    #[test]
    fn higher_timestamp_wins_in_both_directions() {
        let schema = two_level_schema();
        let a = sample(&schema, 100, "x");
        let b = sample(&schema, 200, "y");

        let mut ab = a.clone();
        ab.apply(&schema, &b);
        let mut ba = b.clone();
        ba.apply_owned(&schema, a.clone());
        assert!(ab.equal(&schema, &ba));

        let row = ab.find_row(&schema, &ck(&schema, 1, "a")).expect("row");
        assert_eq!(row.find_cell(R0), Some(&live(200, "y")));
    }

    #[test]
    fn copy_and_move_merge_agree() {
        let schema = two_level_schema();
        let mut a = sample(&schema, 5, "a");
        a.apply_row_tombstone(&schema, prefix(2), tomb(3, 0));
        a.static_row_mut()
            .apply(schema.column(ColumnKind::Static, S0), live(4, "s"));

        let mut b = MutationPartition::new();
        b.apply_tombstone(tomb(1, 0));
        b.apply_row_tombstone(&schema, prefix(2), tomb(4, 0));
        b.apply_row_tombstone(&schema, prefix(0), tomb(4, 0));
        b.clustered_row(&schema, ck(&schema, 0, "z"))
            .cells_mut()
            .apply(schema.column(ColumnKind::Regular, TAGS), set_of(6, &["t"]));
        b.clustered_row(&schema, ck(&schema, 1, "a"))
            .cells_mut()
            .apply(schema.column(ColumnKind::Regular, R1), live(6, "b"));
        b.clustered_row(&schema, ck(&schema, 9, "q"))
            .apply_marker(RowMarker::live(ts(2)));

        let mut copied = a.clone();
        copied.apply(&schema, &b);
        let mut moved = a.clone();
        moved.apply_owned(&schema, b.clone());
        assert!(copied.equal(&schema, &moved));
        assert_eq!(copied.clustered_rows().len(), 3);
        assert_eq!(copied.row_tombstones().len(), 2);
        assert_eq!(copied.row_tombstones()[1].tomb(), tomb(4, 0));
        assert_eq!(copied.partition_tombstone(), tomb(1, 0));

        let mut twice = copied.clone();
        twice.apply(&schema, &b);
        twice.apply(&schema, &a);
        assert!(twice.equal(&schema, &copied));
    }

    #[test]
    fn moving_into_empty_partition_takes_everything() {
        let schema = two_level_schema();
        let donor = sample(&schema, 7, "v");
        let mut p = MutationPartition::new();
        p.apply_owned(&schema, donor.clone());
        assert!(p.equal(&schema, &donor));
    }
}
