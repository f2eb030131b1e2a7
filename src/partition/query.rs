use super::{MutationPartition, RowsEntry};
use crate::{
    cell::CellOrCollection,
    mvcc::GcTime,
    observability::log_debug,
    query::{PartitionSlice, PartitionWriter, RowWriter},
    row::Row,
    schema::{ColumnId, ColumnKind, Schema},
    tombstone::Tombstone,
};

impl MutationPartition {
    /// Write the live data selected by `slice` into `writer`, emitting at
    /// most `row_limit` clustering rows. Returns the number of rows emitted.
    ///
    /// The static row is written whenever static columns are selected. When
    /// neither the static row nor any selected clustering row is live the
    /// partition is retracted instead of finished.
    ///
    /// # Panics
    ///
    /// When `row_limit` is zero.
    pub fn query<W: PartitionWriter>(
        &self,
        mut writer: W,
        schema: &Schema,
        slice: &PartitionSlice,
        now: GcTime,
        row_limit: usize,
    ) -> usize {
        assert!(row_limit > 0, "query row_limit must be positive");

        let static_tomb = self.tombstone_for_static_row();
        if !slice.static_columns.is_empty() {
            let mut rw = writer.add_static_row();
            write_row_slice(
                &mut rw,
                schema,
                ColumnKind::Static,
                &self.static_row,
                &slice.static_columns,
                static_tomb,
                now,
            );
            rw.finish();
        }
        let static_live = self.is_static_row_live(schema, now);

        let mut emitted = 0;
        'ranges: for range in ordered(&slice.row_ranges, slice.reversed) {
            for entry in ordered(self.range(schema, range), slice.reversed) {
                let tomb = self.tombstone_for_entry(schema, entry);
                if !entry.row.is_live(schema, tomb, now) {
                    continue;
                }
                write_clustered_row(&mut writer, schema, entry, &slice.regular_columns, tomb, now);
                emitted += 1;
                if emitted == row_limit {
                    break 'ranges;
                }
            }
        }

        if emitted == 0 && !static_live {
            log_debug!(component = "query", event = "partition_retracted");
            writer.retract();
        } else {
            log_debug!(
                component = "query",
                event = "partition_finished",
                rows = emitted,
                static_live,
            );
            writer.finish();
        }
        emitted
    }
}

/// Iterate `items` forwards, or backwards when `reversed`.
pub(super) fn ordered<T>(items: &[T], reversed: bool) -> impl Iterator<Item = &T> {
    let (fwd, rev) = if reversed {
        (None, Some(items.iter().rev()))
    } else {
        (Some(items.iter()), None)
    };
    fwd.into_iter().flatten().chain(rev.into_iter().flatten())
}

fn write_clustered_row<W: PartitionWriter>(
    writer: &mut W,
    schema: &Schema,
    entry: &RowsEntry,
    columns: &[ColumnId],
    tomb: Tombstone,
    now: GcTime,
) {
    let mut rw = writer.add_row(&entry.key);
    write_row_slice(
        &mut rw,
        schema,
        ColumnKind::Regular,
        entry.row.cells(),
        columns,
        tomb,
        now,
    );
    rw.finish();
}

fn write_row_slice<R: RowWriter>(
    rw: &mut R,
    schema: &Schema,
    kind: ColumnKind,
    row: &Row,
    columns: &[ColumnId],
    tomb: Tombstone,
    now: GcTime,
) {
    for &id in columns {
        match row.find_cell(id) {
            Some(CellOrCollection::Atomic(cell)) if cell.is_live(tomb, now) => rw.add(cell),
            Some(CellOrCollection::Collection(m)) => {
                let ct = schema.column(kind, id).collection_type();
                match ct {
                    Some(ct) if ct.is_any_live(m, tomb, now) => {
                        rw.add_collection(ct.serialize_mutation_form_only_live(m, tomb, now))
                    }
                    _ => rw.add_empty(),
                }
            }
            _ => rw.add_empty(),
        }
    }
}
