use super::{search_row_tombstones, search_rows, MutationPartition, RowTombstonesEntry, RowsEntry};
use crate::{
    schema::{ColumnKind, Schema},
    tombstone::Tombstone,
};

impl MutationPartition {
    /// What this partition holds that `other` lacks or holds an older
    /// version of. Merging the result into `other` gives the same partition
    /// as merging all of `self` into it.
    pub fn difference(&self, schema: &Schema, other: &MutationPartition) -> MutationPartition {
        let cmp = schema.comparator();
        let mut out = MutationPartition::new();
        if self.tombstone > other.tombstone {
            out.tombstone = self.tombstone;
        }
        out.static_row = self
            .static_row
            .difference(schema, ColumnKind::Static, &other.static_row);

        for entry in &self.row_tombstones {
            let theirs = search_row_tombstones(&other.row_tombstones, cmp, entry.prefix.components())
                .map_or(Tombstone::NONE, |idx| other.row_tombstones[idx].tomb);
            if entry.tomb > theirs {
                out.row_tombstones.push(RowTombstonesEntry {
                    prefix: entry.prefix.clone(),
                    tomb: entry.tomb,
                });
            }
        }

        for entry in &self.rows {
            match search_rows(&other.rows, cmp, entry.key.components()) {
                Ok(idx) => {
                    let row = entry.row.difference(schema, &other.rows[idx].row);
                    if !row.is_empty() {
                        out.rows.push(RowsEntry {
                            key: entry.key.clone(),
                            row,
                        });
                    }
                }
                Err(_) => out.rows.push(entry.clone()),
            }
        }
        out
    }
}
