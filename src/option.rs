use crate::mvcc::GcTime;

/// Ten days, the conventional tombstone grace period.
pub const DEFAULT_GC_GRACE_SECONDS: u32 = 864_000;

/// Per-table options carried by a [`Schema`](crate::schema::Schema).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOption {
    pub(crate) gc_grace_seconds: u32,
}

impl Default for TableOption {
    fn default() -> Self {
        TableOption {
            gc_grace_seconds: DEFAULT_GC_GRACE_SECONDS,
        }
    }
}

impl TableOption {
    /// How long tombstones must be retained before they may be purged.
    pub fn gc_grace_seconds(self, gc_grace_seconds: u32) -> Self {
        TableOption {
            gc_grace_seconds,
            ..self
        }
    }
}

impl TableOption {
    /// Purge horizon for a compaction or query running at `query_time`:
    /// tombstones issued before it have outlived the grace period.
    pub fn gc_before(&self, query_time: GcTime) -> GcTime {
        query_time.saturating_sub_secs(self.gc_grace_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gc_before_subtracts_grace() {
        let option = TableOption::default().gc_grace_seconds(100);
        assert_eq!(option.gc_before(GcTime::from_secs(1_000)), GcTime::from_secs(900));
        assert_eq!(option.gc_before(GcTime::from_secs(10)), GcTime::MIN);
        assert_eq!(TableOption::default().gc_grace_seconds, DEFAULT_GC_GRACE_SECONDS);
    }
}
