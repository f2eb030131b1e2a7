//! Time primitives shared across modules (write timestamps, gc clock, ttl).

use std::fmt;

/// Client-supplied write timestamp attached to cells, markers and tombstones.
///
/// Reconciliation compares these as plain signed integers; the larger wins.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Sentinel for "nothing written": older than every real write.
    pub const MISSING: Self = Self(i64::MIN);
    /// Greatest possible timestamp (used as an unbounded purge threshold).
    pub const MAX: Self = Self(i64::MAX);

    /// Construct a timestamp from a raw `i64`.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw `i64` value backing this timestamp.
    #[inline]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Whether this is the [`Timestamp::MISSING`] sentinel.
    #[inline]
    pub const fn is_missing(self) -> bool {
        self.0 == i64::MIN
    }
}

impl From<i64> for Timestamp {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for i64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_missing() {
            f.write_str("Timestamp(missing)")
        } else {
            f.debug_tuple("Timestamp").field(&self.0).finish()
        }
    }
}

/// Point on the garbage-collection clock, in whole seconds since the epoch.
///
/// Deletion times, expiries and query times all live on this clock. The
/// representation is unsigned so ordering matches the unsigned comparison
/// used when reconciling two dead cells.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct GcTime(u32);

impl GcTime {
    /// Earliest representable time point.
    pub const MIN: Self = Self(0);
    /// Latest representable time point.
    pub const MAX: Self = Self(u32::MAX);

    /// Construct a time point from seconds since the epoch.
    #[inline]
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Seconds since the epoch.
    #[inline]
    pub const fn as_secs(self) -> u32 {
        self.0
    }

    /// Move forward by `ttl`, saturating at [`GcTime::MAX`].
    #[inline]
    pub const fn saturating_add(self, ttl: Ttl) -> Self {
        Self(self.0.saturating_add(ttl.as_secs()))
    }

    /// Move backward by `secs`, saturating at [`GcTime::MIN`].
    #[inline]
    pub const fn saturating_sub_secs(self, secs: u32) -> Self {
        Self(self.0.saturating_sub(secs))
    }
}

impl fmt::Debug for GcTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GcTime({}s)", self.0)
    }
}

/// Time-to-live of an expiring write, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ttl(u32);

impl Ttl {
    /// Construct a ttl from whole seconds.
    #[inline]
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Length of the ttl in seconds.
    #[inline]
    pub const fn as_secs(self) -> u32 {
        self.0
    }
}
