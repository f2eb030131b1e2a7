//! Logging infrastructure for partition events.
//!
//! Events are emitted through `tracing` with a single target and an `event`
//! field for filtering.
//!
//! ## Library Integration
//!
//! This crate never initializes a global subscriber. Applications configure
//! tracing via `tracing_subscriber` or similar.
//!
//! ## Conventions
//!
//! - `event`: snake_case event name (required)
//! - `component`: subsystem (e.g., "merge", "query", "compaction", "view")
//! - Use `%` for Display, `?` for Debug formatting
//! - Per-cell or per-row events are not logged; keep events per partition

/// Target for all partition log events.
pub(crate) const PARTITION_TARGET: &str = "partition_core";

/// Macro for debug-level log events.
///
/// # Example
/// ```ignore
/// log_debug!(
///     component = "compaction",
///     event = "partition_compacted",
///     rows_erased = erased,
/// );
/// ```
macro_rules! log_debug {
    ($($field:tt)*) => {
        ::tracing::debug!(target: $crate::observability::PARTITION_TARGET, $($field)*)
    };
}

/// Macro for trace-level log events.
macro_rules! log_trace {
    ($($field:tt)*) => {
        ::tracing::trace!(target: $crate::observability::PARTITION_TARGET, $($field)*)
    };
}

/// Macro for warn-level log events.
macro_rules! log_warn {
    ($($field:tt)*) => {
        ::tracing::warn!(target: $crate::observability::PARTITION_TARGET, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_trace;
pub(crate) use log_warn;
