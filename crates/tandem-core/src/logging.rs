//! Logging facilities for tandem.
//!
//! tandem uses the `tracing` crate for instrumentation and never installs a
//! subscriber itself. To see logs, install one in your application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("tandem::selection=debug,tandem_core=trace")
//!     .init();
//! ```
//!
//! Every subsystem logs under one of the [`targets`], so filters can select
//! the mirror or the selection aggregator independently.

/// Span names used throughout tandem for tracing.
pub mod span_names {
    /// Bulk add on an observable collection.
    pub const ADD_RANGE: &str = "tandem::collection::add_range";
    /// Full rebuild of a mirror's primary collection.
    pub const MIRROR_RESYNC: &str = "tandem::mirror::resync";
    /// Selection aggregator (re)initialization.
    pub const SELECTION_INIT: &str = "tandem::selection::init";
    /// Aggregate recomputation.
    pub const SELECTION_RECOMPUTE: &str = "tandem::selection::recompute";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "tandem_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "tandem_core::signal";
    /// Observable collection target.
    pub const COLLECTION: &str = "tandem_core::collection";
    /// Collection mirror target.
    pub const MIRROR: &str = "tandem::mirror";
    /// Selection aggregator target.
    pub const SELECTION: &str = "tandem::selection";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of bulk operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::debug_span!(target: "tandem::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Trace-level event under the core target.
#[macro_export]
macro_rules! tandem_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "tandem_core", $($arg)*)
    };
}

/// Debug-level event under the core target.
#[macro_export]
macro_rules! tandem_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "tandem_core", $($arg)*)
    };
}

/// Warn-level event under the core target.
#[macro_export]
macro_rules! tandem_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "tandem_core", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_are_hierarchical() {
        assert!(targets::SIGNAL.starts_with(targets::CORE));
        assert!(targets::COLLECTION.starts_with(targets::CORE));
        assert!(targets::SELECTION.starts_with("tandem::"));
    }

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new(span_names::ADD_RANGE);
        crate::tandem_trace!(operation = span_names::ADD_RANGE, "inside perf span");
        crate::tandem_debug!("debug inside perf span");
        crate::tandem_warn!("warn inside perf span");
    }
}
