//! Structured log events.
//!
//! Every event goes through `tracing` under the `tessera` target and names
//! the emitting `component` (`"buffer"`, `"joined"`, ...) and a snake_case
//! `event`. Filter decisions log at debug, per-row and per-delegate detail
//! at trace, recoverable failures at warn.
//!
//! Installing a subscriber is left to the application.

/// Target shared by every tessera event.
pub(crate) const TESSERA_TARGET: &str = "tessera";

/// Emits a `tracing` event at `$level` under [`TESSERA_TARGET`].
macro_rules! tessera_event {
    ($level:ident, $($field:tt)*) => {
        ::tracing::$level!(target: $crate::observability::TESSERA_TARGET, $($field)*)
    };
}

/// ```ignore
/// log_debug!(
///     component = "joined",
///     event = "filter_split",
///     predicate_side = "left",
///     filter = %filter,
/// );
/// ```
macro_rules! log_debug {
    ($($field:tt)*) => {
        $crate::observability::tessera_event!(debug, $($field)*)
    };
}

macro_rules! log_trace {
    ($($field:tt)*) => {
        $crate::observability::tessera_event!(trace, $($field)*)
    };
}

macro_rules! log_warn {
    ($($field:tt)*) => {
        $crate::observability::tessera_event!(warn, $($field)*)
    };
}

pub(crate) use log_debug;
pub(crate) use log_trace;
pub(crate) use log_warn;
pub(crate) use tessera_event;
