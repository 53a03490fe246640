//! Outbound application events.
//!
//! The device emits these through the [`EventSink`](super::ports::EventSink)
//! port. Adapters on the other side decide what to do with them; the
//! default adapter writes them to the serial log.

use crate::app::commands::LineId;
use crate::diagnostics::CounterSnapshot;

/// Structured events emitted by the device core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    /// Acquisition completed; the control surface is now live.
    Started { lines: u8 },

    /// A command was applied and the physical pin now carries `value`.
    LineChanged { line: LineId, value: bool },

    /// A syntactically valid command named a line outside the
    /// configured set and was rejected without side effects.
    CommandRejected { line: LineId },

    /// Teardown finished; carries the final press/request counts
    /// (the counter-reporting contract of the original device).
    Shutdown(CounterSnapshot),
}
