//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the logger (UART / USB-CDC in production). Fire-and-forget by
//! construction: logging never blocks the edge or control path.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &AppEvent) {
        match event {
            AppEvent::Started { lines } => {
                info!("START | {} line(s) live", lines);
            }
            AppEvent::LineChanged { line, value } => {
                info!("LINE  | {} -> {}", line, if *value { "on" } else { "off" });
            }
            AppEvent::CommandRejected { line } => {
                info!("REJECT| unknown {}", line);
            }
            AppEvent::Shutdown(snap) => {
                info!(
                    "STOP  | presses={} requests={}",
                    snap.presses, snap.requests
                );
            }
        }
    }
}
