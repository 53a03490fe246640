//! Runtime diagnostics counters.
//!
//! Two monotonically increasing counters track how often each mutation
//! path ran: button presses (edge-callback path) and control-channel
//! requests. Each counter has exactly one writer, so plain atomic
//! increments are sufficient; no mutual exclusion between them.
//!
//! Counters are never reset while the device is live. A fresh
//! acquisition constructs a fresh zeroed pair, and the final values are
//! surfaced through the event sink at teardown.

use core::sync::atomic::{AtomicU32, Ordering};

/// Press/request counters owned by the device instance.
#[derive(Debug, Default)]
pub struct Counters {
    presses: AtomicU32,
    requests: AtomicU32,
}

impl Counters {
    pub const fn new() -> Self {
        Self {
            presses: AtomicU32::new(0),
            requests: AtomicU32::new(0),
        }
    }

    /// Incremented only inside the edge callback.
    pub fn record_press(&self) {
        self.presses.fetch_add(1, Ordering::Relaxed);
    }

    /// Incremented only on a successfully decoded control write.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Read-only point-in-time view.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            presses: self.presses.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
        }
    }
}

/// A copyable view of the counters, suitable for logging or events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSnapshot {
    pub presses: u32,
    pub requests: u32,
}
