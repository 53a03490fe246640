//! Output controller: the single serialization point for line mutation.
//!
//! Owns the configured output lines and their cached boolean values. Both
//! mutation paths (edge callback and control channel) funnel through
//! [`OutputController::apply`]; nothing else in the system may touch an
//! output line.
//!
//! ## Serialization discipline
//!
//! The line bank lives behind a blocking critical-section mutex. The
//! physical pin write and the cached-value update happen inside the same
//! lock scope, so:
//! - a `Toggle` read-modify-write can never interleave with a concurrent
//!   `apply` on the same line (no lost updates, no torn state);
//! - a successful `apply` implies the physical pin already reflects the
//!   new value before the call returns.
//!
//! `UnknownLine` is a pure validation rejection, checked before any
//! mutation.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Vec;

use crate::app::commands::{Command, LineId};
use crate::app::ports::GpioPort;
use crate::config::{MAX_OUTPUT_LINES, OutputLineConfig};
use crate::error::ControllerError;

struct LineSlot {
    id: LineId,
    gpio: i32,
    value: bool,
}

/// Serialized owner of every output line of the device instance.
pub struct OutputController {
    bank: Mutex<CriticalSectionRawMutex, RefCell<Vec<LineSlot, MAX_OUTPUT_LINES>>>,
}

impl OutputController {
    /// Build the bank from the configured outputs.
    ///
    /// Cached values are seeded from each line's `initial`; the lifecycle
    /// has already driven the pins to those values during acquisition.
    pub fn new(outputs: &[OutputLineConfig]) -> Self {
        let mut slots = Vec::new();
        for o in outputs {
            let _ = slots.push(LineSlot {
                id: o.id,
                gpio: o.gpio,
                value: o.initial,
            });
        }
        Self {
            bank: Mutex::new(RefCell::new(slots)),
        }
    }

    /// Apply one command; returns the line's new value.
    ///
    /// Linearizable with respect to every other `apply` call.
    pub fn apply(&self, gpio: &impl GpioPort, cmd: Command) -> Result<bool, ControllerError> {
        self.bank.lock(|cell| {
            let mut slots = cell.borrow_mut();
            let slot = slots
                .iter_mut()
                .find(|s| s.id == cmd.line())
                .ok_or(ControllerError::UnknownLine(cmd.line()))?;

            let next = match cmd {
                Command::Toggle { .. } => !slot.value,
                Command::Set { value, .. } => value,
            };

            // Pin first, cache second, one critical section: callers
            // observe the cached value only once the pin carries it.
            gpio.set_value(slot.gpio, next);
            slot.value = next;
            Ok(next)
        })
    }

    /// Cached value of `line`, or `None` for an unconfigured id.
    pub fn value(&self, line: LineId) -> Option<bool> {
        self.bank.lock(|cell| {
            cell.borrow()
                .iter()
                .find(|s| s.id == line)
                .map(|s| s.value)
        })
    }

    /// Point-in-time copy of every line's state.
    pub fn snapshot(&self) -> Vec<(LineId, bool), MAX_OUTPUT_LINES> {
        self.bank
            .lock(|cell| cell.borrow().iter().map(|s| (s.id, s.value)).collect())
    }

    /// Drive every output low. Teardown helper; keeps cache and pins in
    /// step so a partially torn-down device still reads consistently.
    pub fn drive_all_low(&self, gpio: &impl GpioPort) {
        self.bank.lock(|cell| {
            for slot in cell.borrow_mut().iter_mut() {
                gpio.set_value(slot.gpio, false);
                slot.value = false;
            }
        });
    }
}
