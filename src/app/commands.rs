//! Inbound commands to the output controller.
//!
//! Both mutation paths converge on [`Command`]: the edge watcher produces
//! `Toggle` for the button's configured line, and the control channel
//! decodes writes into `Set`.

use serde::{Deserialize, Serialize};

/// Stable identifier for one addressable output line.
///
/// Logical, not physical: the mapping to a GPIO number lives in
/// [`PanelConfig`](crate::config::PanelConfig). The configured set is
/// small (one line on the single-LED board, `{0,1,2}` on the
/// traffic-light board); commands naming any other id are rejected with
/// [`ControllerError::UnknownLine`](crate::error::ControllerError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineId(pub u8);

impl LineId {
    /// The sole line of the single-LED board.
    pub const SINGLE: LineId = LineId(0);
}

impl core::fmt::Display for LineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "line {}", self.0)
    }
}

/// A single mutation request against the output bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Invert the line's current value (edge-callback path).
    Toggle { line: LineId },
    /// Force the line to an explicit value (control-channel path).
    /// Idempotent: applying twice observes the same state as once.
    Set { line: LineId, value: bool },
}

impl Command {
    /// The line this command addresses.
    pub fn line(&self) -> LineId {
        match *self {
            Self::Toggle { line } | Self::Set { line, .. } => line,
        }
    }
}
