//! Unified error types for the LedPanel firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! top-level error handling uniform. All variants are `Copy` so they can
//! be passed through the lifecycle and control paths without allocation.
//!
//! Two temporal categories, deliberately separate:
//! - [`AcquireError`]: configuration-time, fatal to bring-up, always
//!   preceded by a full rollback of whatever was already claimed.
//! - [`ControllerError`]: runtime, per-command, never fatal; the device
//!   stays live and the offending command has no side effects.

use core::fmt;

use crate::app::commands::LineId;
use crate::app::ports::GpioError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Device bring-up failed (already rolled back).
    Acquire(AcquireError),
    /// A runtime command was rejected.
    Controller(ControllerError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquire(e) => write!(f, "acquire: {e}"),
            Self::Controller(e) => write!(f, "controller: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Acquisition errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireError {
    /// A configured GPIO number is not usable on this host.
    InvalidLine(i32),
    /// An output line failed to claim/configure/publish.
    OutputSetup { gpio: i32, cause: GpioError },
    /// The input line failed to claim/configure/publish.
    InputSetup { gpio: i32, cause: GpioError },
    /// The host cannot deliver edge notifications for the input line.
    InterruptRegistrationFailed(GpioError),
}

impl fmt::Display for AcquireError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidLine(gpio) => write!(f, "invalid GPIO {}", gpio),
            Self::OutputSetup { gpio, cause } => {
                write!(f, "output GPIO {} setup failed: {}", gpio, cause)
            }
            Self::InputSetup { gpio, cause } => {
                write!(f, "input GPIO {} setup failed: {}", gpio, cause)
            }
            Self::InterruptRegistrationFailed(cause) => {
                write!(f, "edge interrupt registration failed: {}", cause)
            }
        }
    }
}

impl From<AcquireError> for Error {
    fn from(e: AcquireError) -> Self {
        Self::Acquire(e)
    }
}

// ---------------------------------------------------------------------------
// Runtime command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerError {
    /// The command names a line outside the configured set.
    /// Pure validation rejection: no mutation happened.
    UnknownLine(LineId),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownLine(line) => write!(f, "unknown {}", line),
        }
    }
}

impl From<ControllerError> for Error {
    fn from(e: ControllerError) -> Self {
        Self::Controller(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
