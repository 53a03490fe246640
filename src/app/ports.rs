//! Port traits: the hexagonal boundary between domain logic and the host.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Device / OutputController (domain)
//! ```
//!
//! [`GpioPort`] is the whole hardware-abstraction surface the lifecycle
//! consumes: claim/release, direction, value, debounce, the external
//! visibility side-channel (publish/unpublish), and edge-interrupt
//! registration. [`EventSink`] carries structured events outward.
//!
//! Port methods take `&self`: the GPIO bank is reached from both the
//! edge-callback context and the control-channel context, so adapters use
//! interior mutability (atomics or a critical-section mutex) internally.

use core::time::Duration;

use crate::app::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// GPIO port (driven adapter: domain → host GPIO layer)
// ───────────────────────────────────────────────────────────────

/// Direction of a digital line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Which signal transition an interrupt registration fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Opaque handle returned by [`GpioPort::register_edge_irq`].
///
/// Passed back verbatim to [`GpioPort::unregister_edge_irq`]; the domain
/// never inspects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqHandle(pub u32);

/// Host GPIO abstraction.
///
/// Mirrors the operations the lifecycle needs, one method per concern.
/// `set_value`/`get_value` are infallible by contract: they are only
/// called on lines the lifecycle has already claimed and configured.
pub trait GpioPort {
    /// Whether `gpio` names a usable line on this host.
    fn line_is_valid(&self, gpio: i32) -> bool;

    /// Take exclusive ownership of the line.
    fn claim(&self, gpio: i32) -> Result<(), GpioError>;

    /// Relinquish a previously claimed line.
    fn release(&self, gpio: i32);

    /// Configure the line as input or output.
    fn set_direction(&self, gpio: i32, dir: Direction) -> Result<(), GpioError>;

    /// Drive a claimed output line.
    fn set_value(&self, gpio: i32, high: bool);

    /// Read the current level of a claimed line.
    fn get_value(&self, gpio: i32) -> bool;

    /// Configure transition filtering on an input line.
    fn set_debounce(&self, gpio: i32, window: Duration) -> Result<(), GpioError>;

    /// Make the line externally visible (diagnostic side-channel).
    fn publish(&self, gpio: i32) -> Result<(), GpioError>;

    /// Remove the line from external visibility.
    fn unpublish(&self, gpio: i32);

    /// Map the line to an interrupt source firing on `edge`.
    fn register_edge_irq(&self, gpio: i32, edge: Edge) -> Result<IrqHandle, GpioError>;

    /// Tear down an interrupt registration.
    fn unregister_edge_irq(&self, handle: IrqHandle);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget outbound event port.
///
/// The domain emits [`AppEvent`]s through this; adapters decide where
/// they go (serial log, external reporting). Emission must never block
/// the edge or control path, and a failed emission is never propagated.
pub trait EventSink {
    fn emit(&self, event: &AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`GpioPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GpioError {
    /// The line is already claimed by someone else.
    Busy,
    /// Operation on a line that was never claimed.
    NotClaimed,
    /// The host cannot perform this operation on this line.
    Unsupported,
    /// Host-specific failure, carrying the native return code.
    Host(i32),
}

impl core::fmt::Display for GpioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy => write!(f, "line busy"),
            Self::NotClaimed => write!(f, "line not claimed"),
            Self::Unsupported => write!(f, "operation unsupported"),
            Self::Host(rc) => write!(f, "host error (rc={})", rc),
        }
    }
}
