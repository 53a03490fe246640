//! Control channel: the external write-based command surface.
//!
//! Decodes each incoming byte sequence with [`codec`] and forwards the
//! result to the output controller. The channel itself never fails a
//! writer: every write reports the full byte count as consumed, and a
//! malformed or rejected command costs nothing but a log line.

pub mod codec;

use log::{debug, warn};

use crate::app::controller::OutputController;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, GpioPort};
use crate::diagnostics::Counters;
use crate::error::ControllerError;

use codec::Protocol;

/// Per-device control-channel state: just the protocol policy.
pub struct ControlChannel {
    proto: Protocol,
}

impl ControlChannel {
    pub fn new(proto: Protocol) -> Self {
        Self { proto }
    }

    pub fn protocol(&self) -> Protocol {
        self.proto
    }

    /// Handle one external write.
    ///
    /// Always returns `bytes.len()` (the bytes-consumed contract), so a
    /// misbehaving writer is never blocked or failed. A successful decode
    /// bumps the request counter and reaches `apply` even when the
    /// controller then rejects the line.
    pub fn write(
        &self,
        bytes: &[u8],
        gpio: &impl GpioPort,
        controller: &OutputController,
        counters: &Counters,
        sink: &impl EventSink,
    ) -> usize {
        debug!("control write: {} bytes", bytes.len());

        match codec::decode(self.proto, bytes) {
            Some(cmd) => {
                counters.record_request();
                match controller.apply(gpio, cmd) {
                    Ok(value) => {
                        sink.emit(&AppEvent::LineChanged { line: cmd.line(), value });
                    }
                    Err(ControllerError::UnknownLine(line)) => {
                        warn!("control write rejected: unknown {}", line);
                        sink.emit(&AppEvent::CommandRejected { line });
                    }
                }
            }
            None => {
                // Dropped, not surfaced: the writer still sees success.
                warn!("unrecognized control write ({} bytes)", bytes.len());
            }
        }

        bytes.len()
    }
}
