//! Device lifecycle: ordered acquisition, rollback, teardown.
//!
//! [`Device::acquire`] claims hardware in a fixed order (validate ids,
//! outputs, input, interrupt, control surface) and rolls back everything
//! already acquired, in reverse order, when any step fails. Teardown
//! reuses the same release helpers, so it is safe after any acquisition
//! prefix.
//!
//! A live [`Device`] exposes the three runtime entry points: the edge
//! path ([`Device::handle_edge`]), the control-channel path
//! ([`Device::channel_write`]), and the shared serialization point
//! ([`Device::apply`]). All take `&self`; the controller serializes
//! internally, so the two mutator contexts may run concurrently.

use log::{info, warn};

use crate::app::commands::Command;
use crate::app::controller::OutputController;
use crate::app::events::AppEvent;
use crate::app::ports::{Direction, Edge, EventSink, GpioError, GpioPort, IrqHandle};
use crate::channel::ControlChannel;
use crate::config::{ButtonConfig, OutputLineConfig, PanelConfig};
use crate::diagnostics::{CounterSnapshot, Counters};
use crate::drivers::edge::EdgeWatcher;
use crate::error::{AcquireError, ControllerError};
use crate::pins;

/// One acquired controller instance. Constructing it is acquisition;
/// [`Device::shutdown`] is release. Nothing else constructs or tears
/// down the controller, watcher, or counters.
pub struct Device<G: GpioPort, S: EventSink> {
    config: PanelConfig,
    gpio: G,
    controller: OutputController,
    channel: ControlChannel,
    watcher: EdgeWatcher,
    irq: Option<IrqHandle>,
    counters: Counters,
    sink: S,
}

impl<G: GpioPort, S: EventSink> Device<G, S> {
    /// Bring the device up.
    ///
    /// On error, every resource claimed by completed steps has already
    /// been released, in reverse order; nothing past the failed step was
    /// ever claimed, and the control surface never becomes visible.
    pub fn acquire(config: PanelConfig, gpio: G, sink: S) -> Result<Self, AcquireError> {
        info!(
            "acquiring device: {} output line(s), button={}",
            config.outputs.len(),
            config.button.is_some(),
        );

        // Step 1: validate every configured id before claiming anything.
        for o in &config.outputs {
            if !gpio.line_is_valid(o.gpio) {
                warn!("invalid output GPIO {}", o.gpio);
                return Err(AcquireError::InvalidLine(o.gpio));
            }
        }
        if let Some(btn) = &config.button {
            if !gpio.line_is_valid(btn.gpio) {
                warn!("invalid button GPIO {}", btn.gpio);
                return Err(AcquireError::InvalidLine(btn.gpio));
            }
        }

        // Step 2: outputs, in declaration order.
        let mut brought_up = 0usize;
        for o in &config.outputs {
            if let Err(cause) = bring_up_output(&gpio, o) {
                release_outputs(&gpio, &config.outputs[..brought_up]);
                return Err(AcquireError::OutputSetup { gpio: o.gpio, cause });
            }
            brought_up += 1;
        }

        // Step 3: the button input, when the board has one.
        if let Some(btn) = &config.button {
            if let Err(cause) = bring_up_input(&gpio, btn) {
                release_outputs(&gpio, &config.outputs);
                return Err(AcquireError::InputSetup { gpio: btn.gpio, cause });
            }
        }

        // Step 4: map the input to an interrupt source, rising edge.
        let irq = match &config.button {
            Some(btn) => match gpio.register_edge_irq(btn.gpio, Edge::Rising) {
                Ok(handle) => {
                    info!("button GPIO {} mapped to irq handle {}", btn.gpio, handle.0);
                    Some(handle)
                }
                Err(cause) => {
                    release_input(&gpio, btn);
                    release_outputs(&gpio, &config.outputs);
                    return Err(AcquireError::InterruptRegistrationFailed(cause));
                }
            },
            None => None,
        };

        // Step 5: expose the control surface. Counters start from zero
        // on every fresh acquisition.
        let controller = OutputController::new(&config.outputs);
        let channel = ControlChannel::new(config.protocol);
        let counters = Counters::new();
        let watcher = EdgeWatcher::new(
            config
                .button
                .as_ref()
                .map_or(pins::DEBOUNCE_MS, |b| b.debounce_ms),
        );
        if config.button.is_some() {
            watcher.arm();
        }

        sink.emit(&AppEvent::Started {
            lines: config.outputs.len() as u8,
        });
        info!("device live");

        Ok(Self {
            config,
            gpio,
            controller,
            channel,
            watcher,
            irq,
            counters,
            sink,
        })
    }

    // ── Runtime entry points ──────────────────────────────────

    /// Shared serialization point; both runtime paths converge here.
    /// On success the physical pin already carries the new value.
    pub fn apply(&self, cmd: Command) -> Result<bool, ControllerError> {
        let value = self.controller.apply(&self.gpio, cmd)?;
        self.sink.emit(&AppEvent::LineChanged {
            line: cmd.line(),
            value,
        });
        Ok(value)
    }

    /// Edge path: offer one debounced ISR timestamp to the watcher.
    /// Returns `true` iff the edge qualified and the toggle ran.
    pub fn handle_edge(&self, stamp_ms: u32) -> bool {
        let Some(btn) = &self.config.button else {
            return false;
        };
        self.watcher.on_edge(stamp_ms, || {
            match self.controller.apply(
                &self.gpio,
                Command::Toggle {
                    line: btn.toggle_line,
                },
            ) {
                Ok(value) => {
                    self.counters.record_press();
                    info!(
                        "button press: {} now {}",
                        btn.toggle_line,
                        if value { "on" } else { "off" }
                    );
                    self.sink.emit(&AppEvent::LineChanged {
                        line: btn.toggle_line,
                        value,
                    });
                }
                // Unreachable with a validated config; isolate anyway.
                Err(e) => warn!("edge toggle rejected: {}", e),
            }
        })
    }

    /// Control-channel path: handle one external write.
    /// Always reports the full byte count as consumed.
    pub fn channel_write(&self, bytes: &[u8]) -> usize {
        self.channel.write(
            bytes,
            &self.gpio,
            &self.controller,
            &self.counters,
            &self.sink,
        )
    }

    // ── Queries ───────────────────────────────────────────────

    /// Cached value of one line.
    pub fn line_value(&self, line: crate::app::commands::LineId) -> Option<bool> {
        self.controller.value(line)
    }

    /// Diagnostic counters, read-only.
    pub fn counters(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    // ── Teardown ──────────────────────────────────────────────

    /// Release everything, in reverse order of acquisition, and report
    /// the final counters through the sink.
    pub fn shutdown(self) {
        let snap = self.counters.snapshot();
        info!(
            "shutting down: presses={} requests={}",
            snap.presses, snap.requests
        );

        self.watcher.disarm();
        if let Some(handle) = self.irq {
            self.gpio.unregister_edge_irq(handle);
        }
        if let Some(btn) = &self.config.button {
            release_input(&self.gpio, btn);
        }
        self.controller.drive_all_low(&self.gpio);
        release_outputs(&self.gpio, &self.config.outputs);

        self.sink.emit(&AppEvent::Shutdown(snap));
    }
}

// ── Acquisition/release helpers ───────────────────────────────
//
// Each bring-up helper leaves nothing claimed when it fails, so the
// caller only ever rolls back fully acquired lines.

fn bring_up_output(gpio: &impl GpioPort, o: &OutputLineConfig) -> Result<(), GpioError> {
    gpio.claim(o.gpio)?;
    let configured = (|| {
        gpio.set_direction(o.gpio, Direction::Output)?;
        gpio.set_value(o.gpio, o.initial);
        gpio.publish(o.gpio)
    })();
    if configured.is_err() {
        gpio.release(o.gpio);
    }
    configured
}

fn bring_up_input(gpio: &impl GpioPort, btn: &ButtonConfig) -> Result<(), GpioError> {
    gpio.claim(btn.gpio)?;
    let configured = (|| {
        gpio.set_direction(btn.gpio, Direction::Input)?;
        gpio.set_debounce(
            btn.gpio,
            core::time::Duration::from_millis(u64::from(btn.debounce_ms)),
        )?;
        gpio.publish(btn.gpio)
    })();
    if configured.is_err() {
        gpio.release(btn.gpio);
    }
    configured
}

fn release_outputs(gpio: &impl GpioPort, outputs: &[OutputLineConfig]) {
    // Reverse claim order; outputs are driven low before release so an
    // unloaded device is visibly dark.
    for o in outputs.iter().rev() {
        gpio.set_value(o.gpio, false);
        gpio.unpublish(o.gpio);
        gpio.release(o.gpio);
    }
}

fn release_input(gpio: &impl GpioPort, btn: &ButtonConfig) {
    gpio.unpublish(btn.gpio);
    gpio.release(btn.gpio);
}
