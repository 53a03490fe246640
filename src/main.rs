//! LedPanel firmware entry point.
//!
//! Bring-up order mirrors the device lifecycle contract: acquire all
//! GPIO resources (with rollback on any failure), then open the control
//! surface. The main loop dispatches debounced button edges and forwards
//! console writes to the control channel; the device serializes the two
//! paths internally.

#![deny(unused_must_use)]

use std::sync::mpsc;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use ledpanel::adapters::gpio::EspGpio;
use ledpanel::adapters::log_sink::LogEventSink;
use ledpanel::app::commands::Command;
use ledpanel::config::PanelConfig;
use ledpanel::drivers::edge::take_edge_stamp;
use ledpanel::drivers::patterns::boot_sweep;
use ledpanel::lifecycle::Device;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("LedPanel v{}", env!("CARGO_PKG_VERSION"));

    #[cfg(feature = "traffic-light")]
    let config = PanelConfig::traffic_light();
    #[cfg(not(feature = "traffic-light"))]
    let config = PanelConfig::single_led();

    let device = Device::acquire(config, EspGpio::new(), LogEventSink::new())
        .map_err(|e| anyhow::anyhow!("device bring-up failed: {e}"))?;

    play_panel_sweep(&device);

    // Console lines arrive on their own thread; the channel write path
    // is safe to call concurrently with edge dispatch.
    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || console_reader(&tx));

    info!(
        "control surface ready: write '0'/'1' {}",
        if cfg!(feature = "traffic-light") {
            "prefixed with a line digit (e.g. '21')"
        } else {
            "to force the LED"
        }
    );

    loop {
        if let Some(stamp) = take_edge_stamp() {
            device.handle_edge(stamp);
        }

        match rx.recv_timeout(Duration::from_millis(10)) {
            Ok(line) => {
                let consumed = device.channel_write(line.as_bytes());
                log::debug!("console write consumed {} bytes", consumed);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Farewell sweep, then release: the panel goes dark only after the
    // animation finishes, matching the bring-up sequence.
    play_panel_sweep(&device);
    device.shutdown();
    Ok(())
}

/// Play the sweep on boards without a button (traffic light), once at
/// bring-up and once right before teardown. Raw delay timing lives
/// here, outside the device core.
fn play_panel_sweep(device: &Device<EspGpio, LogEventSink>) {
    if device.config().button.is_some() {
        return;
    }
    let lines = device.config().line_ids();
    for step in boot_sweep(&lines) {
        if let Err(e) = device.apply(Command::Set {
            line: step.line,
            value: step.value,
        }) {
            warn!("boot pattern step failed: {e}");
        }
        if step.hold_ms > 0 {
            esp_idf_hal::delay::FreeRtos::delay_ms(step.hold_ms);
        }
    }
}

/// Blocking stdin reader feeding the control channel.
fn console_reader(tx: &mpsc::Sender<String>) {
    use std::io::BufRead;
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        match line {
            // Re-append the newline the reader stripped: the channel
            // protocol accepts and ignores it, as a shell writer would
            // produce.
            Ok(mut l) => {
                l.push('\n');
                if tx.send(l).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}
