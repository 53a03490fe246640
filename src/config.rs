//! Device configuration.
//!
//! A [`PanelConfig`] fully describes one board: which output lines exist,
//! their initial values, the wire protocol the control channel speaks,
//! and the optional button input. The two named constructors match the
//! two boards this firmware ships on.
//!
//! Debounce timing and edge polarity are fixed policy (see
//! [`pins::DEBOUNCE_MS`]) and deliberately not part of the runtime
//! surface.

use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::app::commands::LineId;
use crate::channel::codec::Protocol;
use crate::pins;

/// Upper bound on configured output lines (board layouts max out at 3).
pub const MAX_OUTPUT_LINES: usize = 4;

/// One physical digital output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputLineConfig {
    /// Logical id the protocol and commands address.
    pub id: LineId,
    /// Host GPIO number.
    pub gpio: i32,
    /// Value driven at acquisition.
    pub initial: bool,
}

/// The button input and which line its presses toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonConfig {
    /// Host GPIO number.
    pub gpio: i32,
    /// Line toggled on each qualifying press.
    pub toggle_line: LineId,
    /// Debounce window, milliseconds.
    pub debounce_ms: u32,
}

/// Full board description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Control-channel wire protocol.
    pub protocol: Protocol,
    /// Configured output lines; commands addressing anything else are
    /// rejected at the controller.
    pub outputs: Vec<OutputLineConfig, MAX_OUTPUT_LINES>,
    /// Button input, when the board has one.
    pub button: Option<ButtonConfig>,
}

impl PanelConfig {
    /// Single LED/button board: one output, on by default, toggled by
    /// the push-button.
    pub fn single_led() -> Self {
        let mut outputs = Vec::new();
        let _ = outputs.push(OutputLineConfig {
            id: LineId::SINGLE,
            gpio: pins::LED_GPIO,
            initial: true,
        });
        Self {
            protocol: Protocol::Single,
            outputs,
            button: Some(ButtonConfig {
                gpio: pins::BUTTON_GPIO,
                toggle_line: LineId::SINGLE,
                debounce_ms: pins::DEBOUNCE_MS,
            }),
        }
    }

    /// Traffic-light board: red/yellow/green outputs, all off by
    /// default, addressed protocol, no button.
    pub fn traffic_light() -> Self {
        let mut outputs = Vec::new();
        for (i, gpio) in [
            pins::LED_RED_GPIO,
            pins::LED_YELLOW_GPIO,
            pins::LED_GREEN_GPIO,
        ]
        .into_iter()
        .enumerate()
        {
            let _ = outputs.push(OutputLineConfig {
                id: LineId(i as u8),
                gpio,
                initial: false,
            });
        }
        Self {
            protocol: Protocol::Addressed,
            outputs,
            button: None,
        }
    }

    /// Logical ids of every configured line, in claim order.
    pub fn line_ids(&self) -> Vec<LineId, MAX_OUTPUT_LINES> {
        self.outputs.iter().map(|o| o.id).collect()
    }
}
