//! GPIO pin assignments for the LedPanel boards.
//!
//! Single source of truth. Every driver and config constructor references
//! this module rather than hard-coding pin numbers; change a pin here and
//! it propagates everywhere.

// ---------------------------------------------------------------------------
// Single LED/button board
// ---------------------------------------------------------------------------

/// Digital output driving the lone status LED (active HIGH).
pub const LED_GPIO: i32 = 4;

/// Momentary push-button, active-low with external pull-up.
/// Edge interrupts fire on the rising edge of the debounced signal.
pub const BUTTON_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Traffic-light board (three discrete LEDs, no button)
// ---------------------------------------------------------------------------

/// Red LED.
pub const LED_RED_GPIO: i32 = 11;
/// Yellow LED.
pub const LED_YELLOW_GPIO: i32 = 12;
/// Green LED.
pub const LED_GREEN_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Input conditioning
// ---------------------------------------------------------------------------

/// Fixed debounce window for the button line, milliseconds.
/// Not configurable at runtime; edge polarity is likewise fixed (rising).
pub const DEBOUNCE_MS: u32 = 200;
