//! Adapters: bridge real peripherals and sinks to the domain port traits.

pub mod gpio;
pub mod log_sink;
