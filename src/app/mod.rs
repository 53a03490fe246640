//! Application core: pure domain logic, zero I/O.
//!
//! The business rules of the output controller live here. All interaction
//! with hardware happens through the **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod ports;
