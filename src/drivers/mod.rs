//! Input drivers and LED pattern helpers.

pub mod edge;
pub mod patterns;
