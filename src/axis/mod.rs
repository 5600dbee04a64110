//! Axis module for tripteron-motion.
//!
//! Position in percent of travel on top of a [`Motor`](crate::motor::Motor),
//! with sensor-based homing that measures the travel in steps.

mod driver;
mod homing;
mod sensor;

pub use driver::Axis;
pub use homing::{HomingParams, HomingPhase};
pub use sensor::{active_level, EndSensor};
