//! Configuration module for tripteron-motion.
//!
//! Provides types for loading and validating task, motor, axis and
//! coordinator configuration from TOML files (with the `config-file`
//! feature) or values built in code.

mod axis;
mod coordinator;
#[cfg(feature = "config-file")]
mod loader;
mod motor;
mod system;
mod task;
pub mod units;
mod validation;

pub use axis::{AxisConfig, Pull};
pub use coordinator::{CoordinatorConfig, SequenceConfig, MAX_SEQUENCE_WAYPOINTS};
pub use motor::{MotorConfig, MAX_SYMBOL_TICKS};
pub use system::SystemConfig;
pub use task::TaskDefaults;
pub use validation::validate_config;

#[cfg(feature = "config-file")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Hertz, Percent};
