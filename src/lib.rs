//! # tripteron-motion
//!
//! Real-time task layer and barrier-synchronized multi-axis stepper motion
//! for parallel robots, with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Task layer**: periodic tasks with deadline monitoring and
//!   period-derived priorities, interrupt-released aperiodic tasks
//! - **Pulse-train motors**: step pulses emitted by a peripheral in chunks,
//!   bounded waits, emergency stop from any thread
//! - **Axes in percent of travel**: sensor-based homing measures the travel
//! - **Coordinated moves**: one thread per axis, rendezvous on a barrier
//!   before every waypoint
//! - **Configuration-driven**: motors, axes and sequences in TOML files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tripteron_motion::{Axis, Motor, Tripteron, Waypoint};
//!
//! let config = tripteron_motion::load_config("robot.toml")?;
//!
//! let x = Axis::new("x", Motor::new("x", rmt_x, dir_x, config.motor_for("x").unwrap())?,
//!                   sensor_x, delay, config.axis("x").unwrap())?;
//! let y = /* ... */;
//!
//! let mut robot = Tripteron::new([x, y], &config.coordinator)?;
//! robot.calibrate()?;
//! robot.move_through(config.sequence("square").unwrap().as_slice())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `config-file` (default): Enables TOML parsing and file loading

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Error payloads are fixed-capacity strings
#![allow(clippy::result_large_err)]

// Core modules
pub mod axis;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod motor;
pub mod sim;
pub mod task;

// Re-exports for ergonomic API
pub use axis::{Axis, HomingPhase};
pub use config::{validate_config, AxisConfig, CoordinatorConfig, MotorConfig, SystemConfig};
pub use coordinator::{AxisControl, EmergencyStop, PositionMonitor, Tripteron, Waypoint, MAX_AXES};
pub use error::{Error, Result};
pub use motor::{Direction, Motor, PulseSymbol, PulseTrain, StopHandle};
pub use task::{AperiodicTask, Event, PeriodicTask, Priority, SoftwareEvent, TaskConfig};

// Configuration loading
#[cfg(feature = "config-file")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Hertz, Percent};
