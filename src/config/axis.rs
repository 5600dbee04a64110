//! Axis configuration from TOML.

use core::time::Duration;

use heapless::String;
use serde::Deserialize;

/// Pull bias configured on the end-of-travel sensor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pull {
    /// Floating input.
    #[default]
    None,
    /// Internal pull-up; the switch pulls the line low.
    Up,
    /// Internal pull-down; the switch pulls the line high.
    Down,
}

/// Axis configuration: one motor plus its end-of-travel sensor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AxisConfig {
    /// Motor name (must match a motor in config).
    pub motor: String<16>,

    /// GPIO of the end-of-travel sensor.
    pub sensor_pin: u8,

    /// Pull bias of the sensor input.
    #[serde(default)]
    pub pull: Pull,

    /// Increment used by both homing phases, in steps.
    #[serde(default = "default_calibration_step")]
    pub calibration_step: u32,

    /// Switch settle time after arming the sensor.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u32,

    /// Ceiling for each homing phase, in steps.
    #[serde(default = "default_max_homing_steps")]
    pub max_homing_steps: u32,

    /// Whether the coordinator drives this axis.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_calibration_step() -> u32 {
    50
}

fn default_settle_ms() -> u32 {
    250
}

fn default_max_homing_steps() -> u32 {
    200_000
}

fn default_enabled() -> bool {
    true
}

impl AxisConfig {
    /// Axis driven by `motor` with the sensor on `sensor_pin`.
    pub fn new(motor: &str, sensor_pin: u8, pull: Pull) -> Self {
        Self {
            motor: crate::error::message(motor),
            sensor_pin,
            pull,
            calibration_step: default_calibration_step(),
            settle_ms: default_settle_ms(),
            max_homing_steps: default_max_homing_steps(),
            enabled: default_enabled(),
        }
    }

    /// Set the homing increment.
    pub fn with_calibration_step(mut self, steps: u32) -> Self {
        self.calibration_step = steps;
        self
    }

    /// Set the homing ceiling.
    pub fn with_max_homing_steps(mut self, steps: u32) -> Self {
        self.max_homing_steps = steps;
        self
    }

    /// Set the sensor settle time.
    pub fn with_settle_ms(mut self, ms: u32) -> Self {
        self.settle_ms = ms;
        self
    }

    /// Settle time as a duration.
    pub fn settle(&self) -> Duration {
        Duration::from_millis(u64::from(self.settle_ms))
    }
}
