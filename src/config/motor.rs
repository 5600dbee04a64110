//! Pulse source configuration from TOML.

use core::time::Duration;

use serde::Deserialize;

use super::units::Hertz;
use crate::motor::PulseTrainConfig;

/// Largest half-period a pulse symbol can hold, in peripheral ticks.
pub const MAX_SYMBOL_TICKS: u32 = 0x7FFF;

/// Complete motor configuration from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MotorConfig {
    /// GPIO carrying the step pulse train.
    pub step_pin: u8,

    /// GPIO carrying the direction level.
    pub dir_pin: u8,

    /// Timebase of the pulse peripheral.
    #[serde(default = "default_resolution", rename = "resolution_hz")]
    pub resolution: Hertz,

    /// Target step rate.
    #[serde(default = "default_step_frequency", rename = "step_frequency_hz")]
    pub step_frequency: Hertz,

    /// Drive the direction line low for clockwise instead of high.
    #[serde(default)]
    pub invert_direction: bool,

    /// Slack added to every bounded wait on the peripheral.
    #[serde(default = "default_wait_margin_ms")]
    pub wait_margin_ms: u32,
}

fn default_resolution() -> Hertz {
    Hertz::mhz(10)
}

fn default_step_frequency() -> Hertz {
    Hertz(500)
}

fn default_wait_margin_ms() -> u32 {
    100
}

impl MotorConfig {
    /// Motor on the given pins with the default 500 Hz / 10 MHz timing.
    pub fn new(step_pin: u8, dir_pin: u8) -> Self {
        Self {
            step_pin,
            dir_pin,
            resolution: default_resolution(),
            step_frequency: default_step_frequency(),
            invert_direction: false,
            wait_margin_ms: default_wait_margin_ms(),
        }
    }

    /// Set the step rate.
    pub fn with_step_frequency(mut self, frequency: Hertz) -> Self {
        self.step_frequency = frequency;
        self
    }

    /// Set the peripheral timebase.
    pub fn with_resolution(mut self, resolution: Hertz) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set direction inversion.
    pub fn with_inverted_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Half of one step period in peripheral ticks (0 if the frequency is 0).
    pub fn half_period_ticks(&self) -> u32 {
        match self.step_frequency.0 {
            0 => 0,
            f => self.resolution.0 / (f.saturating_mul(2)),
        }
    }

    /// Whether the step period is representable by one pulse symbol.
    pub fn has_valid_timing(&self) -> bool {
        (1..=MAX_SYMBOL_TICKS).contains(&self.half_period_ticks())
    }

    /// Slack added to bounded waits.
    pub fn wait_margin(&self) -> Duration {
        Duration::from_millis(u64::from(self.wait_margin_ms))
    }

    /// Parameters the board layer needs to bring up the pulse peripheral.
    pub fn pulse_train(&self) -> PulseTrainConfig {
        PulseTrainConfig {
            pin: self.step_pin,
            resolution: self.resolution,
        }
    }
}
