//! Homing parameters and phases.

use core::fmt;
use core::time::Duration;

use crate::config::AxisConfig;
use crate::error::{ConfigError, Result};

/// Stage of the homing procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomingPhase {
    /// Waiting for the freshly armed sensor to settle.
    Settling,
    /// Stepping away from the sensor until it releases.
    Clearing,
    /// Stepping back toward the sensor and counting until it triggers.
    Seeking,
    /// Moving to the resting pose with the new calibration.
    Resting,
}

impl fmt::Display for HomingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HomingPhase::Settling => "settling",
            HomingPhase::Clearing => "clearing",
            HomingPhase::Seeking => "seeking",
            HomingPhase::Resting => "resting",
        };
        f.write_str(name)
    }
}

/// Increment, ceiling and settle time used by [`calibrate`](super::Axis::calibrate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HomingParams {
    /// Steps issued per sensor check.
    pub step: u32,
    /// Steps after which a phase gives up.
    pub max_steps: u32,
    /// Sensor settle time.
    pub settle: Duration,
}

impl HomingParams {
    /// Parameters from an axis configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidCalibrationStep` for a zero increment or
    /// one larger than the ceiling.
    pub fn from_config(config: &AxisConfig) -> Result<Self> {
        if config.calibration_step == 0 || config.calibration_step > config.max_homing_steps {
            return Err(ConfigError::InvalidCalibrationStep {
                step: config.calibration_step,
                max_steps: config.max_homing_steps,
            }
            .into());
        }

        Ok(Self {
            step: config.calibration_step,
            max_steps: config.max_homing_steps,
            settle: config.settle(),
        })
    }
}
