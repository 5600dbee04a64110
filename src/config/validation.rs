//! Configuration validation.

use crate::coordinator::MAX_AXES;
use crate::error::{message, ConfigError, Error, Result};
use crate::task::MAX_PRIORITY;

use super::{AxisConfig, MotorConfig, SystemConfig};

/// Validate a system configuration.
///
/// Checks:
/// - Pulse timing is representable by the peripheral
/// - Axes reference existing motors and have sane homing parameters
/// - One to three axes are enabled
/// - Percentages and priorities are in range
/// - Sequences are non-empty
pub fn validate_config(config: &SystemConfig) -> Result<()> {
    if let Some(priority) = config.tasks.priority {
        if priority > MAX_PRIORITY {
            return Err(Error::Config(ConfigError::InvalidPriority(priority)));
        }
    }

    for (_, motor) in config.motors.iter() {
        validate_motor(motor)?;
    }

    for (_, axis) in config.axes.iter() {
        validate_axis(axis, config)?;
    }

    // An empty axis table describes a partial file (motors only); the
    // count check applies once axes are declared.
    let enabled = config.enabled_axes().count();
    if !config.axes.is_empty() && !(1..=MAX_AXES).contains(&enabled) {
        return Err(Error::Config(ConfigError::InvalidAxisCount(enabled)));
    }

    if config.coordinator.barrier_timeout_ms == 0 {
        return Err(Error::Config(ConfigError::InvalidBarrierTimeout));
    }
    if !config.coordinator.rest_position.is_valid() {
        return Err(Error::Config(ConfigError::InvalidPercent(
            config.coordinator.rest_position.0,
        )));
    }

    for (name, sequence) in config.sequences.iter() {
        if sequence.waypoints.is_empty() {
            return Err(Error::Config(ConfigError::EmptySequence(name.clone())));
        }
        for waypoint in sequence.waypoints.iter() {
            if let Some(bad) = waypoint.components().into_iter().find(|p| !p.is_valid()) {
                return Err(Error::Config(ConfigError::InvalidPercent(bad.0)));
            }
        }
    }

    Ok(())
}

fn validate_motor(motor: &MotorConfig) -> Result<()> {
    if motor.step_frequency.0 == 0 {
        return Err(Error::Config(ConfigError::InvalidStepFrequency(0)));
    }

    if !motor.has_valid_timing() {
        return Err(Error::Config(ConfigError::InvalidPulseTiming {
            resolution_hz: motor.resolution.0,
            step_frequency_hz: motor.step_frequency.0,
        }));
    }

    Ok(())
}

fn validate_axis(axis: &AxisConfig, config: &SystemConfig) -> Result<()> {
    if config.motor(axis.motor.as_str()).is_none() {
        return Err(Error::Config(ConfigError::MotorNotFound(message(
            axis.motor.as_str(),
        ))));
    }

    if axis.calibration_step == 0 || axis.max_homing_steps < axis.calibration_step {
        return Err(Error::Config(ConfigError::InvalidCalibrationStep {
            step: axis.calibration_step,
            max_steps: axis.max_homing_steps,
        }));
    }

    Ok(())
}
