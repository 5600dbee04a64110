//! Unit tests for configuration validation.

use tripteron_motion::config::{parse_config, validate_config, SystemConfig};
use tripteron_motion::error::{ConfigError, Error};

fn robot(extra: &str) -> String {
    format!(
        r#"
[motors.x]
step_pin = 23
dir_pin = 25

[axes.x]
motor = "x"
sensor_pin = 14
pull = "up"
{extra}
"#
    )
}

#[test]
fn test_valid_minimal_config() {
    let config: SystemConfig = toml::from_str(&robot("")).unwrap();
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_unknown_motor_reference() {
    let result = parse_config(&robot(
        "[axes.y]\nmotor = \"missing\"\nsensor_pin = 12\n",
    ));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::MotorNotFound(name))) if name.as_str() == "missing"
    ));
}

#[test]
fn test_too_many_enabled_axes() {
    let extra = r#"
[axes.y]
motor = "x"
sensor_pin = 12

[axes.z]
motor = "x"
sensor_pin = 13

[axes.w]
motor = "x"
sensor_pin = 15
"#;
    let result = parse_config(&robot(extra));
    assert_eq!(result.err(), Some(Error::Config(ConfigError::InvalidAxisCount(4))));
}

#[test]
fn test_waypoint_out_of_range() {
    let result = parse_config(&robot(
        "[sequences.bad]\nwaypoints = [{ x = 30, y = 150 }]\n",
    ));
    assert_eq!(result.err(), Some(Error::Config(ConfigError::InvalidPercent(150))));
}

#[test]
fn test_empty_sequence() {
    let result = parse_config(&robot("[sequences.idle]\nwaypoints = []\n"));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::EmptySequence(_)))
    ));
}

#[test]
fn test_zero_barrier_timeout() {
    let result = parse_config(&robot("[coordinator]\nbarrier_timeout_ms = 0\n"));
    assert_eq!(result.err(), Some(Error::Config(ConfigError::InvalidBarrierTimeout)));
}

#[test]
fn test_priority_above_scheduler_range() {
    let result = parse_config(&format!("[tasks]\npriority = 40\n{}", robot("")));
    assert_eq!(result.err(), Some(Error::Config(ConfigError::InvalidPriority(40))));
}

#[test]
fn test_homing_step_beyond_ceiling() {
    let result = parse_config(&robot(
        "[axes.y]\nmotor = \"x\"\nsensor_pin = 12\ncalibration_step = 500\nmax_homing_steps = 100\n",
    ));
    assert!(matches!(
        result,
        Err(Error::Config(ConfigError::InvalidCalibrationStep {
            step: 500,
            max_steps: 100
        }))
    ));
}
