//! Unit tests for TOML configuration parsing.

use tripteron_motion::config::{parse_config, Hertz, Percent, Pull, SystemConfig};
use tripteron_motion::Waypoint;

const TWO_AXIS_ROBOT: &str = r#"
[tasks]
name = "motion"
priority = 10
stack_size = 16384

[motors.x]
step_pin = 23
dir_pin = 25

[motors.y]
step_pin = 22
dir_pin = 26
step_frequency_hz = 1000
resolution_hz = 1000000
invert_direction = true

[motors.z]
step_pin = 32
dir_pin = 27

[axes.x]
motor = "x"
sensor_pin = 14
pull = "up"

[axes.y]
motor = "y"
sensor_pin = 12
pull = "up"
calibration_step = 25

[axes.z]
motor = "z"
sensor_pin = 13
pull = "up"
enabled = false

[coordinator]
barrier_timeout_ms = 30000

[sequences.square]
waypoints = [
    { x = 30, y = 30 },
    { x = 70, y = 30 },
    { x = 70, y = 70 },
    { x = 30, y = 70 },
]
"#;

/// Test parsing motor defaults and overrides.
#[test]
fn test_parse_motor_config() {
    let config: SystemConfig = toml::from_str(TWO_AXIS_ROBOT).expect("Failed to parse TOML");

    let x = config.motor("x").expect("Motor not found");
    assert_eq!(x.step_pin, 23);
    assert_eq!(x.dir_pin, 25);
    assert_eq!(x.step_frequency, Hertz(500));
    assert_eq!(x.resolution, Hertz::mhz(10));
    assert!(!x.invert_direction);

    let y = config.motor("y").expect("Motor not found");
    assert_eq!(y.step_frequency, Hertz::khz(1));
    assert_eq!(y.resolution, Hertz::mhz(1));
    assert!(y.invert_direction);
    assert_eq!(y.half_period_ticks(), 500);
}

/// Test axis defaults and the disabled third axis.
#[test]
fn test_parse_axis_config() {
    let config = parse_config(TWO_AXIS_ROBOT).expect("Failed to parse config");

    let x = config.axis("x").expect("Axis not found");
    assert_eq!(x.pull, Pull::Up);
    assert_eq!(x.calibration_step, 50);
    assert_eq!(x.settle_ms, 250);
    assert!(x.enabled);

    assert_eq!(config.axis("y").map(|a| a.calibration_step), Some(25));
    assert_eq!(config.motor_for("y").map(|m| m.step_pin), Some(22));

    let enabled: Vec<&str> = config.enabled_axes().map(|(name, _)| name).collect();
    assert_eq!(enabled, ["x", "y"]);
    assert_eq!(config.axis_names().count(), 3);
}

/// Test task defaults and coordinator settings.
#[test]
fn test_parse_tasks_and_coordinator() {
    let config = parse_config(TWO_AXIS_ROBOT).expect("Failed to parse config");

    assert_eq!(config.tasks.name.as_str(), "motion");
    assert_eq!(config.tasks.priority, Some(10));
    assert_eq!(config.tasks.stack_size, Some(16384));
    assert!(!config.tasks.detached);

    assert_eq!(config.coordinator.barrier_timeout_ms, 30_000);
    assert_eq!(config.coordinator.rest_position, Percent::REST);
}

/// Test waypoint sequences with the z component omitted.
#[test]
fn test_parse_sequence() {
    let config = parse_config(TWO_AXIS_ROBOT).expect("Failed to parse config");

    let square = config.sequence("square").expect("Sequence not found");
    assert_eq!(square.as_slice().len(), 4);
    assert_eq!(square.as_slice()[1], Waypoint::new(70, 30));
    assert_eq!(square.as_slice()[1].z, Percent::REST);
    assert_eq!(config.sequence_names().collect::<Vec<_>>(), ["square"]);
}

/// Test that an unknown pull bias is a parse error.
#[test]
fn test_parse_rejects_unknown_pull() {
    let toml_str = r#"
[motors.x]
step_pin = 23
dir_pin = 25

[axes.x]
motor = "x"
sensor_pin = 14
pull = "sideways"
"#;

    assert!(toml::from_str::<SystemConfig>(toml_str).is_err());
}
