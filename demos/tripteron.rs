//! Two-axis tripteron on simulated hardware.
//!
//! Calibrates both axes, then replays a configured waypoint sequence from a
//! periodic task while an interrupt-style task acts as the emergency-stop
//! button.
//!
//! ```text
//! RUST_LOG=tripteron_motion=debug cargo run --example tripteron
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use parking_lot::Mutex;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;
use tripteron_motion::config::{parse_config, SystemConfig};
use tripteron_motion::error::{ConfigError, Error};
use tripteron_motion::sim::{SimulatedChannel, SimulatedDirectionPin, SimulatedEndSensor, SimulatedRig};
use tripteron_motion::task::{AperiodicTask, PeriodicTask, SoftwareEvent, TaskConfig};
use tripteron_motion::{Axis, Motor, Tripteron};

const ROBOT: &str = r#"
[tasks]
name = "sequence"

[motors.x]
step_pin = 23
dir_pin = 25

[motors.y]
step_pin = 22
dir_pin = 26

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

[axes.z]
motor = "z"
sensor_pin = 13
pull = "up"
enabled = false

[coordinator]
barrier_timeout_ms = 10000

[sequences.square]
waypoints = [
    { x = 30, y = 30 },
    { x = 70, y = 30 },
    { x = 70, y = 70 },
    { x = 30, y = 70 },
]
"#;

type SimAxis = Axis<SimulatedChannel, SimulatedDirectionPin, SimulatedEndSensor, HostDelay>;

/// `DelayNs` backed by the OS scheduler.
struct HostDelay;

impl DelayNs for HostDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(u64::from(ns)));
    }
}

fn label(name: &str) -> heapless::String<16> {
    heapless::String::try_from(name).unwrap_or_default()
}

fn build_axis(config: &SystemConfig, name: &str, rig: &SimulatedRig) -> Result<SimAxis, Error> {
    let not_found = || Error::Config(ConfigError::AxisNotFound(label(name)));
    let axis_config = config.axis(name).ok_or_else(not_found)?;
    let motor_config = config.motor_for(name).ok_or_else(not_found)?;

    let motor = Motor::new(name, rig.channel(), rig.direction_pin(), motor_config)?;
    Axis::new(name, motor, rig.end_sensor(axis_config.pull), HostDelay, axis_config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    let config = parse_config(ROBOT)?;
    let names: Vec<&str> = config.enabled_axes().map(|(name, _)| name).collect();
    info!(axes = ?names, "configuration loaded");

    let rig_x = SimulatedRig::new().with_carriage_at(4000);
    let rig_y = SimulatedRig::new().with_carriage_at(2500);
    let x = build_axis(&config, "x", &rig_x)?;
    let y = build_axis(&config, "y", &rig_y)?;

    let mut robot = Tripteron::new([x, y], &config.coordinator)?;
    let constants = robot.calibrate()?;
    info!(?constants, "robot calibrated");

    let monitor = robot.monitor();
    let estop = robot.emergency_stop();
    let robot = Arc::new(Mutex::new(robot));

    let button = SoftwareEvent::new();
    let _estop_task = AperiodicTask::spawn(&TaskConfig::new("estop"), button.clone(), move || {
        estop.trigger();
    })?;

    let square = config
        .sequence("square")
        .cloned()
        .ok_or_else(|| ConfigError::EmptySequence(label("square")))?;
    let driver = {
        let robot = Arc::clone(&robot);
        PeriodicTask::spawn(
            &TaskConfig::from_defaults(&config.tasks),
            Duration::from_millis(500),
            move || {
                if let Err(e) = robot.lock().move_through(square.as_slice()) {
                    error!(error = %e, "sequence aborted");
                }
            },
        )?
    };

    thread::sleep(Duration::from_secs(2));
    info!(position = ?monitor.snapshot(), "pressing emergency stop");
    button.trigger();
    thread::sleep(Duration::from_millis(600));

    let runs = driver.stats().activations();
    let misses = driver.stats().deadline_misses();
    driver.stop();

    info!(
        runs,
        misses,
        position = ?robot.lock().position(),
        carriage_x = rig_x.carriage(),
        carriage_y = rig_y.carriage(),
        "demo finished"
    );
    Ok(())
}
