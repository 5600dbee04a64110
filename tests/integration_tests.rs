//! Integration tests for tripteron-motion.
//!
//! These tests drive complete axes and coordinators on the simulated rig,
//! and exercise the task layer with real threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal_mock::eh1::delay::NoopDelay;
use tripteron_motion::axis::HomingPhase;
use tripteron_motion::config::{AxisConfig, CoordinatorConfig, MotorConfig, Percent, Pull};
use tripteron_motion::coordinator::AxisControl;
use tripteron_motion::error::{AxisError, CoordinatorError, Error, MotorError, Result};
use tripteron_motion::motor::{Halt, Motor, StopHandle};
use tripteron_motion::sim::{SimulatedChannel, SimulatedDirectionPin, SimulatedEndSensor, SimulatedRig};
use tripteron_motion::task::{current_name, AperiodicTask, PeriodicTask, SoftwareEvent, TaskConfig};
use tripteron_motion::{Axis, Tripteron, Waypoint};

// =============================================================================
// Helpers
// =============================================================================

type SimAxis = Axis<SimulatedChannel, SimulatedDirectionPin, SimulatedEndSensor, NoopDelay, 64>;

fn sim_axis_with(rig: &SimulatedRig, name: &str, config: AxisConfig) -> SimAxis {
    let motor =
        Motor::new(name, rig.channel(), rig.direction_pin(), &MotorConfig::new(23, 25)).unwrap();
    Axis::new(name, motor, rig.end_sensor(config.pull), NoopDelay::new(), &config).unwrap()
}

fn sim_axis(rig: &SimulatedRig, name: &str) -> SimAxis {
    sim_axis_with(rig, name, AxisConfig::new(name, 14, Pull::Up).with_settle_ms(0))
}

fn calibrated_at(rig: &SimulatedRig, name: &str, position: u16) -> SimAxis {
    let mut axis = sim_axis(rig, name);
    axis.set_calibration(1000);
    axis.move_to(Percent(position), true).unwrap();
    rig.clear_log();
    axis
}

/// Stop flag shared between a scripted axis and its stop handles.
struct StopFlag {
    name: String,
    stopped: AtomicBool,
}

impl Halt for StopFlag {
    fn halt(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Axis whose moves take a fixed time and are logged on completion.
struct ScriptedAxis {
    flag: Arc<StopFlag>,
    work: Duration,
    panics: bool,
    fails: bool,
    position: Percent,
    log: Arc<Mutex<Vec<(String, u16)>>>,
}

impl ScriptedAxis {
    fn new(name: &str, work: Duration, log: &Arc<Mutex<Vec<(String, u16)>>>) -> Self {
        Self {
            flag: Arc::new(StopFlag {
                name: name.to_owned(),
                stopped: AtomicBool::new(false),
            }),
            work,
            panics: false,
            fails: false,
            position: Percent::REST,
            log: Arc::clone(log),
        }
    }

    fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    fn failing(mut self) -> Self {
        self.fails = true;
        self
    }

    fn stopped(&self) -> Arc<StopFlag> {
        Arc::clone(&self.flag)
    }
}

impl AxisControl for ScriptedAxis {
    fn name(&self) -> &str {
        &self.flag.name
    }

    fn move_to(&mut self, target: Percent, _synchronous: bool) -> Result<()> {
        if self.panics {
            panic!("driver fault on {}", self.flag.name);
        }
        if !target.is_valid() {
            return Err(AxisError::TargetOutOfRange(target.0).into());
        }
        if self.fails {
            return Err(MotorError::WaitTimeout { pending_pulses: 1 }.into());
        }

        let deadline = Instant::now() + self.work;
        while Instant::now() < deadline {
            if self.flag.stopped.load(Ordering::SeqCst) {
                return Err(MotorError::Halted.into());
            }
            thread::sleep(Duration::from_millis(1));
        }

        self.position = target;
        self.log.lock().unwrap().push((self.flag.name.clone(), target.0));
        Ok(())
    }

    fn calibrate(&mut self) -> Result<u32> {
        self.move_to(Percent::REST, true)?;
        Ok(1000)
    }

    fn position(&self) -> Percent {
        self.position
    }

    fn stop_handle(&self) -> StopHandle {
        StopHandle::new(self.flag.clone())
    }
}

// =============================================================================
// Axis moves
// =============================================================================

#[test]
fn axis_out_of_range_target_is_rejected() {
    let rig = SimulatedRig::new();
    let mut axis = calibrated_at(&rig, "x", 40);

    let result = axis.move_to(Percent(150), false);

    assert_eq!(result, Err(Error::Axis(AxisError::TargetOutOfRange(150))));
    assert!(result.unwrap_err().is_rejection());
    assert_eq!(axis.position(), Percent(40));
    assert_eq!(rig.pulses(), 0);
}

#[test]
fn axis_repeated_move_issues_no_pulses() {
    let rig = SimulatedRig::new();
    let mut axis = calibrated_at(&rig, "x", 0);

    axis.move_to(Percent(30), true).unwrap();
    assert_eq!(rig.pulses(), 300);

    rig.clear_log();
    axis.move_to(Percent(30), true).unwrap();
    assert_eq!(rig.pulses(), 0);
    assert!(rig.chunks().is_empty());
}

#[test]
fn axis_direction_follows_sign_of_delta() {
    let rig = SimulatedRig::new();
    let mut axis = calibrated_at(&rig, "x", 50);
    let start = rig.carriage();

    axis.move_to(Percent(60), true).unwrap();
    assert_eq!(rig.carriage(), start + 100);

    axis.move_to(Percent(20), true).unwrap();
    assert_eq!(rig.carriage(), start - 300);
}

#[test]
fn axis_asynchronous_move_commits_on_issue() {
    let rig = SimulatedRig::new();
    let mut axis = calibrated_at(&rig, "x", 0);

    axis.move_to(Percent(90), false).unwrap();
    assert_eq!(axis.position(), Percent(90));
    axis.wait().unwrap();
    assert_eq!(rig.pulses(), 900);
}

#[test]
fn axis_halted_move_drops_calibration() {
    let rig = SimulatedRig::new();
    let mut axis = calibrated_at(&rig, "x", 0);
    rig.stop_on_chunk(2, axis.stop_handle());

    let result = axis.move_to(Percent(100), true);

    assert_eq!(result, Err(Error::Motor(MotorError::Halted)));
    assert_eq!(axis.position(), Percent(0));
    assert!(!axis.is_calibrated());
    assert_eq!(
        axis.move_to(Percent(10), true),
        Err(Error::Axis(AxisError::NotCalibrated))
    );
}

// =============================================================================
// Axis calibration
// =============================================================================

#[test]
fn calibration_measures_travel_and_parks_at_rest() {
    let rig = SimulatedRig::new().with_carriage_at(3000);
    let mut axis = sim_axis(&rig, "x");

    let steps = axis.calibrate().unwrap();

    assert_eq!(steps, 3050);
    assert_eq!(axis.calibration(), 3050);
    assert_eq!(axis.position(), Percent::REST);
    assert_eq!(rig.carriage(), 1525);
}

#[test]
fn calibration_round_trip_matches_constant() {
    let rig = SimulatedRig::new().with_carriage_at(2000);
    let mut axis = sim_axis(&rig, "x");
    let steps = axis.calibrate().unwrap();

    axis.move_to(Percent::MIN, true).unwrap();
    rig.clear_log();
    axis.move_to(Percent::FULL, true).unwrap();
    assert_eq!(rig.pulses(), u64::from(steps));

    rig.clear_log();
    axis.move_to(Percent::MIN, true).unwrap();
    assert_eq!(rig.pulses(), u64::from(steps));
    assert_eq!(rig.carriage(), 0);
}

#[test]
fn calibration_starting_on_sensor_clears_it_first() {
    let rig = SimulatedRig::new().with_sensor_zone(120);
    let mut axis = sim_axis_with(
        &rig,
        "x",
        AxisConfig::new("x", 14, Pull::Down).with_settle_ms(0),
    );

    let steps = axis.calibrate().unwrap();

    // Cleared at 150, re-triggered at 100.
    assert_eq!(steps, 50);
    assert!(axis.is_calibrated());
}

#[test]
fn calibration_gives_up_when_sensor_never_triggers() {
    let rig = SimulatedRig::new().with_carriage_at(3000);
    let config = AxisConfig::new("x", 14, Pull::Up)
        .with_settle_ms(0)
        .with_max_homing_steps(1000);
    let mut axis = sim_axis_with(&rig, "x", config);
    rig.force_sensor(Some(false));

    let result = axis.calibrate();

    assert_eq!(
        result,
        Err(Error::Axis(AxisError::CalibrationTimeout {
            phase: HomingPhase::Seeking,
            steps: 1000
        }))
    );
    assert!(!axis.is_calibrated());
}

#[test]
fn calibration_gives_up_when_sensor_never_clears() {
    let rig = SimulatedRig::new();
    let config = AxisConfig::new("x", 14, Pull::Up)
        .with_settle_ms(0)
        .with_max_homing_steps(500);
    let mut axis = sim_axis_with(&rig, "x", config);
    rig.force_sensor(Some(true));

    let result = axis.calibrate();

    assert!(matches!(
        result,
        Err(Error::Axis(AxisError::CalibrationTimeout {
            phase: HomingPhase::Clearing,
            ..
        }))
    ));
    assert_eq!(rig.pulses(), 500);
}

#[test]
fn calibration_reports_sensor_fault() {
    let rig = SimulatedRig::new().with_carriage_at(500);
    let mut axis = sim_axis(&rig, "x");
    rig.fail_sensor();

    assert_eq!(axis.calibrate(), Err(Error::Axis(AxisError::Sensor)));
}

// =============================================================================
// Coordinator on simulated axes
// =============================================================================

#[test]
fn coordinator_visits_waypoints_then_rests() {
    let (rig_x, rig_y) = (SimulatedRig::new(), SimulatedRig::new());
    let x = calibrated_at(&rig_x, "x", 30);
    let y = calibrated_at(&rig_y, "y", 70);
    let mut robot = Tripteron::new([x, y], &CoordinatorConfig::default()).unwrap();
    assert_eq!(robot.position(), [Percent(30), Percent(70)]);

    robot
        .move_through(&[Waypoint::new(80, 20), Waypoint::new(10, 10)])
        .unwrap();

    assert_eq!(robot.position(), [Percent::REST, Percent::REST]);
    assert_eq!(rig_x.carriage(), 500);
    assert_eq!(rig_y.carriage(), 500);
    // 30 -> 80 -> 10 -> 50, at 10 steps per percent.
    assert_eq!(rig_x.pulses(), 500 + 700 + 400);
    assert_eq!(robot.monitor().snapshot().as_slice(), &[Percent::REST, Percent::REST]);
}

#[test]
fn coordinator_calibrates_all_axes() {
    let rig_x = SimulatedRig::new().with_carriage_at(3000);
    let rig_y = SimulatedRig::new().with_carriage_at(1000);
    let mut robot = Tripteron::new(
        [sim_axis(&rig_x, "x"), sim_axis(&rig_y, "y")],
        &CoordinatorConfig::default(),
    )
    .unwrap();

    let constants = robot.calibrate().unwrap();

    assert_eq!(constants, [3050, 1050]);
    assert_eq!(robot.position(), [Percent::REST, Percent::REST]);
    assert_eq!(rig_y.carriage(), 525);
}

#[test]
fn coordinator_reports_rejected_component_and_continues() {
    let (rig_x, rig_y) = (SimulatedRig::new(), SimulatedRig::new());
    let x = calibrated_at(&rig_x, "x", 30);
    let y = calibrated_at(&rig_y, "y", 30);
    let mut robot = Tripteron::new([x, y], &CoordinatorConfig::default()).unwrap();

    robot
        .move_through(&[Waypoint::new(150, 80), Waypoint::new(40, 40)])
        .unwrap();

    // x stayed at 30 on the rejected step.
    assert_eq!(rig_x.pulses(), 100 + 100);
    assert_eq!(rig_y.pulses(), 500 + 400 + 100);
}

#[test]
fn coordinator_aborts_sequence_on_fault() {
    let (rig_x, rig_y) = (SimulatedRig::new(), SimulatedRig::new());
    let x = calibrated_at(&rig_x, "x", 30);
    let y = calibrated_at(&rig_y, "y", 30);
    let mut robot = Tripteron::new([x, y], &CoordinatorConfig::default()).unwrap();
    rig_x.stall(true);

    let result = robot.move_through(&[Waypoint::new(60, 60), Waypoint::new(90, 90)]);

    assert!(matches!(
        result,
        Err(Error::Motor(MotorError::WaitTimeout { .. }))
    ));
    // y finished the first step only; no further steps, no rest move.
    assert_eq!(rig_y.pulses(), 300);
    assert_eq!(robot.position()[1], Percent(60));
}

#[test]
fn coordinator_rejects_invalid_axis_count() {
    let axes: [ScriptedAxis; 0] = [];
    let result = Tripteron::new(axes, &CoordinatorConfig::default());
    assert!(matches!(
        result,
        Err(Error::Coordinator(CoordinatorError::InvalidAxisCount(0)))
    ));
}

// =============================================================================
// Coordinator barrier semantics
// =============================================================================

#[test]
fn barrier_holds_next_step_until_every_axis_finished() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let slow = ScriptedAxis::new("slow", Duration::from_millis(30), &log);
    let fast = ScriptedAxis::new("fast", Duration::ZERO, &log);
    let mut robot = Tripteron::new([slow, fast], &CoordinatorConfig::default()).unwrap();
    assert_eq!(robot.barrier_count(), 2);

    robot
        .move_through(&[Waypoint::new(10, 20), Waypoint::new(30, 40)])
        .unwrap();

    let log = log.lock().unwrap();
    let targets: Vec<Vec<u16>> = log
        .chunks(2)
        .map(|step| {
            let mut targets: Vec<u16> = step.iter().map(|(_, t)| *t).collect();
            targets.sort_unstable();
            targets
        })
        .collect();
    assert_eq!(targets, vec![vec![10, 20], vec![30, 40], vec![50, 50]]);
    // The fast axis always reports first, yet never runs ahead.
    assert!(log.chunks(2).all(|step| step[0].0 == "fast"));
}

#[test]
fn barrier_timeout_stops_every_axis() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let stuck = ScriptedAxis::new("stuck", Duration::from_secs(10), &log);
    let fine = ScriptedAxis::new("fine", Duration::ZERO, &log);
    let (stuck_flag, fine_flag) = (stuck.stopped(), fine.stopped());
    let config = CoordinatorConfig::default().with_barrier_timeout(Duration::from_millis(50));
    let mut robot = Tripteron::new([stuck, fine], &config).unwrap();

    let started = Instant::now();
    let result = robot.move_through(&[Waypoint::new(10, 10)]);

    assert_eq!(
        result,
        Err(Error::Coordinator(CoordinatorError::BarrierTimeout {
            arrived: 1,
            required: 2
        }))
    );
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(stuck_flag.stopped.load(Ordering::SeqCst));
    assert!(fine_flag.stopped.load(Ordering::SeqCst));
}

#[test]
fn fault_on_one_axis_halts_siblings_mid_move() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let broken = ScriptedAxis::new("broken", Duration::ZERO, &log).failing();
    let slow = ScriptedAxis::new("slow", Duration::from_secs(2), &log);
    let slow_flag = slow.stopped();
    let mut robot = Tripteron::new([broken, slow], &CoordinatorConfig::default()).unwrap();

    let started = Instant::now();
    let result = robot.move_through(&[Waypoint::new(10, 10)]);

    // The root fault is reported, not the sibling's halt.
    assert!(matches!(
        result,
        Err(Error::Motor(MotorError::WaitTimeout { .. }))
    ));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(slow_flag.stopped.load(Ordering::SeqCst));
    assert_eq!(robot.position()[1], Percent::REST);
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn calibration_fault_halts_siblings() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let slow = ScriptedAxis::new("slow", Duration::from_secs(2), &log);
    let broken = ScriptedAxis::new("broken", Duration::ZERO, &log).failing();
    let slow_flag = slow.stopped();
    let mut robot = Tripteron::new([slow, broken], &CoordinatorConfig::default()).unwrap();

    let started = Instant::now();
    let result = robot.calibrate();

    // Axis order puts the halted sibling first; the fault still wins.
    assert!(matches!(
        result,
        Err(Error::Motor(MotorError::WaitTimeout { .. }))
    ));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(slow_flag.stopped.load(Ordering::SeqCst));
}

#[test]
fn panicking_worker_still_releases_barrier() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let broken = ScriptedAxis::new("broken", Duration::ZERO, &log).panicking();
    let fine = ScriptedAxis::new("fine", Duration::ZERO, &log);
    let mut robot = Tripteron::new([broken, fine], &CoordinatorConfig::default()).unwrap();

    let result = robot.move_through(&[Waypoint::new(10, 10)]);

    assert!(matches!(
        result,
        Err(Error::Coordinator(CoordinatorError::WorkerPanicked(name))) if name.as_str() == "broken"
    ));
}

#[test]
fn single_axis_coordinator_ignores_extra_components() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let only = ScriptedAxis::new("x", Duration::ZERO, &log);
    let mut robot = Tripteron::new([only], &CoordinatorConfig::default()).unwrap();

    robot.move_through(&[Waypoint::new(20, 150).with_z(999)]).unwrap();

    let targets: Vec<u16> = log.lock().unwrap().iter().map(|(_, t)| *t).collect();
    assert_eq!(targets, [20, 50]);
}

// =============================================================================
// Task layer
// =============================================================================

#[test]
fn periodic_overrun_counts_one_deadline_miss() {
    let first = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&first);
    let task = PeriodicTask::spawn(&TaskConfig::new("overrun"), Duration::from_millis(20), move || {
        if flag.swap(false, Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(30));
        }
    })
    .unwrap();

    thread::sleep(Duration::from_millis(150));
    let misses = task.stats().deadline_misses();
    let activations = task.stats().activations();
    drop(task);

    assert_eq!(misses, 1);
    assert!(activations >= 4, "only {activations} activations");
}

#[test]
fn periodic_callback_sees_its_task_name() {
    let (tx, rx) = mpsc::channel();
    let task = PeriodicTask::spawn(&TaskConfig::new("sampler"), Duration::from_millis(5), move || {
        let _ = tx.send(current_name());
    })
    .unwrap();

    assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), "sampler");
    drop(task);
}

#[test]
fn aperiodic_burst_coalesces_while_busy() {
    let event = SoftwareEvent::new();
    let (entered_tx, entered_rx) = mpsc::channel();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let task = AperiodicTask::spawn(&TaskConfig::new("button"), event.clone(), move || {
        let _ = entered_tx.send(());
        let _ = gate_rx.recv();
    })
    .unwrap();

    assert!(event.trigger());
    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();

    // Five releases while the callback is still running.
    for _ in 0..5 {
        event.trigger();
    }
    gate_tx.send(()).unwrap();
    entered_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    gate_tx.send(()).unwrap();

    assert!(entered_rx.recv_timeout(Duration::from_millis(100)).is_err());
    let deadline = Instant::now() + Duration::from_secs(2);
    while task.stats().activations() < 2 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(task.stats().activations(), 2);
}

#[test]
fn aperiodic_event_stops_coordinated_move() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let x = ScriptedAxis::new("x", Duration::from_secs(10), &log);
    let y = ScriptedAxis::new("y", Duration::from_secs(10), &log);
    let mut robot = Tripteron::new([x, y], &CoordinatorConfig::default()).unwrap();

    let button = SoftwareEvent::new();
    let estop = robot.emergency_stop();
    let _task = AperiodicTask::spawn(&TaskConfig::new("estop"), button.clone(), move || {
        estop.trigger();
    })
    .unwrap();

    let presser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        button.trigger()
    });

    let result = robot.move_through(&[Waypoint::new(10, 10)]);

    assert!(presser.join().unwrap());
    assert_eq!(result, Err(Error::Motor(MotorError::Halted)));
    assert!(log.lock().unwrap().is_empty());
}
