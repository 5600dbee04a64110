//! Unit tests for the pulse source.

use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};
use proptest::prelude::*;
use tripteron_motion::config::MotorConfig;
use tripteron_motion::error::{Error, MotorError};
use tripteron_motion::motor::{Direction, Motor};
use tripteron_motion::sim::{SimulatedChannel, SimulatedDirectionPin, SimulatedRig};

type SimMotor = Motor<SimulatedChannel, SimulatedDirectionPin, 64>;

fn motor_on(rig: &SimulatedRig) -> SimMotor {
    Motor::new("x", rig.channel(), rig.direction_pin(), &MotorConfig::new(23, 25)).unwrap()
}

#[test]
fn test_direction_set_before_each_move() {
    let rig = SimulatedRig::new();
    let expectations = [
        Transaction::set(State::Low),
        Transaction::set(State::High),
    ];
    let mut dir = PinMock::new(&expectations);

    let mut motor: Motor<_, _, 64> =
        Motor::new("x", rig.channel(), dir.clone(), &MotorConfig::new(23, 25)).unwrap();
    motor.move_steps(Direction::CounterClockwise, 10, true).unwrap();
    motor.move_steps(Direction::Clockwise, 0, true).unwrap();
    motor.move_steps(Direction::Clockwise, 5, true).unwrap();
    drop(motor);

    dir.done();
}

#[test]
fn test_direction_held_while_pulses_pending() {
    let rig = SimulatedRig::new();
    let expectations = [Transaction::set(State::Low)];
    let mut dir = PinMock::new(&expectations);

    let mut motor: Motor<_, _, 64> =
        Motor::new("x", rig.channel(), dir.clone(), &MotorConfig::new(23, 25)).unwrap();
    motor.move_steps(Direction::CounterClockwise, 10, false).unwrap();
    rig.stall(true);

    // The reversal waits for the queued pulses and never touches the line.
    let result = motor.move_steps(Direction::Clockwise, 5, false);
    assert_eq!(
        result,
        Err(Error::Motor(MotorError::WaitTimeout { pending_pulses: 10 }))
    );
    assert_eq!(rig.pulses(), 10);
    drop(motor);

    dir.done();
}

#[test]
fn test_inverted_direction_line() {
    let rig = SimulatedRig::new();
    let expectations = [Transaction::set(State::Low)];
    let mut dir = PinMock::new(&expectations);

    let config = MotorConfig::new(23, 25).with_inverted_direction(true);
    let mut motor: Motor<_, _, 64> = Motor::new("x", rig.channel(), dir.clone(), &config).unwrap();
    motor.move_steps(Direction::Clockwise, 3, false).unwrap();
    drop(motor);

    dir.done();
}

#[test]
fn test_every_pulse_uses_precomputed_symbol() {
    let rig = SimulatedRig::new();
    let mut motor = motor_on(&rig);

    motor.move_steps(Direction::Clockwise, 1, true).unwrap();
    assert_eq!(rig.last_symbol(), Some(motor.pulse_symbol()));
    assert_eq!(motor.pulse_symbol().high_ticks, 10_000);
}

#[test]
fn test_stalled_channel_times_out() {
    let rig = SimulatedRig::new();
    let mut motor = motor_on(&rig);
    rig.stall(true);

    let result = motor.move_steps(Direction::Clockwise, 10, true);
    assert_eq!(
        result,
        Err(Error::Motor(MotorError::WaitTimeout { pending_pulses: 10 }))
    );
}

#[test]
fn test_stop_interrupts_chunked_move() {
    let rig = SimulatedRig::new().with_carriage_at(1000);
    let mut motor = motor_on(&rig);
    rig.stop_on_chunk(2, motor.stop_handle());

    let result = motor.move_steps(Direction::CounterClockwise, 500, true);
    assert_eq!(result, Err(Error::Motor(MotorError::Halted)));
    assert_eq!(rig.pulses(), 128);

    // The channel is re-armed, so the motor remains usable.
    motor.move_steps(Direction::CounterClockwise, 10, true).unwrap();
    assert_eq!(rig.pulses(), 138);
}

proptest! {
    /// A move is split into ceil(steps / N) chunks that add up to the request.
    #[test]
    fn prop_chunks_cover_request(steps in 1u32..2_000, synchronous in any::<bool>()) {
        let rig = SimulatedRig::new();
        let mut motor = motor_on(&rig);

        motor.move_steps(Direction::CounterClockwise, steps, synchronous).unwrap();

        let chunks = rig.chunks();
        prop_assert_eq!(chunks.len() as u32, (steps + 63) / 64);
        prop_assert_eq!(chunks.iter().sum::<usize>() as u32, steps);
        prop_assert!(chunks.iter().all(|&c| (1..=64).contains(&c)));
        prop_assert!(chunks[..chunks.len() - 1].iter().all(|&c| c == 64));
    }
}
