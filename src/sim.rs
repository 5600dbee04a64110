//! Simulated hardware for one axis.
//!
//! [`SimulatedRig`] models a carriage on a lead screw with an end sensor at
//! the low end. It hands out a pulse channel, a direction pin and a sensor
//! pin that all act on the same shared carriage, so a complete
//! [`Axis`](crate::axis::Axis) can run on a host without hardware.
//!
//! Pulses move the carriage instantly when queued. A high direction line
//! drives the carriage toward the sensor.

use core::convert::Infallible;
use core::time::Duration;
use std::sync::Arc;

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin, PinState};
use parking_lot::Mutex;
use tracing::trace;

use crate::axis::active_level;
use crate::config::Pull;
use crate::motor::{PulseSymbol, PulseTrain, StopHandle};

/// Failure injected by the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// The channel was used while disabled.
    Disabled,
    /// The sensor line is broken.
    SensorFault,
}

impl digital::Error for SimError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug)]
struct RigState {
    carriage: i64,
    sensor_zone: i64,
    direction: PinState,
    enabled: bool,
    stalled: bool,
    stall_from_chunk: Option<usize>,
    forced_sensor: Option<bool>,
    sensor_fault: bool,
    pulses: u64,
    chunks: Vec<usize>,
    halts: u32,
    last_symbol: Option<PulseSymbol>,
    stop_on_chunk: Option<(usize, StopHandle)>,
}

impl RigState {
    fn sensor_active(&self) -> bool {
        self.forced_sensor.unwrap_or(self.carriage <= self.sensor_zone)
    }
}

/// Shared state of one simulated axis.
///
/// Clones observe the same carriage.
#[derive(Debug, Clone)]
pub struct SimulatedRig {
    state: Arc<Mutex<RigState>>,
}

impl Default for SimulatedRig {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedRig {
    /// Carriage resting on the sensor at position 0.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(RigState {
                carriage: 0,
                sensor_zone: 0,
                direction: PinState::Low,
                enabled: false,
                stalled: false,
                stall_from_chunk: None,
                forced_sensor: None,
                sensor_fault: false,
                pulses: 0,
                chunks: Vec::new(),
                halts: 0,
                last_symbol: None,
                stop_on_chunk: None,
            })),
        }
    }

    /// Start with the carriage `steps` away from the sensor end.
    pub fn with_carriage_at(self, steps: i64) -> Self {
        self.state.lock().carriage = steps;
        self
    }

    /// The sensor reads active while the carriage is at or below `steps`.
    pub fn with_sensor_zone(self, steps: i64) -> Self {
        self.state.lock().sensor_zone = steps;
        self
    }

    /// Pulse channel driving this carriage.
    pub fn channel(&self) -> SimulatedChannel {
        SimulatedChannel { rig: self.clone() }
    }

    /// Direction line of this carriage's motor.
    pub fn direction_pin(&self) -> SimulatedDirectionPin {
        SimulatedDirectionPin { rig: self.clone() }
    }

    /// End sensor input wired with `pull`.
    pub fn end_sensor(&self, pull: Pull) -> SimulatedEndSensor {
        SimulatedEndSensor {
            rig: self.clone(),
            active: active_level(pull),
        }
    }

    /// Carriage position in steps from the sensor end.
    pub fn carriage(&self) -> i64 {
        self.state.lock().carriage
    }

    /// Total pulses emitted.
    pub fn pulses(&self) -> u64 {
        self.state.lock().pulses
    }

    /// Size of every chunk handed to the channel, in order.
    pub fn chunks(&self) -> Vec<usize> {
        self.state.lock().chunks.clone()
    }

    /// Number of times the channel was disabled.
    pub fn halts(&self) -> u32 {
        self.state.lock().halts
    }

    /// Whether the channel is armed.
    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Symbol of the most recent chunk.
    pub fn last_symbol(&self) -> Option<PulseSymbol> {
        self.state.lock().last_symbol
    }

    /// Current direction line level.
    pub fn direction_level(&self) -> PinState {
        self.state.lock().direction
    }

    /// Forget recorded pulses and chunks.
    pub fn clear_log(&self) {
        let mut state = self.state.lock();
        state.pulses = 0;
        state.chunks.clear();
    }

    /// Pin the sensor reading regardless of the carriage, or release it.
    pub fn force_sensor(&self, active: Option<bool>) {
        self.state.lock().forced_sensor = active;
    }

    /// Make every sensor read fail.
    pub fn fail_sensor(&self) {
        self.state.lock().sensor_fault = true;
    }

    /// Make the channel never report completion.
    pub fn stall(&self, stalled: bool) {
        self.state.lock().stalled = stalled;
    }

    /// Stall once the `chunk`-th transmission (1-based) has been accepted.
    pub fn stall_from_chunk(&self, chunk: usize) {
        self.state.lock().stall_from_chunk = Some(chunk);
    }

    /// Fire `handle` right after the `chunk`-th transmission (1-based).
    pub fn stop_on_chunk(&self, chunk: usize, handle: StopHandle) {
        self.state.lock().stop_on_chunk = Some((chunk, handle));
    }
}

/// [`PulseTrain`] that moves the rig's carriage.
#[derive(Debug)]
pub struct SimulatedChannel {
    rig: SimulatedRig,
}

impl PulseTrain for SimulatedChannel {
    type Error = SimError;

    fn transmit(&self, symbols: &[PulseSymbol]) -> Result<(), Self::Error> {
        let trigger = {
            let mut state = self.rig.state.lock();
            if !state.enabled {
                return Err(SimError::Disabled);
            }

            let count = symbols.len();
            let travel = count as i64;
            match state.direction {
                PinState::High => state.carriage -= travel,
                PinState::Low => state.carriage += travel,
            }
            state.pulses += count as u64;
            state.chunks.push(count);
            state.last_symbol = symbols.last().copied();
            trace!(count, carriage = state.carriage, "simulated chunk");

            let chunk = state.chunks.len();
            if state.stall_from_chunk.is_some_and(|at| chunk >= at) {
                state.stalled = true;
            }
            match state.stop_on_chunk.take() {
                Some((at, handle)) if at == chunk => Some(handle),
                pending => {
                    state.stop_on_chunk = pending;
                    None
                }
            }
        };

        // Halting re-enters the channel, so the lock must be released first.
        if let Some(handle) = trigger {
            handle.stop();
        }
        Ok(())
    }

    fn wait_all_done(&self, _timeout: Option<Duration>) -> Result<bool, Self::Error> {
        Ok(!self.rig.state.lock().stalled)
    }

    fn disable(&self) -> Result<(), Self::Error> {
        let mut state = self.rig.state.lock();
        state.enabled = false;
        state.halts += 1;
        Ok(())
    }

    fn enable(&self) -> Result<(), Self::Error> {
        self.rig.state.lock().enabled = true;
        Ok(())
    }
}

/// Direction line of the simulated motor.
#[derive(Debug)]
pub struct SimulatedDirectionPin {
    rig: SimulatedRig,
}

impl ErrorType for SimulatedDirectionPin {
    type Error = Infallible;
}

impl OutputPin for SimulatedDirectionPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.rig.state.lock().direction = PinState::Low;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.rig.state.lock().direction = PinState::High;
        Ok(())
    }
}

/// End sensor input of the simulated axis.
#[derive(Debug)]
pub struct SimulatedEndSensor {
    rig: SimulatedRig,
    active: PinState,
}

impl ErrorType for SimulatedEndSensor {
    type Error = SimError;
}

impl InputPin for SimulatedEndSensor {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let state = self.rig.state.lock();
        if state.sensor_fault {
            return Err(SimError::SensorFault);
        }
        let level_is_active_high = self.active == PinState::High;
        Ok(state.sensor_active() == level_is_active_high)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
