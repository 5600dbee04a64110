//! Stepper pulse source.
//!
//! Generic over an embedded-hal 1.0 direction pin and a [`PulseTrain`]
//! channel that emits the step pulses.

use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::sync::Arc;

use embedded_hal::digital::OutputPin;
use heapless::String;
use tracing::{debug, error, warn};

use crate::config::MotorConfig;
use crate::error::{message, Error, MotorError, Result};

use super::direction::Direction;
use super::pulse::{PulseSymbol, PulseTrain};

/// Default pulse buffer capacity, in symbols.
pub const DEFAULT_PULSE_BUFFER: usize = 1000;

/// Something that can be brought to an immediate stop from any thread.
pub trait Halt: Send + Sync {
    /// Abort all motion now.
    fn halt(&self);

    /// Name used in reports.
    fn name(&self) -> &str;
}

/// Cloneable emergency-stop handle for one motor.
///
/// Usable from any thread while the motor itself is borrowed by a move.
#[derive(Clone)]
pub struct StopHandle {
    target: Arc<dyn Halt>,
}

impl StopHandle {
    /// Wrap a haltable target.
    pub fn new(target: Arc<dyn Halt>) -> Self {
        Self { target }
    }

    /// Abort all motion of the target.
    pub fn stop(&self) {
        self.target.halt();
    }

    /// Name of the target.
    pub fn name(&self) -> &str {
        self.target.name()
    }
}

impl fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StopHandle").field(&self.target.name()).finish()
    }
}

/// Pulse channel shared between a motor and its stop handles.
struct Channel<P> {
    name: String<16>,
    peripheral: P,
    halt_epoch: AtomicU32,
}

impl<P: PulseTrain> Channel<P> {
    fn epoch(&self) -> u32 {
        self.halt_epoch.load(Ordering::Acquire)
    }
}

impl<P: PulseTrain> Halt for Channel<P> {
    fn halt(&self) {
        self.halt_epoch.fetch_add(1, Ordering::AcqRel);
        if let Err(e) = self.peripheral.disable() {
            error!(motor = %self.name, error = ?e, "failed to disable pulse channel");
        }
        if let Err(e) = self.peripheral.enable() {
            error!(motor = %self.name, error = ?e, "failed to re-enable pulse channel");
        }
        warn!(motor = %self.name, "emergency stop");
    }

    fn name(&self) -> &str {
        self.name.as_str()
    }
}

fn peripheral_error<E: fmt::Debug>(e: E) -> Error {
    MotorError::Peripheral(message(&format!("{:?}", e))).into()
}

/// Stepper motor driven by a pulse-train channel.
///
/// Generic over:
/// - `P`: pulse channel (must implement [`PulseTrain`])
/// - `DIR`: direction pin (must implement `OutputPin`)
/// - `N`: pulse buffer capacity; longer moves are issued in chunks of `N`
pub struct Motor<P, DIR, const N: usize = DEFAULT_PULSE_BUFFER>
where
    P: PulseTrain + 'static,
    DIR: OutputPin,
{
    /// Shared pulse channel.
    channel: Arc<Channel<P>>,

    /// DIR pin.
    dir_pin: DIR,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Identical symbols, computed once at construction.
    pulse_buffer: [PulseSymbol; N],

    /// Nominal duration of one pulse.
    pulse_period: Duration,

    /// Slack added to every bounded wait.
    wait_margin: Duration,

    /// Pulses queued since the last completed wait.
    in_flight: u32,
}

impl<P, DIR, const N: usize> Motor<P, DIR, N>
where
    P: PulseTrain + 'static,
    DIR: OutputPin,
{
    const NON_EMPTY_BUFFER: () = assert!(N > 0, "pulse buffer must hold at least one symbol");

    /// Create a motor and arm its pulse channel.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::InvalidTiming` if the configured step frequency
    /// cannot be produced and `MotorError::Peripheral` if the channel
    /// refuses to start. Either is a startup failure.
    pub fn new(name: &str, peripheral: P, dir_pin: DIR, config: &MotorConfig) -> Result<Self> {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY_BUFFER;

        let symbol = PulseSymbol::square(config.resolution, config.step_frequency)?;
        peripheral.enable().map_err(peripheral_error)?;

        let pulse_period = config
            .resolution
            .ticks_to_duration(u64::from(symbol.period_ticks()));

        debug!(
            motor = name,
            half_period_ticks = symbol.high_ticks,
            buffer = N,
            "pulse source ready"
        );

        Ok(Self {
            channel: Arc::new(Channel {
                name: message(name),
                peripheral,
                halt_epoch: AtomicU32::new(0),
            }),
            dir_pin,
            invert_direction: config.invert_direction,
            pulse_buffer: [symbol; N],
            pulse_period,
            wait_margin: config.wait_margin(),
            in_flight: 0,
        })
    }

    /// Get the motor name.
    #[inline]
    pub fn name(&self) -> &str {
        self.channel.name.as_str()
    }

    /// The symbol emitted for every step.
    #[inline]
    pub fn pulse_symbol(&self) -> PulseSymbol {
        self.pulse_buffer[0]
    }

    /// Nominal duration of one step pulse.
    #[inline]
    pub fn pulse_period(&self) -> Duration {
        self.pulse_period
    }

    /// Largest chunk handed to the channel at once.
    #[inline]
    pub const fn buffer_capacity(&self) -> usize {
        N
    }

    /// Emit `steps` pulses in `direction`.
    ///
    /// Waits for the previous move to drain before touching the direction
    /// line, then hands the pulses to the channel in chunks of at most `N`.
    /// With `synchronous`, each chunk is waited for before the next is
    /// queued and the call returns once the last pulse is out.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::Halted` if an emergency stop hits the move,
    /// `MotorError::WaitTimeout` if emission stalls, and pin or peripheral
    /// errors as reported by the drivers.
    pub fn move_steps(&mut self, direction: Direction, steps: u32, synchronous: bool) -> Result<()> {
        if steps == 0 {
            return Ok(());
        }

        self.wait()?;
        self.set_direction(direction)?;

        let epoch = self.channel.epoch();
        let mut remaining = steps;
        while remaining > 0 {
            if self.channel.epoch() != epoch {
                return Err(self.halted(steps - remaining));
            }

            let count = remaining.min(N as u32);
            self.channel
                .peripheral
                .transmit(&self.pulse_buffer[..count as usize])
                .map_err(peripheral_error)?;
            self.in_flight = self.in_flight.saturating_add(count);
            remaining -= count;

            debug!(motor = %self.name(), chunk = count, remaining, "pulses queued");

            if synchronous {
                self.wait()?;
            }
        }

        if synchronous && self.channel.epoch() != epoch {
            return Err(self.halted(steps));
        }

        Ok(())
    }

    /// Block until every queued pulse has been emitted.
    ///
    /// The wait is bounded by twice the nominal emission time of the
    /// queued pulses plus the configured margin.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::WaitTimeout` if the channel does not drain in time.
    pub fn wait(&mut self) -> Result<()> {
        if self.in_flight == 0 {
            return Ok(());
        }

        let timeout = self
            .pulse_period
            .checked_mul(self.in_flight)
            .and_then(|d| d.checked_mul(2))
            .map_or(Duration::MAX, |d| d.saturating_add(self.wait_margin));

        match self.channel.peripheral.wait_all_done(Some(timeout)) {
            Ok(true) => {
                self.in_flight = 0;
                Ok(())
            }
            Ok(false) => {
                error!(motor = %self.name(), pending = self.in_flight, "pulse emission stalled");
                Err(MotorError::WaitTimeout {
                    pending_pulses: self.in_flight,
                }
                .into())
            }
            Err(e) => Err(peripheral_error(e)),
        }
    }

    /// Emergency stop: discard queued and in-flight pulses.
    ///
    /// Abrupt; steps already emitted are not accounted for.
    pub fn stop(&self) {
        self.channel.halt();
    }

    /// Handle that stops this motor from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        let target: Arc<dyn Halt> = self.channel.clone();
        StopHandle::new(target)
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        self.dir_pin
            .set_state(direction.level(self.invert_direction))
            .map_err(|_| MotorError::DirectionPin.into())
    }

    fn halted(&mut self, issued: u32) -> Error {
        warn!(motor = %self.name(), issued, "move interrupted");
        self.in_flight = 0;
        MotorError::Halted.into()
    }
}

impl<P, DIR, const N: usize> Drop for Motor<P, DIR, N>
where
    P: PulseTrain + 'static,
    DIR: OutputPin,
{
    fn drop(&mut self) {
        self.channel.halt_epoch.fetch_add(1, Ordering::AcqRel);
        if let Err(e) = self.channel.peripheral.disable() {
            error!(motor = %self.name(), error = ?e, "failed to release pulse channel");
        }
    }
}

impl<P, DIR, const N: usize> fmt::Debug for Motor<P, DIR, N>
where
    P: PulseTrain + 'static,
    DIR: OutputPin,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Motor")
            .field("name", &self.name())
            .field("symbol", &self.pulse_buffer[0])
            .field("buffer", &N)
            .field("in_flight", &self.in_flight)
            .finish()
    }
}
