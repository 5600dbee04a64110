//! One linear degree of freedom.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::String;
use tracing::{debug, info, warn};

use crate::config::{AxisConfig, Percent};
use crate::error::{message, AxisError, Error, MotorError, Result};
use crate::motor::{Direction, Motor, PulseTrain, StopHandle, DEFAULT_PULSE_BUFFER};

use super::homing::{HomingParams, HomingPhase};
use super::sensor::EndSensor;

/// Rotational sense that increases the percentage (away from the sensor).
const OUTWARD: Direction = Direction::CounterClockwise;

/// Rotational sense that drives the carriage toward the sensor.
const HOMEWARD: Direction = Direction::Clockwise;

/// A motor plus an end-of-travel sensor, positioned in percent of travel.
///
/// 0 % is the sensor end. Moving to a larger percentage runs the motor
/// [`Direction::CounterClockwise`], toward the sensor [`Direction::Clockwise`].
///
/// Generic over:
/// - `P`, `DIR`, `N`: see [`Motor`]
/// - `S`: end sensor input (must implement `InputPin`)
/// - `DELAY`: delay provider for sensor settling (must implement `DelayNs`)
pub struct Axis<P, DIR, S, DELAY, const N: usize = DEFAULT_PULSE_BUFFER>
where
    P: PulseTrain + 'static,
    DIR: OutputPin,
    S: InputPin,
    DELAY: DelayNs,
{
    name: String<16>,
    motor: Motor<P, DIR, N>,
    sensor: EndSensor<S>,
    delay: DELAY,
    homing: HomingParams,

    /// Last committed position.
    position: Percent,

    /// Steps for 100 % travel, 0 until calibrated.
    calibration: u32,
}

impl<P, DIR, S, DELAY, const N: usize> Axis<P, DIR, S, DELAY, N>
where
    P: PulseTrain + 'static,
    DIR: OutputPin,
    S: InputPin,
    DELAY: DelayNs,
{
    /// Assemble an uncalibrated axis.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidCalibrationStep` if the homing
    /// parameters are unusable.
    pub fn new(
        name: &str,
        motor: Motor<P, DIR, N>,
        sensor_pin: S,
        delay: DELAY,
        config: &AxisConfig,
    ) -> Result<Self> {
        let homing = HomingParams::from_config(config)?;

        Ok(Self {
            name: message(name),
            motor,
            sensor: EndSensor::new(sensor_pin, config.pull),
            delay,
            homing,
            position: Percent::MIN,
            calibration: 0,
        })
    }

    /// Get the axis name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Last committed position.
    ///
    /// Meaningful only once calibrated.
    #[inline]
    pub fn position(&self) -> Percent {
        self.position
    }

    /// Steps corresponding to 100 % travel, 0 if uncalibrated.
    #[inline]
    pub fn calibration(&self) -> u32 {
        self.calibration
    }

    /// Whether a calibration constant is installed.
    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.calibration > 0
    }

    /// Install a known calibration constant without homing.
    ///
    /// The carriage is assumed to be at the current committed position.
    pub fn set_calibration(&mut self, steps: u32) {
        self.calibration = steps;
    }

    /// Homing parameters in use.
    pub fn homing(&self) -> &HomingParams {
        &self.homing
    }

    /// Underlying motor.
    pub fn motor(&self) -> &Motor<P, DIR, N> {
        &self.motor
    }

    /// Move to `target` percent of travel.
    ///
    /// The position is committed once the pulses are issued (and, with
    /// `synchronous`, emitted). A zero delta issues nothing.
    ///
    /// # Errors
    ///
    /// Rejections leave the axis untouched: `AxisError::TargetOutOfRange`
    /// above 100 % and `AxisError::NotCalibrated` before calibration.
    /// A halted move returns `MotorError::Halted` and drops the calibration.
    pub fn move_to(&mut self, target: Percent, synchronous: bool) -> Result<()> {
        if !target.is_valid() {
            warn!(axis = %self.name, target = target.0, "target out of range, move rejected");
            return Err(AxisError::TargetOutOfRange(target.0).into());
        }
        if !self.is_calibrated() {
            warn!(axis = %self.name, %target, "axis not calibrated, move rejected");
            return Err(AxisError::NotCalibrated.into());
        }

        let delta = self.position.delta_to(target);
        if delta == 0 {
            return Ok(());
        }

        let direction = if delta > 0 { OUTWARD } else { HOMEWARD };
        // |delta| <= 100, so the result never exceeds the calibration.
        let steps = (u64::from(delta.unsigned_abs()) * u64::from(self.calibration) / 100) as u32;

        debug!(
            axis = %self.name,
            from = %self.position,
            to = %target,
            steps,
            ?direction,
            "moving"
        );

        match self.motor.move_steps(direction, steps, synchronous) {
            Ok(()) => {
                self.position = target;
                Ok(())
            }
            Err(e) => Err(self.fault(e)),
        }
    }

    /// Home against the end sensor and measure the travel.
    ///
    /// Steps away from the sensor until it releases, then back toward it
    /// counting increments until it triggers again. The count becomes the
    /// calibration constant, the sensor end becomes 0 %, and the axis parks
    /// at 50 %. Returns the constant.
    ///
    /// # Errors
    ///
    /// Returns `AxisError::CalibrationTimeout` if either phase exceeds the
    /// homing ceiling, `AxisError::Sensor` on read failure, and motor errors
    /// as they occur. The axis is left uncalibrated on error.
    pub fn calibrate(&mut self) -> Result<u32> {
        info!(axis = %self.name, step = self.homing.step, "calibration started");
        self.calibration = 0;

        debug!(axis = %self.name, phase = %HomingPhase::Settling, "arming sensor");
        self.delay
            .delay_ms(u32::try_from(self.homing.settle.as_millis()).unwrap_or(u32::MAX));

        let cleared = self.step_while(HomingPhase::Clearing, OUTWARD, true)?;
        debug!(axis = %self.name, steps = cleared, "sensor released");

        let travel = self.step_while(HomingPhase::Seeking, HOMEWARD, false)?;

        self.calibration = travel;
        self.position = Percent::MIN;
        info!(axis = %self.name, calibration = travel, "calibration complete");

        debug!(axis = %self.name, phase = %HomingPhase::Resting, "parking");
        if let Err(e) = self.move_to(Percent::REST, true) {
            self.invalidate();
            return Err(e);
        }

        Ok(travel)
    }

    /// Block until the last issued move has been emitted.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::WaitTimeout` if emission stalls.
    pub fn wait(&mut self) -> Result<()> {
        self.motor.wait()
    }

    /// Emergency stop. The carriage position becomes unknown, so the
    /// calibration is dropped.
    pub fn stop(&mut self) {
        self.motor.stop();
        self.invalidate();
    }

    /// Handle that stops this axis from another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.motor.stop_handle()
    }

    /// Issue homing increments in `direction` while the sensor reads
    /// `while_active`; always issues at least one.
    fn step_while(&mut self, phase: HomingPhase, direction: Direction, while_active: bool) -> Result<u32> {
        let step = self.homing.step;
        let mut issued: u32 = 0;

        loop {
            if issued.saturating_add(step) > self.homing.max_steps {
                warn!(axis = %self.name, %phase, steps = issued, "homing ceiling reached");
                self.motor.stop();
                return Err(AxisError::CalibrationTimeout { phase, steps: issued }.into());
            }

            if let Err(e) = self.motor.move_steps(direction, step, true) {
                return Err(self.fault(e));
            }
            issued += step;

            if self.sensor.is_active()? != while_active {
                return Ok(issued);
            }
        }
    }

    fn fault(&mut self, error: Error) -> Error {
        if error == Error::Motor(MotorError::Halted) {
            self.invalidate();
        }
        error
    }

    fn invalidate(&mut self) {
        if self.calibration > 0 {
            warn!(axis = %self.name, "calibration invalidated");
        }
        self.calibration = 0;
    }
}

impl<P, DIR, S, DELAY, const N: usize> fmt::Debug for Axis<P, DIR, S, DELAY, N>
where
    P: PulseTrain + 'static,
    DIR: OutputPin,
    S: InputPin,
    DELAY: DelayNs,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Axis")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("calibration", &self.calibration)
            .finish()
    }
}
