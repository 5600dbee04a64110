//! End-of-travel sensor.

use embedded_hal::digital::{InputPin, PinState};
use tracing::error;

use crate::config::Pull;
use crate::error::{AxisError, Result};

/// Level the sensor reads while triggered: the opposite of its pull bias.
///
/// A floating input is treated like a pull-down (active high).
#[inline]
pub fn active_level(pull: Pull) -> PinState {
    match pull {
        Pull::Up => PinState::Low,
        Pull::Down | Pull::None => PinState::High,
    }
}

/// Switch or optical sensor at the 0 % end of an axis.
#[derive(Debug)]
pub struct EndSensor<S> {
    pin: S,
    active: PinState,
}

impl<S: InputPin> EndSensor<S> {
    /// Wrap an input pin configured with `pull`.
    pub fn new(pin: S, pull: Pull) -> Self {
        Self {
            pin,
            active: active_level(pull),
        }
    }

    /// Level that means "triggered".
    pub fn active_level(&self) -> PinState {
        self.active
    }

    /// Whether the sensor is currently triggered.
    ///
    /// # Errors
    ///
    /// Returns `AxisError::Sensor` if the pin cannot be read.
    pub fn is_active(&mut self) -> Result<bool> {
        let high = self.pin.is_high().map_err(|e| {
            error!(error = ?e, "end sensor read failed");
            AxisError::Sensor
        })?;
        Ok(PinState::from(high) == self.active)
    }

    /// Give the pin back.
    pub fn release(self) -> S {
        self.pin
    }
}
