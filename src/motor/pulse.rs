//! Pulse-train peripheral interface.
//!
//! Models a peripheral that emits a queued buffer of timed symbols on its
//! own, without CPU involvement (an RMT channel on ESP32, a PIO state
//! machine, a timer with DMA).

use core::fmt;
use core::time::Duration;

use crate::config::{Hertz, MAX_SYMBOL_TICKS};
use crate::error::MotorError;

/// One step pulse: `high_ticks` at level 1 followed by `low_ticks` at level 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PulseSymbol {
    /// Duration of the high half, in peripheral ticks.
    pub high_ticks: u16,
    /// Duration of the low half, in peripheral ticks.
    pub low_ticks: u16,
}

impl PulseSymbol {
    /// 50 % duty square wave at `step_frequency` on a `resolution` timebase.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::InvalidTiming` if the half-period rounds to zero
    /// ticks or does not fit one symbol.
    pub fn square(resolution: Hertz, step_frequency: Hertz) -> Result<Self, MotorError> {
        let invalid = MotorError::InvalidTiming {
            resolution_hz: resolution.0,
            step_frequency_hz: step_frequency.0,
        };

        if step_frequency.0 == 0 {
            return Err(invalid);
        }

        let half = resolution.0 / step_frequency.0.saturating_mul(2);
        if half == 0 || half > MAX_SYMBOL_TICKS {
            return Err(invalid);
        }

        // Bounded by MAX_SYMBOL_TICKS above.
        let half = half as u16;
        Ok(Self {
            high_ticks: half,
            low_ticks: half,
        })
    }

    /// Full pulse period in ticks.
    #[inline]
    pub fn period_ticks(&self) -> u32 {
        u32::from(self.high_ticks) + u32::from(self.low_ticks)
    }
}

/// Parameters for bringing up a pulse-train channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseTrainConfig {
    /// Output GPIO.
    pub pin: u8,
    /// Channel timebase.
    pub resolution: Hertz,
}

/// A pulse-train channel that emits symbol buffers autonomously.
///
/// Methods take `&self`: the channel is shared between the motor that
/// feeds it and the stop handles that may halt it from other threads.
/// Teardown happens in the implementation's `Drop`.
pub trait PulseTrain: Send + Sync {
    /// Driver error type.
    type Error: fmt::Debug;

    /// Queue `symbols` for emission and return without waiting.
    ///
    /// Implementations copy or consume the symbols before returning.
    fn transmit(&self, symbols: &[PulseSymbol]) -> Result<(), Self::Error>;

    /// Block until every queued symbol has been emitted.
    ///
    /// Returns `Ok(false)` if `timeout` elapsed first; `None` waits forever.
    fn wait_all_done(&self, timeout: Option<Duration>) -> Result<bool, Self::Error>;

    /// Stop the channel, discarding queued and in-flight symbols.
    fn disable(&self) -> Result<(), Self::Error>;

    /// Re-arm the channel after [`disable`](Self::disable).
    fn enable(&self) -> Result<(), Self::Error>;
}
