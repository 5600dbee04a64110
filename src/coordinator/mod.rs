//! Coordinator module for tripteron-motion.
//!
//! Fans coordinated moves and calibration out to one thread per axis and
//! rendezvous on a completion barrier before each next step.

mod barrier;
mod tripteron;
mod waypoint;

pub use barrier::{Arrival, CompletionBarrier};
pub use tripteron::{EmergencyStop, PositionMonitor, Tripteron};
pub use waypoint::Waypoint;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::axis::Axis;
use crate::config::Percent;
use crate::error::Result;
use crate::motor::{PulseTrain, StopHandle};

/// Most axes one coordinator drives.
pub const MAX_AXES: usize = 3;

/// What the coordinator needs from an axis.
///
/// Implemented by [`Axis`]; tests and alternative mechanics can provide
/// their own.
pub trait AxisControl: Send {
    /// Name used in logs and thread names.
    fn name(&self) -> &str;

    /// Move to `target`, optionally waiting for completion.
    fn move_to(&mut self, target: Percent, synchronous: bool) -> Result<()>;

    /// Home and measure the travel; returns the calibration constant.
    fn calibrate(&mut self) -> Result<u32>;

    /// Last committed position.
    fn position(&self) -> Percent;

    /// Handle stopping this axis from another thread.
    fn stop_handle(&self) -> StopHandle;
}

impl<P, DIR, S, DELAY, const N: usize> AxisControl for Axis<P, DIR, S, DELAY, N>
where
    P: PulseTrain + 'static,
    DIR: OutputPin + Send,
    S: InputPin + Send,
    DELAY: DelayNs + Send,
{
    fn name(&self) -> &str {
        Axis::name(self)
    }

    fn move_to(&mut self, target: Percent, synchronous: bool) -> Result<()> {
        Axis::move_to(self, target, synchronous)
    }

    fn calibrate(&mut self) -> Result<u32> {
        Axis::calibrate(self)
    }

    fn position(&self) -> Percent {
        Axis::position(self)
    }

    fn stop_handle(&self) -> StopHandle {
        Axis::stop_handle(self)
    }
}
