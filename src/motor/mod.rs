//! Motor module for tripteron-motion.
//!
//! A stepper driven by a pulse-train peripheral and a direction line, with
//! chunked emission, bounded waits and cross-thread emergency stop.

mod direction;
mod driver;
mod pulse;

pub use direction::Direction;
pub use driver::{Halt, Motor, StopHandle, DEFAULT_PULSE_BUFFER};
pub use pulse::{PulseSymbol, PulseTrain, PulseTrainConfig};
