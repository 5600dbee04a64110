//! Rotational sense of a stepper motor.

use embedded_hal::digital::PinState;

/// One of the two opposite rotational senses.
///
/// Which electrical level selects which sense is a wiring property, set
/// per motor with `invert_direction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Driven with the direction line high (low when inverted).
    Clockwise,
    /// Driven with the direction line low (high when inverted).
    CounterClockwise,
}

impl Direction {
    /// The other sense.
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }

    /// Direction line level selecting this sense.
    #[inline]
    pub fn level(self, invert: bool) -> PinState {
        let high = matches!(self, Direction::Clockwise) != invert;
        PinState::from(high)
    }
}
