//! Coordinated multi-axis targets.

use serde::Deserialize;

use crate::config::Percent;

fn rest() -> Percent {
    Percent::REST
}

/// One target per axis, in percent of travel.
///
/// Components beyond the coordinator's axis count are ignored. `z` defaults
/// to the resting pose so two-axis sequences can omit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Waypoint {
    /// First axis.
    pub x: Percent,
    /// Second axis.
    pub y: Percent,
    /// Third axis.
    #[serde(default = "rest")]
    pub z: Percent,
}

impl Waypoint {
    /// Planar waypoint with `z` at rest.
    pub const fn new(x: u16, y: u16) -> Self {
        Self {
            x: Percent(x),
            y: Percent(y),
            z: Percent::REST,
        }
    }

    /// Same waypoint with `z` set.
    pub const fn with_z(mut self, z: u16) -> Self {
        self.z = Percent(z);
        self
    }

    /// Every axis at the same percentage.
    pub const fn uniform(value: Percent) -> Self {
        Self {
            x: value,
            y: value,
            z: value,
        }
    }

    /// Components in axis order.
    pub const fn components(&self) -> [Percent; 3] {
        [self.x, self.y, self.z]
    }

    /// Component for axis `index`.
    pub fn component(&self, index: usize) -> Option<Percent> {
        self.components().get(index).copied()
    }
}
