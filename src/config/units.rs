//! Unit types for physical quantities.
//!
//! Provides type-safe representations of travel percentages and
//! frequencies to prevent unit confusion at compile time.

use core::fmt;
use core::time::Duration;

use serde::Deserialize;

/// Position along an axis as a percentage of its full travel.
///
/// 0 % is the end-of-travel sensor, 100 % the far end of the measured travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize)]
#[serde(transparent)]
pub struct Percent(pub u16);

impl Percent {
    /// The sensor end of the travel.
    pub const MIN: Percent = Percent(0);

    /// Full travel.
    pub const FULL: Percent = Percent(100);

    /// Safe resting pose between moves.
    pub const REST: Percent = Percent(50);

    /// Create a new Percent value.
    #[inline]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u16 {
        self.0
    }

    /// Check the value lies within 0..=100.
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 <= Self::FULL.0
    }

    /// Signed distance from `self` to `target`, in percentage points.
    #[inline]
    pub fn delta_to(self, target: Percent) -> i32 {
        i32::from(target.0) - i32::from(self.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Frequency in hertz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Deserialize)]
#[serde(transparent)]
pub struct Hertz(pub u32);

impl Hertz {
    /// Create a new Hertz value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Create a value in kilohertz.
    #[inline]
    pub const fn khz(value: u32) -> Self {
        Self(value * 1_000)
    }

    /// Create a value in megahertz.
    #[inline]
    pub const fn mhz(value: u32) -> Self {
        Self(value * 1_000_000)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Duration of `ticks` cycles at this frequency.
    ///
    /// Returns zero for a zero frequency.
    pub fn ticks_to_duration(self, ticks: u64) -> Duration {
        if self.0 == 0 {
            return Duration::ZERO;
        }
        let nanos = u128::from(ticks) * 1_000_000_000 / u128::from(self.0);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Hertz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}
