//! Period-derived priority assignment.
//!
//! Shorter periods are assumed more timing-critical: a periodic task's
//! automatic priority falls log-linearly with its period, from just below
//! the aperiodic level at 1 ms down to 1 at 1000 ms.

use core::fmt;
use core::time::Duration;

use libm::{log10, round};

use crate::error::{Result, TaskError};

/// Lowest priority a task can be assigned.
pub const MIN_PRIORITY: u8 = 0;

/// Highest priority a task can be assigned (25-level scheduler).
pub const MAX_PRIORITY: u8 = 24;

/// Highest priority an automatically prioritized periodic task receives.
///
/// One level below [`MAX_PRIORITY`] so interrupt-driven tasks always
/// preempt periodic work.
pub const PERIODIC_CEILING: u8 = MAX_PRIORITY - 1;

/// Priority assigned to a 1000 ms periodic task.
const PERIODIC_FLOOR_AT_1S: f64 = 1.0;

/// Decades between the 1 ms and 1000 ms anchor points.
const ANCHOR_DECADES: f64 = 3.0;

/// Scheduler priority, always within `MIN_PRIORITY..=MAX_PRIORITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(u8);

impl Priority {
    /// Lowest priority.
    pub const MIN: Priority = Priority(MIN_PRIORITY);

    /// Highest priority.
    pub const MAX: Priority = Priority(MAX_PRIORITY);

    /// Create a priority, clamping into range.
    #[inline]
    pub const fn new(value: u8) -> Self {
        if value > MAX_PRIORITY {
            Self(MAX_PRIORITY)
        } else {
            Self(value)
        }
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Requested priority of a task before its thread starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskPriority {
    /// Derive from the task kind and period.
    #[default]
    Automatic,
    /// Use exactly this priority.
    Fixed(Priority),
}

/// Resolve a requested priority.
///
/// `period` is `Some` for periodic tasks and `None` for interrupt-driven
/// ones. A fixed priority is returned unchanged; automatic resolution maps
/// aperiodic tasks to [`MAX_PRIORITY`] and periodic ones through
/// [`periodic_priority`].
///
/// # Errors
///
/// Returns `TaskError::InvalidPeriod` for a zero period, whether or not
/// the priority is fixed.
pub fn resolve(requested: TaskPriority, period: Option<Duration>) -> Result<Priority> {
    if period == Some(Duration::ZERO) {
        return Err(TaskError::InvalidPeriod.into());
    }

    match (requested, period) {
        (TaskPriority::Fixed(priority), _) => Ok(priority),
        (TaskPriority::Automatic, None) => Ok(Priority::MAX),
        (TaskPriority::Automatic, Some(period)) => periodic_priority(period),
    }
}

/// Automatic priority of a periodic task.
///
/// `round(CEILING + slope * log10(period_ms))` with
/// `slope = (1 - CEILING) / 3`, clamped to `MIN_PRIORITY..=PERIODIC_CEILING`.
///
/// # Errors
///
/// Returns `TaskError::InvalidPeriod` for a zero period.
pub fn periodic_priority(period: Duration) -> Result<Priority> {
    if period.is_zero() {
        return Err(TaskError::InvalidPeriod.into());
    }

    let ceiling = f64::from(PERIODIC_CEILING);
    let slope = (PERIODIC_FLOOR_AT_1S - ceiling) / ANCHOR_DECADES;
    let period_ms = period.as_secs_f64() * 1_000.0;

    let raw = round(ceiling + slope * log10(period_ms));
    let clamped = raw.clamp(f64::from(MIN_PRIORITY), ceiling);

    // In range after the clamp, so the cast is exact.
    Ok(Priority::new(clamped as u8))
}
