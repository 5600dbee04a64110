//! Coordinator and waypoint sequence configuration from TOML.

use core::time::Duration;

use heapless::Vec;
use serde::Deserialize;

use super::units::Percent;
use crate::coordinator::Waypoint;

/// Maximum waypoints in one configured sequence.
pub const MAX_SEQUENCE_WAYPOINTS: usize = 64;

/// Coordinator settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CoordinatorConfig {
    /// Longest time to wait for every axis to finish one coordinated step.
    #[serde(default = "default_barrier_timeout_ms")]
    pub barrier_timeout_ms: u32,

    /// Pose every axis returns to after a sequence.
    #[serde(default = "default_rest_position")]
    pub rest_position: Percent,
}

fn default_barrier_timeout_ms() -> u32 {
    120_000
}

fn default_rest_position() -> Percent {
    Percent::REST
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            barrier_timeout_ms: default_barrier_timeout_ms(),
            rest_position: default_rest_position(),
        }
    }
}

impl CoordinatorConfig {
    /// Set the barrier timeout.
    pub fn with_barrier_timeout(mut self, timeout: Duration) -> Self {
        self.barrier_timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        self
    }

    /// Barrier timeout as a duration.
    pub fn barrier_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.barrier_timeout_ms))
    }
}

/// A named, ordered list of coordinated waypoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SequenceConfig {
    /// Waypoints visited in order.
    pub waypoints: Vec<Waypoint, MAX_SEQUENCE_WAYPOINTS>,
}

impl SequenceConfig {
    /// Waypoints as a slice.
    pub fn as_slice(&self) -> &[Waypoint] {
        &self.waypoints
    }
}
