//! System configuration - root configuration structure.

use heapless::{FnvIndexMap, String};
use serde::Deserialize;

use super::axis::AxisConfig;
use super::coordinator::{CoordinatorConfig, SequenceConfig};
use super::motor::MotorConfig;
use super::task::TaskDefaults;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Defaults for tasks built from configuration.
    #[serde(default)]
    pub tasks: TaskDefaults,

    /// Named pulse sources.
    pub motors: FnvIndexMap<String<16>, MotorConfig, 4>,

    /// Named axes.
    pub axes: FnvIndexMap<String<16>, AxisConfig, 4>,

    /// Coordinator settings.
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// Named waypoint sequences.
    #[serde(default)]
    pub sequences: FnvIndexMap<String<16>, SequenceConfig, 8>,
}

impl SystemConfig {
    /// Get a motor configuration by name.
    pub fn motor(&self, name: &str) -> Option<&MotorConfig> {
        self.motors
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Get an axis configuration by name.
    pub fn axis(&self, name: &str) -> Option<&AxisConfig> {
        self.axes
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Get the motor driving the named axis.
    pub fn motor_for(&self, axis: &str) -> Option<&MotorConfig> {
        self.axis(axis).and_then(|a| self.motor(a.motor.as_str()))
    }

    /// Get a waypoint sequence by name.
    pub fn sequence(&self, name: &str) -> Option<&SequenceConfig> {
        self.sequences
            .iter()
            .find(|(k, _)| k.as_str() == name)
            .map(|(_, v)| v)
    }

    /// Axes the coordinator drives, in declaration order.
    pub fn enabled_axes(&self) -> impl Iterator<Item = (&str, &AxisConfig)> {
        self.axes
            .iter()
            .filter(|(_, a)| a.enabled)
            .map(|(k, a)| (k.as_str(), a))
    }

    /// List all motor names.
    pub fn motor_names(&self) -> impl Iterator<Item = &str> {
        self.motors.keys().map(|s| s.as_str())
    }

    /// List all axis names.
    pub fn axis_names(&self) -> impl Iterator<Item = &str> {
        self.axes.keys().map(|s| s.as_str())
    }

    /// List all sequence names.
    pub fn sequence_names(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(|s| s.as_str())
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            tasks: TaskDefaults::default(),
            motors: FnvIndexMap::new(),
            axes: FnvIndexMap::new(),
            coordinator: CoordinatorConfig::default(),
            sequences: FnvIndexMap::new(),
        }
    }
}
