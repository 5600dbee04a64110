//! Error types for tripteron-motion.
//!
//! Provides unified error handling across configuration, tasks, pulse
//! generation, axes and multi-axis coordination.

use core::fmt;

use crate::axis::HomingPhase;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all tripteron-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Task construction or scheduling error
    Task(TaskError),
    /// Pulse source error
    Motor(MotorError),
    /// Single-axis move or calibration error
    Axis(AxisError),
    /// Multi-axis coordination error
    Coordinator(CoordinatorError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Axis references a motor that is not configured
    MotorNotFound(heapless::String<16>),
    /// Axis name not found in configuration
    AxisNotFound(heapless::String<16>),
    /// Step frequency must be > 0
    InvalidStepFrequency(u32),
    /// Half-period in peripheral ticks must be within 1..=32767
    InvalidPulseTiming {
        /// Peripheral timebase in Hz
        resolution_hz: u32,
        /// Requested step frequency in Hz
        step_frequency_hz: u32,
    },
    /// Calibration increment must be > 0 and not exceed the homing ceiling
    InvalidCalibrationStep {
        /// Increment in steps
        step: u32,
        /// Homing ceiling in steps
        max_steps: u32,
    },
    /// Number of enabled axes must be 1..=3
    InvalidAxisCount(usize),
    /// A percentage outside 0..=100
    InvalidPercent(u16),
    /// Priority above the scheduler maximum
    InvalidPriority(u8),
    /// Barrier timeout must be > 0
    InvalidBarrierTimeout,
    /// Waypoint sequence has no entries
    EmptySequence(heapless::String<16>),
    /// File I/O error
    IoError(heapless::String<128>),
}

/// Task errors.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskError {
    /// Period must be strictly positive
    InvalidPeriod,
    /// The OS refused to create the thread of control
    Spawn(heapless::String<64>),
    /// The interrupt source refused the handler
    EventRegistration(heapless::String<64>),
}

/// Pulse source errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorError {
    /// Direction line could not be driven
    DirectionPin,
    /// Pulse-train peripheral reported a failure
    Peripheral(heapless::String<64>),
    /// Pulse timing cannot be represented by the peripheral
    InvalidTiming {
        /// Peripheral timebase in Hz
        resolution_hz: u32,
        /// Requested step frequency in Hz
        step_frequency_hz: u32,
    },
    /// Emission did not complete within the expected time
    WaitTimeout {
        /// Pulses queued since the last completed wait
        pending_pulses: u32,
    },
    /// Emergency stop interrupted the move
    Halted,
}

/// Axis errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AxisError {
    /// Target percentage outside 0..=100
    TargetOutOfRange(u16),
    /// Axis has no calibration constant yet
    NotCalibrated,
    /// End-of-travel sensor could not be read
    Sensor,
    /// Homing did not reach the expected sensor state within the step ceiling
    CalibrationTimeout {
        /// Phase that ran out of steps
        phase: HomingPhase,
        /// Steps issued in that phase
        steps: u32,
    },
}

/// Coordinator errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorError {
    /// Coordinator supports one to three axes
    InvalidAxisCount(usize),
    /// Not every axis reported completion in time
    BarrierTimeout {
        /// Completions received
        arrived: usize,
        /// Completions required
        required: usize,
    },
    /// Per-axis worker thread could not be created
    WorkerSpawn(heapless::String<64>),
    /// Per-axis worker panicked
    WorkerPanicked(heapless::String<16>),
}

impl Error {
    /// Whether this error is a rejected request rather than a fault.
    ///
    /// Rejections leave state untouched and are reported, never escalated.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::Axis(AxisError::TargetOutOfRange(_))
                | Error::Axis(AxisError::NotCalibrated)
                | Error::Task(TaskError::InvalidPeriod)
        )
    }
}

/// Truncating conversion of a message into a fixed-capacity string.
pub(crate) fn message<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Task(e) => write!(f, "Task error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Axis(e) => write!(f, "Axis error: {}", e),
            Error::Coordinator(e) => write!(f, "Coordinator error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::MotorNotFound(name) => write!(f, "Motor '{}' not found", name),
            ConfigError::AxisNotFound(name) => write!(f, "Axis '{}' not found", name),
            ConfigError::InvalidStepFrequency(v) => {
                write!(f, "Invalid step frequency: {} Hz. Must be > 0", v)
            }
            ConfigError::InvalidPulseTiming {
                resolution_hz,
                step_frequency_hz,
            } => write!(
                f,
                "Step frequency {} Hz cannot be produced from a {} Hz timebase",
                step_frequency_hz, resolution_hz
            ),
            ConfigError::InvalidCalibrationStep { step, max_steps } => write!(
                f,
                "Invalid calibration step {} (homing ceiling {})",
                step, max_steps
            ),
            ConfigError::InvalidAxisCount(n) => {
                write!(f, "Invalid number of enabled axes: {}. Must be 1-3", n)
            }
            ConfigError::InvalidPercent(v) => write!(f, "Invalid percentage: {}. Must be 0-100", v),
            ConfigError::InvalidPriority(v) => write!(f, "Invalid priority: {}", v),
            ConfigError::InvalidBarrierTimeout => write!(f, "Barrier timeout must be > 0"),
            ConfigError::EmptySequence(name) => write!(f, "Sequence '{}' has no waypoints", name),
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskError::InvalidPeriod => write!(f, "Task period must be greater than zero"),
            TaskError::Spawn(msg) => write!(f, "Failed to spawn task: {}", msg),
            TaskError::EventRegistration(msg) => {
                write!(f, "Failed to register interrupt: {}", msg)
            }
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::DirectionPin => write!(f, "Direction pin operation failed"),
            MotorError::Peripheral(msg) => write!(f, "Pulse peripheral failure: {}", msg),
            MotorError::InvalidTiming {
                resolution_hz,
                step_frequency_hz,
            } => write!(
                f,
                "Cannot emit {} Hz steps from a {} Hz timebase",
                step_frequency_hz, resolution_hz
            ),
            MotorError::WaitTimeout { pending_pulses } => {
                write!(f, "Timed out waiting for {} pulses", pending_pulses)
            }
            MotorError::Halted => write!(f, "Move interrupted by emergency stop"),
        }
    }
}

impl fmt::Display for AxisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxisError::TargetOutOfRange(v) => {
                write!(f, "Target {}% is outside 0-100%", v)
            }
            AxisError::NotCalibrated => write!(f, "Axis is not calibrated"),
            AxisError::Sensor => write!(f, "End sensor read failed"),
            AxisError::CalibrationTimeout { phase, steps } => {
                write!(f, "Calibration {:?} phase gave up after {} steps", phase, steps)
            }
        }
    }
}

impl fmt::Display for CoordinatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinatorError::InvalidAxisCount(n) => {
                write!(f, "Invalid axis count: {}. Must be 1-3", n)
            }
            CoordinatorError::BarrierTimeout { arrived, required } => write!(
                f,
                "Only {} of {} axes completed before the barrier timed out",
                arrived, required
            ),
            CoordinatorError::WorkerSpawn(msg) => write!(f, "Failed to spawn axis worker: {}", msg),
            CoordinatorError::WorkerPanicked(axis) => write!(f, "Axis worker '{}' panicked", axis),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<TaskError> for Error {
    fn from(e: TaskError) -> Self {
        Error::Task(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<AxisError> for Error {
    fn from(e: AxisError) -> Self {
        Error::Axis(e)
    }
}

impl From<CoordinatorError> for Error {
    fn from(e: CoordinatorError) -> Self {
        Error::Coordinator(e)
    }
}

impl std::error::Error for Error {}

impl std::error::Error for ConfigError {}

impl std::error::Error for TaskError {}

impl std::error::Error for MotorError {}

impl std::error::Error for AxisError {}

impl std::error::Error for CoordinatorError {}
