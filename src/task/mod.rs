//! Real-time task layer.
//!
//! Periodic tasks with deadline monitoring and period-derived priorities,
//! interrupt-triggered aperiodic tasks, and the explicit configuration
//! value both are built from.

mod aperiodic;
mod config;
mod periodic;
mod priority;
mod query;
pub mod signal;
mod stats;

pub use aperiodic::{AperiodicTask, Event, SoftwareEvent};
pub use config::{Lifecycle, TaskConfig, TaskInfo};
pub use periodic::PeriodicTask;
pub use priority::{
    periodic_priority, resolve, Priority, TaskPriority, MAX_PRIORITY, MIN_PRIORITY,
    PERIODIC_CEILING,
};
pub use query::{current_name, current_task};
pub use signal::{Listener, Notifier, Wake};
pub use stats::TaskStats;
