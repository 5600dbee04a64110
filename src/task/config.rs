//! Explicit task configuration.
//!
//! Every task constructor takes a [`TaskConfig`] value. There is no hidden
//! "next task" state: defaults are loaded once into a value and overridden
//! per call with the builder methods.

use core::time::Duration;
use std::thread::{self, JoinHandle};

use heapless::String;
use tracing::debug;

use crate::config::TaskDefaults;
use crate::error::{message, Result, TaskError};

use super::priority::{self, Priority, TaskPriority};
use super::query;

/// What dropping a task owner does with its thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Signal the thread to stop and join it.
    #[default]
    Joined,
    /// Signal the thread to stop and return without waiting for it.
    Detached,
}

/// Builder-style configuration for a task's thread of control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskConfig {
    name: String<16>,
    priority: TaskPriority,
    core: Option<u8>,
    stack_size: Option<usize>,
    lifecycle: Lifecycle,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self::from_defaults(&TaskDefaults::default())
    }
}

impl TaskConfig {
    /// Configuration with the given name and automatic priority.
    pub fn new(name: &str) -> Self {
        Self::default().with_name(name)
    }

    /// Configuration mirroring the configured task defaults.
    pub fn from_defaults(defaults: &TaskDefaults) -> Self {
        Self {
            name: defaults.name.clone(),
            priority: defaults
                .priority
                .map_or(TaskPriority::Automatic, |p| TaskPriority::Fixed(Priority::new(p))),
            core: defaults.core,
            stack_size: defaults.stack_size,
            lifecycle: if defaults.detached {
                Lifecycle::Detached
            } else {
                Lifecycle::Joined
            },
        }
    }

    /// Set the thread name (truncated to 16 chars).
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = message(name);
        self
    }

    /// Set a fixed priority, clamped into the scheduler's range.
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = TaskPriority::Fixed(Priority::new(priority));
        self
    }

    /// Derive the priority from the task kind and period.
    pub fn with_automatic_priority(mut self) -> Self {
        self.priority = TaskPriority::Automatic;
        self
    }

    /// Set the stack size in bytes.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Pin the task to one core.
    pub fn pinned_to_core(mut self, core: u8) -> Self {
        self.core = Some(core);
        self
    }

    /// Do not join the thread when the owner is dropped.
    pub fn detached(mut self) -> Self {
        self.lifecycle = Lifecycle::Detached;
        self
    }

    /// Configured name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Requested priority.
    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Drop behaviour.
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Resolve the priority once, before any thread exists.
    pub(crate) fn resolve(&self, period: Option<Duration>) -> Result<TaskInfo> {
        Ok(TaskInfo {
            name: self.name.clone(),
            priority: priority::resolve(self.priority, period)?,
            core: self.core,
            stack_size: self.stack_size,
        })
    }
}

/// Resolved identity of a running task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    /// Thread name.
    pub name: String<16>,
    /// Resolved priority.
    pub priority: Priority,
    /// Core affinity, `None` for any core.
    pub core: Option<u8>,
    /// Requested stack size, `None` for the platform default.
    pub stack_size: Option<usize>,
}

/// Start a thread of control for `info`.
///
/// The thread registers `info` for [`current_task`](super::current_task)
/// before running `body`. On hosted targets priority and core affinity are
/// advisory: they are recorded and reported but scheduling is left to the OS.
pub(crate) fn spawn<F>(info: &TaskInfo, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let mut builder = thread::Builder::new().name(info.name.as_str().into());
    if let Some(bytes) = info.stack_size {
        builder = builder.stack_size(bytes);
    }

    let registered = info.clone();
    builder
        .spawn(move || {
            debug!(
                task = %registered.name,
                priority = %registered.priority,
                core = ?registered.core,
                "task started"
            );
            query::register(registered);
            body();
        })
        .map_err(|e| TaskError::Spawn(message(&e.to_string())).into())
}
