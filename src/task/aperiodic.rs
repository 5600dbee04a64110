//! Interrupt-triggered tasks.
//!
//! An aperiodic task parks its worker on a binary signal and runs its
//! callback once per release. The release comes from an [`Event`]: the
//! interrupt source is handed a [`Notifier`] and calls
//! [`Notifier::notify`] from its handler.

use core::fmt;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{message, Result, TaskError};

use super::config::{self, Lifecycle, TaskConfig, TaskInfo};
use super::signal::{self, Notifier, Wake};
use super::stats::TaskStats;

/// An interrupt source that can release a task.
///
/// `register_interrupt` installs a handler that calls `notifier.notify()`
/// and nothing else; `unregister_interrupt` removes it so no release can
/// happen afterwards.
pub trait Event {
    /// Error raised when the handler cannot be installed.
    type Error: fmt::Debug;

    /// Install the handler.
    fn register_interrupt(&mut self, notifier: Notifier) -> core::result::Result<(), Self::Error>;

    /// Remove the handler.
    fn unregister_interrupt(&mut self);
}

/// Owner of an interrupt-driven thread of control.
///
/// Dropping the owner unregisters the interrupt first, then shuts the
/// signal down and, with [`Lifecycle::Joined`], joins the worker.
pub struct AperiodicTask<E: Event> {
    info: TaskInfo,
    event: E,
    notifier: Notifier,
    stats: Arc<TaskStats>,
    lifecycle: Lifecycle,
    handle: Option<JoinHandle<()>>,
}

impl<E: Event> AperiodicTask<E> {
    /// Start a worker that runs `callback` once per release of `event`.
    ///
    /// An automatic priority resolves to the maximum.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::Spawn` if the worker cannot be created and
    /// `TaskError::EventRegistration` if the interrupt cannot be installed.
    pub fn spawn<F>(config: &TaskConfig, mut event: E, mut callback: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let info = config.resolve(None)?;
        let stats = Arc::new(TaskStats::default());
        let (notifier, listener) = signal::binary();

        let handle = {
            let stats = Arc::clone(&stats);
            let name = info.name.clone();
            config::spawn(&info, move || {
                while listener.wait() == Wake::Notified {
                    let start = Instant::now();
                    callback();
                    stats.record(start.elapsed());
                }
                debug!(task = %name, "aperiodic worker stopped");
            })?
        };

        if let Err(e) = event.register_interrupt(notifier.clone()) {
            notifier.close();
            if handle.join().is_err() {
                warn!(task = %info.name, "aperiodic worker panicked");
            }
            return Err(TaskError::EventRegistration(message(&format!("{:?}", e))).into());
        }

        info!(task = %info.name, priority = %info.priority, "aperiodic task armed");

        Ok(Self {
            info,
            event,
            notifier,
            stats,
            lifecycle: config.lifecycle(),
            handle: Some(handle),
        })
    }

    /// Resolved task identity.
    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    /// Activation statistics.
    pub fn stats(&self) -> &TaskStats {
        &self.stats
    }

    /// The interrupt source.
    pub fn event(&self) -> &E {
        &self.event
    }

    /// Stop the task, honouring the configured lifecycle.
    pub fn stop(self) {
        drop(self);
    }
}

impl<E: Event> Drop for AperiodicTask<E> {
    fn drop(&mut self) {
        self.event.unregister_interrupt();
        self.notifier.close();
        if let Some(handle) = self.handle.take() {
            if self.lifecycle == Lifecycle::Joined && handle.join().is_err() {
                warn!(task = %self.info.name, "aperiodic worker panicked");
            }
        }
    }
}

impl<E: Event> fmt::Debug for AperiodicTask<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AperiodicTask")
            .field("info", &self.info)
            .field("activations", &self.stats.activations())
            .finish()
    }
}

/// An [`Event`] raised from code instead of hardware.
///
/// Clones share one registration, so a clone can be handed to whatever
/// raises the event (a simulated button, a watchdog, a test).
#[derive(Debug, Clone, Default)]
pub struct SoftwareEvent {
    handler: Arc<Mutex<Option<Notifier>>>,
}

impl SoftwareEvent {
    /// Create an event with no handler installed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the event. Returns `false` if no handler is installed.
    pub fn trigger(&self) -> bool {
        match self.handler.lock().as_ref() {
            Some(notifier) => {
                notifier.notify();
                true
            }
            None => false,
        }
    }

    /// Whether a handler is installed.
    pub fn is_registered(&self) -> bool {
        self.handler.lock().is_some()
    }
}

impl Event for SoftwareEvent {
    type Error = core::convert::Infallible;

    fn register_interrupt(&mut self, notifier: Notifier) -> core::result::Result<(), Self::Error> {
        *self.handler.lock() = Some(notifier);
        Ok(())
    }

    fn unregister_interrupt(&mut self) {
        *self.handler.lock() = None;
    }
}
