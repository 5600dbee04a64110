//! Lock-free activation statistics shared between a task and its owner.

use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;

/// Counters updated by a task's thread after every activation.
#[derive(Debug, Default)]
pub struct TaskStats {
    activations: AtomicU64,
    deadline_misses: AtomicU64,
    last_execution_us: AtomicU64,
    worst_execution_us: AtomicU64,
}

impl TaskStats {
    /// Callback invocations so far.
    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::Relaxed)
    }

    /// Activations that finished after their deadline.
    pub fn deadline_misses(&self) -> u64 {
        self.deadline_misses.load(Ordering::Relaxed)
    }

    /// Execution time of the latest activation.
    pub fn last_execution(&self) -> Duration {
        Duration::from_micros(self.last_execution_us.load(Ordering::Relaxed))
    }

    /// Longest execution time observed.
    pub fn worst_execution(&self) -> Duration {
        Duration::from_micros(self.worst_execution_us.load(Ordering::Relaxed))
    }

    pub(crate) fn record(&self, execution: Duration) {
        let micros = u64::try_from(execution.as_micros()).unwrap_or(u64::MAX);
        self.activations.fetch_add(1, Ordering::Relaxed);
        self.last_execution_us.store(micros, Ordering::Relaxed);
        self.worst_execution_us.fetch_max(micros, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.deadline_misses.fetch_add(1, Ordering::Relaxed);
    }
}
