//! Periodic tasks with deadline monitoring.
//!
//! A periodic task wakes at a fixed cadence measured against absolute
//! deadlines, so a late activation does not shift the ones after it.
//! Deadline misses are counted and reported; they never stop the task.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{Result, TaskError};

use super::config::{self, Lifecycle, TaskConfig, TaskInfo};
use super::stats::TaskStats;

/// Owner of a periodic thread of control.
///
/// Dropping the owner stops the loop; with [`Lifecycle::Joined`] it also
/// waits for the current activation to finish.
#[derive(Debug)]
pub struct PeriodicTask {
    info: TaskInfo,
    period: Duration,
    stats: Arc<TaskStats>,
    stop: Arc<AtomicBool>,
    lifecycle: Lifecycle,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Start calling `callback` every `period`.
    ///
    /// An automatic priority is resolved from `period` before the thread
    /// starts.
    ///
    /// # Errors
    ///
    /// Returns `TaskError::InvalidPeriod` for a zero period or one too long
    /// to schedule against the monotonic clock, and
    /// `TaskError::Spawn` if the thread cannot be created.
    pub fn spawn<F>(config: &TaskConfig, period: Duration, mut callback: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        if Instant::now().checked_add(period).is_none() {
            return Err(TaskError::InvalidPeriod.into());
        }
        let info = config.resolve(Some(period))?;
        let stats = Arc::new(TaskStats::default());
        let stop = Arc::new(AtomicBool::new(false));

        let handle = {
            let stats = Arc::clone(&stats);
            let stop = Arc::clone(&stop);
            let name = info.name.clone();
            config::spawn(&info, move || {
                let mut next = Instant::now();
                loop {
                    if !sleep_until(next, &stop) {
                        break;
                    }
                    next = match next.checked_add(period) {
                        Some(deadline) => deadline,
                        None => {
                            warn!(task = %name, "next deadline out of clock range");
                            break;
                        }
                    };

                    let start = Instant::now();
                    callback();
                    let end = Instant::now();

                    let took = end - start;
                    stats.record(took);
                    if end > next {
                        stats.record_miss();
                        warn!(task = %name, overrun_us = (end - next).as_micros() as u64, "missed its deadline");
                    } else {
                        debug!(task = %name, took_us = took.as_micros() as u64, "activation");
                    }
                }
                debug!(task = %name, "periodic loop stopped");
            })?
        };

        info!(task = %info.name, priority = %info.priority, period_ms = period.as_millis() as u64, "periodic task created");

        Ok(Self {
            info,
            period,
            stats,
            stop,
            lifecycle: config.lifecycle(),
            handle: Some(handle),
        })
    }

    /// Resolved task identity.
    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    /// Activation cadence.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Activation statistics.
    pub fn stats(&self) -> &TaskStats {
        &self.stats
    }

    /// Stop the loop, honouring the configured lifecycle.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if self.lifecycle == Lifecycle::Joined && handle.join().is_err() {
                warn!(task = %self.info.name, "periodic task panicked");
            }
        }
    }
}

/// Park until `deadline`. Returns `false` if asked to stop first.
fn sleep_until(deadline: Instant, stop: &AtomicBool) -> bool {
    loop {
        if stop.load(Ordering::Acquire) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::park_timeout(deadline - now);
    }
}
