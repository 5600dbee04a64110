//! Completion barrier for fanned-out axis work.

use core::time::Duration;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use crate::error::{CoordinatorError, Result};

/// Counts one completion per axis and releases the waiter once all arrived.
///
/// The required count is fixed at construction; [`reset`](Self::reset)
/// rearms the barrier for the next coordinated step.
#[derive(Debug)]
pub struct CompletionBarrier {
    required: usize,
    arrived: Mutex<usize>,
    released: Condvar,
}

impl CompletionBarrier {
    /// Barrier waiting for `required` completions.
    pub fn new(required: usize) -> Self {
        Self {
            required,
            arrived: Mutex::new(0),
            released: Condvar::new(),
        }
    }

    /// Completions needed to release the waiter.
    #[inline]
    pub fn required(&self) -> usize {
        self.required
    }

    /// Completions received since the last reset.
    pub fn arrived(&self) -> usize {
        *self.arrived.lock()
    }

    /// Forget all completions.
    pub fn reset(&self) {
        *self.arrived.lock() = 0;
    }

    /// Record one completion.
    pub fn arrive(&self) {
        let mut arrived = self.arrived.lock();
        *arrived += 1;
        if *arrived > self.required {
            warn!(arrived = *arrived, required = self.required, "surplus barrier arrival");
        }
        if *arrived >= self.required {
            self.released.notify_all();
        }
    }

    /// Guard that records one completion when dropped, unwinding included.
    pub fn arrival(&self) -> Arrival<'_> {
        Arrival { barrier: self }
    }

    /// Block until every completion arrived or `timeout` elapsed.
    ///
    /// # Errors
    ///
    /// Returns `CoordinatorError::BarrierTimeout` with the count received
    /// so far if the deadline passes first.
    pub fn wait(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now().checked_add(timeout);
        let mut arrived = self.arrived.lock();

        while *arrived < self.required {
            let timed_out = match deadline {
                Some(deadline) => self.released.wait_until(&mut arrived, deadline).timed_out(),
                None => {
                    self.released.wait(&mut arrived);
                    false
                }
            };

            if timed_out && *arrived < self.required {
                return Err(CoordinatorError::BarrierTimeout {
                    arrived: *arrived,
                    required: self.required,
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Records one completion on drop.
#[derive(Debug)]
pub struct Arrival<'a> {
    barrier: &'a CompletionBarrier,
}

impl Drop for Arrival<'_> {
    fn drop(&mut self) {
        self.barrier.arrive();
    }
}
