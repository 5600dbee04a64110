//! Single-slot binary signal for interrupt-to-thread hand-off.
//!
//! [`binary`] returns the two ends of a one-slot notification channel. The
//! [`Notifier`] end may only release: [`Notifier::notify`] is lock-free,
//! never blocks and never allocates, so it is safe to call from interrupt
//! context. The [`Listener`] end may only acquire and belongs to exactly one
//! worker thread.
//!
//! The slot holds at most one pending release. Any number of notifications
//! arriving before the listener drains the slot collapse into one wake-up.

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::{Arc, OnceLock};
use std::thread::{self, Thread};
use std::time::Instant;

#[derive(Debug, Default)]
struct Slot {
    pending: AtomicBool,
    closed: AtomicBool,
    waiter: OnceLock<Thread>,
}

impl Slot {
    fn wake(&self) {
        if let Some(waiter) = self.waiter.get() {
            waiter.unpark();
        }
    }
}

/// Outcome of waiting on a [`Listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// A release was consumed.
    Notified,
    /// The timeout elapsed with no release pending.
    TimedOut,
    /// The signal was shut down.
    Closed,
}

/// Release-only end of a binary signal.
#[derive(Debug, Clone)]
pub struct Notifier {
    slot: Arc<Slot>,
}

/// Acquire-only end of a binary signal.
#[derive(Debug)]
pub struct Listener {
    slot: Arc<Slot>,
}

/// Create a binary signal with no pending release.
pub fn binary() -> (Notifier, Listener) {
    let slot = Arc::new(Slot::default());
    (
        Notifier {
            slot: Arc::clone(&slot),
        },
        Listener { slot },
    )
}

impl Notifier {
    /// Release the signal. Interrupt-safe.
    #[inline]
    pub fn notify(&self) {
        self.slot.pending.store(true, Ordering::Release);
        self.slot.wake();
    }

    /// Whether a release is waiting to be consumed.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.slot.pending.load(Ordering::Acquire)
    }

    /// Shut the signal down; the listener returns [`Wake::Closed`] once
    /// any pending release has been consumed.
    pub(crate) fn close(&self) {
        self.slot.closed.store(true, Ordering::Release);
        self.slot.wake();
    }
}

impl Listener {
    /// Consume a pending release without blocking.
    #[inline]
    pub fn try_take(&self) -> bool {
        self.slot.pending.swap(false, Ordering::AcqRel)
    }

    /// Block until released or closed.
    pub fn wait(&self) -> Wake {
        self.bind();
        loop {
            if let Some(wake) = self.poll() {
                return wake;
            }
            thread::park();
        }
    }

    /// Block until released, closed, or `timeout` elapses.
    ///
    /// A timeout too large to express as a deadline waits without one.
    pub fn wait_timeout(&self, timeout: Duration) -> Wake {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait();
        };
        self.bind();
        loop {
            if let Some(wake) = self.poll() {
                return wake;
            }
            let now = Instant::now();
            if now >= deadline {
                return Wake::TimedOut;
            }
            thread::park_timeout(deadline - now);
        }
    }

    fn poll(&self) -> Option<Wake> {
        if self.try_take() {
            Some(Wake::Notified)
        } else if self.slot.closed.load(Ordering::Acquire) {
            Some(Wake::Closed)
        } else {
            None
        }
    }

    fn bind(&self) {
        let waiter = self.slot.waiter.get_or_init(thread::current);
        debug_assert_eq!(
            waiter.id(),
            thread::current().id(),
            "a listener is drained by a single thread"
        );
    }
}
