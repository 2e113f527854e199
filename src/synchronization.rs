//! Interruptible sleeping for the toggle loop. See [`StopSignal`].

use crate::WakeupReason;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

const STOPPED: bool = true;
const RUNNING: bool = false;

/// One-shot stop flag that a sleeping thread can be woken up by.
///
/// The toggle loop sleeps on it until the next transition is due; raising the
/// signal ends that sleep immediately instead of after the remaining interval.
#[derive(Debug)]
pub struct StopSignal {
    state: Mutex<bool>,
    condvar: Condvar,
}

impl StopSignal {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RUNNING),
            condvar: Condvar::new(),
        }
    }

    /// Blocks until `deadline` has passed or [`StopSignal::stop`] was called,
    /// whichever comes first. Returns immediately if the signal is already
    /// raised.
    #[allow(clippy::significant_drop_tightening)]
    pub fn sleep_until(&self, deadline: Instant) -> WakeupReason {
        let mut guard = self.lock();

        loop {
            if *guard == STOPPED {
                break WakeupReason::Stopped;
            }

            let now = Instant::now();
            if now >= deadline {
                break WakeupReason::Timeout;
            }

            // Spurious wakeups just go around the loop with a shorter timeout.
            let (guard_, _) = self
                .condvar
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            guard = guard_;
        }
    }

    /// Blocks until [`StopSignal::stop`] was called.
    pub fn wait(&self) {
        let mut guard = self.lock();
        while *guard == RUNNING {
            guard = self
                .condvar
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Raises the signal and wakes up every sleeper.
    pub fn stop(&self) {
        let mut guard = self.lock();
        *guard = STOPPED;
        drop(guard);

        self.condvar.notify_all();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.lock() == STOPPED
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}
