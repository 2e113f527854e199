//! A blocking message queue for handing values from one thread to another.
//! See [`MessageQueue`].

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Unbounded, thread-safe handoff buffer.
///
/// [`MessageQueue::send`] never blocks, [`MessageQueue::receive`] parks the
/// calling thread until a value is available.
///
/// Values are handed out **most recent first** (LIFO). A consumer that falls
/// behind therefore skips stale values and sees the newest one, which is what
/// a phase observer wants. Consumers must not rely on seeing every value.
#[derive(Debug)]
pub struct MessageQueue<T> {
    messages: Mutex<Vec<T>>,
    message_ready: Condvar,
}

impl<T> MessageQueue<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            message_ready: Condvar::new(),
        }
    }

    /// Pushes `message` and wakes up one waiting receiver.
    pub fn send(&self, message: T) {
        let mut guard = self.lock();
        guard.push(message);
        drop(guard);

        self.message_ready.notify_one();
    }

    /// Blocks until the queue is non-empty, then removes and returns the
    /// most recently sent value.
    pub fn receive(&self) -> T {
        let mut guard = self.lock();
        loop {
            // Re-checked after every wakeup: spurious wakeups and other
            // receivers racing for the same value.
            if let Some(message) = guard.pop() {
                return message;
            }
            guard = self
                .message_ready
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Number of values currently waiting to be received.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panicking lock holder can't leave the Vec half-mutated, so a
    // poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
