//! The background thread that drives a traffic light. See [`ToggleLoop`].

use crate::interval::IntervalSource;
use crate::message_queue::MessageQueue;
use crate::phase::Phase;
use crate::synchronization::StopSignal;
use crate::WakeupReason;
use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::Instant;

const THREAD_NAME: &str = "traffic-light";

/// Phase state shared between a traffic light and its toggle loop.
///
/// Only the toggle loop writes; everyone else reads [`SharedPhase::current`]
/// or receives from [`SharedPhase::queue`].
#[derive(Debug)]
pub(crate) struct SharedPhase {
    current: AtomicU8,
    queue: MessageQueue<Phase>,
}

impl SharedPhase {
    pub(crate) const fn new(initial: Phase) -> Self {
        Self {
            current: AtomicU8::new(initial.as_u8()),
            queue: MessageQueue::new(),
        }
    }

    pub(crate) fn current(&self) -> Phase {
        // Only valid discriminants are ever stored.
        Phase::from_u8(self.current.load(Ordering::Acquire)).unwrap_or(Phase::Red)
    }

    pub(crate) const fn queue(&self) -> &MessageQueue<Phase> {
        &self.queue
    }

    /// Makes `phase` the current phase, then hands it to the observers.
    fn publish(&self, phase: Phase) {
        self.current.store(phase.as_u8(), Ordering::Release);
        self.queue.send(phase);
    }
}

/// Handle to the thread that toggles a [`SharedPhase`] between red and green.
///
/// The thread holds each phase for an interval drawn from its
/// [`IntervalSource`], then toggles and publishes the new phase. It runs until
/// [`ToggleLoop::shutdown`] is called or the handle is dropped.
#[derive(Debug)]
pub(crate) struct ToggleLoop {
    stop_signal: Arc<StopSignal>,
    handle: Option<JoinHandle<()>>,
}

impl ToggleLoop {
    fn thread_fn(
        shared: Arc<SharedPhase>,
        mut interval_source: Box<dyn IntervalSource + Send>,
        stop_signal: Arc<StopSignal>,
        thread_startup_barrier: Arc<Barrier>,
    ) -> impl FnOnce() {
        move || {
            // Notify caller that thread has started.
            thread_startup_barrier.wait();
            Self::cycle_through_phases(&shared, interval_source.as_mut(), &stop_signal);
        }
    }

    fn cycle_through_phases(
        shared: &SharedPhase,
        interval_source: &mut dyn IntervalSource,
        stop_signal: &StopSignal,
    ) {
        let mut phase = shared.current();
        let mut last_transition = Instant::now();

        loop {
            let interval = interval_source.next_interval();
            let Some(deadline) = last_transition.checked_add(interval) else {
                // Not representable, so the phase is held until shutdown.
                stop_signal.wait();
                break;
            };

            if stop_signal.sleep_until(deadline) == WakeupReason::Stopped {
                break;
            }

            phase = phase.toggled();
            last_transition = Instant::now();
            shared.publish(phase);
            tracing::debug!(%phase, ?interval, "phase changed");
        }
    }

    /// Spawns the toggle thread and waits for it to start up.
    pub(crate) fn spawn(
        shared: Arc<SharedPhase>,
        interval_source: Box<dyn IntervalSource + Send>,
    ) -> io::Result<Self> {
        let stop_signal = Arc::new(StopSignal::new());
        let thread_startup_barrier = Arc::new(Barrier::new(2));
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_owned())
            .spawn(Self::thread_fn(
                shared,
                interval_source,
                stop_signal.clone(),
                thread_startup_barrier.clone(),
            ))?;

        // Wait for thread to start up.
        thread_startup_barrier.wait();

        Ok(Self {
            stop_signal,
            handle: Some(handle),
        })
    }

    /// Stops the thread and waits for it to exit.
    ///
    /// Returns `false` if the thread panicked.
    pub(crate) fn shutdown(mut self) -> bool {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> bool {
        self.stop_signal.stop();
        self.handle
            .take()
            .is_none_or(|handle| handle.join().is_ok())
    }
}

impl Drop for ToggleLoop {
    fn drop(&mut self) {
        if self.handle.is_some() && !self.stop_and_join() {
            tracing::warn!("toggle loop panicked");
        }
    }
}
