//! The phase controller. See [`TrafficLight`].

use crate::error::TrafficLightError;
use crate::interval::{IntervalSource, RandomInterval};
use crate::phase::Phase;
use crate::toggle_loop::{SharedPhase, ToggleLoop};
use std::fmt;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

enum Lifecycle {
    Idle(Box<dyn IntervalSource + Send>),
    Running(ToggleLoop),
    Stopped,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle(_) => f.write_str("Idle"),
            Self::Running(toggle_loop) => f.debug_tuple("Running").field(toggle_loop).finish(),
            Self::Stopped => f.write_str("Stopped"),
        }
    }
}

/// A traffic light that toggles between [`Phase::Red`] and [`Phase::Green`]
/// on its own once [`TrafficLight::simulate`] was called.
///
/// Each phase is held for an interval drawn from an [`IntervalSource`],
/// uniformly between 4 and 6 seconds by default. Every new phase is published
/// through a LIFO [`MessageQueue`], which any number of threads can wait on
/// with [`TrafficLight::wait_for_green`].
///
/// The queue hands out the newest phase first and keeps everything nobody
/// received. While waiters keep up, each one sees the phase that was just
/// published. Once phases pile up, a waiter can be released by an old
/// [`Phase::Green`] buried under newer values, even though the light is red
/// by now. Check [`TrafficLight::current_phase`] if the live phase matters.
///
/// Dropping the light stops and joins its background thread.
///
/// [`MessageQueue`]: crate::message_queue::MessageQueue
#[derive(Debug)]
pub struct TrafficLight {
    shared: Arc<SharedPhase>,
    lifecycle: Mutex<Lifecycle>,
}

impl TrafficLight {
    /// A red light holding each phase for 4 to 6 seconds.
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval_source(RandomInterval::new())
    }

    /// A red light that asks `interval_source` how long to hold each phase.
    #[must_use]
    pub fn with_interval_source(interval_source: impl IntervalSource + Send + 'static) -> Self {
        Self {
            shared: Arc::new(SharedPhase::new(Phase::Red)),
            lifecycle: Mutex::new(Lifecycle::Idle(Box::new(interval_source))),
        }
    }

    /// Starts toggling the phase in a background thread.
    ///
    /// Returns as soon as the thread is up; the first toggle happens one
    /// interval later. A light can only be started once, later calls fail
    /// with [`TrafficLightError::AlreadyStarted`], even after
    /// [`TrafficLight::stop`].
    pub fn simulate(&self) -> Result<(), TrafficLightError> {
        let mut lifecycle = self.lock_lifecycle();
        let interval_source = match mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Idle(interval_source) => interval_source,
            other => {
                *lifecycle = other;
                return Err(TrafficLightError::AlreadyStarted);
            }
        };

        let toggle_loop = ToggleLoop::spawn(self.shared.clone(), interval_source)?;
        *lifecycle = Lifecycle::Running(toggle_loop);
        drop(lifecycle);

        tracing::info!(phase = %self.current_phase(), "simulation started");
        Ok(())
    }

    /// Stops the background thread and waits for it to exit.
    ///
    /// Does nothing if the light is not running. Threads blocked in
    /// [`TrafficLight::wait_for`] stay blocked, no further phases are
    /// published.
    pub fn stop(&self) -> Result<(), TrafficLightError> {
        let mut lifecycle = self.lock_lifecycle();
        let toggle_loop = match mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Running(toggle_loop) => toggle_loop,
            other => {
                *lifecycle = other;
                return Ok(());
            }
        };
        drop(lifecycle);

        let exited_cleanly = toggle_loop.shutdown();
        tracing::info!(phase = %self.current_phase(), "simulation stopped");
        if exited_cleanly {
            Ok(())
        } else {
            Err(TrafficLightError::LoopPanicked)
        }
    }

    /// Whether the background thread is currently toggling the phase.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(*self.lock_lifecycle(), Lifecycle::Running(_))
    }

    /// The phase shown right now. Never blocks.
    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.shared.current()
    }

    /// Blocks until the light publishes [`Phase::Green`].
    pub fn wait_for_green(&self) {
        self.wait_for(Phase::Green);
    }

    /// Blocks until the light publishes `target`, discarding other phases.
    ///
    /// Phases are received newest first, so with a backlog in the queue this
    /// may return on a stale `target` that is no longer current.
    pub fn wait_for(&self, target: Phase) {
        loop {
            let phase = self.shared.queue().receive();
            if phase == target {
                return;
            }
            tracing::trace!(%phase, %target, "discarding phase");
        }
    }

    fn lock_lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::DEFAULT_CYCLE_MAX;
    use assert2::check;
    use std::sync::mpsc;
    use std::thread;
    use std::time::{Duration, Instant};

    const LONG: Duration = Duration::from_secs(3600);

    /// Holds the first phase for `first`, every later one for an hour.
    fn first_then_long(first: Duration) -> impl IntervalSource + Send + 'static {
        let mut intervals = [first].into_iter();
        move || intervals.next().unwrap_or(LONG)
    }

    fn spawn_waiter(light: &Arc<TrafficLight>) -> mpsc::Receiver<Instant> {
        let (sender, receiver) = mpsc::channel();
        let light = light.clone();
        thread::spawn(move || {
            light.wait_for_green();
            let _ = sender.send(Instant::now());
        });
        receiver
    }

    #[test]
    fn starts_red() {
        let light = TrafficLight::new();
        check!(light.current_phase() == Phase::Red);
        check!(!light.is_running());
    }

    #[test]
    fn turns_green_at_first_toggle() {
        let light = Arc::new(TrafficLight::with_interval_source(first_then_long(
            Duration::from_millis(30),
        )));
        let waiter = spawn_waiter(&light);

        light.simulate().unwrap();
        check!(light.is_running());
        check!(light.current_phase() == Phase::Red);

        check!(waiter.recv_timeout(Duration::from_secs(1)).is_ok());
        check!(light.current_phase() == Phase::Green);
        light.stop().unwrap();
    }

    #[test]
    fn keeps_alternating() {
        const INTERVAL: Duration = Duration::from_millis(25);
        const TOGGLES: u32 = 6;

        let light = TrafficLight::with_interval_source(|| INTERVAL);
        let begin = Instant::now();
        light.simulate().unwrap();

        // Draining as fast as phases arrive, so nothing piles up.
        let mut expected = Phase::Red;
        for toggle in 1..=TOGGLES {
            expected = expected.toggled();
            check!(light.shared.queue().receive() == expected);
            check!(begin.elapsed() >= INTERVAL * toggle);
        }
        check!(begin.elapsed() < INTERVAL * TOGGLES * 2);
        light.stop().unwrap();
        check!(light.shared.queue().is_empty());
    }

    #[test]
    fn wait_for_skips_other_phases() {
        let light = Arc::new(TrafficLight::with_interval_source(|| {
            Duration::from_millis(20)
        }));
        light.simulate().unwrap();

        let (sender, receiver) = mpsc::channel();
        {
            let light = light.clone();
            thread::spawn(move || {
                // Red is published at the second toggle, after green was discarded.
                light.wait_for(Phase::Red);
                light.wait_for(Phase::Green);
                let _ = sender.send(());
            });
        }

        check!(receiver.recv_timeout(Duration::from_secs(1)).is_ok());
        light.stop().unwrap();
    }

    #[test]
    fn backlog_releases_waiter_on_stale_green() {
        const INTERVAL: Duration = Duration::from_millis(5);

        // Green, then red, then red is held for an hour.
        let mut intervals = [INTERVAL, INTERVAL].into_iter();
        let light = Arc::new(TrafficLight::with_interval_source(move || {
            intervals.next().unwrap_or(LONG)
        }));
        light.simulate().unwrap();

        // Nobody observes the first two toggles.
        let begin = Instant::now();
        while light.shared.queue().len() < 2 {
            assert!(begin.elapsed() < Duration::from_secs(1), "light did not toggle");
            thread::sleep(Duration::from_millis(1));
        }
        check!(light.current_phase() == Phase::Red);

        // Red on top is discarded, the green below it releases the waiter.
        let waiter = spawn_waiter(&light);
        check!(waiter.recv_timeout(Duration::from_secs(1)).is_ok());
        check!(light.current_phase() == Phase::Red);
        check!(light.shared.queue().is_empty());
        light.stop().unwrap();
    }

    #[test]
    fn all_observers_get_through() {
        const OBSERVERS: usize = 8;

        let light = Arc::new(TrafficLight::with_interval_source(|| {
            Duration::from_millis(10)
        }));
        let waiters = (0..OBSERVERS)
            .map(|_| spawn_waiter(&light))
            .collect::<Vec<_>>();

        light.simulate().unwrap();
        for waiter in waiters {
            check!(waiter.recv_timeout(Duration::from_secs(2)).is_ok());
        }
        light.stop().unwrap();
    }

    #[test]
    fn simulate_twice_is_rejected() {
        let light = TrafficLight::with_interval_source(|| LONG);
        light.simulate().unwrap();

        let err = light.simulate().unwrap_err();
        check!(matches!(err, TrafficLightError::AlreadyStarted));

        light.stop().unwrap();
        let err = light.simulate().unwrap_err();
        check!(matches!(err, TrafficLightError::AlreadyStarted));
    }

    #[test]
    fn stop_interrupts_pending_interval() {
        let light = TrafficLight::new();
        light.simulate().unwrap();

        let begin = Instant::now();
        light.stop().unwrap();
        check!(begin.elapsed() < Duration::from_millis(100));
        check!(!light.is_running());
        check!(light.current_phase() == Phase::Red);

        // Stopping again is a no-op.
        light.stop().unwrap();
    }

    #[test]
    fn stop_before_simulate_is_a_noop() {
        let light = Arc::new(TrafficLight::with_interval_source(first_then_long(
            Duration::from_millis(10),
        )));
        light.stop().unwrap();

        let waiter = spawn_waiter(&light);
        light.simulate().unwrap();
        check!(waiter.recv_timeout(Duration::from_secs(1)).is_ok());
        light.stop().unwrap();
    }

    #[test]
    fn drop_stops_the_loop() {
        let light = TrafficLight::with_interval_source(|| LONG);
        light.simulate().unwrap();

        let begin = Instant::now();
        // Test succeeds if this does not get stuck.
        drop(light);
        check!(begin.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn panicking_interval_source_is_reported() {
        let light = TrafficLight::with_interval_source(|| -> Duration {
            panic!("interval source failure")
        });
        light.simulate().unwrap();

        let err = light.stop().unwrap_err();
        check!(matches!(err, TrafficLightError::LoopPanicked));
        check!(!light.is_running());
    }

    #[test]
    fn default_light_turns_green_within_one_cycle() {
        const SLACK: Duration = Duration::from_millis(500);

        let light = Arc::new(TrafficLight::new());
        let begin = Instant::now();
        light.simulate().unwrap();
        let waiter = spawn_waiter(&light);

        let turned_green = waiter.recv_timeout(DEFAULT_CYCLE_MAX + SLACK).unwrap();
        check!(turned_green - begin >= Duration::from_millis(4000));
        // The next toggle is at least 4 seconds away.
        check!(light.current_phase() == Phase::Green);
        light.stop().unwrap();
    }
}
