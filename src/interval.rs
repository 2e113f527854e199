//! Sources for the time a phase is held before the light toggles.

use std::ops::Range;
use std::time::Duration;

/// Shortest time a phase is held by default.
pub const DEFAULT_CYCLE_MIN: Duration = Duration::from_millis(4000);
/// Upper bound (exclusive) of the time a phase is held by default.
pub const DEFAULT_CYCLE_MAX: Duration = Duration::from_millis(6000);

/// Supplies the duration of each cycle of the toggle loop.
///
/// A fresh interval is requested for every transition. Closures returning a
/// [`Duration`] implement this trait, which is handy for deterministic
/// schedules.
pub trait IntervalSource {
    /// Duration to hold the current phase before the next toggle.
    fn next_interval(&mut self) -> Duration;
}

impl<F: FnMut() -> Duration> IntervalSource for F {
    fn next_interval(&mut self) -> Duration {
        self()
    }
}

/// Draws intervals uniformly, with microsecond granularity, from a range that
/// defaults to `[DEFAULT_CYCLE_MIN, DEFAULT_CYCLE_MAX)`.
#[derive(Debug, Clone)]
pub struct RandomInterval {
    rng: fastrand::Rng,
    bounds_us: Range<u64>,
}

impl RandomInterval {
    /// Seeded from entropy; not reproducible.
    #[must_use]
    pub fn new() -> Self {
        Self::from_rng(fastrand::Rng::new())
    }

    /// Reproducible sequence of intervals.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(fastrand::Rng::with_seed(seed))
    }

    /// Replaces the range intervals are drawn from. Bounds are truncated to
    /// whole microseconds; an empty range always yields its start.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Range<Duration>) -> Self {
        self.bounds_us = as_micros(bounds.start)..as_micros(bounds.end);
        self
    }

    fn from_rng(rng: fastrand::Rng) -> Self {
        Self {
            rng,
            bounds_us: as_micros(DEFAULT_CYCLE_MIN)..as_micros(DEFAULT_CYCLE_MAX),
        }
    }
}

impl Default for RandomInterval {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalSource for RandomInterval {
    fn next_interval(&mut self) -> Duration {
        let micros = if self.bounds_us.is_empty() {
            self.bounds_us.start
        } else {
            self.rng.u64(self.bounds_us.clone())
        };
        Duration::from_micros(micros)
    }
}

fn as_micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}
