// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Time sources for duration measurement.
//!
//! Route-switch timing needs a monotonic clock; tests need one they can
//! steer. Both sit behind the [`Clock`] trait so the tracker never touches
//! wall-clock time directly.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// A monotonic time source.
///
/// Implementations report elapsed time since an arbitrary fixed origin.
/// Only differences between readings are meaningful.
pub trait Clock: Send + Sync {
    /// Elapsed time since the clock's origin.
    fn now(&self) -> Duration;

    /// Elapsed time since the clock's origin, in fractional milliseconds.
    fn now_millis(&self) -> f64 {
        self.now().as_secs_f64() * 1000.0
    }
}

static TIME_ORIGIN: Lazy<Instant> = Lazy::new(Instant::now);

/// The real monotonic clock.
///
/// All instances share one process-wide origin, so readings from separate
/// instances are directly comparable.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotonicClock;

impl MonotonicClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        TIME_ORIGIN.elapsed()
    }
}

/// A hand-driven clock for tests.
///
/// Clones share the same underlying reading, so a test can hold one clone
/// and advance time while the code under test reads another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Create a clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock starting at the given reading.
    pub fn at(now: Duration) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    /// Move the clock forward by whole milliseconds.
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Set the clock to an absolute reading.
    pub fn set(&self, now: Duration) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_clock_advances() {
        let clock = MonotonicClock::new();
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }

    #[test]
    fn test_monotonic_instances_share_origin() {
        let a = MonotonicClock::new();
        let b = MonotonicClock::new();
        let reading_a = a.now();
        let reading_b = b.now();
        assert!(reading_b >= reading_a);
        assert!(reading_b - reading_a < Duration::from_secs(1));
    }

    #[test]
    fn test_manual_clock_advances_on_demand() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance_millis(120);
        assert_eq!(clock.now(), Duration::from_millis(120));
        assert_eq!(clock.now_millis(), 120.0);

        clock.advance(Duration::from_micros(500));
        assert_eq!(clock.now_millis(), 120.5);
    }

    #[test]
    fn test_manual_clock_clones_share_state() {
        let clock = ManualClock::at(Duration::from_secs(1));
        let observer: Arc<dyn Clock> = Arc::new(clock.clone());

        clock.advance_millis(250);
        assert_eq!(observer.now(), Duration::from_millis(1250));

        clock.set(Duration::ZERO);
        assert_eq!(observer.now(), Duration::ZERO);
    }
}
