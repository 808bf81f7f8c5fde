//! Time representation and time sources.
//!
//! All timestamps in the mapper are microseconds (`u64`). Measurement
//! producers stamp their own data; the mapper only needs "now" to decide
//! commit eligibility, and it gets that through the [`TimeSource`] trait so
//! replay and tests can drive the clock manually.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Timestamp in microseconds.
pub type Time = u64;

/// Microseconds per second.
pub const US_PER_SEC: u64 = 1_000_000;

/// Convert seconds (as f32, e.g. from config) to microseconds.
#[inline]
pub fn secs_to_us(secs: f32) -> Time {
    (secs.max(0.0) as f64 * US_PER_SEC as f64) as Time
}

/// Source of the current time, used for commit-window decisions.
pub trait TimeSource: Send + Sync {
    /// Current time in microseconds.
    fn now(&self) -> Time;
}

/// Wall-clock time source (microseconds since the Unix epoch).
#[derive(Debug, Default)]
pub struct WallClock;

impl TimeSource for WallClock {
    fn now(&self) -> Time {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as u64)
            .unwrap_or(0)
    }
}

/// Manually driven clock for offline replay and tests.
///
/// Shared freely; `set`/`advance` take `&self` so the clock can be advanced
/// while the mapper holds a reference to it.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_us: AtomicU64,
}

impl ManualClock {
    /// Create a clock starting at `now_us`.
    pub fn new(now_us: Time) -> Self {
        Self {
            now_us: AtomicU64::new(now_us),
        }
    }

    /// Set the current time.
    pub fn set(&self, now_us: Time) {
        self.now_us.store(now_us, Ordering::SeqCst);
    }

    /// Advance the current time by `delta_us`.
    pub fn advance(&self, delta_us: Time) {
        self.now_us.fetch_add(delta_us, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Time {
        self.now_us.load(Ordering::SeqCst)
    }
}
