//! Time sources used for expiration and recency bookkeeping.
//!
//! All timestamps inside the cache are nanoseconds since a fixed origin. The
//! default [`SystemClock`] measures from a process-wide epoch; [`ManualClock`]
//! is driven by hand and is what the test-suite uses to make expiration
//! deterministic.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// The single, static reference point for all wall-clock calculations.
// It is initialized lazily on its first use.
static CACHE_EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// A monotonic time source.
pub trait Clock: Send + Sync + 'static {
  /// Nanoseconds elapsed since this clock's origin. Must never go backwards.
  fn now_nanos(&self) -> u64;
}

/// The real, monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  #[inline]
  fn now_nanos(&self) -> u64 {
    duration_to_nanos(Instant::now().saturating_duration_since(*CACHE_EPOCH))
  }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the cache builder.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
  nanos: Arc<AtomicU64>,
}

impl ManualClock {
  /// Creates a clock positioned at its origin.
  pub fn new() -> Self {
    Self::default()
  }

  /// Moves the clock forward by `by`.
  pub fn advance(&self, by: Duration) {
    self.nanos.fetch_add(duration_to_nanos(by), Ordering::SeqCst);
  }

  /// Positions the clock at `at` past its origin. Moving backwards is ignored.
  pub fn set(&self, at: Duration) {
    self.nanos.fetch_max(duration_to_nanos(at), Ordering::SeqCst);
  }

  /// The current position of the clock.
  pub fn elapsed(&self) -> Duration {
    Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
  }
}

impl Clock for ManualClock {
  #[inline]
  fn now_nanos(&self) -> u64 {
    self.nanos.load(Ordering::SeqCst)
  }
}

impl<C: Clock> Clock for Arc<C> {
  #[inline]
  fn now_nanos(&self) -> u64 {
    (**self).now_nanos()
  }
}

/// Saturating conversion of a `Duration` to whole nanoseconds.
#[inline]
pub(crate) fn duration_to_nanos(duration: Duration) -> u64 {
  u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
