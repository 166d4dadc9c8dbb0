use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// A thread-safe, internal metrics collector for the cache.
/// All fields are atomic so hits can be counted under the read lock.
#[derive(Debug)]
pub(crate) struct Metrics {
  // --- Hit/Miss Ratios ---
  pub(crate) hits: CachePadded<AtomicU64>,
  pub(crate) misses: CachePadded<AtomicU64>,

  // --- Throughput ---
  pub(crate) inserts: CachePadded<AtomicU64>,
  pub(crate) updates: CachePadded<AtomicU64>,
  pub(crate) invalidations: CachePadded<AtomicU64>,

  // --- Reaping ---
  pub(crate) evicted_by_capacity: CachePadded<AtomicU64>,
  pub(crate) evicted_by_expiry: CachePadded<AtomicU64>,
  pub(crate) evicted_by_idle: CachePadded<AtomicU64>,
  pub(crate) reaps: CachePadded<AtomicU64>,

  // --- Fetch on miss ---
  pub(crate) fetches: CachePadded<AtomicU64>,
  pub(crate) fetch_failures: CachePadded<AtomicU64>,
  pub(crate) null_values: CachePadded<AtomicU64>,

  // --- Disposal ---
  pub(crate) disposals: CachePadded<AtomicU64>,
  pub(crate) disposal_failures: CachePadded<AtomicU64>,

  // --- Timestamps for Uptime ---
  created_at: Instant,
}

// Manual implementation of Default to handle the non-default `Instant`.
impl Default for Metrics {
  fn default() -> Self {
    let zero = || CachePadded::new(AtomicU64::new(0));
    Self {
      hits: zero(),
      misses: zero(),
      inserts: zero(),
      updates: zero(),
      invalidations: zero(),
      evicted_by_capacity: zero(),
      evicted_by_expiry: zero(),
      evicted_by_idle: zero(),
      reaps: zero(),
      fetches: zero(),
      fetch_failures: zero(),
      null_values: zero(),
      disposals: zero(),
      disposal_failures: zero(),
      created_at: Instant::now(),
    }
  }
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub(crate) fn incr(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
  }

  #[inline]
  pub(crate) fn add(counter: &AtomicU64, n: u64) {
    if n > 0 {
      counter.fetch_add(n, Ordering::Relaxed);
    }
  }

  /// Creates a point-in-time snapshot. `current_size` and `entries` are read
  /// from the store by the caller.
  pub(crate) fn snapshot(&self, current_size: u64, entries: usize) -> MetricsSnapshot {
    let hits = self.hits.load(Ordering::Relaxed);
    let misses = self.misses.load(Ordering::Relaxed);
    let total_lookups = hits + misses;

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio: if total_lookups == 0 {
        0.0
      } else {
        hits as f64 / total_lookups as f64
      },
      inserts: self.inserts.load(Ordering::Relaxed),
      updates: self.updates.load(Ordering::Relaxed),
      invalidations: self.invalidations.load(Ordering::Relaxed),
      evicted_by_capacity: self.evicted_by_capacity.load(Ordering::Relaxed),
      evicted_by_expiry: self.evicted_by_expiry.load(Ordering::Relaxed),
      evicted_by_idle: self.evicted_by_idle.load(Ordering::Relaxed),
      reaps: self.reaps.load(Ordering::Relaxed),
      fetches: self.fetches.load(Ordering::Relaxed),
      fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
      null_values: self.null_values.load(Ordering::Relaxed),
      disposals: self.disposals.load(Ordering::Relaxed),
      disposal_failures: self.disposal_failures.load(Ordering::Relaxed),
      current_size,
      entries,
      uptime_secs: self.created_at.elapsed().as_secs(),
    }
  }
}

/// A point-in-time, public-facing snapshot of the cache's metrics.
#[derive(Clone)]
pub struct MetricsSnapshot {
  /// Lookups that found a fresh entry.
  pub hits: u64,
  /// Lookups that found nothing or an expired entry.
  pub misses: u64,
  /// The cache hit ratio (hits / (hits + misses)).
  pub hit_ratio: f64,
  /// Entries created for a previously absent key.
  pub inserts: u64,
  /// Writes that overwrote an existing entry.
  pub updates: u64,
  /// Entries removed by `invalidate`, `remove` or `invalidate_where`.
  pub invalidations: u64,
  /// Entries chosen as capacity victims.
  pub evicted_by_capacity: u64,
  /// Entries removed because their deadline passed.
  pub evicted_by_expiry: u64,
  /// Entries removed by the idle-time threshold.
  pub evicted_by_idle: u64,
  /// Reap passes run, whether triggered by capacity or on demand.
  pub reaps: u64,
  /// Fetcher invocations.
  pub fetches: u64,
  /// Fetcher invocations that returned an error.
  pub fetch_failures: u64,
  /// Values flagged as null, under any null policy.
  pub null_values: u64,
  /// Disposal action invocations.
  pub disposals: u64,
  /// Disposal action invocations that failed or panicked.
  pub disposal_failures: u64,
  /// Aggregate size of all live entries.
  pub current_size: u64,
  /// Number of live entries.
  pub entries: usize,
  /// The number of seconds the cache has been running.
  pub uptime_secs: u64,
}

impl fmt::Debug for MetricsSnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MetricsSnapshot")
      .field("hits", &self.hits)
      .field("misses", &self.misses)
      .field("hit_ratio", &format!("{:.2}%", self.hit_ratio * 100.0))
      .field("inserts", &self.inserts)
      .field("updates", &self.updates)
      .field("invalidations", &self.invalidations)
      .field("evicted_by_capacity", &self.evicted_by_capacity)
      .field("evicted_by_expiry", &self.evicted_by_expiry)
      .field("evicted_by_idle", &self.evicted_by_idle)
      .field("reaps", &self.reaps)
      .field("fetches", &self.fetches)
      .field("fetch_failures", &self.fetch_failures)
      .field("null_values", &self.null_values)
      .field("disposals", &self.disposals)
      .field("disposal_failures", &self.disposal_failures)
      .field("current_size", &self.current_size)
      .field("entries", &self.entries)
      .field("uptime_secs", &self.uptime_secs)
      .finish()
  }
}
