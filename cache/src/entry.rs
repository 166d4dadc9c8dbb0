use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A container for a value in the cache, holding all necessary metadata.
///
/// Entries are owned by the [`EntryStore`](crate::store::EntryStore). The only
/// fields that change after creation are the access stamps, which are atomic
/// so that a hit can refresh recency while holding just the read lock.
#[derive(Debug)]
pub(crate) struct CacheEntry<V> {
  /// The user's value, wrapped in an Arc for shared ownership.
  value: Arc<V>,
  /// The size estimate charged against capacity.
  size: u64,
  /// When the value was fetched or written, in clock nanoseconds.
  fetched_at: u64,
  /// Store-wide logical tick at write time. Breaks timestamp ties.
  fetch_tick: u64,
  /// The last access timestamp in clock nanoseconds.
  last_accessed: AtomicU64,
  /// Store-wide logical tick at last access.
  access_tick: AtomicU64,
}

impl<V> CacheEntry<V> {
  /// Creates a new entry; a write counts as the first access.
  pub(crate) fn new(value: Arc<V>, size: u64, now: u64, tick: u64) -> Self {
    Self {
      value,
      size,
      fetched_at: now,
      fetch_tick: tick,
      last_accessed: AtomicU64::new(now),
      access_tick: AtomicU64::new(tick),
    }
  }

  /// Returns a clone of the `Arc` containing the value.
  #[inline]
  pub(crate) fn value(&self) -> Arc<V> {
    self.value.clone()
  }

  #[inline]
  pub(crate) fn value_ref(&self) -> &V {
    &self.value
  }

  #[inline]
  pub(crate) fn into_value(self) -> Arc<V> {
    self.value
  }

  #[inline]
  pub(crate) fn size(&self) -> u64 {
    self.size
  }

  #[inline]
  pub(crate) fn fetched_at(&self) -> u64 {
    self.fetched_at
  }

  #[inline]
  pub(crate) fn last_accessed(&self) -> u64 {
    self.last_accessed.load(Ordering::Relaxed)
  }

  /// Marks the entry as accessed. Two relaxed stores; callable under a read lock.
  #[inline]
  pub(crate) fn touch(&self, now: u64, tick: u64) {
    self.last_accessed.fetch_max(now, Ordering::Relaxed);
    self.access_tick.fetch_max(tick, Ordering::Relaxed);
  }

  /// Total recency order: `(last access time, access tick)`.
  #[inline]
  pub(crate) fn recency(&self) -> (u64, u64) {
    (self.last_accessed(), self.access_tick.load(Ordering::Relaxed))
  }

  /// Total age order: `(fetch time, fetch tick)`.
  #[inline]
  pub(crate) fn age(&self) -> (u64, u64) {
    (self.fetched_at, self.fetch_tick)
  }

  /// How long the entry has gone without an access, as of `now`.
  #[inline]
  pub(crate) fn idle_nanos(&self, now: u64) -> u64 {
    now.saturating_sub(self.last_accessed())
  }
}
