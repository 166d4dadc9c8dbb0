use crate::error::CacheError;
use crate::shared::{CacheShared, ReapSummary};
use crate::MetricsSnapshot;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// A thread-safe, synchronous cache.
///
/// Cloning is cheap and yields another handle to the same cache. Lookups
/// that hit take only the shared read lock; every mutation takes the single
/// exclusive write lock of this instance.
pub struct Cache<K, V, H = ahash::RandomState> {
  pub(crate) shared: Arc<CacheShared<K, V, H>>,
}

impl<K, V, H> Clone for Cache<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<K, V, H> fmt::Debug for Cache<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache").field("shared", &self.shared).finish()
  }
}

impl<K, V, H> Cache<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  /// Fetches a value from the cache, returning a clone of the `Arc` if the key
  /// is present and not expired.
  ///
  /// A hit refreshes the entry's last-access time. Finding an expired entry
  /// counts as a miss, and the entry is removed (and disposed) on the spot.
  pub fn get(&self, key: &K) -> Option<Arc<V>> {
    self.shared.get(key)
  }

  /// "Peeks" at a value without updating its recency or access time and
  /// without touching the hit/miss counters.
  pub fn peek(&self, key: &K) -> Option<Arc<V>> {
    self.shared.peek(key)
  }

  /// Whether a fresh entry exists for `key`. Like `peek`, never refreshes
  /// recency.
  pub fn contains_key(&self, key: &K) -> bool {
    self.shared.contains_key(key)
  }

  /// Inserts or overwrites `key`, resetting its fetch time.
  ///
  /// The value first goes through the null policy, then the size estimator;
  /// if either fails, the cache is left unchanged. An overwritten value is
  /// disposed. If the insert takes the cache over capacity a reap pass runs
  /// before this returns; the entry just written is never its victim.
  pub fn put(&self, key: K, value: V) -> Result<(), CacheError> {
    self.shared.put(key, value)
  }

  /// Inserts a batch under a single write lock, followed by at most one reap.
  ///
  /// Null screening and size estimation run for the whole batch before the
  /// lock is taken, so one failing entry aborts the batch with nothing
  /// stored. Returns the number of entries stored.
  pub fn bulk_load<I>(&self, entries: I) -> Result<usize, CacheError>
  where
    I: IntoIterator<Item = (K, V)>,
  {
    self.shared.bulk_load(entries)
  }

  /// Removes `key` and returns its value, disposing it. `None` if absent.
  pub fn remove(&self, key: &K) -> Option<Arc<V>> {
    self.shared.invalidate(key)
  }

  /// Removes `key` if present. Returns whether anything was removed.
  pub fn invalidate(&self, key: &K) -> bool {
    self.shared.invalidate(key).is_some()
  }

  /// Removes every entry for which `predicate` returns true, under one
  /// write lock. Returns the number removed.
  pub fn invalidate_where<F>(&self, predicate: F) -> usize
  where
    F: FnMut(&K, &V) -> bool,
  {
    self.shared.invalidate_where(predicate)
  }

  /// Empties the cache, disposing every value. Returns the number removed.
  pub fn flush(&self) -> usize {
    self.shared.flush()
  }

  /// Same as [`flush`](Self::flush).
  pub fn clear(&self) {
    self.shared.flush();
  }

  /// Runs one reap pass now: expired entries, idle entries (idle-time
  /// policy only), then capacity victims.
  pub fn reap(&self) -> ReapSummary {
    self.shared.reap()
  }

  /// The keys of all fresh entries, in no particular order.
  pub fn keys(&self) -> Vec<K> {
    self.shared.keys()
  }

  /// Number of entries held, including expired ones not yet reaped.
  pub fn len(&self) -> usize {
    self.shared.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Aggregate size of every entry held.
  pub fn current_size(&self) -> u64 {
    self.shared.current_size()
  }

  /// The configured maximum capacity; `u64::MAX` when unbounded.
  pub fn capacity(&self) -> u64 {
    self.shared.accountant.capacity()
  }

  /// True while a single entry larger than the capacity keeps the cache
  /// over its limit.
  pub fn is_over_capacity(&self) -> bool {
    self.shared.is_over_capacity()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics()
  }
}
