use crate::error::CacheError;
use crate::handles::Cache;
use crate::loader::Fetcher;
use crate::shared::ReapSummary;
use crate::MetricsSnapshot;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

/// A cache that fills itself: `get` always resolves to a value or an error.
///
/// On a miss (absent or expired) the calling thread takes the write lock,
/// re-checks the key, and only then runs the fetcher. Concurrent callers for
/// the same key queue on that lock and find the fetched value when they get
/// in, so each miss runs the fetcher at most once.
///
/// The fetcher runs with the write lock held. A slow fetcher therefore stalls
/// every other operation on this cache, including hits on unrelated keys.
pub struct LoadingCache<K, V, H = ahash::RandomState> {
  cache: Cache<K, V, H>,
  fetcher: Fetcher<K, V>,
}

impl<K, V, H> Clone for LoadingCache<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
      fetcher: self.fetcher.clone(),
    }
  }
}

impl<K, V, H> fmt::Debug for LoadingCache<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LoadingCache")
      .field("cache", &self.cache)
      .finish_non_exhaustive()
  }
}

impl<K, V, H> LoadingCache<K, V, H> {
  pub(crate) fn new(cache: Cache<K, V, H>, fetcher: Fetcher<K, V>) -> Self {
    Self { cache, fetcher }
  }
}

impl<K, V, H> LoadingCache<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  /// Returns the cached value, fetching it on a miss.
  ///
  /// # Errors
  ///
  /// - [`CacheError::Fetch`] if the fetcher failed; nothing is stored.
  /// - [`CacheError::NullValue`] if the fetcher produced the null marker
  ///   under [`NullValuePolicy::Fail`](crate::NullValuePolicy::Fail).
  /// - [`CacheError::SizeEstimate`] if sizing the fetched value failed.
  pub fn get(&self, key: &K) -> Result<Arc<V>, CacheError> {
    self.cache.shared.get_or_fetch(key, &self.fetcher)
  }

  /// Re-runs the fetcher for `key` even if a fresh entry exists, replacing
  /// (and disposing) the old value. If the fetch fails, the old entry stays.
  pub fn refresh(&self, key: &K) -> Result<Arc<V>, CacheError> {
    self.cache.shared.refresh(key, &self.fetcher)
  }

  /// Looks up `key` without fetching, refreshing recency or counting.
  pub fn peek(&self, key: &K) -> Option<Arc<V>> {
    self.cache.peek(key)
  }

  pub fn contains_key(&self, key: &K) -> bool {
    self.cache.contains_key(key)
  }

  /// See [`Cache::put`].
  pub fn put(&self, key: K, value: V) -> Result<(), CacheError> {
    self.cache.put(key, value)
  }

  /// See [`Cache::bulk_load`].
  pub fn bulk_load<I>(&self, entries: I) -> Result<usize, CacheError>
  where
    I: IntoIterator<Item = (K, V)>,
  {
    self.cache.bulk_load(entries)
  }

  pub fn remove(&self, key: &K) -> Option<Arc<V>> {
    self.cache.remove(key)
  }

  pub fn invalidate(&self, key: &K) -> bool {
    self.cache.invalidate(key)
  }

  pub fn invalidate_where<F>(&self, predicate: F) -> usize
  where
    F: FnMut(&K, &V) -> bool,
  {
    self.cache.invalidate_where(predicate)
  }

  pub fn flush(&self) -> usize {
    self.cache.flush()
  }

  pub fn reap(&self) -> ReapSummary {
    self.cache.reap()
  }

  pub fn len(&self) -> usize {
    self.cache.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cache.is_empty()
  }

  pub fn current_size(&self) -> u64 {
    self.cache.current_size()
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.cache.metrics()
  }

  /// The underlying non-loading cache, sharing the same entries.
  pub fn as_cache(&self) -> &Cache<K, V, H> {
    &self.cache
  }
}
