use crate::entry::CacheEntry;

use core::fmt;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// The hash-indexed map from key to entry, plus the aggregate size of every
/// live entry.
///
/// The store does no locking of its own. Every method is called while the
/// owning cache holds its [`CacheLock`](crate::sync::CacheLock): `&self`
/// methods under the read lock, `&mut self` methods under the write lock.
pub(crate) struct EntryStore<K, V, H> {
  map: HashMap<K, CacheEntry<V>, H>,
  /// Always equal to the sum of `size()` over `map`'s entries once a `&mut`
  /// method has returned.
  current_size: u64,
  /// Logical clock handed out to writes and accesses.
  tick: AtomicU64,
}

impl<K, V, H> fmt::Debug for EntryStore<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EntryStore")
      .field("len", &self.map.len())
      .field("current_size", &self.current_size)
      .finish()
  }
}

impl<K, V, H> EntryStore<K, V, H> {
  /// Empties the store, handing every entry back to the caller.
  pub(crate) fn clear(&mut self) -> Vec<(K, CacheEntry<V>)> {
    self.current_size = 0;
    self.map.drain().collect()
  }
}

impl<K, V, H> EntryStore<K, V, H>
where
  K: Eq + Hash,
  H: BuildHasher,
{
  pub(crate) fn new(hasher: H) -> Self {
    Self {
      map: HashMap::with_hasher(hasher),
      current_size: 0,
      tick: AtomicU64::new(0),
    }
  }

  /// Hands out the next logical tick. Safe to call under the read lock.
  #[inline]
  pub(crate) fn next_tick(&self) -> u64 {
    self.tick.fetch_add(1, Ordering::Relaxed)
  }

  #[inline]
  pub(crate) fn try_get(&self, key: &K) -> Option<&CacheEntry<V>> {
    self.map.get(key)
  }

  /// Inserts or overwrites `key`, returning the entry it replaced.
  ///
  /// The aggregate size moves by `size - old.size()` in one step.
  pub(crate) fn upsert(&mut self, key: K, value: Arc<V>, size: u64, now: u64) -> Option<CacheEntry<V>> {
    let tick = self.next_tick();
    let old = self.map.insert(key, CacheEntry::new(value, size, now, tick));
    let old_size = old.as_ref().map_or(0, CacheEntry::size);
    self.current_size = self.current_size.saturating_sub(old_size).saturating_add(size);
    old
  }

  pub(crate) fn remove(&mut self, key: &K) -> Option<(K, CacheEntry<V>)> {
    let removed = self.map.remove_entry(key)?;
    self.current_size = self.current_size.saturating_sub(removed.1.size());
    Some(removed)
  }

  /// Every live entry, in unspecified (hash) order.
  #[inline]
  pub(crate) fn iter_live(&self) -> impl Iterator<Item = (&K, &CacheEntry<V>)> {
    self.map.iter()
  }

  /// Removes every entry matching `predicate`.
  pub(crate) fn remove_where<F>(&mut self, mut predicate: F) -> Vec<(K, CacheEntry<V>)>
  where
    F: FnMut(&K, &CacheEntry<V>) -> bool,
    K: Clone,
  {
    let doomed: Vec<K> = self
      .map
      .iter()
      .filter(|(key, entry)| predicate(key, entry))
      .map(|(key, _)| key.clone())
      .collect();

    doomed.iter().filter_map(|key| self.remove(key)).collect()
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.map.len()
  }

  #[inline]
  pub(crate) fn current_size(&self) -> u64 {
    self.current_size
  }
}
