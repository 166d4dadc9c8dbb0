use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::listener::{dispose_all, DisposalAction, Removed, RemovalReason};
use crate::loader::{Fetched, Fetcher};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::policy::null::{NullCheck, NullDecision};
use crate::policy::{EvictionPolicy, ExpirationPolicy, NullValuePolicy};
use crate::size::SizeAccountant;
use crate::store::EntryStore;
use crate::sync::CacheLock;
use crate::task::janitor::Janitor;
use crate::time::Clock;

use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use parking_lot::Mutex;

/// What a single reap pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapSummary {
  /// Entries past their expiration deadline.
  pub expired: usize,
  /// Entries past the idle-time policy's threshold.
  pub idle: usize,
  /// Entries chosen as capacity victims.
  pub evicted: usize,
  /// Aggregate size once the pass finished.
  pub remaining_size: u64,
  /// The pass could not get back within capacity because a single entry
  /// is larger than the whole cache.
  pub over_capacity: bool,
}

impl ReapSummary {
  pub fn removed(&self) -> usize {
    self.expired + self.idle + self.evicted
  }
}

/// Result of looking a key up without changing the store.
enum Probe<V> {
  Hit(Arc<V>),
  Stale,
  Absent,
}

/// The internal, thread-safe core of the cache.
pub(crate) struct CacheShared<K, V, H> {
  pub(crate) store: CacheLock<EntryStore<K, V, H>>,
  pub(crate) metrics: Metrics,
  pub(crate) expiration: ExpirationPolicy,
  pub(crate) eviction: EvictionPolicy,
  pub(crate) accountant: SizeAccountant<K, V>,
  pub(crate) null_policy: NullValuePolicy,
  pub(crate) null_check: Option<NullCheck<V>>,
  pub(crate) disposal: Option<Arc<dyn DisposalAction<K, V>>>,
  pub(crate) clock: Arc<dyn Clock>,
  pub(crate) janitor: Mutex<Option<Janitor>>,
}

impl<K, V, H> fmt::Debug for CacheShared<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheShared")
      .field("capacity", &self.accountant.capacity())
      .field("expiration", &self.expiration)
      .field("eviction", &self.eviction)
      .field("null_policy", &self.null_policy)
      .finish_non_exhaustive()
  }
}

impl<K, V, H> Drop for CacheShared<K, V, H> {
  fn drop(&mut self) {
    if let Some(janitor) = self.janitor.get_mut().take() {
      janitor.stop();
    }

    // Nothing outlives the cache: whatever is still held gets disposed.
    let remaining = self.store.get_mut().clear();
    if remaining.is_empty() {
      return;
    }
    tracing::debug!(count = remaining.len(), "disposing entries on cache drop");
    if let Some(action) = &self.disposal {
      let removed: Vec<_> = remaining
        .into_iter()
        .map(|(key, entry)| Removed::new(key, entry.into_value(), RemovalReason::Flushed))
        .collect();
      dispose_all(action.as_ref(), removed);
    }
  }
}

impl<K, V, H> CacheShared<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  #[inline]
  fn now(&self) -> u64 {
    self.clock.now_nanos()
  }

  /// Looks `key` up. A hit refreshes recency when `touch` is set; that is the
  /// only mutation, and it is atomic, so this runs under the read lock.
  fn probe(&self, store: &EntryStore<K, V, H>, key: &K, now: u64, touch: bool) -> Probe<V> {
    match store.try_get(key) {
      None => Probe::Absent,
      Some(entry) if self.expiration.is_expired(entry, now) => Probe::Stale,
      Some(entry) => {
        if touch {
          entry.touch(now, store.next_tick());
        }
        Probe::Hit(entry.value())
      }
    }
  }

  /// Queues a removed entry for disposal and counts it.
  fn discard(&self, removed: &mut Vec<Removed<K, V>>, key: K, entry: CacheEntry<V>, reason: RemovalReason) {
    let counter = match reason {
      RemovalReason::Capacity => Some(&self.metrics.evicted_by_capacity),
      RemovalReason::Expired => Some(&self.metrics.evicted_by_expiry),
      RemovalReason::Idle => Some(&self.metrics.evicted_by_idle),
      RemovalReason::Invalidated => Some(&self.metrics.invalidations),
      RemovalReason::Replaced | RemovalReason::Flushed => None,
    };
    if let Some(counter) = counter {
      Metrics::incr(counter);
    }
    removed.push(Removed::new(key, entry.into_value(), reason));
  }

  fn remove_locked(
    &self,
    store: &mut EntryStore<K, V, H>,
    key: &K,
    reason: RemovalReason,
    removed: &mut Vec<Removed<K, V>>,
  ) -> bool {
    match store.remove(key) {
      Some((key, entry)) => {
        self.discard(removed, key, entry, reason);
        true
      }
      None => false,
    }
  }

  /// Runs the disposal action over entries that already left the store.
  /// Must be called with no lock held.
  fn dispose(&self, removed: Vec<Removed<K, V>>) {
    if removed.is_empty() {
      return;
    }
    if let Some(action) = &self.disposal {
      let count = removed.len() as u64;
      let failures = dispose_all(action.as_ref(), removed);
      Metrics::add(&self.metrics.disposals, count);
      Metrics::add(&self.metrics.disposal_failures, failures);
    }
  }

  /// Applies the null policy to a value about to be stored.
  fn screen(&self, value: &V) -> Result<NullDecision, CacheError> {
    let is_null = self.null_check.as_ref().is_some_and(|check| check(value));
    if is_null {
      Metrics::incr(&self.metrics.null_values);
      tracing::debug!(policy = ?self.null_policy, "null value produced");
    }
    self.null_policy.decide(is_null)
  }

  /// Upserts under the write lock, then reaps if that pushed the cache over
  /// capacity. The inserted key is protected from that reap.
  fn insert_locked(
    &self,
    store: &mut EntryStore<K, V, H>,
    key: K,
    value: Arc<V>,
    size: u64,
    removed: &mut Vec<Removed<K, V>>,
  ) {
    let now = self.now();
    match store.upsert(key.clone(), value, size, now) {
      Some(old) => {
        Metrics::incr(&self.metrics.updates);
        self.discard(removed, key.clone(), old, RemovalReason::Replaced);
      }
      None => Metrics::incr(&self.metrics.inserts),
    }

    if self.accountant.is_over(store.current_size()) {
      self.reap_locked(store, Some(&key), now, removed);
    }
  }

  /// One reap sweep: expired entries, then idle entries, then capacity
  /// victims in policy order until the cache fits.
  fn reap_locked(
    &self,
    store: &mut EntryStore<K, V, H>,
    protected: Option<&K>,
    now: u64,
    removed: &mut Vec<Removed<K, V>>,
  ) -> ReapSummary {
    Metrics::incr(&self.metrics.reaps);
    let mut summary = ReapSummary::default();

    if self.expiration.after().is_some() {
      let expired: Vec<K> = store
        .iter_live()
        .filter(|&(key, entry)| protected != Some(key) && self.expiration.is_expired(entry, now))
        .map(|(key, _)| key.clone())
        .collect();
      for key in &expired {
        if self.remove_locked(store, key, RemovalReason::Expired, removed) {
          summary.expired += 1;
        }
      }
    }

    let idle = self.eviction.idle_victims(store.iter_live(), protected, now);
    for key in &idle {
      if self.remove_locked(store, key, RemovalReason::Idle, removed) {
        summary.idle += 1;
      }
    }

    if self.accountant.is_over(store.current_size()) {
      let excess = self.accountant.excess(store.current_size());
      let mut victims = self.eviction.select_victims(store.iter_live(), protected, excess);
      // Taking every entry means the last one alone exceeds capacity. It stays.
      if protected.is_none() && victims.len() == store.len() {
        victims.pop();
      }
      for key in &victims {
        if self.remove_locked(store, key, RemovalReason::Capacity, removed) {
          summary.evicted += 1;
        }
      }
    }

    summary.remaining_size = store.current_size();
    summary.over_capacity = self.accountant.is_over(summary.remaining_size);
    if summary.over_capacity {
      tracing::debug!(
        size = summary.remaining_size,
        capacity = self.accountant.capacity(),
        "entry larger than capacity retained"
      );
    }
    tracing::debug!(
      expired = summary.expired,
      idle = summary.idle,
      evicted = summary.evicted,
      size = summary.remaining_size,
      capacity = self.accountant.capacity(),
      "reap pass complete"
    );
    summary
  }

  /// Runs the fetcher for `key` under the write lock and stores its result
  /// subject to the null policy. On any error the store is left as it was.
  fn fetch_locked(
    &self,
    store: &mut EntryStore<K, V, H>,
    key: &K,
    fetcher: &Fetcher<K, V>,
    removed: &mut Vec<Removed<K, V>>,
  ) -> Result<Fetched<V>, CacheError> {
    Metrics::incr(&self.metrics.fetches);
    tracing::trace!("fetching value for missing key");

    let value = fetcher(key).map_err(|error| {
      Metrics::incr(&self.metrics.fetch_failures);
      tracing::debug!(error = %error, "fetcher failed");
      CacheError::Fetch(error)
    })?;

    if self.screen(&value)? == NullDecision::Skip {
      self.remove_locked(store, key, RemovalReason::Replaced, removed);
      return Ok(Fetched::Uncached(Arc::new(value)));
    }

    let size = self.accountant.estimate(key, &value)?;
    let value = Arc::new(value);
    self.insert_locked(store, key.clone(), value.clone(), size, removed);
    Ok(Fetched::Cached(value))
  }

  // --- Facade operations ---

  pub(crate) fn get(&self, key: &K) -> Option<Arc<V>> {
    let mut removed = Vec::new();
    let found = self.store.read_or_escalate(
      |store| match self.probe(store, key, self.now(), true) {
        Probe::Hit(value) => Some(Some(value)),
        Probe::Absent => Some(None),
        Probe::Stale => None,
      },
      |store| match self.probe(store, key, self.now(), true) {
        Probe::Hit(value) => Some(value),
        Probe::Absent => None,
        Probe::Stale => {
          self.remove_locked(store, key, RemovalReason::Expired, &mut removed);
          None
        }
      },
    );

    match &found {
      Some(_) => Metrics::incr(&self.metrics.hits),
      None => Metrics::incr(&self.metrics.misses),
    }
    self.dispose(removed);
    found
  }

  pub(crate) fn get_or_fetch(&self, key: &K, fetcher: &Fetcher<K, V>) -> Result<Arc<V>, CacheError> {
    let mut removed = Vec::new();
    let result = self.store.read_or_escalate(
      |store| match self.probe(store, key, self.now(), true) {
        Probe::Hit(value) => {
          Metrics::incr(&self.metrics.hits);
          Some(Ok(value))
        }
        Probe::Stale | Probe::Absent => None,
      },
      |store| {
        // Another caller may have fetched this key while we waited.
        match self.probe(store, key, self.now(), true) {
          Probe::Hit(value) => {
            Metrics::incr(&self.metrics.hits);
            return Ok(value);
          }
          Probe::Stale => {
            self.remove_locked(store, key, RemovalReason::Expired, &mut removed);
          }
          Probe::Absent => {}
        }
        Metrics::incr(&self.metrics.misses);
        self
          .fetch_locked(store, key, fetcher, &mut removed)
          .map(Fetched::into_value)
      },
    );

    self.dispose(removed);
    result
  }

  pub(crate) fn refresh(&self, key: &K, fetcher: &Fetcher<K, V>) -> Result<Arc<V>, CacheError> {
    let mut removed = Vec::new();
    let result = {
      let mut store = self.store.write();
      self
        .fetch_locked(&mut store, key, fetcher, &mut removed)
        .map(Fetched::into_value)
    };
    self.dispose(removed);
    result
  }

  pub(crate) fn peek(&self, key: &K) -> Option<Arc<V>> {
    let store = self.store.read();
    match self.probe(&store, key, self.now(), false) {
      Probe::Hit(value) => Some(value),
      Probe::Stale | Probe::Absent => None,
    }
  }

  pub(crate) fn contains_key(&self, key: &K) -> bool {
    let store = self.store.read();
    store
      .try_get(key)
      .is_some_and(|entry| !self.expiration.is_expired(entry, self.now()))
  }

  pub(crate) fn put(&self, key: K, value: V) -> Result<(), CacheError> {
    let decision = self.screen(&value)?;
    let mut removed = Vec::new();

    match decision {
      NullDecision::Skip => {
        let mut store = self.store.write();
        self.remove_locked(&mut store, &key, RemovalReason::Replaced, &mut removed);
      }
      NullDecision::Store => {
        let size = self.accountant.estimate(&key, &value)?;
        let value = Arc::new(value);
        let mut store = self.store.write();
        self.insert_locked(&mut store, key, value, size, &mut removed);
      }
    }

    self.dispose(removed);
    Ok(())
  }

  /// Screens and sizes the whole batch first, so a failure anywhere leaves the
  /// store untouched; then inserts everything under one write lock followed
  /// by a single reap.
  pub(crate) fn bulk_load<I>(&self, entries: I) -> Result<usize, CacheError>
  where
    I: IntoIterator<Item = (K, V)>,
  {
    let mut staged = Vec::new();
    let mut skipped = Vec::new();
    for (key, value) in entries {
      match self.screen(&value)? {
        NullDecision::Skip => skipped.push(key),
        NullDecision::Store => {
          let size = self.accountant.estimate(&key, &value)?;
          staged.push((key, Arc::new(value), size));
        }
      }
    }

    let loaded = staged.len();
    let mut removed = Vec::new();
    {
      let mut store = self.store.write();
      let now = self.now();

      for key in &skipped {
        self.remove_locked(&mut store, key, RemovalReason::Replaced, &mut removed);
      }

      let mut last = None;
      for (key, value, size) in staged {
        match store.upsert(key.clone(), value, size, now) {
          Some(old) => {
            Metrics::incr(&self.metrics.updates);
            self.discard(&mut removed, key.clone(), old, RemovalReason::Replaced);
          }
          None => Metrics::incr(&self.metrics.inserts),
        }
        last = Some(key);
      }

      if self.accountant.is_over(store.current_size()) {
        self.reap_locked(&mut store, last.as_ref(), now, &mut removed);
      }
    }

    tracing::trace!(loaded, skipped = skipped.len(), "bulk load complete");
    self.dispose(removed);
    Ok(loaded)
  }

  pub(crate) fn invalidate(&self, key: &K) -> Option<Arc<V>> {
    let (key, entry) = self.store.write().remove(key)?;
    Metrics::incr(&self.metrics.invalidations);
    let value = entry.into_value();
    self.dispose(vec![Removed::new(key, value.clone(), RemovalReason::Invalidated)]);
    Some(value)
  }

  pub(crate) fn invalidate_where<F>(&self, mut predicate: F) -> usize
  where
    F: FnMut(&K, &V) -> bool,
  {
    let gone = self
      .store
      .write()
      .remove_where(|key, entry| predicate(key, entry.value_ref()));

    let mut removed = Vec::with_capacity(gone.len());
    for (key, entry) in gone {
      self.discard(&mut removed, key, entry, RemovalReason::Invalidated);
    }
    let count = removed.len();
    self.dispose(removed);
    count
  }

  pub(crate) fn flush(&self) -> usize {
    let drained = self.store.write().clear();
    let removed: Vec<_> = drained
      .into_iter()
      .map(|(key, entry)| Removed::new(key, entry.into_value(), RemovalReason::Flushed))
      .collect();
    let count = removed.len();
    tracing::debug!(count, "cache flushed");
    self.dispose(removed);
    count
  }

  pub(crate) fn reap(&self) -> ReapSummary {
    let mut removed = Vec::new();
    let summary = {
      let mut store = self.store.write();
      let now = self.now();
      self.reap_locked(&mut store, None, now, &mut removed)
    };
    self.dispose(removed);
    summary
  }

  // --- Introspection ---

  pub(crate) fn keys(&self) -> Vec<K> {
    let store = self.store.read();
    let now = self.now();
    store
      .iter_live()
      .filter(|&(_, entry)| !self.expiration.is_expired(entry, now))
      .map(|(key, _)| key.clone())
      .collect()
  }

  pub(crate) fn len(&self) -> usize {
    self.store.read().len()
  }

  pub(crate) fn current_size(&self) -> u64 {
    self.store.read().current_size()
  }

  pub(crate) fn is_over_capacity(&self) -> bool {
    self.accountant.is_over(self.current_size())
  }

  pub(crate) fn metrics(&self) -> MetricsSnapshot {
    let store = self.store.read();
    self.metrics.snapshot(store.current_size(), store.len())
  }
}
