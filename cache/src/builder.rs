use crate::config::CacheConfig;
use crate::error::{BoxError, BuildError};
use crate::handles::{Cache, LoadingCache};
use crate::listener::{DisposalAction, FnDisposal, RemovalReason};
use crate::loader::Fetcher;
use crate::metrics::Metrics;
use crate::policy::null::NullCheck;
use crate::policy::{EvictionPolicy, ExpirationBasis, ExpirationPolicy, NullValuePolicy};
use crate::shared::CacheShared;
use crate::size::{SizeAccountant, SizeEstimator};
use crate::store::EntryStore;
use crate::sync::CacheLock;
use crate::task::janitor::Janitor;
use crate::time::{Clock, SystemClock};

use core::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// A builder for creating `Cache` and `LoadingCache` instances.
pub struct CacheBuilder<K, V, H = ahash::RandomState> {
  capacity: u64,
  expire_after: Option<Duration>,
  expiration_basis: ExpirationBasis,
  eviction_policy: EvictionPolicy,
  null_value_policy: NullValuePolicy,
  null_check: Option<NullCheck<V>>,
  fetcher: Option<Fetcher<K, V>>,
  size_estimator: Option<SizeEstimator<K, V>>,
  disposal: Option<Arc<dyn DisposalAction<K, V>>>,
  clock: Arc<dyn Clock>,
  reap_interval: Option<Duration>,
  hasher: H,
}

// Manual Debug implementation for CacheBuilder.
impl<K, V, H> fmt::Debug for CacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("capacity", &self.capacity)
      .field("expire_after", &self.expire_after)
      .field("expiration_basis", &self.expiration_basis)
      .field("eviction_policy", &self.eviction_policy)
      .field("null_value_policy", &self.null_value_policy)
      .field("has_fetcher", &self.fetcher.is_some())
      .field("has_disposal", &self.disposal.is_some())
      .field("reap_interval", &self.reap_interval)
      .finish_non_exhaustive()
  }
}

// --- General Configuration Methods ---
// This impl block has no restrictive bounds on K or V.
impl<K, V, H> CacheBuilder<K, V, H> {
  /// Sets the maximum aggregate size of the cache.
  ///
  /// Without a size estimator every entry has size 1, so this is an entry
  /// count.
  pub fn capacity(mut self, capacity: u64) -> Self {
    self.capacity = capacity;
    self
  }

  /// Sets the cache to be "unbounded".
  pub fn unbounded(mut self) -> Self {
    self.capacity = u64::MAX;
    self
  }

  /// Entries expire once this much time has passed since the
  /// [`ExpirationBasis`] timestamp.
  pub fn expire_after(mut self, duration: Duration) -> Self {
    self.expire_after = Some(duration);
    self
  }

  /// Sets which timestamp expiration is measured from. Defaults to
  /// [`ExpirationBasis::SinceFetch`].
  pub fn expiration_basis(mut self, basis: ExpirationBasis) -> Self {
    self.expiration_basis = basis;
    self
  }

  /// Sets how capacity victims are chosen. Defaults to [`EvictionPolicy::Lru`].
  pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
    self.eviction_policy = policy;
    self
  }

  /// Sets what happens to values flagged by [`null_when`](Self::null_when).
  pub fn null_value_policy(mut self, policy: NullValuePolicy) -> Self {
    self.null_value_policy = policy;
    self
  }

  /// Designates which values count as the null marker.
  pub fn null_when(mut self, f: impl Fn(&V) -> bool + Send + Sync + 'static) -> Self {
    self.null_check = Some(Arc::new(f));
    self
  }

  /// Sets the fetcher used by [`build_loading`](Self::build_loading) caches
  /// on a miss. It runs with the cache's write lock held.
  pub fn fetcher(mut self, f: impl Fn(&K) -> Result<V, BoxError> + Send + Sync + 'static) -> Self {
    self.fetcher = Some(Arc::new(f));
    self
  }

  /// Sets the per-entry size function. Defaults to 1 for every entry.
  pub fn size_estimator(
    mut self,
    f: impl Fn(&K, &V) -> Result<u64, BoxError> + Send + Sync + 'static,
  ) -> Self {
    self.size_estimator = Some(Arc::new(f));
    self
  }

  /// Sets the action run exactly once for every value that leaves the cache.
  pub fn disposal_action<D>(mut self, action: D) -> Self
  where
    D: DisposalAction<K, V> + 'static,
  {
    self.disposal = Some(Arc::new(action));
    self
  }

  /// Closure form of [`disposal_action`](Self::disposal_action).
  pub fn on_dispose<F>(mut self, f: F) -> Self
  where
    F: Fn(&K, Arc<V>, RemovalReason) -> Result<(), BoxError> + Send + Sync + 'static,
  {
    self.disposal = Some(Arc::new(FnDisposal(f)));
    self
  }

  /// Replaces the time source. Mostly useful with
  /// [`ManualClock`](crate::time::ManualClock) in tests.
  pub fn clock(mut self, clock: impl Clock) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  /// Runs a reap pass on a background thread every `interval`.
  pub fn reap_interval(mut self, interval: Duration) -> Self {
    self.reap_interval = Some(interval);
    self
  }

  /// Sets the hasher for the cache.
  pub fn hasher(mut self, hasher: H) -> Self {
    self.hasher = hasher;
    self
  }

  /// Applies every field of `config`, overriding earlier calls.
  pub fn config(mut self, config: &CacheConfig) -> Self {
    self.capacity = config.max_capacity.unwrap_or(u64::MAX);
    self.expire_after = config.expiration;
    self.expiration_basis = config.expiration_basis;
    self.eviction_policy = config.eviction_policy;
    self.null_value_policy = config.null_value_policy;
    self.reap_interval = config.reap_interval;
    self
  }
}

// --- Default Constructor ---
impl<K, V, H: BuildHasher + Default> CacheBuilder<K, V, H> {
  /// Creates a new `CacheBuilder` with default settings: unbounded, no
  /// expiration, LRU, nulls cached normally, unit sizes, system clock.
  pub fn new() -> Self {
    Self {
      capacity: u64::MAX,
      expire_after: None,
      expiration_basis: ExpirationBasis::default(),
      eviction_policy: EvictionPolicy::default(),
      null_value_policy: NullValuePolicy::default(),
      null_check: None,
      fetcher: None,
      size_estimator: None,
      disposal: None,
      clock: Arc::new(SystemClock),
      reap_interval: None,
      hasher: H::default(),
    }
  }

  /// Creates a builder seeded from `config`.
  pub fn from_config(config: &CacheConfig) -> Self {
    Self::new().config(config)
  }
}

impl<K, V> Default for CacheBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

// --- Build Methods ---
impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone + Send + Sync + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher + Send + Sync + 'static,
{
  /// Builds a `Cache`. A configured fetcher is ignored.
  pub fn build(self) -> Result<Cache<K, V, H>, BuildError> {
    self.validate()?;
    Ok(Cache {
      shared: self.build_shared_core(),
    })
  }

  /// Builds a `LoadingCache` that fetches missing keys with the configured
  /// fetcher.
  pub fn build_loading(mut self) -> Result<LoadingCache<K, V, H>, BuildError> {
    self.validate()?;
    let fetcher = self.fetcher.take().ok_or(BuildError::FetcherRequired)?;
    let cache = Cache {
      shared: self.build_shared_core(),
    };
    Ok(LoadingCache::new(cache, fetcher))
  }

  /// Central logic to construct the shared core of the cache.
  fn build_shared_core(self) -> Arc<CacheShared<K, V, H>> {
    let reap_interval = self.reap_interval;

    let shared = Arc::new(CacheShared {
      store: CacheLock::new(EntryStore::new(self.hasher)),
      metrics: Metrics::new(),
      expiration: ExpirationPolicy::new(self.expire_after, self.expiration_basis),
      eviction: self.eviction_policy,
      accountant: SizeAccountant::new(self.size_estimator, self.capacity),
      null_policy: self.null_value_policy,
      null_check: self.null_check,
      disposal: self.disposal,
      clock: self.clock,
      janitor: Mutex::new(None),
    });

    if let Some(interval) = reap_interval {
      let janitor = Janitor::spawn(Arc::downgrade(&shared), interval);
      *shared.janitor.lock() = Some(janitor);
    }

    tracing::debug!(
      capacity = shared.accountant.capacity(),
      bounded = shared.accountant.is_bounded(),
      eviction = ?shared.eviction,
      "cache built"
    );
    shared
  }

  /// Validates the builder configuration.
  pub(crate) fn validate(&self) -> Result<(), BuildError> {
    if self.capacity == 0 {
      return Err(BuildError::ZeroCapacity);
    }
    if self.reap_interval.is_some_and(|interval| interval.is_zero()) {
      return Err(BuildError::ZeroReapInterval);
    }
    Ok(())
  }
}
