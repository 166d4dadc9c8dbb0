use crate::error::BoxError;

use std::sync::Arc;

/// Produces the value for a key the cache does not hold.
///
/// Runs while the cache's write lock is held, so it must not call back into
/// the same cache.
pub type Fetcher<K, V> = Arc<dyn Fn(&K) -> Result<V, BoxError> + Send + Sync>;

/// The result of a fetch, before the null policy and size accountant see it.
pub(crate) enum Fetched<V> {
  /// Stored in the cache and handed to the caller.
  Cached(Arc<V>),
  /// Handed to the caller only.
  Uncached(Arc<V>),
}

impl<V> Fetched<V> {
  pub(crate) fn into_value(self) -> Arc<V> {
    match self {
      Fetched::Cached(value) | Fetched::Uncached(value) => value,
    }
  }
}
