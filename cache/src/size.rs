use crate::error::{BoxError, CacheError};

use std::fmt;
use std::sync::Arc;

/// Estimates the capacity an entry consumes.
pub type SizeEstimator<K, V> = Arc<dyn Fn(&K, &V) -> Result<u64, BoxError> + Send + Sync>;

/// Applies the configured size estimator and compares aggregate size to the
/// configured capacity. The aggregate itself lives in the entry store.
pub(crate) struct SizeAccountant<K, V> {
  estimator: Option<SizeEstimator<K, V>>,
  capacity: u64,
}

impl<K, V> fmt::Debug for SizeAccountant<K, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SizeAccountant")
      .field("capacity", &self.capacity)
      .field("custom_estimator", &self.estimator.is_some())
      .finish()
  }
}

impl<K, V> SizeAccountant<K, V> {
  pub(crate) fn new(estimator: Option<SizeEstimator<K, V>>, capacity: u64) -> Self {
    Self { estimator, capacity }
  }

  /// Size of one entry; 1 when no estimator is configured.
  #[inline]
  pub(crate) fn estimate(&self, key: &K, value: &V) -> Result<u64, CacheError> {
    match &self.estimator {
      Some(estimator) => estimator(key, value).map_err(CacheError::SizeEstimate),
      None => Ok(1),
    }
  }

  #[inline]
  pub(crate) fn capacity(&self) -> u64 {
    self.capacity
  }

  #[inline]
  pub(crate) fn is_bounded(&self) -> bool {
    self.capacity != u64::MAX
  }

  #[inline]
  pub(crate) fn is_over(&self, current_size: u64) -> bool {
    current_size > self.capacity
  }

  /// How much must be freed to get back within capacity.
  #[inline]
  pub(crate) fn excess(&self, current_size: u64) -> u64 {
    current_size.saturating_sub(self.capacity)
  }
}
