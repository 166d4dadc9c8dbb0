use thiserror::Error;

/// The error type returned by every pluggable function: fetchers, size
/// estimators and disposal actions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// The cache was configured with a capacity of zero, which is not allowed
  /// for a bounded cache. Use `unbounded()` for an unbounded cache.
  #[error("bounded cache capacity cannot be zero")]
  ZeroCapacity,
  /// `build_loading()` was called without a fetcher.
  #[error("a loading cache requires a fetcher")]
  FetcherRequired,
  /// A periodic reaper was requested with a zero interval.
  #[error("reap interval cannot be zero")]
  ZeroReapInterval,
}

/// Errors surfaced by cache operations.
///
/// A fetcher that fails and a fetcher that produced a null value under
/// [`NullValuePolicy::Fail`](crate::NullValuePolicy::Fail) are deliberately
/// different variants.
#[derive(Debug, Error)]
pub enum CacheError {
  /// The fetcher returned an error. Nothing was inserted.
  #[error("fetcher failed")]
  Fetch(#[source] BoxError),
  /// The value was the null marker and the null policy refuses it.
  #[error("null value refused by the null value policy")]
  NullValue,
  /// The size estimator returned an error. The store was not touched.
  #[error("size estimator failed")]
  SizeEstimate(#[source] BoxError),
}

impl CacheError {
  /// True if this is a controlled null-policy refusal rather than a fault.
  pub fn is_null_value(&self) -> bool {
    matches!(self, CacheError::NullValue)
  }
}
