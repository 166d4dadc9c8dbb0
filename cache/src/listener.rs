use crate::error::BoxError;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Describes why an entry left the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalReason {
  /// Chosen as a victim because the cache exceeded its capacity.
  Capacity,
  /// The entry passed its expiration deadline.
  Expired,
  /// Idle past the idle-time policy's threshold.
  Idle,
  /// Removed by `invalidate`, `remove` or `invalidate_where`.
  Invalidated,
  /// Overwritten by a newer value for the same key.
  Replaced,
  /// Dropped by `flush`.
  Flushed,
}

impl fmt::Display for RemovalReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RemovalReason::Capacity => write!(f, "evicted due to capacity"),
      RemovalReason::Expired => write!(f, "evicted due to expiration"),
      RemovalReason::Idle => write!(f, "evicted due to idleness"),
      RemovalReason::Invalidated => write!(f, "manually invalidated"),
      RemovalReason::Replaced => write!(f, "replaced by a newer value"),
      RemovalReason::Flushed => write!(f, "flushed"),
    }
  }
}

/// Releases resources held by a value once the cache lets go of it.
///
/// The cache calls `dispose` exactly once per removed entry, after its lock
/// has been released. An `Err` or a panic is logged and counted; it never
/// stops the remaining entries of the same batch from being disposed.
pub trait DisposalAction<K, V>: Send + Sync {
  fn dispose(&self, key: &K, value: Arc<V>, reason: RemovalReason) -> Result<(), BoxError>;
}

/// Adapts a closure into a [`DisposalAction`].
pub(crate) struct FnDisposal<F>(pub(crate) F);

impl<K, V, F> DisposalAction<K, V> for FnDisposal<F>
where
  F: Fn(&K, Arc<V>, RemovalReason) -> Result<(), BoxError> + Send + Sync,
{
  fn dispose(&self, key: &K, value: Arc<V>, reason: RemovalReason) -> Result<(), BoxError> {
    (self.0)(key, value, reason)
  }
}

/// An entry that has left the store and still needs disposing.
pub(crate) struct Removed<K, V> {
  pub(crate) key: K,
  pub(crate) value: Arc<V>,
  pub(crate) reason: RemovalReason,
}

impl<K, V> Removed<K, V> {
  pub(crate) fn new(key: K, value: Arc<V>, reason: RemovalReason) -> Self {
    Self { key, value, reason }
  }
}

/// Runs `action` once for each entry, isolating failures.
///
/// Returns the number of entries whose disposal failed.
pub(crate) fn dispose_all<K, V>(
  action: &dyn DisposalAction<K, V>,
  removed: Vec<Removed<K, V>>,
) -> u64 {
  let mut failures = 0;
  for Removed { key, value, reason } in removed {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| action.dispose(&key, value, reason)));
    match outcome {
      Ok(Ok(())) => {}
      Ok(Err(error)) => {
        failures += 1;
        tracing::warn!(%reason, error = %error, "disposal action failed");
      }
      Err(_) => {
        failures += 1;
        tracing::warn!(%reason, "disposal action panicked");
      }
    }
  }
  failures
}
