use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// The single reader/writer lock guarding one cache instance.
///
/// Hits that need no mutation run under the shared read lock. Everything that
/// changes the store runs under the exclusive write lock, including a fetch
/// on miss: a slow fetcher blocks every other operation on the same cache
/// until it returns.
#[derive(Debug, Default)]
pub(crate) struct CacheLock<T> {
  inner: RwLock<T>,
}

impl<T> CacheLock<T> {
  pub(crate) fn new(data: T) -> Self {
    Self {
      inner: RwLock::new(data),
    }
  }

  /// Exclusive access without locking, for when the cache is being torn down.
  #[inline]
  pub(crate) fn get_mut(&mut self) -> &mut T {
    self.inner.get_mut()
  }

  #[inline]
  pub(crate) fn read(&self) -> RwLockReadGuard<'_, T> {
    self.inner.read()
  }

  #[inline]
  pub(crate) fn write(&self) -> RwLockWriteGuard<'_, T> {
    self.inner.write()
  }

  /// Optimistic read, escalating to the write lock only when needed.
  ///
  /// `optimistic` runs under the read lock; if it yields `Some`, that is the
  /// result. Otherwise the read lock is released, the write lock taken, and
  /// `escalated` runs. The state may have changed in between, so `escalated`
  /// must re-check whatever `optimistic` looked at.
  pub(crate) fn read_or_escalate<R>(
    &self,
    optimistic: impl FnOnce(&T) -> Option<R>,
    escalated: impl FnOnce(&mut T) -> R,
  ) -> R {
    {
      let guard = self.inner.read();
      if let Some(result) = optimistic(&guard) {
        return result;
      }
    }

    tracing::trace!("escalating to write lock");
    let mut guard = self.inner.write();
    escalated(&mut guard)
  }
}
