use crate::shared::CacheShared;

use std::hash::{BuildHasher, Hash};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// The background thread that runs a reap pass every tick.
///
/// It holds only a weak reference to the cache, so it never keeps a cache
/// alive on its own, and exits once the cache is gone.
pub(crate) struct Janitor {
  handle: Option<JoinHandle<()>>,
  stop_flag: Arc<AtomicBool>,
}

impl Janitor {
  /// Spawns a new janitor thread.
  pub(crate) fn spawn<K, V, H>(shared: Weak<CacheShared<K, V, H>>, tick_interval: Duration) -> Self
  where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    H: BuildHasher + Send + Sync + 'static,
  {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_clone = stop_flag.clone();

    let spawned = thread::Builder::new()
      .name("policy-cache-janitor".into())
      .spawn(move || {
        tracing::debug!(?tick_interval, "janitor started");
        loop {
          thread::park_timeout(tick_interval);
          if stop_clone.load(Ordering::Acquire) {
            break;
          }
          // The cache may have been dropped while we slept.
          let Some(shared) = shared.upgrade() else {
            break;
          };
          let summary = shared.reap();
          if summary.removed() > 0 {
            tracing::trace!(removed = summary.removed(), "janitor reaped entries");
          }
        }
        tracing::debug!("janitor stopped");
      });

    let handle = match spawned {
      Ok(handle) => Some(handle),
      Err(error) => {
        tracing::warn!(error = %error, "failed to spawn janitor thread; periodic reaping disabled");
        None
      }
    };

    Self { handle, stop_flag }
  }

  /// Signals the thread to exit and waits for it, unless called from the
  /// janitor thread itself (which happens when it held the last reference).
  pub(crate) fn stop(mut self) {
    self.stop_flag.store(true, Ordering::Release);
    if let Some(handle) = self.handle.take() {
      handle.thread().unpark();
      if handle.thread().id() != thread::current().id() {
        let _ = handle.join();
      }
    }
  }
}
