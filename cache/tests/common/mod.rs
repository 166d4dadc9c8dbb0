#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use policy_cache::{BoxError, Cache, CacheBuilder, EvictionPolicy, ManualClock, RemovalReason};

pub const SECOND: Duration = Duration::from_secs(1);

/// Installs a test subscriber once; `RUST_LOG=policy_cache=debug` shows reaps.
pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// A count-limited cache on a manual clock.
pub fn build_test_cache(capacity: u64, policy: EvictionPolicy) -> (Cache<&'static str, i32>, ManualClock) {
  init_tracing();
  let clock = ManualClock::new();
  let cache = CacheBuilder::new()
    .capacity(capacity)
    .eviction_policy(policy)
    .clock(clock.clone())
    .build()
    .unwrap();
  (cache, clock)
}

/// Records every disposal the cache performs.
#[derive(Clone)]
pub struct DisposalLog<K> {
  events: Arc<Mutex<Vec<(K, RemovalReason)>>>,
}

impl<K: Clone + Send + 'static> DisposalLog<K> {
  pub fn new() -> Self {
    Self {
      events: Arc::new(Mutex::new(Vec::new())),
    }
  }

  /// A closure suitable for `CacheBuilder::on_dispose`.
  pub fn recorder<V: 'static>(&self) -> impl Fn(&K, Arc<V>, RemovalReason) -> Result<(), BoxError> + Send + Sync + 'static {
    let events = self.events.clone();
    move |key: &K, _value: Arc<V>, reason: RemovalReason| {
      events.lock().unwrap().push((key.clone(), reason));
      Ok(())
    }
  }

  pub fn events(&self) -> Vec<(K, RemovalReason)> {
    self.events.lock().unwrap().clone()
  }

  pub fn keys_for(&self, reason: RemovalReason) -> Vec<K> {
    self
      .events()
      .into_iter()
      .filter(|(_, r)| *r == reason)
      .map(|(k, _)| k)
      .collect()
  }
}
