mod common;

use common::SECOND;
use policy_cache::{
  BuildError, CacheBuilder, CacheConfig, EvictionPolicy, ExpirationBasis, ManualClock, NullValuePolicy,
};
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_default_builder_is_unbounded() {
  let cache = CacheBuilder::<u32, u32>::default().build().unwrap();
  assert_eq!(cache.capacity(), u64::MAX);

  for key in 0..10_000 {
    cache.put(key, key).unwrap();
  }
  assert_eq!(cache.len(), 10_000);
  assert_eq!(cache.metrics().reaps, 0);
}

#[test]
fn test_zero_capacity_is_rejected() {
  let err = CacheBuilder::<u32, u32>::new().capacity(0).build().unwrap_err();
  assert_eq!(err, BuildError::ZeroCapacity);
}

#[test]
fn test_zero_reap_interval_is_rejected() {
  let err = CacheBuilder::<u32, u32>::new()
    .reap_interval(Duration::ZERO)
    .build()
    .unwrap_err();
  assert_eq!(err, BuildError::ZeroReapInterval);
}

#[test]
fn test_unbounded_overrides_capacity() {
  let cache = CacheBuilder::<u32, u32>::new().capacity(1).unbounded().build().unwrap();
  cache.put(1, 1).unwrap();
  cache.put(2, 2).unwrap();
  assert_eq!(cache.len(), 2);
}

#[test]
fn test_from_config_applies_every_field() {
  let config = CacheConfig {
    max_capacity: Some(2),
    expiration: Some(10 * SECOND),
    expiration_basis: ExpirationBasis::SinceLastAccess,
    eviction_policy: EvictionPolicy::OldestFirst,
    null_value_policy: NullValuePolicy::Fail,
    reap_interval: None,
  };
  let clock = ManualClock::new();
  let cache = CacheBuilder::<&str, Option<i32>>::from_config(&config)
    .null_when(Option::is_none)
    .clock(clock.clone())
    .build()
    .unwrap();

  assert_eq!(cache.capacity(), 2);
  assert!(cache.put("null", None).unwrap_err().is_null_value());

  cache.put("a", Some(1)).unwrap();
  clock.advance(SECOND);
  cache.put("b", Some(2)).unwrap();
  cache.get(&"a");
  cache.put("c", Some(3)).unwrap();
  assert!(!cache.contains_key(&"a"), "oldest-first ignores the read of a");

  // Since-last-access: reads keep "b" alive past ten seconds since fetch.
  for _ in 0..3 {
    clock.advance(6 * SECOND);
    assert!(cache.get(&"b").is_some());
  }
}

#[cfg(feature = "serde")]
#[test]
fn test_config_from_json() {
  let json = r#"{
    "max_capacity": 1000,
    "expiration": "5m",
    "expiration_basis": "since_last_access",
    "eviction_policy": { "kind": "idle_time", "threshold": "30s" },
    "reap_interval": "1s"
  }"#;

  let config: CacheConfig = serde_json::from_str(json).unwrap();
  assert_eq!(config.max_capacity, Some(1000));
  assert_eq!(config.expiration, Some(Duration::from_secs(300)));
  assert_eq!(
    config.eviction_policy,
    EvictionPolicy::IdleTime {
      threshold: Duration::from_secs(30)
    }
  );
  assert_eq!(config.null_value_policy, NullValuePolicy::CacheNormally);

  let cache = CacheBuilder::<u32, u32>::from_config(&config).build().unwrap();
  assert_eq!(cache.capacity(), 1000);
}

#[cfg(feature = "serde")]
#[test]
fn test_config_rejects_unknown_fields() {
  let err = serde_json::from_str::<CacheConfig>(r#"{ "max_size": 10 }"#);
  assert!(err.is_err());
}

#[test]
fn test_background_reaper_purges_expired_entries() {
  common::init_tracing();
  let clock = ManualClock::new();
  let cache = CacheBuilder::<u32, u32>::new()
    .expire_after(SECOND)
    .reap_interval(Duration::from_millis(10))
    .clock(clock.clone())
    .build()
    .unwrap();

  cache.bulk_load((0..50).map(|key| (key, key))).unwrap();
  clock.advance(2 * SECOND);

  let deadline = Instant::now() + Duration::from_secs(5);
  while !cache.is_empty() && Instant::now() < deadline {
    thread::sleep(Duration::from_millis(10));
  }
  assert!(cache.is_empty(), "the reaper should have purged every expired entry");
  assert_eq!(cache.metrics().evicted_by_expiry, 50);
}

#[test]
fn test_dropping_cache_stops_reaper() {
  let cache = CacheBuilder::<u32, u32>::new()
    .reap_interval(Duration::from_millis(5))
    .build()
    .unwrap();
  cache.put(1, 1).unwrap();
  thread::sleep(Duration::from_millis(20));

  // Returns once the janitor thread has been joined.
  drop(cache);
}
