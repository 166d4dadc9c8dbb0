mod common;

use common::{DisposalLog, SECOND};
use policy_cache::{Cache, CacheBuilder, ExpirationBasis, ManualClock, RemovalReason};
use std::time::Duration;

fn ttl_cache(ttl: Duration, basis: ExpirationBasis) -> (Cache<&'static str, i32>, ManualClock) {
  common::init_tracing();
  let clock = ManualClock::new();
  let cache = CacheBuilder::new()
    .capacity(100)
    .expire_after(ttl)
    .expiration_basis(basis)
    .clock(clock.clone())
    .build()
    .unwrap();
  (cache, clock)
}

#[test]
fn test_since_fetch_expires_after_deadline() {
  let (cache, clock) = ttl_cache(10 * SECOND, ExpirationBasis::SinceFetch);
  cache.put("key", 1).unwrap();

  clock.advance(10 * SECOND);
  assert_eq!(cache.get(&"key").as_deref(), Some(&1), "fresh exactly at the deadline");

  clock.advance(Duration::from_nanos(1));
  assert!(cache.get(&"key").is_none());
  assert_eq!(cache.len(), 0, "an expired hit removes the entry");
  assert_eq!(cache.metrics().evicted_by_expiry, 1);
}

#[test]
fn test_since_fetch_is_not_extended_by_reads() {
  let (cache, clock) = ttl_cache(10 * SECOND, ExpirationBasis::SinceFetch);
  cache.put("key", 1).unwrap();

  for _ in 0..4 {
    clock.advance(3 * SECOND);
    cache.get(&"key");
  }
  assert!(!cache.contains_key(&"key"));
}

#[test]
fn test_since_fetch_is_reset_by_put() {
  let (cache, clock) = ttl_cache(10 * SECOND, ExpirationBasis::SinceFetch);
  cache.put("key", 1).unwrap();
  clock.advance(8 * SECOND);
  cache.put("key", 2).unwrap();
  clock.advance(8 * SECOND);

  assert_eq!(cache.get(&"key").as_deref(), Some(&2));
}

#[test]
fn test_since_last_access_slides_with_reads() {
  let (cache, clock) = ttl_cache(10 * SECOND, ExpirationBasis::SinceLastAccess);
  cache.put("key", 1).unwrap();

  for _ in 0..5 {
    clock.advance(6 * SECOND);
    assert!(cache.get(&"key").is_some());
  }

  clock.advance(11 * SECOND);
  assert!(cache.get(&"key").is_none());
}

#[test]
fn test_peek_does_not_slide_last_access() {
  let (cache, clock) = ttl_cache(10 * SECOND, ExpirationBasis::SinceLastAccess);
  cache.put("key", 1).unwrap();

  clock.advance(6 * SECOND);
  assert!(cache.peek(&"key").is_some());
  clock.advance(6 * SECOND);
  assert!(cache.peek(&"key").is_none());
}

#[test]
fn test_expired_entries_are_invisible_before_reap() {
  let (cache, clock) = ttl_cache(SECOND, ExpirationBasis::SinceFetch);
  cache.put("a", 1).unwrap();
  cache.put("b", 2).unwrap();
  clock.advance(2 * SECOND);
  cache.put("c", 3).unwrap();

  assert!(!cache.contains_key(&"a"));
  assert_eq!(cache.keys(), vec!["c"]);
  // Still held until something reaps them.
  assert_eq!(cache.len(), 3);
}

#[test]
fn test_reap_purges_expired_and_reports() {
  let log = DisposalLog::new();
  let clock = ManualClock::new();
  let cache = CacheBuilder::<&str, i32>::new()
    .expire_after(5 * SECOND)
    .clock(clock.clone())
    .on_dispose(log.recorder())
    .build()
    .unwrap();

  cache.put("old1", 1).unwrap();
  cache.put("old2", 2).unwrap();
  clock.advance(4 * SECOND);
  cache.put("young", 3).unwrap();
  clock.advance(2 * SECOND);

  let summary = cache.reap();
  assert_eq!(summary.expired, 2);
  assert_eq!(summary.removed(), 2);
  assert_eq!(summary.remaining_size, 1);
  assert!(!summary.over_capacity);

  let mut expired = log.keys_for(RemovalReason::Expired);
  expired.sort();
  assert_eq!(expired, vec!["old1", "old2"]);
  assert_eq!(cache.keys(), vec!["young"]);
}

#[test]
fn test_no_expiration_keeps_entries_forever() {
  let clock = ManualClock::new();
  let cache = CacheBuilder::<&str, i32>::new().clock(clock.clone()).build().unwrap();
  cache.put("key", 1).unwrap();

  clock.advance(Duration::from_secs(60 * 60 * 24 * 365));
  assert!(cache.get(&"key").is_some());
  assert_eq!(cache.reap().removed(), 0);
}
