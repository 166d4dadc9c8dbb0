use policy_cache::CacheBuilder;
use std::thread;
use std::time::Duration;

fn main() {
  // A cache of 100 entries whose values go stale 5 seconds after being
  // written, with a reaper sweeping every second.
  let cache = CacheBuilder::default()
    .capacity(100)
    .expire_after(Duration::from_secs(5))
    .reap_interval(Duration::from_secs(1))
    .build()
    .expect("Failed to build cache");

  println!("Putting ('key1', 100) into the cache.");
  cache.put("key1".to_string(), 100).expect("put failed");

  match cache.get(&"key1".to_string()) {
    Some(value) => println!("Found value for key1: {}", value),
    None => println!("Value for key1 not found."),
  }

  println!("\nCache metrics: {:#?}", cache.metrics());

  println!("\nWaiting for 6 seconds for the item to expire...");
  thread::sleep(Duration::from_secs(6));

  // The reaper has already dropped the stale entry.
  println!("Entries held: {}", cache.len());
  match cache.get(&"key1".to_string()) {
    Some(value) => println!("Found value for key1: {}", value),
    None => println!("Value for key1 not found (as expected after expiration)."),
  }

  println!("\nCache metrics after expiration: {:#?}", cache.metrics());
}
