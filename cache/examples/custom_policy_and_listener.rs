use policy_cache::{BoxError, CacheBuilder, DisposalAction, EvictionPolicy, RemovalReason};
use std::sync::Arc;

// A disposal action that just prints what left the cache.
struct PrintDisposal;

impl DisposalAction<i32, String> for PrintDisposal {
  fn dispose(&self, key: &i32, value: Arc<String>, reason: RemovalReason) -> Result<(), BoxError> {
    println!("[Disposal] Key: {}, Value: '{}', Reason: {}", key, value, reason);
    Ok(())
  }
}

fn main() {
  println!("--- Largest-first eviction with a size estimator and a disposal action ---");

  let cache = CacheBuilder::default()
    .capacity(12)
    .eviction_policy(EvictionPolicy::LargestFirst)
    .size_estimator(|_, value: &String| Ok(value.len() as u64))
    .disposal_action(PrintDisposal)
    .build()
    .expect("Failed to build cache");

  println!("Cache created with a capacity of 12 bytes.");

  cache.put(1, "one".to_string()).unwrap();
  cache.put(2, "three".to_string()).unwrap();
  cache.put(3, "four".to_string()).unwrap();
  println!("\nPut keys 1, 2, 3. Current size: {}", cache.current_size());

  // 12 + 3 pushes the cache over; the largest value goes first.
  println!("\nPutting key 4. This will trigger a reap.");
  cache.put(4, "two".to_string()).unwrap();

  println!("\n--- Final State ---");
  assert!(cache.get(&2).is_none(), "Key 2 holds the largest value");
  assert!(cache.get(&1).is_some());
  assert!(cache.get(&3).is_some());
  assert!(cache.get(&4).is_some());

  println!("Final size: {}", cache.current_size());
  println!("\nCache metrics: {:#?}", cache.metrics());
}
