use policy_cache::{CacheBuilder, CacheError, NullValuePolicy};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Pretends to be a slow user directory where id 0 does not exist.
fn lookup_user(id: u32) -> Option<String> {
  thread::sleep(Duration::from_millis(100));
  (id != 0).then(|| format!("user-{id}"))
}

fn main() {
  let lookups = Arc::new(AtomicUsize::new(0));
  let counter = lookups.clone();

  let users = CacheBuilder::default()
    .capacity(1_000)
    .expire_after(Duration::from_secs(30))
    .null_value_policy(NullValuePolicy::Fail)
    .null_when(Option::is_none)
    .fetcher(move |id: &u32| {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(lookup_user(*id))
    })
    .build_loading()
    .expect("Failed to build loading cache");

  // Eight threads ask for the same missing user at once; only one lookup runs.
  thread::scope(|s| {
    for _ in 0..8 {
      s.spawn(|| {
        let user = users.get(&42).expect("lookup failed");
        println!("Got {:?}", user);
      });
    }
  });
  println!("Lookups performed: {}", lookups.load(Ordering::SeqCst));

  match users.get(&0) {
    Err(CacheError::NullValue) => println!("User 0 does not exist and was not cached."),
    other => println!("Unexpected result: {:?}", other),
  }

  println!("\nCache metrics: {:#?}", users.metrics());
}
