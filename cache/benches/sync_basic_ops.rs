use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use policy_cache::{Cache, CacheBuilder, EvictionPolicy};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

const ITEMS: u64 = 10_000;

#[derive(Debug, Clone, Copy)]
enum Op {
  GetHit,
  GetMiss,
  Insert,
}

fn prepared_cache(capacity: u64, policy: EvictionPolicy) -> Cache<u64, u64> {
  let cache = CacheBuilder::new()
    .capacity(capacity)
    .eviction_policy(policy)
    .build()
    .unwrap();
  // Pre-populate in a single thread for a consistent start.
  cache.bulk_load((0..ITEMS).map(|i| (i, i))).unwrap();
  cache
}

/// Spreads `ITEMS` keys over `threads` and times them running `op` together.
fn run_workload(cache: &Cache<u64, u64>, op: Op, threads: u64) -> Duration {
  let barrier = Barrier::new(threads as usize);
  let per_thread = ITEMS / threads;

  let start = Instant::now();
  thread::scope(|s| {
    for t in 0..threads {
      let barrier = &barrier;
      s.spawn(move || {
        barrier.wait();
        let keys = (t * per_thread)..((t + 1) * per_thread);
        match op {
          Op::GetHit => keys.for_each(|key| {
            black_box(cache.get(&key));
          }),
          Op::GetMiss => keys.for_each(|key| {
            black_box(cache.get(&(key + ITEMS)));
          }),
          Op::Insert => keys.for_each(|key| {
            cache.put(key + ITEMS, key).unwrap();
          }),
        }
      });
    }
  });
  start.elapsed()
}

fn sync_benches(c: &mut Criterion) {
  let mut group = c.benchmark_group("SyncBasicOps");
  group.throughput(Throughput::Elements(ITEMS));

  for op in [Op::GetHit, Op::GetMiss, Op::Insert] {
    for threads in [1, 4, 8] {
      let id = BenchmarkId::new(format!("{op:?}"), format!("threads={threads}"));
      group.bench_with_input(id, &threads, |b, &threads| {
        b.iter_custom(|iters| {
          let mut total = Duration::ZERO;
          for _ in 0..iters {
            let cache = prepared_cache(ITEMS, EvictionPolicy::Lru);
            total += run_workload(&cache, op, threads);
          }
          total
        });
      });
    }
  }
  group.finish();
}

fn eviction_benches(c: &mut Criterion) {
  let mut group = c.benchmark_group("InsertUnderPressure");
  group.throughput(Throughput::Elements(ITEMS));

  let policies = [
    EvictionPolicy::Lru,
    EvictionPolicy::OldestFirst,
    EvictionPolicy::LargestFirst,
    EvictionPolicy::Immediate,
  ];
  for policy in policies {
    group.bench_function(format!("{policy:?}"), |b| {
      b.iter_custom(|iters| {
        let mut total = Duration::ZERO;
        for _ in 0..iters {
          // Every insert lands on a full cache and triggers a reap.
          let cache = prepared_cache(ITEMS / 10, policy);
          total += run_workload(&cache, Op::Insert, 1);
        }
        total
      });
    });
  }
  group.finish();
}

criterion_group!(benches, sync_benches, eviction_benches);
criterion_main!(benches);
