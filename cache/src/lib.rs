//! An in-process, policy-driven cache that is safe to share between threads.
//!
//! # Features
//! - **Expiration**: entries go stale a fixed time after they were fetched or
//!   after they were last read; a stale entry is a miss.
//! - **Reaping**: when the aggregate size passes the capacity, expired entries
//!   go first, then victims chosen by LRU, idle time, size (largest or
//!   smallest first), age, or plain scan order.
//! - **Pluggable sizing**: count-based by default, any size function on demand.
//! - **Fetch on miss**: a [`LoadingCache`] runs its fetcher at most once per
//!   miss, however many threads ask for the key at the same time.
//! - **Null values**: cache them, return them without caching, or refuse them.
//! - **Disposal**: every value that leaves the cache is handed to a disposal
//!   action exactly once, with failures isolated per entry.
//!
//! # Concurrency
//! Each cache has one reader/writer lock. Hits share the read lock; anything
//! that mutates, including the fetcher of a `LoadingCache`, holds the write
//! lock. A slow fetcher therefore blocks the whole instance while it runs.
//! There is no coordination between separate cache instances.
//!
//! ```
//! use policy_cache::{CacheBuilder, EvictionPolicy};
//!
//! let cache = CacheBuilder::default()
//!   .capacity(2)
//!   .eviction_policy(EvictionPolicy::Lru)
//!   .build()
//!   .unwrap();
//!
//! cache.put("a", 1).unwrap();
//! cache.put("b", 2).unwrap();
//! cache.get(&"a");
//! cache.put("c", 3).unwrap();
//!
//! assert!(cache.contains_key(&"a"));
//! assert!(!cache.contains_key(&"b"));
//! ```

// Public modules that form the API
pub mod builder;
pub mod config;
pub mod error;
pub mod handles;
pub mod listener;
pub mod metrics;
pub mod policy;
pub mod time;

// Internal, crate-only modules
mod entry;
mod loader;
mod shared;
mod size;
mod store;
mod sync;
mod task;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use config::CacheConfig;
pub use error::{BoxError, BuildError, CacheError};
pub use handles::{Cache, LoadingCache};
pub use listener::{DisposalAction, RemovalReason};
pub use loader::Fetcher;
pub use metrics::MetricsSnapshot;
pub use policy::{EvictionPolicy, ExpirationBasis, NullValuePolicy};
pub use shared::ReapSummary;
pub use size::SizeEstimator;
pub use time::{Clock, ManualClock, SystemClock};
