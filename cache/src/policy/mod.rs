//! The policy engine: stateless rules for staleness, victim ordering and
//! null-value handling. Every policy is a small closed enum; the cache core
//! evaluates them while holding the appropriate lock.

pub mod eviction;
pub mod expiration;
pub mod null;

pub use eviction::EvictionPolicy;
pub use expiration::{ExpirationBasis, ExpirationPolicy};
pub use null::NullValuePolicy;
