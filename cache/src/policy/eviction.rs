use crate::entry::CacheEntry;
use crate::time::duration_to_nanos;

use std::cmp::Ordering;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Selects which entries a reap removes once the cache is over capacity.
///
/// Expired entries are always purged before any of these orderings apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
  feature = "serde",
  derive(Serialize, Deserialize),
  serde(tag = "kind", rename_all = "snake_case")
)]
pub enum EvictionPolicy {
  /// Evict the entry with the oldest last-access timestamp first.
  #[default]
  Lru,
  /// Every reap drops all entries idle for at least `threshold`, whether or
  /// not the cache is over capacity, in no particular order. If that is not
  /// enough, the longest-idle entries go next.
  IdleTime {
    #[cfg_attr(feature = "serde", serde(with = "crate::config::duration_str"))]
    threshold: Duration,
  },
  /// Evict the entry with the greatest size estimate first.
  LargestFirst,
  /// Evict the entry with the smallest size estimate first.
  SmallestFirst,
  /// Evict the entry fetched earliest first, regardless of access.
  OldestFirst,
  /// No ranking: whatever entry the scan reaches first goes.
  ///
  /// Only capacity victims skip the ranking. A reap still purges every
  /// expired entry first, which is a full scan. An expired entry found by
  /// `get` is removed on the spot, while `peek`, `contains_key` and `keys`
  /// run under the read lock and only hide it until the next write or reap.
  Immediate,
}

type VictimOrder<V> = fn(&CacheEntry<V>, &CacheEntry<V>) -> Ordering;

fn least_recent_first<V>(a: &CacheEntry<V>, b: &CacheEntry<V>) -> Ordering {
  a.recency().cmp(&b.recency())
}

fn largest_first<V>(a: &CacheEntry<V>, b: &CacheEntry<V>) -> Ordering {
  b.size().cmp(&a.size()).then_with(|| a.age().cmp(&b.age()))
}

fn smallest_first<V>(a: &CacheEntry<V>, b: &CacheEntry<V>) -> Ordering {
  a.size().cmp(&b.size()).then_with(|| a.age().cmp(&b.age()))
}

fn oldest_first<V>(a: &CacheEntry<V>, b: &CacheEntry<V>) -> Ordering {
  a.age().cmp(&b.age())
}

impl EvictionPolicy {
  /// The ranking used for capacity victims. `None` means scan order.
  fn victim_order<V>(&self) -> Option<VictimOrder<V>> {
    match self {
      EvictionPolicy::Lru | EvictionPolicy::IdleTime { .. } => Some(least_recent_first::<V>),
      EvictionPolicy::LargestFirst => Some(largest_first::<V>),
      EvictionPolicy::SmallestFirst => Some(smallest_first::<V>),
      EvictionPolicy::OldestFirst => Some(oldest_first::<V>),
      EvictionPolicy::Immediate => None,
    }
  }

  pub fn idle_threshold(&self) -> Option<Duration> {
    match self {
      EvictionPolicy::IdleTime { threshold } => Some(*threshold),
      _ => None,
    }
  }

  /// Entries this policy drops on every reap regardless of capacity.
  pub(crate) fn idle_victims<'a, K, V>(
    &self,
    entries: impl Iterator<Item = (&'a K, &'a CacheEntry<V>)>,
    protected: Option<&K>,
    now: u64,
  ) -> Vec<K>
  where
    K: Eq + Clone + 'a,
    V: 'a,
  {
    let Some(threshold) = self.idle_threshold() else {
      return Vec::new();
    };
    let threshold = duration_to_nanos(threshold);

    entries
      .filter(|(key, entry)| protected != Some(*key) && entry.idle_nanos(now) >= threshold)
      .map(|(key, _)| key.clone())
      .collect()
  }

  /// Picks victims in policy order until their sizes add up to `excess`.
  ///
  /// `protected` is never selected. The result may free less than `excess`
  /// when the candidates run out.
  pub(crate) fn select_victims<'a, K, V>(
    &self,
    entries: impl Iterator<Item = (&'a K, &'a CacheEntry<V>)>,
    protected: Option<&K>,
    excess: u64,
  ) -> Vec<K>
  where
    K: Eq + Clone + 'a,
    V: 'a,
  {
    let candidates = entries.filter(|(key, _)| protected != Some(*key));

    match self.victim_order::<V>() {
      Some(order) => {
        let mut ranked: Vec<_> = candidates.collect();
        ranked.sort_unstable_by(|a, b| order(a.1, b.1));
        take_until_freed(ranked.into_iter(), excess)
      }
      None => take_until_freed(candidates, excess),
    }
  }
}

fn take_until_freed<'a, K, V>(
  candidates: impl Iterator<Item = (&'a K, &'a CacheEntry<V>)>,
  excess: u64,
) -> Vec<K>
where
  K: Clone + 'a,
  V: 'a,
{
  let mut freed = 0u64;
  let mut victims = Vec::new();
  for (key, entry) in candidates {
    if freed >= excess {
      break;
    }
    freed = freed.saturating_add(entry.size());
    victims.push(key.clone());
  }
  victims
}
