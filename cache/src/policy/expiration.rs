use crate::entry::CacheEntry;
use crate::time::duration_to_nanos;

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The timestamp an entry's staleness deadline is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum ExpirationBasis {
  /// Deadline is `fetched_at + duration`. Reads do not extend it.
  #[default]
  SinceFetch,
  /// Deadline is `last_accessed + duration`. Every hit pushes it out.
  SinceLastAccess,
}

/// How long entries stay fresh, and from which timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpirationPolicy {
  after: Option<Duration>,
  basis: ExpirationBasis,
}

impl ExpirationPolicy {
  /// Entries never expire.
  pub const NEVER: Self = Self {
    after: None,
    basis: ExpirationBasis::SinceFetch,
  };

  pub fn new(after: Option<Duration>, basis: ExpirationBasis) -> Self {
    Self { after, basis }
  }

  pub fn after(&self) -> Option<Duration> {
    self.after
  }

  pub fn basis(&self) -> ExpirationBasis {
    self.basis
  }

  /// The instant (clock nanoseconds) after which `entry` is stale, or `None`
  /// if entries never expire.
  #[inline]
  pub(crate) fn deadline<V>(&self, entry: &CacheEntry<V>) -> Option<u64> {
    let after = duration_to_nanos(self.after?);
    let origin = match self.basis {
      ExpirationBasis::SinceFetch => entry.fetched_at(),
      ExpirationBasis::SinceLastAccess => entry.last_accessed(),
    };
    Some(origin.saturating_add(after))
  }

  /// An entry is expired once `now` is strictly past its deadline.
  #[inline]
  pub(crate) fn is_expired<V>(&self, entry: &CacheEntry<V>, now: u64) -> bool {
    self.deadline(entry).is_some_and(|deadline| now > deadline)
  }
}
