use crate::error::CacheError;

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Decides whether a value is the designated null marker.
///
/// For `Option<T>` values this is usually `Option::is_none`.
pub type NullCheck<V> = Arc<dyn Fn(&V) -> bool + Send + Sync>;

/// What to do with a value that the configured [`NullCheck`] flags as null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum NullValuePolicy {
  /// Store and return it like any other value.
  #[default]
  CacheNormally,
  /// Hand it back to the caller but keep no entry for the key.
  ReturnWithoutCaching,
  /// Refuse it with [`CacheError::NullValue`]; keep no entry for the key.
  Fail,
}

/// The outcome of running a value through the null policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NullDecision {
  Store,
  Skip,
}

impl NullValuePolicy {
  pub(crate) fn decide(&self, is_null: bool) -> Result<NullDecision, CacheError> {
    if !is_null {
      return Ok(NullDecision::Store);
    }

    match self {
      NullValuePolicy::CacheNormally => Ok(NullDecision::Store),
      NullValuePolicy::ReturnWithoutCaching => Ok(NullDecision::Skip),
      NullValuePolicy::Fail => Err(CacheError::NullValue),
    }
  }
}
