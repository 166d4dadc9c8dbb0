//! The plain-data part of a cache's configuration.
//!
//! Everything that is not a function (fetcher, size estimator, disposal
//! action, null check, clock) can be described by a [`CacheConfig`], which
//! with the `serde` feature can be read from any serde format. Durations are
//! written in humantime form, e.g. `"30s"` or `"5m 10s"`.

use crate::policy::{EvictionPolicy, ExpirationBasis, NullValuePolicy};

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
  feature = "serde",
  derive(Serialize, Deserialize),
  serde(default, deny_unknown_fields)
)]
pub struct CacheConfig {
  /// Maximum aggregate size. `None` means unbounded.
  #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
  pub max_capacity: Option<u64>,
  /// How long an entry stays fresh. `None` means entries never expire.
  #[cfg_attr(
    feature = "serde",
    serde(with = "duration_str::option", skip_serializing_if = "Option::is_none")
  )]
  pub expiration: Option<Duration>,
  pub expiration_basis: ExpirationBasis,
  pub eviction_policy: EvictionPolicy,
  pub null_value_policy: NullValuePolicy,
  /// Period of the background reaper. `None` disables it.
  #[cfg_attr(
    feature = "serde",
    serde(with = "duration_str::option", skip_serializing_if = "Option::is_none")
  )]
  pub reap_interval: Option<Duration>,
}

/// `serde(with)` helpers storing a `Duration` as a humantime string.
#[cfg(feature = "serde")]
pub(crate) mod duration_str {
  use serde::de::Error as _;
  use serde::{Deserialize, Deserializer, Serializer};
  use std::time::Duration;

  pub(crate) fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&humantime::format_duration(*duration))
  }

  pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let raw = String::deserialize(deserializer)?;
    humantime::parse_duration(&raw).map_err(D::Error::custom)
  }

  pub(crate) mod option {
    use super::*;

    pub(crate) fn serialize<S: Serializer>(
      duration: &Option<Duration>,
      serializer: S,
    ) -> Result<S::Ok, S::Error> {
      match duration {
        Some(duration) => serializer.serialize_some(&humantime::format_duration(*duration).to_string()),
        None => serializer.serialize_none(),
      }
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
      deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
      Option::<String>::deserialize(deserializer)?
        .map(|raw| humantime::parse_duration(&raw).map_err(D::Error::custom))
        .transpose()
    }
  }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
  use super::*;

  #[test]
  fn parses_humantime_durations_and_tagged_policies() {
    let json = r#"{
      "max_capacity": 512,
      "expiration": "5m",
      "expiration_basis": "since_last_access",
      "eviction_policy": { "kind": "idle_time", "threshold": "30s" },
      "null_value_policy": "return_without_caching"
    }"#;
    let config: CacheConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.max_capacity, Some(512));
    assert_eq!(config.expiration, Some(Duration::from_secs(300)));
    assert_eq!(config.expiration_basis, ExpirationBasis::SinceLastAccess);
    assert_eq!(
      config.eviction_policy,
      EvictionPolicy::IdleTime {
        threshold: Duration::from_secs(30)
      }
    );
    assert_eq!(config.null_value_policy, NullValuePolicy::ReturnWithoutCaching);
    assert_eq!(config.reap_interval, None);
  }

  #[test]
  fn empty_document_is_the_default() {
    let config: CacheConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, CacheConfig::default());
    assert_eq!(config.eviction_policy, EvictionPolicy::Lru);
  }

  #[test]
  fn serializes_back_to_the_same_config() {
    let config = CacheConfig {
      max_capacity: Some(3),
      expiration: Some(Duration::from_millis(1500)),
      eviction_policy: EvictionPolicy::LargestFirst,
      ..CacheConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains(r#""kind":"largest_first""#), "{json}");
    assert_eq!(serde_json::from_str::<CacheConfig>(&json).unwrap(), config);
  }

  #[test]
  fn rejects_bad_durations_and_unknown_fields() {
    assert!(serde_json::from_str::<CacheConfig>(r#"{"expiration": "soon"}"#).is_err());
    assert!(serde_json::from_str::<CacheConfig>(r#"{"capacity": 1}"#).is_err());
  }
}
