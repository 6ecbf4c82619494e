//! # Request Policies
//!
//! Purpose: Describe per-call knobs (timeouts, consistency) handed to a
//! cluster together with a request. Retries and timeouts are enforced by the
//! cluster; the bindings only select which policy applies.
//!
//! Policies are serde-friendly so they can be loaded as client defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Number of replicas consulted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyLevel {
    /// Read from a single replica.
    #[default]
    One,
    /// Read from every replica.
    All,
}

/// Whether the user key is sent alongside the digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPolicy {
    /// Send the digest only.
    #[default]
    Digest,
    /// Send the user key as well.
    Send,
}

/// Policy for batch requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchPolicy {
    /// Whole-call deadline; zero disables it.
    #[serde(with = "duration_ms")]
    pub total_timeout: Duration,
    /// Per-node socket deadline; zero disables it.
    #[serde(with = "duration_ms")]
    pub socket_timeout: Duration,
    pub consistency: ConsistencyLevel,
    /// Issue per-node sub-requests in parallel.
    pub concurrent: bool,
    /// Let the server answer in-memory namespaces inline.
    pub allow_inline: bool,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        BatchPolicy {
            total_timeout: Duration::from_millis(1_000),
            socket_timeout: Duration::ZERO,
            consistency: ConsistencyLevel::One,
            concurrent: false,
            allow_inline: true,
        }
    }
}

/// Policy for single-record reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadPolicy {
    #[serde(with = "duration_ms")]
    pub total_timeout: Duration,
    #[serde(with = "duration_ms")]
    pub socket_timeout: Duration,
    pub consistency: ConsistencyLevel,
    pub max_retries: u32,
    pub key_policy: KeyPolicy,
}

impl Default for ReadPolicy {
    fn default() -> Self {
        ReadPolicy {
            total_timeout: Duration::from_millis(1_000),
            socket_timeout: Duration::ZERO,
            consistency: ConsistencyLevel::One,
            max_retries: 2,
            key_policy: KeyPolicy::Digest,
        }
    }
}

// Durations are configured as whole milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{ser::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis())
            .map_err(|_| S::Error::custom(format!("duration {:?} exceeds u64 milliseconds", value)))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
