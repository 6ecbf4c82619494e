//! # Client Configuration
//!
//! Default policies applied when a call does not pass its own.

use bkv_common::{BatchPolicy, BkvError, ReadPolicy};
use serde::{Deserialize, Serialize};

use crate::error::{translate, ClientResult};

/// Configuration for the client bindings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Default policy for `exists_many`.
    pub batch_policy: BatchPolicy,
    /// Default policy for `select`.
    pub read_policy: ReadPolicy,
    /// Largest number of entries an `exists_many` result may hold. Delivery
    /// stops with a `Resource` error once a chunk would go past it.
    pub max_batch_records: Option<usize>,
}

impl ClientConfig {
    /// Parses a JSON document; missing fields keep their defaults.
    pub fn from_json_str(raw: &str) -> ClientResult<Self> {
        serde_json::from_str(raw)
            .map_err(|err| translate(BkvError::param(format!("invalid client config: {}", err))))
    }
}
