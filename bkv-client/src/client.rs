//! # Client API
//!
//! Purpose: Expose a compact, blocking API over the batch and select
//! operations.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `Client` hides the session and codec plumbing.
//! 2. **Borrow-Friendly API**: Accept `&Value` so callers keep ownership of
//!    their arguments.
//! 3. **Fail Fast**: Malformed arguments surface before any cluster call.

use std::sync::Arc;

use bkv_common::Value;
use bkv_engine::Cluster;

use crate::batch::{self, BatchResult};
use crate::codec::RecordTuple;
use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::select;
use crate::session::Session;

/// Blocking client bound to one cluster.
#[derive(Clone)]
pub struct Client {
    session: Session,
}

impl Client {
    /// Creates a client with default configuration.
    pub fn new(cluster: Arc<dyn Cluster>) -> Self {
        Self::with_config(cluster, ClientConfig::default())
    }

    /// Creates a client with a custom configuration.
    pub fn with_config(cluster: Arc<dyn Cluster>, config: ClientConfig) -> Self {
        Client {
            session: Session::new(cluster, config),
        }
    }

    /// Session capability, for calling the operation functions directly.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Checks existence of many keys.
    ///
    /// See [`batch::exists_many`].
    pub fn exists_many(&self, keys: &Value, policy: Option<&Value>) -> ClientResult<BatchResult> {
        batch::exists_many(&self.session, keys, policy)
    }

    /// Reads selected bins of one record.
    ///
    /// See [`select::select`].
    pub fn select(
        &self,
        key: &Value,
        bins: &Value,
        policy: Option<&Value>,
    ) -> ClientResult<RecordTuple> {
        select::select(&self.session, key, bins, policy)
    }
}
