//! # Session Capability
//!
//! Purpose: Hand every operation an explicit cluster handle instead of
//! consulting a global "connected" flag.
//!
//! ## Design Principles
//! 1. **Capability Passing**: Operations receive `&Session`; nothing is looked
//!    up from ambient state.
//! 2. **Probe on Use**: Connection validity is checked by probing the cluster
//!    right before a request is built.

use std::sync::Arc;

use bkv_common::{BkvError, Status};
use bkv_engine::Cluster;

use crate::config::ClientConfig;
use crate::error::{translate, ClientResult};

/// Cluster handle plus the configured default policies.
#[derive(Clone)]
pub struct Session {
    cluster: Arc<dyn Cluster>,
    config: ClientConfig,
}

impl Session {
    pub fn new(cluster: Arc<dyn Cluster>, config: ClientConfig) -> Self {
        Session { cluster, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the cluster after probing it.
    ///
    /// Fails with `ClusterUnavailable` when the probe fails, whatever status
    /// the cluster reported.
    pub fn cluster(&self) -> ClientResult<&dyn Cluster> {
        self.cluster.probe().map_err(|err| match err.status() {
            Status::ClusterError => translate(err),
            _ => translate(BkvError::cluster(err.message())),
        })?;
        Ok(self.cluster.as_ref())
    }
}
