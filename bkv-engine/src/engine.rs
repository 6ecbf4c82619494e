//! # Cluster Trait
//!
//! Purpose: The collaborator boundary. Everything behind it (connection
//! management, routing, retries, wire encoding) belongs to the implementation.

use bkv_common::{BatchCallback, BatchPolicy, BinName, BkvResult, Key, ReadPolicy, Record};

/// Database cluster able to answer existence checks and projected reads.
///
/// Implementations must be shareable across threads; calls are blocking.
pub trait Cluster: Send + Sync {
    /// Checks that the cluster connection is usable.
    ///
    /// Fails with `Status::ClusterError` when it is not.
    fn probe(&self) -> BkvResult<()>;

    /// Largest number of bin names accepted in a single request.
    fn max_bins_per_request(&self) -> usize;

    /// Checks existence of `keys`, pushing per-key outcomes to `callback`.
    ///
    /// The callback may be invoked zero or more times with chunks in any
    /// order. Returning `Flow::Stop` aborts delivery of the remaining chunks;
    /// the call then returns `Ok(())`.
    fn batch_exists(
        &self,
        policy: &BatchPolicy,
        keys: &[Key],
        callback: &mut BatchCallback<'_>,
    ) -> BkvResult<()>;

    /// Reads `key`, returning only the requested `bins`.
    ///
    /// A missing record fails with `Status::RecordNotFound`.
    fn select(&self, policy: &ReadPolicy, key: &Key, bins: &[BinName]) -> BkvResult<Record>;
}
