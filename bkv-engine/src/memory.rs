//! # In-Memory Cluster
//!
//! Provide a `Cluster` backed by process memory, partitioned into nodes by
//! record digest, with TTL-aware lookups and per-node batch delivery.
//!
//! ## Usage
//!
//! - Use `MemoryCluster::new()` for a default four-node cluster.
//! - Use `MemoryCluster::with_config` to choose the node count and bin limit.
//! - Use `put`/`remove` to seed data, and `start_expirer` to enable active
//!   TTL cleanup in the background.
//! - Use `close` to simulate a lost connection.
//!
//! ## Design Principles
//!
//! 1. **Per-Node Locks**: Each node owns its own lock, so batch chunks are
//!    built under one lock at a time and never while the consumer runs.
//! 2. **Digest Partitioning**: The first digest bytes pick the node, like a
//!    partition map would.
//! 3. **Rotating Delivery**: Batch chunks start at a rotating node, so callers
//!    never see a stable result order.
//! 4. **TTL Fast Path**: Expiration is checked on access; the sweeper only
//!    reclaims memory.
//!
//! ## Structure Overview
//!
//! ```text
//! MemoryCluster
//!   └── nodes: Vec<Node>
//!         └── Node
//!               └── inner: RwLock<NodeInner>
//!                     └── records: HashMap<Key, StoredRecord>
//!                           └── StoredRecord { bins, generation, expires_at }
//! ```

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use ahash::RandomState;
use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use bkv_common::{
    BatchCallback, BatchPolicy, BatchRead, BinName, Bins, BkvError, BkvResult, Flow, Key,
    ReadPolicy, Record, RecordMeta, Status, Value, TTL_NEVER_EXPIRE,
};

use crate::engine::Cluster;

/// Default bin-count limit, bounded by the 16-bit operation count on the wire.
const DEFAULT_MAX_BINS: usize = 32_767;

/// Configuration for the in-memory cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Number of simulated nodes; normalized to a power of two.
    pub node_count: usize,
    /// Largest number of bins per request.
    pub max_bins_per_request: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        MemoryConfig {
            node_count: 4,
            max_bins_per_request: DEFAULT_MAX_BINS,
        }
    }
}

/// Stored record state.
#[derive(Debug)]
struct StoredRecord {
    bins: Bins,
    generation: u32,
    // Absolute expiration timestamp.
    expires_at: Option<Instant>,
}

impl StoredRecord {
    fn is_expired(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    /// Builds metadata with the TTL remaining at `now`, rounded up to seconds.
    fn meta(&self, now: Instant) -> RecordMeta {
        let ttl = match self.expires_at {
            None => TTL_NEVER_EXPIRE,
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(now);
                let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                secs.min(u64::from(TTL_NEVER_EXPIRE - 1)) as u32
            }
        };
        RecordMeta {
            generation: self.generation,
            ttl,
        }
    }
}

#[derive(Debug)]
struct NodeInner {
    records: HashMap<Key, StoredRecord, RandomState>,
}

impl NodeInner {
    /// Returns the live record for `key`, dropping it first if expired.
    fn live(&mut self, key: &Key, now: Instant) -> Option<&StoredRecord> {
        let expired = self.records.get(key)?.is_expired(now);
        if expired {
            self.records.remove(key);
            return None;
        }
        self.records.get(key)
    }
}

/// One simulated cluster node.
#[derive(Debug)]
struct Node {
    inner: RwLock<NodeInner>,
}

/// Sharded in-memory implementation of `Cluster`.
#[derive(Debug)]
pub struct MemoryCluster {
    nodes: Vec<Node>,
    /// Bitmask for fast node selection (power-of-two node count).
    node_mask: usize,
    max_bins: usize,
    connected: AtomicBool,
    /// Start node for the next batch, advanced on every batch call.
    delivery_cursor: AtomicUsize,
}

/// Handle for the background expiration sweeper.
///
/// Call `stop` to signal shutdown and join the thread.
pub struct ExpirationHandle {
    stop: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ExpirationHandle {
    /// Stops the sweeper and waits for the thread to finish.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCluster {
    /// Creates a cluster with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MemoryConfig::default())
    }

    /// Creates a cluster with a caller-provided configuration.
    pub fn with_config(config: MemoryConfig) -> Self {
        let node_count = normalize_node_count(config.node_count);
        let hash_state = RandomState::new();
        let nodes = (0..node_count)
            .map(|_| Node {
                inner: RwLock::new(NodeInner {
                    records: HashMap::with_hasher(hash_state.clone()),
                }),
            })
            .collect();

        MemoryCluster {
            nodes,
            node_mask: node_count - 1,
            max_bins: config.max_bins_per_request,
            connected: AtomicBool::new(true),
            delivery_cursor: AtomicUsize::new(0),
        }
    }

    /// Number of simulated nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Marks the cluster unreachable; every later call fails.
    pub fn close(&self) {
        self.connected.store(false, Ordering::Release);
        tracing::debug!("memory cluster closed");
    }

    /// Writes bins into a record, creating it if needed.
    ///
    /// `Value::Nil` removes a bin. The generation is bumped and the TTL is
    /// reset: `None`, or a TTL past the clock's range, never expires.
    pub fn put(&self, key: &Key, bins: Bins, ttl: Option<Duration>) -> BkvResult<RecordMeta> {
        self.probe()?;
        if bins.len() > self.max_bins {
            return Err(BkvError::param(format!(
                "too many bins: {} > {}",
                bins.len(),
                self.max_bins
            )));
        }

        let now = Instant::now();
        let mut inner = self.node_for(key).inner.write();
        if inner.live(key, now).is_none() {
            inner.records.insert(
                key.clone(),
                StoredRecord {
                    bins: Bins::new(),
                    generation: 0,
                    expires_at: None,
                },
            );
        }

        let record = inner
            .records
            .get_mut(key)
            .ok_or_else(|| BkvError::new(Status::ServerError, "record vanished during write"))?;
        for (name, value) in bins.iter() {
            if value.is_nil() {
                record.bins.remove(name);
            } else {
                record.bins.insert(*name, value.clone());
            }
        }
        record.generation = record.generation.wrapping_add(1);
        // A deadline past the clock's range never expires.
        record.expires_at = ttl.and_then(|ttl| now.checked_add(ttl));
        Ok(record.meta(now))
    }

    /// Deletes a record. Returns true when a live record was removed.
    pub fn remove(&self, key: &Key) -> BkvResult<bool> {
        self.probe()?;
        let now = Instant::now();
        let mut inner = self.node_for(key).inner.write();
        match inner.records.remove(key) {
            Some(record) => Ok(!record.is_expired(now)),
            None => Ok(false),
        }
    }

    /// Removes expired records across all nodes.
    ///
    /// This is an O(n) scan intended for a periodic background sweep.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut removed = 0;
        for node in &self.nodes {
            let mut inner = node.inner.write();
            let before = inner.records.len();
            inner.records.retain(|_, record| !record.is_expired(now));
            removed += before - inner.records.len();
        }
        removed
    }

    /// Starts a background thread that periodically removes expired records.
    ///
    /// The returned handle must be stopped to avoid leaking the thread.
    pub fn start_expirer(self: &Arc<Self>, interval: Duration) -> ExpirationHandle {
        let interval = if interval.is_zero() {
            Duration::from_millis(1)
        } else {
            interval
        };

        let stop = Arc::new(AtomicBool::new(false));
        let stop_thread = Arc::clone(&stop);
        let cluster = Arc::clone(self);

        let join = std::thread::spawn(move || {
            while !stop_thread.load(Ordering::Acquire) {
                std::thread::sleep(interval);
                let removed = cluster.purge_expired(Instant::now());
                if removed > 0 {
                    tracing::trace!(removed, "expired records purged");
                }
            }
        });

        ExpirationHandle {
            stop,
            join: Some(join),
        }
    }

    /// Maps a key to its owning node from the leading digest bytes.
    fn node_index(&self, key: &Key) -> usize {
        let digest = key.digest().as_bytes();
        let word = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
        (word as usize) & self.node_mask
    }

    fn node_for(&self, key: &Key) -> &Node {
        &self.nodes[self.node_index(key)]
    }
}

impl Cluster for MemoryCluster {
    fn probe(&self) -> BkvResult<()> {
        if self.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(BkvError::cluster("No connection to cluster"))
        }
    }

    fn max_bins_per_request(&self) -> usize {
        self.max_bins
    }

    /// Groups keys per node and delivers one chunk per node.
    ///
    /// Each chunk is built under that node's lock and handed to the callback
    /// after the lock is released.
    fn batch_exists(
        &self,
        policy: &BatchPolicy,
        keys: &[Key],
        callback: &mut BatchCallback<'_>,
    ) -> BkvResult<()> {
        self.probe()?;
        let started = Instant::now();

        let mut per_node: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (idx, key) in keys.iter().enumerate() {
            per_node[self.node_index(key)].push(idx);
        }

        let start = self.delivery_cursor.fetch_add(1, Ordering::Relaxed);
        for offset in 0..self.nodes.len() {
            let node_idx = start.wrapping_add(offset) & self.node_mask;
            let slots = &per_node[node_idx];
            if slots.is_empty() {
                continue;
            }

            if !policy.total_timeout.is_zero() && started.elapsed() > policy.total_timeout {
                return Err(BkvError::new(Status::Timeout, "batch timed out"));
            }

            let now = Instant::now();
            let mut chunk = Vec::with_capacity(slots.len());
            {
                let mut inner = self.nodes[node_idx].inner.write();
                for &idx in slots {
                    let key = &keys[idx];
                    let read = match inner.live(key, now) {
                        Some(record) => BatchRead::found(key.clone(), record.meta(now)),
                        None => BatchRead::not_found(key.clone()),
                    };
                    chunk.push(read);
                }
            }

            tracing::trace!(node = node_idx, records = chunk.len(), "delivering batch chunk");
            if callback(&chunk) == Flow::Stop {
                tracing::debug!(node = node_idx, "batch consumer stopped delivery");
                return Ok(());
            }
        }
        Ok(())
    }

    fn select(&self, _policy: &ReadPolicy, key: &Key, bins: &[BinName]) -> BkvResult<Record> {
        self.probe()?;
        if bins.len() > self.max_bins {
            return Err(BkvError::param(format!(
                "too many bins: {} > {}",
                bins.len(),
                self.max_bins
            )));
        }

        let now = Instant::now();
        let mut inner = self.node_for(key).inner.write();
        let record = inner.live(key, now).ok_or_else(BkvError::not_found)?;

        let mut projected = Bins::with_capacity(bins.len());
        for name in bins {
            if let Some(value) = record.bins.get(name.as_str()) {
                projected.insert(*name, value.clone());
            }
        }
        Ok(Record {
            meta: record.meta(now),
            bins: projected,
        })
    }
}

/// Normalizes node counts to a power of two for fast masking.
fn normalize_node_count(count: usize) -> usize {
    count.max(1).next_power_of_two()
}

/// Builds `Bins` from name/value pairs, for seeding and tests.
///
/// # Errors
/// Fails on the first invalid bin name.
pub fn bins_from<I, N, V>(pairs: I) -> BkvResult<Bins>
where
    I: IntoIterator<Item = (N, V)>,
    N: AsRef<str>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(name, value)| Ok((BinName::new(name.as_ref())?, value.into())))
        .collect()
}
