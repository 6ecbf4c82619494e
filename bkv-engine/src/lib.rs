//! # BinKV Engine
//!
//! Purpose: Define the cluster seam the client bindings dispatch to, and ship
//! an in-memory cluster for tests and local development.
//!
//! ## Design Principles
//! 1. **Strategy Pattern**: Bindings talk to `dyn Cluster`, never to a concrete
//!    backend.
//! 2. **Node Sharding**: The memory cluster partitions records by digest so
//!    batch results arrive per node, just like a real cluster.

mod engine;
mod memory;

pub use engine::Cluster;
pub use memory::{bins_from, ExpirationHandle, MemoryCluster, MemoryConfig};
