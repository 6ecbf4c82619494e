//! # Batch Protocol Structures
//!
//! Purpose: Define the per-key outcome records a cluster pushes back while a
//! batch request is in flight, and the signal the consumer returns.
//!
//! ## Usage Notes
//!
//! - A cluster delivers outcomes in chunks (typically one chunk per node), in
//!   any order and possibly from several threads one at a time.
//! - Each chunk is handed to the consumer callback, which answers with
//!   `Flow::Continue` to keep receiving or `Flow::Stop` to abort the rest.
//! - A `BatchRead` carries `Status::Ok` with metadata, `RecordNotFound`
//!   without, or any other status for a per-key failure.

use crate::error::Status;
use crate::types::{Key, RecordMeta};

/// Outcome for one key of a batch request.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRead {
    /// Key as submitted in the request.
    pub key: Key,
    /// Per-key status.
    pub status: Status,
    /// Metadata, present only when `status` is `Ok`.
    pub meta: Option<RecordMeta>,
}

impl BatchRead {
    /// Successful lookup.
    pub fn found(key: Key, meta: RecordMeta) -> Self {
        BatchRead {
            key,
            status: Status::Ok,
            meta: Some(meta),
        }
    }

    /// Record does not exist.
    pub fn not_found(key: Key) -> Self {
        BatchRead {
            key,
            status: Status::RecordNotFound,
            meta: None,
        }
    }

    /// Per-key failure with a status other than not-found.
    pub fn failed(key: Key, status: Status) -> Self {
        BatchRead {
            key,
            status,
            meta: None,
        }
    }
}

/// Consumer answer to a delivered chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep delivering chunks.
    Continue,
    /// Abort the remaining work.
    Stop,
}

/// Callback receiving batch chunks.
///
/// `Send` so a cluster may invoke it from a worker thread; `&mut` access
/// guarantees one delivery at a time.
pub type BatchCallback<'a> = dyn FnMut(&[BatchRead]) -> Flow + Send + 'a;
