//! # Error Translation
//!
//! Purpose: Map cluster status codes onto the caller-facing error taxonomy
//! while keeping the cluster's code and message intact.
//!
//! ## Design Principles
//! 1. **Pass-Through**: `code` and `message` are copied verbatim; only `kind`
//!    is derived.
//! 2. **Single Surface**: Every operation fails with exactly one
//!    `DatabaseError`, never alongside a partial result.

use bkv_common::{BkvError, Status, Value};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, DatabaseError>;

/// Caller-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed key, bin list, or policy. Raised before any network call.
    InvalidArgument,
    /// No live connection to the cluster.
    ClusterUnavailable,
    /// Failure reported by the cluster.
    Server,
    /// Local allocation failure while assembling a result.
    Resource,
}

/// Error surfaced by `exists_many` and `select`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?} error {code}: {message}")]
pub struct DatabaseError {
    kind: ErrorKind,
    code: i32,
    message: String,
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Protocol status code reported by the cluster.
    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn status(&self) -> Status {
        Status::from_code(self.code)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// External error payload: `{"code": int, "message": str}`.
    pub fn to_value(&self) -> Value {
        Value::Map(vec![
            (Value::from("code"), Value::Integer(i64::from(self.code))),
            (Value::from("message"), Value::from(self.message.as_str())),
        ])
    }
}

/// Derives the caller-facing kind of a status code.
pub fn kind_of(status: Status) -> ErrorKind {
    match status {
        Status::ParameterError | Status::ClientError | Status::BinNameTooLong => {
            ErrorKind::InvalidArgument
        }
        Status::ClusterError => ErrorKind::ClusterUnavailable,
        Status::NoMemory => ErrorKind::Resource,
        _ => ErrorKind::Server,
    }
}

/// Translates a cluster error, preserving its code and message.
pub fn translate(err: BkvError) -> DatabaseError {
    DatabaseError {
        kind: kind_of(err.status()),
        code: err.code(),
        message: err.message().to_string(),
    }
}

impl From<BkvError> for DatabaseError {
    fn from(err: BkvError) -> Self {
        translate(err)
    }
}
