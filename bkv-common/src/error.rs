//! # Status Codes and Cluster Errors
//!
//! Purpose: Carry the numeric status codes reported by a cluster together
//! with a human-readable message, the same way the wire protocol does.
//!
//! ## Design Principles
//! 1. **Code Preservation**: Every error keeps the numeric code so
//!    callers can match on it after translation.
//! 2. **Open Set**: Unknown codes round-trip through `Status::Other`.
//! 3. **Data, Not Failure**: `RecordNotFound` is a status, and operations decide
//!    whether it is an error or an ordinary outcome.

use std::fmt;

use thiserror::Error;

/// Result alias for cluster-level operations.
pub type BkvResult<T> = Result<T, BkvError>;

/// Protocol status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Request succeeded.
    Ok,
    /// Generic server-side failure.
    ServerError,
    /// Record does not exist.
    RecordNotFound,
    /// Generation check failed.
    GenerationError,
    /// Bad request parameter.
    ParameterError,
    /// Record already exists.
    RecordExists,
    /// Request timed out.
    Timeout,
    /// No usable connection to the cluster.
    ClusterError,
    /// Bin name exceeds the protocol slot.
    BinNameTooLong,
    /// Client-side usage error.
    ClientError,
    /// Local allocation failed.
    NoMemory,
    /// Any code not modelled above.
    Other(i32),
}

impl Status {
    /// Returns the numeric protocol code.
    pub const fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::ServerError => 1,
            Status::RecordNotFound => 2,
            Status::GenerationError => 3,
            Status::ParameterError => 4,
            Status::RecordExists => 5,
            Status::Timeout => 9,
            Status::ClusterError => 11,
            Status::BinNameTooLong => 21,
            Status::ClientError => -1,
            Status::NoMemory => -2,
            Status::Other(code) => code,
        }
    }

    /// Maps a numeric code back to a status.
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Status::Ok,
            1 => Status::ServerError,
            2 => Status::RecordNotFound,
            3 => Status::GenerationError,
            4 => Status::ParameterError,
            5 => Status::RecordExists,
            9 => Status::Timeout,
            11 => Status::ClusterError,
            21 => Status::BinNameTooLong,
            -1 => Status::ClientError,
            -2 => Status::NoMemory,
            other => Status::Other(other),
        }
    }

    /// Returns true for `Status::Ok`.
    #[inline]
    pub const fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::ServerError => "ERR_SERVER",
            Status::RecordNotFound => "ERR_RECORD_NOT_FOUND",
            Status::GenerationError => "ERR_RECORD_GENERATION",
            Status::ParameterError => "ERR_PARAM",
            Status::RecordExists => "ERR_RECORD_EXISTS",
            Status::Timeout => "ERR_TIMEOUT",
            Status::ClusterError => "ERR_CLUSTER",
            Status::BinNameTooLong => "ERR_BIN_NAME",
            Status::ClientError => "ERR_CLIENT",
            Status::NoMemory => "ERR_NO_MEMORY",
            Status::Other(_) => "ERR_UNKNOWN",
        };
        f.write_str(name)
    }
}

/// Error reported by a cluster or by local request validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status} ({code}): {message}", code = .status.code())]
pub struct BkvError {
    status: Status,
    message: String,
}

impl BkvError {
    /// Creates an error with an explicit status.
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        BkvError {
            status,
            message: message.into(),
        }
    }

    /// Bad request parameter.
    pub fn param(message: impl Into<String>) -> Self {
        Self::new(Status::ParameterError, message)
    }

    /// Client-side usage error.
    pub fn client(message: impl Into<String>) -> Self {
        Self::new(Status::ClientError, message)
    }

    /// Cluster connection is not usable.
    pub fn cluster(message: impl Into<String>) -> Self {
        Self::new(Status::ClusterError, message)
    }

    /// Record does not exist.
    pub fn not_found() -> Self {
        Self::new(Status::RecordNotFound, "record not found")
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn code(&self) -> i32 {
        self.status.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
