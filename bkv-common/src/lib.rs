// bkv-common - Shared types and protocol definitions for the BinKV client
//
// This crate defines the record data model and the request/response
// structures exchanged between the client bindings and a cluster.

pub mod error;
pub mod policy;
pub mod protocol;
pub mod types;
pub mod value;

// Re-export for convenience
pub use error::*;
pub use policy::*;
pub use protocol::*;
pub use types::*;
pub use value::*;
