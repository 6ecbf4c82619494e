//! # BinKV Client Bindings
//!
//! Purpose: Marshal caller-side values into validated requests, dispatch them
//! to a `Cluster`, and turn results back into caller-side shapes.
//!
//! ## Design Principles
//! 1. **Thin Pipeline**: decode, dispatch, encode. Routing, retries, and the
//!    wire protocol belong to the cluster.
//! 2. **Scoped Ownership**: Decoded keys and bin names are owned values that
//!    live until dispatch returns and are dropped on every exit path.
//! 3. **Explicit Capability**: Operations take a `Session` rather than
//!    consulting global connection state.
//! 4. **Preserved Codes**: Errors keep the cluster's status code and message.

mod batch;
mod client;
mod codec;
mod config;
mod error;
mod select;
mod session;

pub use batch::{exists_many, BatchResult};
pub use client::Client;
pub use codec::{
    decode_batch_policy, decode_bins, decode_key, decode_read_policy, decode_record_meta,
    encode_key, encode_meta, encode_record, RecordTuple,
};
pub use config::ClientConfig;
pub use error::{kind_of, translate, ClientResult, DatabaseError, ErrorKind};
pub use select::select;
pub use session::Session;
