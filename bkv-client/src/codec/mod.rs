//! # Codecs
//!
//! Purpose: Convert caller-side `Value`s into validated request values and
//! cluster results back into caller-side shapes.
//!
//! ## Design Principles
//! 1. **Fail Closed**: Every decoder rejects the whole input on the first bad
//!    element; nothing partially decoded escapes.
//! 2. **Owned Output**: Decoded values own their data, so they outlive the
//!    dispatch call without borrowing from the caller.

mod bins;
mod key;
mod policy;
mod record;

pub use bins::decode_bins;
pub use key::{decode_key, encode_key};
pub use policy::{decode_batch_policy, decode_read_policy};
pub use record::{decode_record_meta, encode_meta, encode_record, RecordTuple};
