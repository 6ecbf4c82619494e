//! # Projected Reads
//!
//! Purpose: Read one record, returning only the requested bins.
//!
//! A missing record is an ordinary outcome here: the call succeeds with
//! `(key, None, None)`.

use bkv_common::{Status, Value};

use crate::codec::{decode_bins, decode_key, decode_read_policy, encode_record, RecordTuple};
use crate::error::{translate, ClientResult};
use crate::session::Session;

/// Reads `key`, projecting the bins named in `bins`.
///
/// `key` is a key tuple and `bins` a list or tuple of bin names. `policy`
/// overrides the session's default read policy field by field.
///
/// # Errors
/// - `ClusterUnavailable` when the session's cluster cannot be reached.
/// - `InvalidArgument` for a malformed key, bin list, or policy.
/// - `Server` for any cluster failure other than a missing record.
pub fn select(
    session: &Session,
    key: &Value,
    bins: &Value,
    policy: Option<&Value>,
) -> ClientResult<RecordTuple> {
    let cluster = session.cluster()?;
    let key = decode_key(key)?;
    let bins = decode_bins(bins, cluster.max_bins_per_request())?;
    let policy = decode_read_policy(policy, &session.config().read_policy)?;

    tracing::debug!(
        op = "select",
        namespace = key.namespace(),
        bins = bins.len(),
        "dispatching read"
    );

    match cluster.select(&policy, &key, &bins) {
        Ok(record) => Ok(encode_record(record, key)),
        Err(err) if err.status() == Status::RecordNotFound => {
            tracing::trace!(key = %key, "record not found");
            Ok(RecordTuple::not_found(key))
        }
        Err(err) => Err(translate(err)),
    }
}
