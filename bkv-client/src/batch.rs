//! # Batch Existence Checks
//!
//! Purpose: Check many keys in one call and fold the per-key outcomes the
//! cluster pushes back into a single mapping.
//!
//! ## Design Principles
//! 1. **Fail Fast on Input**: The first malformed key aborts the call before
//!    anything is dispatched; decoded keys are dropped with the request.
//! 2. **Single Consumer**: The cluster pushes chunks to one accumulator behind
//!    an exclusive borrow, so deliveries never interleave.
//! 3. **Not Found Is Data**: A missing record maps to `None`; it is not an
//!    error.
//! 4. **Nothing Silently Lost**: Keys that fail for another reason have no
//!    mapping entry but are reported in `failures`.
//!
//! ## Flow
//!
//! ```text
//! keys: Value ──decode──> Vec<Key> ──batch_exists──> chunk, chunk, ...
//!                                                       │
//!                                          BatchAccumulator::accept
//!                                                       │
//!                                    BatchResult { records, failures }
//! ```

use std::collections::HashMap;

use bkv_common::{BatchRead, BkvError, Flow, Key, RecordMeta, Status, UserKey, Value};

use crate::codec::{decode_batch_policy, decode_key, encode_meta};
use crate::error::{translate, ClientResult, DatabaseError};
use crate::session::Session;

/// Outcome of `exists_many`.
///
/// Holds exactly one entry per distinct key that was found (`Some`) or is
/// missing (`None`). Duplicate keys resolve last-write-wins. Keys that failed
/// for any other reason are absent from the mapping and listed in
/// `failures`. Iteration order is unspecified.
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    records: HashMap<Key, Slot>,
    failures: HashMap<Key, DatabaseError>,
    writes: u64,
}

/// Mapping entry tagged with the order in which it was written.
#[derive(Debug, Clone, Copy)]
struct Slot {
    seq: u64,
    meta: Option<RecordMeta>,
}

impl BatchResult {
    /// Number of mapping entries.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a key.
    ///
    /// `None` means the key has no entry; `Some(None)` means the record is
    /// missing.
    pub fn get(&self, key: &Key) -> Option<Option<&RecordMeta>> {
        self.records.get(key).map(|slot| slot.meta.as_ref())
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.records.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, Option<&RecordMeta>)> {
        self.records.iter().map(|(key, slot)| (key, slot.meta.as_ref()))
    }

    /// Keys that failed with a status other than not-found.
    pub fn failures(&self) -> impl Iterator<Item = (&Key, &DatabaseError)> {
        self.failures.iter()
    }

    pub fn into_records(self) -> HashMap<Key, Option<RecordMeta>> {
        self.records
            .into_iter()
            .map(|(key, slot)| (key, slot.meta))
            .collect()
    }

    /// External mapping: user key (or `None` for digest-only keys) to
    /// `{"gen", "ttl"}` or `None`.
    ///
    /// Keys sharing a token (digest-only keys, or equal user keys in
    /// different sets) collapse into one entry holding the value written
    /// last. Entries appear in the order their token was first written.
    pub fn to_value(&self) -> Value {
        let mut slots: Vec<(&Key, &Slot)> = self.records.iter().collect();
        slots.sort_unstable_by_key(|(_, slot)| slot.seq);

        let mut positions: HashMap<Option<&UserKey>, usize> = HashMap::with_capacity(slots.len());
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(slots.len());
        for (key, slot) in slots {
            let meta = slot.meta.as_ref().map_or(Value::Nil, encode_meta);
            match positions.get(&key.user_key()).copied() {
                Some(pos) => entries[pos].1 = meta,
                None => {
                    positions.insert(key.user_key(), entries.len());
                    let token = key.user_key().map_or(Value::Nil, UserKey::to_value);
                    entries.push((token, meta));
                }
            }
        }
        Value::Map(entries)
    }
}

/// Folds delivered chunks into a `BatchResult`.
struct BatchAccumulator {
    result: BatchResult,
    max_records: Option<usize>,
    error: Option<DatabaseError>,
}

impl BatchAccumulator {
    fn new(capacity: usize, max_records: Option<usize>) -> Self {
        let mut result = BatchResult::default();
        result.records.reserve(max_records.map_or(capacity, |max| capacity.min(max)));
        BatchAccumulator {
            result,
            max_records,
            error: None,
        }
    }

    /// Consumes one chunk; answers `Stop` when the result cannot grow.
    fn accept(&mut self, chunk: &[BatchRead]) -> Flow {
        tracing::trace!(records = chunk.len(), "batch chunk received");
        if let Err(err) = self.reserve(chunk.len()) {
            tracing::warn!(code = err.code(), "stopping batch delivery");
            self.error = Some(translate(err));
            return Flow::Stop;
        }

        for read in chunk {
            match (read.status, read.meta) {
                (Status::Ok, Some(meta)) => self.record(&read.key, Some(meta)),
                (Status::RecordNotFound, _) => self.record(&read.key, None),
                (Status::Ok, None) => self.fail(
                    &read.key,
                    BkvError::new(Status::ServerError, "record metadata missing"),
                ),
                (status, _) => self.fail(
                    &read.key,
                    BkvError::new(status, format!("batch read failed for {}", read.key)),
                ),
            }
        }
        Flow::Continue
    }

    /// Makes room for `additional` entries, within the configured cap.
    fn reserve(&mut self, additional: usize) -> Result<(), BkvError> {
        let wanted = self.result.records.len().saturating_add(additional);
        if let Some(max) = self.max_records {
            if wanted > max {
                return Err(BkvError::new(
                    Status::NoMemory,
                    format!("batch result would exceed {} records", max),
                ));
            }
        }
        self.result.records.try_reserve(additional).map_err(|err| {
            BkvError::new(
                Status::NoMemory,
                format!("cannot grow batch result: {}", err),
            )
        })
    }

    fn record(&mut self, key: &Key, meta: Option<RecordMeta>) {
        self.result.failures.remove(key);
        let seq = self.result.writes;
        self.result.writes += 1;
        self.result.records.insert(key.clone(), Slot { seq, meta });
    }

    fn fail(&mut self, key: &Key, err: BkvError) {
        tracing::warn!(key = %key, code = err.code(), "batch read failed for key");
        self.result.records.remove(key);
        self.result.failures.insert(key.clone(), translate(err));
    }

    fn finish(self) -> ClientResult<BatchResult> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }
}

/// Checks existence of many keys in one call.
///
/// `keys` must be a list or tuple of key tuples. `policy` overrides the
/// session's default batch policy field by field.
///
/// # Errors
/// - `ClusterUnavailable` when the session's cluster cannot be reached.
/// - `InvalidArgument` for a malformed collection, key, or policy. Nothing is
///   dispatched in that case.
/// - `Server` when the cluster fails the call as a whole.
/// - `Resource` when the result cannot be assembled, including when it
///   would exceed `ClientConfig::max_batch_records`. No partial result is
///   returned.
pub fn exists_many(
    session: &Session,
    keys: &Value,
    policy: Option<&Value>,
) -> ClientResult<BatchResult> {
    let cluster = session.cluster()?;

    let items = keys.as_sequence().ok_or_else(|| {
        translate(BkvError::client("Keys should be specified as a list or tuple."))
    })?;

    let mut batch = Vec::with_capacity(items.len());
    for item in items {
        if !matches!(item, Value::Tuple(_)) {
            return Err(translate(BkvError::client("Key should be a tuple.")));
        }
        batch.push(decode_key(item)?);
    }

    let policy = decode_batch_policy(policy, &session.config().batch_policy)?;
    if batch.is_empty() {
        return Ok(BatchResult::default());
    }

    tracing::debug!(
        op = "exists_many",
        namespace = batch[0].namespace(),
        keys = batch.len(),
        "dispatching batch"
    );

    let mut accumulator =
        BatchAccumulator::new(batch.len(), session.config().max_batch_records);
    cluster.batch_exists(&policy, &batch, &mut |chunk: &[BatchRead]| {
        accumulator.accept(chunk)
    })?;
    accumulator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn key(id: i64) -> Key {
        Key::new("test", "demo", UserKey::Integer(id)).unwrap()
    }

    fn meta(generation: u32) -> RecordMeta {
        RecordMeta { generation, ttl: 10 }
    }

    #[test]
    fn accumulator_maps_found_and_missing() {
        let mut acc = BatchAccumulator::new(2, None);
        let flow = acc.accept(&[BatchRead::found(key(1), meta(1)), BatchRead::not_found(key(2))]);
        assert_eq!(flow, Flow::Continue);

        let result = acc.finish().unwrap();
        assert_eq!(result.get(&key(1)), Some(Some(&meta(1))));
        assert_eq!(result.get(&key(2)), Some(None));
        assert_eq!(result.get(&key(3)), None);
    }

    #[test]
    fn accumulator_reports_failed_keys_separately() {
        let mut acc = BatchAccumulator::new(1, None);
        acc.accept(&[BatchRead::failed(key(1), Status::Timeout)]);
        let result = acc.finish().unwrap();

        assert!(!result.contains_key(&key(1)));
        let failures: Vec<_> = result.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].1.status(), Status::Timeout);
    }

    #[test]
    fn accumulator_last_write_wins() {
        let mut acc = BatchAccumulator::new(1, None);
        acc.accept(&[BatchRead::failed(key(1), Status::Timeout)]);
        acc.accept(&[BatchRead::found(key(1), meta(1))]);
        acc.accept(&[BatchRead::found(key(1), meta(2))]);
        let result = acc.finish().unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.get(&key(1)), Some(Some(&meta(2))));
        assert_eq!(result.failures().count(), 0);
    }

    #[test]
    fn external_mapping_uses_user_key_tokens() {
        let mut acc = BatchAccumulator::new(2, None);
        let digest_only = Key::from_digest("test", "demo", *key(5).digest()).unwrap();
        acc.accept(&[BatchRead::found(key(1), meta(3)), BatchRead::not_found(digest_only)]);
        let value = acc.finish().unwrap().to_value();

        let Value::Map(entries) = value else {
            panic!("expected map");
        };
        assert_eq!(entries.len(), 2);
        let found = entries
            .iter()
            .find(|(token, _)| *token == Value::Integer(1))
            .unwrap();
        assert_eq!(found.1.get("gen"), Some(&Value::Integer(3)));
        let missing = entries.iter().find(|(token, _)| token.is_nil()).unwrap();
        assert!(missing.1.is_nil());
    }

    #[test]
    fn external_mapping_collapses_shared_tokens() {
        let first = Key::from_digest("test", "demo", *key(1).digest()).unwrap();
        let second = Key::from_digest("test", "demo", *key(2).digest()).unwrap();
        let in_a = Key::new("test", "a", UserKey::Integer(7)).unwrap();
        let in_b = Key::new("test", "b", UserKey::Integer(7)).unwrap();

        let mut acc = BatchAccumulator::new(4, None);
        acc.accept(&[
            BatchRead::not_found(first),
            BatchRead::found(in_a, meta(1)),
            BatchRead::found(second, meta(4)),
            BatchRead::not_found(in_b),
        ]);
        let result = acc.finish().unwrap();
        assert_eq!(result.len(), 4);

        let Value::Map(entries) = result.to_value() else {
            panic!("expected map");
        };
        assert_eq!(entries.len(), 2);
        assert!(entries[0].0.is_nil());
        assert_eq!(entries[0].1.get("gen"), Some(&Value::Integer(4)));
        assert_eq!(entries[1].0, Value::Integer(7));
        assert!(entries[1].1.is_nil());
    }

    #[test]
    fn accumulator_stops_at_record_cap() {
        let mut acc = BatchAccumulator::new(3, Some(2));
        assert_eq!(acc.accept(&[BatchRead::found(key(1), meta(1))]), Flow::Continue);
        assert_eq!(
            acc.accept(&[BatchRead::not_found(key(2)), BatchRead::not_found(key(3))]),
            Flow::Stop
        );

        let err = acc.finish().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Resource);
        assert_eq!(err.status(), Status::NoMemory);
    }
}
