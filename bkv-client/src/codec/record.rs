//! Records and record metadata in caller-side shapes.
//!
//! A found record becomes `(key, {"gen", "ttl"}, {bin: value})`; a missing
//! one becomes `(key, None, None)`. Batch results use the metadata map alone.

use bkv_common::{Bins, Key, Record, RecordMeta, Value};

use super::key::encode_key;

/// Result of a projected read.
///
/// `meta` and `bins` are both `Some` for a found record and both `None` for a
/// missing one.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordTuple {
    pub key: Key,
    pub meta: Option<RecordMeta>,
    pub bins: Option<Bins>,
}

impl RecordTuple {
    /// Tuple for a missing record.
    pub fn not_found(key: Key) -> Self {
        RecordTuple {
            key,
            meta: None,
            bins: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.meta.is_some()
    }

    /// Converts into the external 3-tuple.
    pub fn into_value(self) -> Value {
        let meta = self.meta.as_ref().map_or(Value::Nil, encode_meta);
        let bins = self.bins.as_ref().map_or(Value::Nil, encode_bins);
        Value::Tuple(vec![encode_key(&self.key), meta, bins])
    }
}

/// Extracts metadata from a cluster record.
pub fn decode_record_meta(record: &Record) -> RecordMeta {
    record.meta
}

/// Encodes metadata as `{"gen": int, "ttl": int}`.
pub fn encode_meta(meta: &RecordMeta) -> Value {
    Value::Map(vec![
        (Value::from("gen"), Value::from(meta.generation)),
        (Value::from("ttl"), Value::from(meta.ttl)),
    ])
}

/// Pairs a found cluster record with the key it was requested under.
pub fn encode_record(record: Record, key: Key) -> RecordTuple {
    RecordTuple {
        key,
        meta: Some(decode_record_meta(&record)),
        bins: Some(record.bins),
    }
}

fn encode_bins(bins: &Bins) -> Value {
    Value::Map(
        bins.iter()
            .map(|(name, value)| (Value::from(name.as_str()), value.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bkv_common::{BinName, UserKey};

    fn key() -> Key {
        Key::new("test", "demo", UserKey::String("k".into())).unwrap()
    }

    #[test]
    fn found_record_encodes_three_parts() {
        let mut bins = Bins::new();
        bins.insert(BinName::new("a").unwrap(), Value::from(1i64));
        let record = Record {
            meta: RecordMeta {
                generation: 2,
                ttl: 100,
            },
            bins,
        };

        let value = encode_record(record, key()).into_value();
        let items = value.as_sequence().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].get("gen"), Some(&Value::Integer(2)));
        assert_eq!(items[1].get("ttl"), Some(&Value::Integer(100)));
        assert_eq!(items[2].get("a"), Some(&Value::Integer(1)));
    }

    #[test]
    fn missing_record_has_nil_meta_and_bins() {
        let tuple = RecordTuple::not_found(key());
        assert!(!tuple.is_found());
        let value = tuple.into_value();
        let items = value.as_sequence().unwrap();
        assert_eq!(items[0], encode_key(&key()));
        assert!(items[1].is_nil());
        assert!(items[2].is_nil());
    }
}
