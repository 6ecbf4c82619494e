//! Key tuples: `(namespace, set, user_key[, digest])`.

use bkv_common::{BkvError, BkvResult, Digest, Key, UserKey, Value};

/// Decodes a key tuple.
///
/// `set` may be `Nil` for the empty set. `user_key` may be `Nil` only when a
/// digest is supplied; when both are present they must agree.
///
/// # Errors
/// `ParameterError` for any malformed shape, type, or name.
pub fn decode_key(value: &Value) -> BkvResult<Key> {
    let items = match value {
        Value::Tuple(items) => items,
        other => {
            return Err(BkvError::param(format!(
                "key is invalid: expected tuple, got {}",
                other.type_name()
            )))
        }
    };

    if !(2..=4).contains(&items.len()) {
        return Err(BkvError::param(format!(
            "key is invalid: expected 2 to 4 elements, got {}",
            items.len()
        )));
    }

    let namespace = items[0]
        .as_str()
        .ok_or_else(|| BkvError::param("namespace must be a string"))?;
    let set = match &items[1] {
        Value::String(set) => set.as_str(),
        Value::Nil => "",
        _ => return Err(BkvError::param("set must be a string or None")),
    };

    let user_key = match items.get(2) {
        None | Some(Value::Nil) => None,
        Some(Value::Integer(value)) => Some(UserKey::Integer(*value)),
        Some(Value::String(value)) => Some(UserKey::String(value.clone())),
        Some(Value::Bytes(value)) => Some(UserKey::Bytes(value.clone())),
        Some(other) => {
            return Err(BkvError::param(format!(
                "key is invalid: unsupported user key type {}",
                other.type_name()
            )))
        }
    };

    let digest = match items.get(3) {
        None | Some(Value::Nil) => None,
        Some(Value::Bytes(data)) => Some(Digest::from_slice(data)?),
        Some(other) => {
            return Err(BkvError::param(format!(
                "digest must be bytes, got {}",
                other.type_name()
            )))
        }
    };

    match (user_key, digest) {
        (Some(user_key), None) => Key::new(namespace, set, user_key),
        (Some(user_key), Some(digest)) => {
            let key = Key::new(namespace, set, user_key)?;
            if *key.digest() != digest {
                return Err(BkvError::param("digest does not match user key"));
            }
            Ok(key)
        }
        (None, Some(digest)) => Key::from_digest(namespace, set, digest),
        (None, None) => Err(BkvError::param(
            "key is invalid: either user key or digest is required",
        )),
    }
}

/// Encodes a key as `(namespace, set, user_key | None, digest)`.
pub fn encode_key(key: &Key) -> Value {
    Value::Tuple(vec![
        Value::from(key.namespace()),
        Value::from(key.set()),
        key.user_key().map_or(Value::Nil, UserKey::to_value),
        Value::from(key.digest().as_bytes().to_vec()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use bkv_common::{tuple, Status};
    use bytes::Bytes;
    use proptest::prelude::*;

    #[test]
    fn decodes_three_element_tuple() {
        let key = decode_key(&tuple!["test", "demo", 1i64]).unwrap();
        assert_eq!(key.namespace(), "test");
        assert_eq!(key.set(), "demo");
        assert_eq!(key.user_key(), Some(&UserKey::Integer(1)));
    }

    #[test]
    fn nil_set_is_empty_set() {
        let key = decode_key(&tuple!["test", Value::Nil, "k"]).unwrap();
        assert_eq!(key.set(), "");
    }

    #[test]
    fn digest_only_key_has_no_user_key() {
        let full = decode_key(&tuple!["test", "demo", "k"]).unwrap();
        let digest = Bytes::copy_from_slice(full.digest().as_bytes());
        let key = decode_key(&tuple!["test", "demo", Value::Nil, digest]).unwrap();
        assert!(key.user_key().is_none());
        assert_eq!(key, full);
    }

    #[test]
    fn rejects_mismatched_digest() {
        let err = decode_key(&tuple!["test", "demo", "k", vec![0u8; 20]]).unwrap_err();
        assert_eq!(err.status(), Status::ParameterError);
    }

    #[test]
    fn rejects_missing_identity() {
        assert!(decode_key(&tuple!["test", "demo"]).is_err());
        assert!(decode_key(&tuple!["test", "demo", Value::Nil]).is_err());
    }

    #[test]
    fn rejects_bad_shapes() {
        assert!(decode_key(&bkv_common::list!["test", "demo", 1i64]).is_err());
        assert!(decode_key(&tuple!["test"]).is_err());
        assert!(decode_key(&tuple!["test", "demo", 1i64, Value::Nil, Value::Nil]).is_err());
        assert!(decode_key(&tuple![1i64, "demo", 1i64]).is_err());
        assert!(decode_key(&tuple!["test", "demo", 1.5f64]).is_err());
        assert!(decode_key(&tuple!["test", "demo", bkv_common::list![1i64]]).is_err());
    }

    fn user_key_strategy() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<i64>().prop_map(Value::Integer),
            ".{0,32}".prop_map(Value::String),
            proptest::collection::vec(any::<u8>(), 0..32).prop_map(Value::from),
        ]
    }

    proptest! {
        #[test]
        fn key_roundtrip(
            namespace in "[a-z]{1,31}",
            set in "[a-z]{0,63}",
            user_key in user_key_strategy(),
        ) {
            let input = Value::Tuple(vec![
                Value::from(namespace.as_str()),
                Value::from(set.as_str()),
                user_key.clone(),
            ]);
            let key = decode_key(&input).unwrap();
            let encoded = encode_key(&key);
            let items = encoded.as_sequence().unwrap();
            prop_assert_eq!(&items[0], &Value::from(namespace.as_str()));
            prop_assert_eq!(&items[1], &Value::from(set.as_str()));
            prop_assert_eq!(&items[2], &user_key);
            prop_assert_eq!(decode_key(&encoded).unwrap(), key);
        }
    }
}
