//! Bin-name lists for projected reads.

use bkv_common::{BinName, BkvError, BkvResult, Value};

/// Decodes a list or tuple of bin names.
///
/// Names longer than the protocol slot are rejected, never truncated. The
/// result holds at most `limit` names, the cluster's per-request bin limit.
///
/// # Errors
/// `ParameterError` ("not a list or tuple", "not string type", too many bins)
/// or `BinNameTooLong`.
pub fn decode_bins(value: &Value, limit: usize) -> BkvResult<Vec<BinName>> {
    let items = value
        .as_sequence()
        .ok_or_else(|| BkvError::param("not a list or tuple"))?;

    if items.len() > limit {
        return Err(BkvError::param(format!(
            "too many bins: {} > {}",
            items.len(),
            limit
        )));
    }

    let mut bins = Vec::with_capacity(items.len());
    for item in items {
        let name = item
            .as_str()
            .ok_or_else(|| BkvError::param("not string type"))?;
        bins.push(BinName::new(name)?);
    }
    Ok(bins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bkv_common::{list, tuple, Status, BIN_NAME_MAX_LEN};
    use proptest::prelude::*;

    const LIMIT: usize = 32_767;

    #[test]
    fn accepts_list_and_tuple() {
        let from_list = decode_bins(&list!["a", "b"], LIMIT).unwrap();
        let from_tuple = decode_bins(&tuple!["a", "b"], LIMIT).unwrap();
        assert_eq!(from_list, from_tuple);
    }

    #[test]
    fn empty_list_is_allowed() {
        assert!(decode_bins(&list![], LIMIT).unwrap().is_empty());
    }

    #[test]
    fn rejects_other_shapes() {
        let err = decode_bins(&Value::from("a"), LIMIT).unwrap_err();
        assert_eq!(err.status(), Status::ParameterError);
        assert_eq!(err.message(), "not a list or tuple");
    }

    #[test]
    fn rejects_non_string_element() {
        let err = decode_bins(&list!["a", 1i64], LIMIT).unwrap_err();
        assert_eq!(err.message(), "not string type");
    }

    #[test]
    fn rejects_overlong_name_instead_of_truncating() {
        let long = "x".repeat(BIN_NAME_MAX_LEN + 1);
        let err = decode_bins(&list![long.as_str()], LIMIT).unwrap_err();
        assert_eq!(err.status(), Status::BinNameTooLong);
    }

    #[test]
    fn enforces_bin_limit() {
        let err = decode_bins(&list!["a", "b", "c"], 2).unwrap_err();
        assert_eq!(err.status(), Status::ParameterError);
    }

    proptest! {
        #[test]
        fn preserves_order_and_text(names in proptest::collection::vec("[a-z_]{1,15}", 0..16)) {
            let input = Value::List(names.iter().map(|name| Value::from(name.as_str())).collect());
            let bins = decode_bins(&input, LIMIT).unwrap();
            let decoded: Vec<&str> = bins.iter().map(|bin| bin.as_str()).collect();
            let expected: Vec<&str> = names.iter().map(String::as_str).collect();
            prop_assert_eq!(decoded, expected);
        }

        #[test]
        fn overlong_policy_is_deterministic(name in "[a-z]{16,40}") {
            let input = list![name.as_str()];
            let first = decode_bins(&input, LIMIT).unwrap_err();
            let second = decode_bins(&input, LIMIT).unwrap_err();
            prop_assert_eq!(first.status(), bkv_common::Status::BinNameTooLong);
            prop_assert_eq!(first, second);
        }
    }
}
