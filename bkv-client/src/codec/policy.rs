//! Per-call policy maps.
//!
//! A policy argument is `Nil` (use the configured default) or a map whose
//! fields override the default one by one. Unknown or mistyped fields are
//! rejected.

use std::time::Duration;

use bkv_common::{BatchPolicy, BkvError, BkvResult, ConsistencyLevel, KeyPolicy, ReadPolicy, Value};

/// Resolves the effective batch policy.
///
/// # Errors
/// `ParameterError` for a non-map policy or any invalid field.
pub fn decode_batch_policy(value: Option<&Value>, default: &BatchPolicy) -> BkvResult<BatchPolicy> {
    let mut policy = default.clone();
    for (field, value) in policy_fields(value)? {
        match field {
            "timeout" => policy.total_timeout = millis(field, value)?,
            "socket_timeout" => policy.socket_timeout = millis(field, value)?,
            "consistency_level" => policy.consistency = consistency(value)?,
            "concurrent" => policy.concurrent = boolean(field, value)?,
            "allow_inline" => policy.allow_inline = boolean(field, value)?,
            other => return Err(invalid(format!("unknown field '{}'", other))),
        }
    }
    Ok(policy)
}

/// Resolves the effective read policy.
///
/// # Errors
/// `ParameterError` for a non-map policy or any invalid field.
pub fn decode_read_policy(value: Option<&Value>, default: &ReadPolicy) -> BkvResult<ReadPolicy> {
    let mut policy = default.clone();
    for (field, value) in policy_fields(value)? {
        match field {
            "timeout" => policy.total_timeout = millis(field, value)?,
            "socket_timeout" => policy.socket_timeout = millis(field, value)?,
            "consistency_level" => policy.consistency = consistency(value)?,
            "max_retries" => {
                policy.max_retries = u32::try_from(integer(field, value)?)
                    .map_err(|_| invalid("max_retries out of range"))?
            }
            "key" => {
                policy.key_policy = match integer(field, value)? {
                    0 => KeyPolicy::Digest,
                    1 => KeyPolicy::Send,
                    other => return Err(invalid(format!("unknown key policy {}", other))),
                }
            }
            other => return Err(invalid(format!("unknown field '{}'", other))),
        }
    }
    Ok(policy)
}

fn policy_fields(value: Option<&Value>) -> BkvResult<Vec<(&str, &Value)>> {
    match value {
        None | Some(Value::Nil) => Ok(Vec::new()),
        Some(Value::Map(entries)) => entries
            .iter()
            .map(|(key, value)| {
                key.as_str()
                    .map(|field| (field, value))
                    .ok_or_else(|| invalid("field names must be strings"))
            })
            .collect(),
        Some(other) => Err(invalid(format!("expected map, got {}", other.type_name()))),
    }
}

fn invalid(reason: impl std::fmt::Display) -> BkvError {
    BkvError::param(format!("policy is invalid: {}", reason))
}

fn integer(field: &str, value: &Value) -> BkvResult<i64> {
    value
        .as_i64()
        .ok_or_else(|| invalid(format!("{} must be an integer", field)))
}

fn millis(field: &str, value: &Value) -> BkvResult<Duration> {
    let ms = u64::try_from(integer(field, value)?)
        .map_err(|_| invalid(format!("{} must not be negative", field)))?;
    Ok(Duration::from_millis(ms))
}

fn boolean(field: &str, value: &Value) -> BkvResult<bool> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        _ => Err(invalid(format!("{} must be a bool", field))),
    }
}

fn consistency(value: &Value) -> BkvResult<ConsistencyLevel> {
    match integer("consistency_level", value)? {
        0 => Ok(ConsistencyLevel::One),
        1 => Ok(ConsistencyLevel::All),
        other => Err(invalid(format!("unknown consistency level {}", other))),
    }
}
