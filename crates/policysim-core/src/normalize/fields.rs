//! Path-aware accessors over untyped JSON.
//!
//! Every accessor reports the dotted path of the field it looked at, so a
//! contract mismatch can be traced to the exact key in the engine response.

use serde_json::{Map, Value};

use crate::error::NormalizationError;

pub(crate) type Object = Map<String, Value>;

pub(crate) fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

pub(crate) fn index(parent: &str, i: usize) -> String {
    format!("{parent}[{i}]")
}

/// First present, non-null key among `keys`. The first key names the field.
pub(crate) fn lookup<'a>(obj: &'a Object, parent: &str, keys: &[&str]) -> Option<(&'a Value, String)> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::Null) | None => None,
        Some(value) => Some((value, join(parent, key))),
    })
}

pub(crate) fn required<'a>(
    obj: &'a Object,
    parent: &str,
    keys: &[&str],
) -> Result<(&'a Value, String), NormalizationError> {
    lookup(obj, parent, keys).ok_or_else(|| NormalizationError::MissingField {
        path: join(parent, keys[0]),
    })
}

pub(crate) fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Object, NormalizationError> {
    value.as_object().ok_or_else(|| NormalizationError::InvalidType {
        path: path.to_string(),
        expected: "object",
    })
}

pub(crate) fn array<'a>(value: &'a Value, path: &str) -> Result<&'a [Value], NormalizationError> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| NormalizationError::InvalidType {
            path: path.to_string(),
            expected: "array",
        })
}

pub(crate) fn string<'a>(value: &'a Value, path: &str) -> Result<&'a str, NormalizationError> {
    value.as_str().ok_or_else(|| NormalizationError::InvalidType {
        path: path.to_string(),
        expected: "string",
    })
}

/// Numbers, and numeric strings the transport may have produced.
pub(crate) fn number(value: &Value, path: &str) -> Result<f64, NormalizationError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(NormalizationError::InvalidType {
            path: path.to_string(),
            expected: "number",
        }),
    }
}

pub(crate) fn whole_number(value: &Value, path: &str) -> Result<u32, NormalizationError> {
    let n = number(value, path)?;
    if n.fract() != 0.0 || n < 0.0 || n > f64::from(u32::MAX) {
        return Err(NormalizationError::InvalidValue {
            path: path.to_string(),
            reason: format!("expected a non-negative integer, got {n}"),
        });
    }
    Ok(n as u32)
}

pub(crate) fn required_number(obj: &Object, parent: &str, keys: &[&str]) -> Result<f64, NormalizationError> {
    let (value, path) = required(obj, parent, keys)?;
    number(value, &path)
}
