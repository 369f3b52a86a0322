//! Value normalization.
//!
//! Converts the raw values a host item carries for a field into the single
//! typed value the engine expects for that field's declared [`FieldType`].
//!
//! Coercion is total: every input produces a value and nothing here fails.
//! The engine remains the final judge of validity.
//!
//! | Type | Coercion | Empty |
//! |------|----------|-------|
//! | `bool` | truthiness | `false` |
//! | `float` | numeric parse, bools as 1/0 | `0.0` |
//! | `int32` | truncate, then `& 0xFFFFFFFF` | `0` |
//! | `string` | canonical string form | `""` |
//! | `auto` | passed through | `null` |
//! | `T[]` | every value coerced as `T` | `[]` |
//!
//! Scalar types keep only the last raw value. Array types keep all of them.

use serde_json::{Number, Value};

use crate::types::FieldType;

/// Mask applied to int32 values.
pub const INT32_MASK: u64 = 0xFFFF_FFFF;

/// Normalize a field's raw values for its declared type.
pub fn normalize(values: &[Value], field_type: FieldType) -> Value {
    if let Some(element) = field_type.element() {
        return Value::Array(values.iter().map(|v| coerce(v, element)).collect());
    }

    match values.last() {
        Some(value) => coerce(value, field_type),
        None => empty_value(field_type),
    }
}

/// Canonical placeholder sent when a field has no values.
pub fn empty_value(field_type: FieldType) -> Value {
    if field_type.is_array() {
        return Value::Array(Vec::new());
    }
    coerce(&Value::Null, field_type)
}

/// Coerce one raw value to a scalar type.
///
/// Array types coerce as their element type.
pub fn coerce(value: &Value, field_type: FieldType) -> Value {
    match field_type.element().unwrap_or(field_type) {
        FieldType::Bool => Value::Bool(truthy(value)),
        FieldType::Float => float_value(to_float(value)),
        FieldType::Int32 => Value::Number(Number::from(mask_int32(to_integer(value)))),
        FieldType::String => Value::String(to_string(value)),
        _ => value.clone(),
    }
}

/// Wrap an integer into the unsigned 32-bit range.
///
/// Negative and oversized values wrap rather than being rejected:
/// `mask_int32(-1) == 4294967295`.
pub fn mask_int32(value: i64) -> u32 {
    ((value as u64) & INT32_MASK) as u32
}

/// Loose truthiness: null, `false`, zero, `""`, `"0"` and empty containers are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn to_float(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Array(_) | Value::Object(_) => f64::from(u8::from(truthy(value))),
    }
}

fn to_integer(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u as i64))
            .or_else(|| n.as_f64().map(truncate))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(truncate))
                .unwrap_or(0)
        }
        Value::Array(_) | Value::Object(_) => i64::from(truthy(value)),
    }
}

/// Truncate toward zero; NaN becomes 0 and infinities saturate.
fn truncate(f: f64) -> i64 {
    if f.is_nan() { 0 } else { f.trunc() as i64 }
}

fn to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => {
                format!("{}", f as i64)
            }
            _ => n.to_string(),
        },
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or_else(|| Value::Number(Number::from(0)))
}

// ============================================================================
// Tests
// ============================================================================
