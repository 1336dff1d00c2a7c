// Lenient field coercion for backend payloads
//
// The aggregation functions return numbers as JSON numbers or as numeric
// strings depending on the column type. Anything unusable becomes zero.
use serde_json::{Map, Value};

/// Placeholder for missing text fields.
pub const MISSING_TEXT: &str = "—";

pub fn int_field(row: Option<&Map<String, Value>>, key: &str) -> i64 {
    match row.and_then(|r| r.get(key)) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => parse_int_prefix(s),
        _ => 0,
    }
}

pub fn float_field(row: Option<&Map<String, Value>>, key: &str) -> f64 {
    let value = match row.and_then(|r| r.get(key)) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_float_prefix(s),
        _ => 0.0,
    };
    if value.is_finite() { value } else { 0.0 }
}

pub fn text_field(row: Option<&Map<String, Value>>, key: &str, default: &str) -> String {
    match row.and_then(|r| r.get(key)) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

/// Parse the leading integer of `s`, ignoring leading whitespace and any
/// trailing garbage. Returns 0 when no digits lead the string.
pub fn parse_int_prefix(s: &str) -> i64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }
    let prefix = &s[..end];
    prefix.parse::<i64>().unwrap_or_else(|_| {
        // Out of i64 range, saturate
        prefix.parse::<f64>().map(|f| f as i64).unwrap_or(0)
    })
}

/// Parse the leading decimal number of `s` (sign, digits, fraction,
/// exponent), ignoring trailing garbage. Returns 0 when nothing parses.
pub fn parse_float_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut mantissa_digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        mantissa_digits += frac_end - frac_start;
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return 0.0;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s[..end].parse::<f64>().unwrap_or(0.0)
}
