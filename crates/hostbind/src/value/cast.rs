//! Explicit host casts: `(int)`, `(float)`, `(bool)`, `(string)`
//!
//! These are the lossy conversions a handler asks for on purpose. The
//! binder never applies them implicitly.

use super::{ByteString, Value};

impl Value {
    /// `(bool)` cast
    pub fn cast_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !(s.is_empty() || s.as_bytes() == b"0"),
            Value::Array(a) => !a.is_empty(),
            Value::Object(_) | Value::Callable(_) => true,
            Value::Reference(r) => r.get().cast_bool(),
        }
    }

    /// `(int)` cast
    pub fn cast_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(b) => i64::from(*b),
            Value::Int(i) => *i,
            Value::Float(f) => float_to_int(*f),
            Value::String(s) => match numeric_prefix(s.as_bytes()) {
                Some(Numeric::Int(i)) => i,
                Some(Numeric::Float(f)) => float_to_int(f),
                None => 0,
            },
            Value::Array(a) => i64::from(!a.is_empty()),
            Value::Object(_) | Value::Callable(_) => 1,
            Value::Reference(r) => r.get().cast_int(),
        }
    }

    /// `(float)` cast
    pub fn cast_float(&self) -> f64 {
        match self {
            Value::Float(f) => *f,
            Value::String(s) => match numeric_prefix(s.as_bytes()) {
                Some(Numeric::Int(i)) => i as f64,
                Some(Numeric::Float(f)) => f,
                None => 0.0,
            },
            Value::Reference(r) => r.get().cast_float(),
            other => other.cast_int() as f64,
        }
    }

    /// `(string)` cast for values that do not need the runtime.
    ///
    /// Objects and callables return `None`; use
    /// [`Runtime::to_string`](crate::Runtime::to_string) for those.
    pub fn cast_string(&self) -> Option<ByteString> {
        let s = match self {
            Value::Null | Value::Bool(false) => ByteString::new(""),
            Value::Bool(true) => ByteString::new("1"),
            Value::Int(i) => ByteString::from(i.to_string()),
            Value::Float(f) => ByteString::from(format_float(*f)),
            Value::String(s) => s.clone(),
            Value::Array(_) => ByteString::new("Array"),
            Value::Object(_) | Value::Callable(_) => return None,
            Value::Reference(r) => return r.get().cast_string(),
        };
        Some(s)
    }
}

/// Float to int the way the host truncates: NaN and infinities become 0.
fn float_to_int(f: f64) -> i64 {
    if f.is_finite() {
        f.trunc() as i64
    } else {
        0
    }
}

enum Numeric {
    Int(i64),
    Float(f64),
}

/// Parse the leading numeric part of a string, skipping leading whitespace.
fn numeric_prefix(bytes: &[u8]) -> Option<Numeric> {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let s = &bytes[start..];

    let mut end = 0;
    if matches!(s.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let int_start = end;
    while s.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut is_float = false;
    if s.get(end) == Some(&b'.') {
        let mut frac = end + 1;
        while s.get(frac).is_some_and(u8::is_ascii_digit) {
            frac += 1;
        }
        if frac > end + 1 || end > int_start {
            end = frac;
            is_float = true;
        }
    }
    if end == int_start {
        return None;
    }
    if matches!(s.get(end), Some(b'e') | Some(b'E')) {
        let mut exp = end + 1;
        if matches!(s.get(exp), Some(b'+') | Some(b'-')) {
            exp += 1;
        }
        let digits_start = exp;
        while s.get(exp).is_some_and(u8::is_ascii_digit) {
            exp += 1;
        }
        if exp > digits_start {
            end = exp;
            is_float = true;
        }
    }

    let text = std::str::from_utf8(&s[..end]).ok()?;
    if is_float {
        text.parse().ok().map(Numeric::Float)
    } else {
        match text.parse::<i64>() {
            Ok(i) => Some(Numeric::Int(i)),
            Err(_) => text.parse().ok().map(Numeric::Float),
        }
    }
}

/// Format a float the way the host prints it: 14 significant digits,
/// exponent form outside `1e-4 .. 1e14`, `INF`, `-INF` and `NAN`.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NAN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "INF" } else { "-INF" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let sci = format!("{:.13e}", f);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return sci;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let negative = mantissa.starts_with('-');
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.trim_end_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };
    let sign = if negative { "-" } else { "" };

    if !(-4..14).contains(&exponent) {
        let (head, tail) = digits.split_at(1);
        let tail = if tail.is_empty() { "0" } else { tail };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{head}.{tail}E{exp_sign}{}", exponent.abs());
    }

    let point = exponent + 1;
    let body = if point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else {
        let point = point as usize;
        if digits.len() <= point {
            format!("{}{}", digits, "0".repeat(point - digits.len()))
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };
    format!("{sign}{body}")
}
