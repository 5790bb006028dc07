//! Debug and Display implementations for Value

use std::fmt;

use super::cast::format_float;
use super::Value;

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "float({})", format_float(*x)),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Array(a) => write!(f, "{a:?}"),
            Value::Object(o) => write!(f, "object({o})"),
            Value::Callable(c) => write!(f, "{c:?}"),
            Value::Reference(r) => write!(f, "&{:?}", r.get()),
        }
    }
}

/// Renders the host's string cast. Objects print as their handle since
/// `__toString` needs a runtime.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cast_string() {
            Some(s) => write!(f, "{s}"),
            None => match self {
                Value::Object(o) => write!(f, "Object({o})"),
                Value::Callable(c) => write!(f, "{}", c.name()),
                other => write!(f, "{other:?}"),
            },
        }
    }
}
