//! Strict conversion from host values into native types
//!
//! Only lossless conversions succeed. The single implicit coercion is
//! int to float widening; everything else is a [`ConversionError`].

use std::sync::Arc;

use super::{Array, ByteString, Callable, Reference, Value};
use crate::error::ConversionError;
use crate::object::ObjectRef;

/// Conversion from a host value into a native type.
pub trait FromValue: Sized {
    /// Convert, failing when no lossless path exists.
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

fn mismatch(value: &Value, to: &str) -> ConversionError {
    ConversionError::new(value.type_name(), to)
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.unref() {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(&other, "bool")),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.unref() {
            Value::Int(i) => Ok(i),
            other => Err(mismatch(&other, "int")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.unref() {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch(&other, "float")),
        }
    }
}

impl FromValue for ByteString {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.unref() {
            Value::String(s) => Ok(s),
            other => Err(mismatch(&other, "string")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.unref() {
            Value::String(s) => s
                .to_str()
                .map(str::to_owned)
                .ok_or_else(|| ConversionError::new("string", "UTF-8 string")),
            other => Err(mismatch(&other, "string")),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        ByteString::from_value(value).map(|s| s.as_bytes().to_vec())
    }
}

impl FromValue for Arc<Array> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.unref() {
            Value::Array(a) => Ok(a),
            other => Err(mismatch(&other, "array")),
        }
    }
}

impl FromValue for Array {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Arc::<Array>::from_value(value).map(Arc::unwrap_or_clone)
    }
}

impl FromValue for ObjectRef {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.unref() {
            Value::Object(o) => Ok(o),
            other => Err(mismatch(&other, "object")),
        }
    }
}

impl FromValue for Callable {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value.unref() {
            Value::Callable(c) => Ok(c),
            Value::String(s) => s
                .to_str()
                .map(Callable::function)
                .ok_or_else(|| ConversionError::new("string", "callable")),
            other => Err(mismatch(&other, "callable")),
        }
    }
}

/// Takes the slot itself; a plain value is wrapped in a fresh slot.
impl FromValue for Reference {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Reference(r) => Ok(r),
            other => Ok(Reference::new(other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let arr = Arc::<Array>::from_value(value)?;
        arr.values().cloned().map(T::from_value).collect()
    }
}

impl Value {
    /// Convert into a native type.
    pub fn extract<T: FromValue>(self) -> Result<T, ConversionError> {
        T::from_value(self)
    }
}
