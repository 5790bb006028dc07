//! Value representation for host values
//!
//! [`Value`] is a closed tagged union over everything that crosses the
//! native/host boundary. Arrays are copy-on-write behind an `Arc`; objects
//! are non-owning [`ObjectRef`] handles into the runtime's heap.

mod array;
mod callable;
mod cast;
mod convert;
mod display;
mod impls;
mod refs;
mod string;

pub use array::{Array, ArrayKey};
pub use callable::{Callable, Closure, ClosureFn};
pub use convert::FromValue;
pub use refs::Reference;
pub use string::ByteString;

use std::sync::Arc;

use crate::object::ObjectRef;

/// Runtime value representation for the host.
#[derive(Clone)]
pub enum Value {
    // ═══════════════════════════════════════════════════════════════════
    // Scalars
    // ═══════════════════════════════════════════════════════════════════
    /// `null`
    Null,

    /// `true` or `false`
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// Double precision float
    Float(f64),

    /// Byte string, no implied encoding
    String(ByteString),

    // ═══════════════════════════════════════════════════════════════════
    // Compound
    // ═══════════════════════════════════════════════════════════════════
    /// Ordered map, copy-on-write
    Array(Arc<Array>),

    /// Handle to a host object
    Object(ObjectRef),

    // ═══════════════════════════════════════════════════════════════════
    // Indirection
    // ═══════════════════════════════════════════════════════════════════
    /// Something the host can call
    Callable(Callable),

    /// Shared slot, as created by by-reference passing
    Reference(Reference),
}

/// The kind of a [`Value`], as the host names it in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `null`
    Null,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `string`
    String,
    /// `array`
    Array,
    /// `object`
    Object,
    /// `callable`
    Callable,
    /// `reference`
    Reference,
}

impl Kind {
    /// The host's name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Callable => "callable",
            Kind::Reference => "reference",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// The kind of this value. References report `Reference`.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
            Value::Callable(_) => Kind::Callable,
            Value::Reference(_) => Kind::Reference,
        }
    }

    /// The host's type name for this value, following references.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Reference(r) => r.get().type_name(),
            other => other.kind().name(),
        }
    }

    /// The value with references followed.
    pub fn unref(&self) -> Value {
        match self {
            Value::Reference(r) => r.get().unref(),
            other => other.clone(),
        }
    }
}
