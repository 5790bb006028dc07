//! Host exceptions
//!
//! An [`Exception`] is the native view of a host exception object: class,
//! message, code, location and chained previous exception. Every engine
//! error converts into one through [`Throwable`], and the runtime converts
//! between exceptions and live host objects when they cross a call boundary.

use std::fmt;

use thiserror::Error;

use crate::class::{ClassDef, ClassKind, MethodSpec, PropertySpec, Visibility};
use crate::error::{Error, Result, RuntimeError, RuntimeErrorKind, Throwable};
use crate::object::ObjectRef;
use crate::runtime::Runtime;
use crate::value::Value;

/// A host exception crossing into native code, or thrown from it.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct Exception {
    class: String,
    message: String,
    code: i64,
    file: String,
    line: i64,
    previous: Option<Box<Exception>>,
}

impl Exception {
    /// An exception of `class` with code 0.
    pub fn new(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            message: message.into(),
            code: 0,
            file: String::new(),
            line: 0,
            previous: None,
        }
    }

    /// Render any throwable as an exception.
    pub fn from_throwable<T: Throwable + ?Sized>(t: &T) -> Self {
        Self::new(t.class_name(), t.message()).with_code(t.code())
    }

    /// Set the code.
    pub fn with_code(mut self, code: i64) -> Self {
        self.code = code;
        self
    }

    /// Chain a previous exception.
    pub fn with_previous(mut self, previous: Exception) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }

    /// Set the reported location.
    pub fn with_location(mut self, file: impl Into<String>, line: i64) -> Self {
        self.file = file.into();
        self.line = line;
        self
    }

    /// Host class name
    pub fn class(&self) -> &str {
        &self.class
    }

    /// File the exception was raised in
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Line the exception was raised on
    pub fn line(&self) -> i64 {
        self.line
    }

    /// Chained previous exception
    pub fn previous(&self) -> Option<&Exception> {
        self.previous.as_deref()
    }
}

impl Throwable for Exception {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn code(&self) -> i64 {
        self.code
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

/// Declaration of an exception class.
///
/// ```
/// use hostbind::ExceptionSpec;
///
/// let mut spec = ExceptionSpec::new("Demo\\HttpException");
/// spec.extends("RuntimeException").default_code(500);
/// assert_eq!(spec.name(), "Demo\\HttpException");
/// ```
#[derive(Clone)]
pub struct ExceptionSpec {
    pub(crate) def: ClassDef,
    default_code: i64,
}

impl ExceptionSpec {
    /// An exception class extending `Exception`.
    pub fn new(name: impl Into<String>) -> Self {
        let mut def = ClassDef::new(name, ClassKind::Class);
        def.parent = Some("Exception".to_string());
        Self {
            def,
            default_code: 0,
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Extend another throwable class.
    pub fn extends(&mut self, parent: impl Into<String>) -> &mut Self {
        self.def.parent = Some(parent.into());
        self
    }

    /// Code used when the exception is created without one.
    pub fn default_code(&mut self, code: i64) -> &mut Self {
        self.default_code = code;
        self
    }

    /// Declare a class constant.
    pub fn add_constant(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.def.constants.push((name.into(), value.into()));
        self
    }

    /// Declare an instance method.
    pub fn add_method<F, R, E>(
        &mut self,
        name: impl Into<String>,
        visibility: Visibility,
        handler: F,
    ) -> &mut MethodSpec
    where
        F: Fn(&mut Runtime, ObjectRef, &mut crate::function::Arguments) -> std::result::Result<R, E>
            + Send
            + Sync
            + 'static,
        R: Into<Value>,
        E: Into<Error>,
    {
        self.def.push_method(MethodSpec::new(
            name,
            visibility,
            false,
            Some(crate::class::method_handler(handler)),
        ))
    }

    pub(crate) fn into_def(self) -> ClassDef {
        let mut def = self.def;
        if self.default_code != 0 {
            def.properties.push(PropertySpec {
                name: "code".to_string(),
                visibility: Visibility::Protected,
                default: Value::Int(self.default_code),
                is_static: false,
                readonly: false,
            });
        }
        def
    }
}

impl fmt::Debug for ExceptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionSpec")
            .field("name", &self.def.name)
            .field("parent", &self.def.parent)
            .field("default_code", &self.default_code)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════
// Runtime Bridge
// ═══════════════════════════════════════════════════════════════════

fn not_throwable() -> Error {
    RuntimeError::new(
        RuntimeErrorKind::NotThrowable,
        "Cannot throw objects that do not implement Throwable",
    )
    .into()
}

impl Runtime {
    /// Create an exception of a registered throwable class, applying the
    /// class's default code.
    pub fn new_exception(&self, class: &str, message: impl Into<String>) -> Result<Exception> {
        let entry = self.class(class)?;
        if !entry.is_throwable() || !entry.is_instantiable() {
            return Err(not_throwable());
        }
        let code = entry
            .property("code")
            .map_or(0, |p| p.default_value().cast_int());
        Ok(Exception::new(entry.name(), message).with_code(code))
    }

    /// Build the error that throws a new exception of `class`.
    ///
    /// If the class cannot be thrown, the returned error says why.
    pub fn throw_new(&self, class: &str, message: impl Into<String>) -> Error {
        match self.new_exception(class, message) {
            Ok(e) => Error::Throw(e),
            Err(e) => e,
        }
    }

    /// Materialize an exception as a host object.
    pub fn exception_object(&mut self, exception: &Exception) -> Result<ObjectRef> {
        let entry = self.class(exception.class())?;
        if !entry.is_throwable() {
            return Err(not_throwable());
        }
        let previous = match exception.previous() {
            Some(p) => Value::Object(self.exception_object(p)?),
            None => Value::Null,
        };
        let object = self.instantiate(&entry)?;
        self.set_raw_property(object, "message", Value::from(exception.message.as_str()))?;
        self.set_raw_property(object, "code", Value::Int(exception.code))?;
        self.set_raw_property(object, "file", Value::from(exception.file.as_str()))?;
        self.set_raw_property(object, "line", Value::Int(exception.line))?;
        self.set_raw_property(object, "previous", previous)?;
        Ok(object)
    }

    /// Read a host exception object back into native form.
    pub fn exception_from_object(&self, object: ObjectRef) -> Result<Exception> {
        let entry = self.class_of(object)?;
        if !entry.is_throwable() {
            return Err(not_throwable());
        }
        let read = |name: &str| self.raw_property(object, name).unwrap_or(Value::Null);
        let mut exception = Exception::new(entry.name(), read("message").to_string())
            .with_code(read("code").cast_int())
            .with_location(read("file").to_string(), read("line").cast_int());
        if let Value::Object(previous) = read("previous") {
            exception = exception.with_previous(self.exception_from_object(previous)?);
        }
        Ok(exception)
    }

    /// Throw a host object. Only throwable objects can be thrown.
    pub fn throw_object(&self, object: ObjectRef) -> Error {
        match self.exception_from_object(object) {
            Ok(e) => Error::Throw(e),
            Err(e) => e,
        }
    }

    /// Whether a `catch (<class> $e)` clause would catch `error`.
    pub fn catches(&self, error: &Error, class: &str) -> bool {
        let thrown = error.class_name();
        match self.lookup_class(thrown) {
            Some(entry) => entry.is_subclass_of(class),
            None => thrown.eq_ignore_ascii_case(class),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ArityError, CloneNotSupportedError};

    #[test]
    fn test_from_throwable() {
        let e = Exception::from_throwable(&ArityError::too_few("f", 1, 0));
        assert_eq!(e.class(), "ArgumentCountError");
        assert_eq!(e.to_string(), "f(): expects at least 1 parameter(s), 0 given");
        assert_eq!(e.code(), 0);
    }

    #[test]
    fn test_previous_chain() {
        let inner = Exception::from_throwable(&CloneNotSupportedError { class: "B".into() });
        let outer = Exception::new("RuntimeException", "wrapped")
            .with_code(7)
            .with_previous(inner.clone());
        assert_eq!(outer.previous(), Some(&inner));
        assert_eq!(outer.code(), 7);
        assert_eq!(outer.class_name(), "RuntimeException");
    }

    #[test]
    fn test_default_code_becomes_property() {
        let mut spec = ExceptionSpec::new("HttpException");
        spec.default_code(404);
        let def = spec.into_def();
        assert_eq!(def.parent.as_deref(), Some("Exception"));
        assert_eq!(def.properties[0].name, "code");
        assert_eq!(def.properties[0].default, Value::Int(404));
    }
}
