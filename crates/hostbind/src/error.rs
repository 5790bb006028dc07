//! Error taxonomy for binding, projection and registration
//!
//! Every error the engine raises maps onto exactly one host exception class
//! through [`Throwable`]. The class name, code and message are what host code
//! observes once the error crosses a call boundary.

use std::convert::Infallible;
use std::fmt;

use hostbind_macros::Throwable;
use thiserror::Error;

use crate::exception::Exception;
use crate::value::Value;

/// An error that can be rendered as a host exception.
///
/// Usually derived with `#[derive(Throwable)]`.
pub trait Throwable: fmt::Display {
    /// Host class the error is thrown as
    fn class_name(&self) -> &str;

    /// Exception code
    fn code(&self) -> i64 {
        0
    }

    /// Exception message
    fn message(&self) -> String {
        self.to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════
// Binder Errors
// ═══════════════════════════════════════════════════════════════════

/// Too few arguments, or a required parameter left unbound.
#[derive(Debug, Clone, PartialEq, Eq, Error, Throwable)]
#[error("{message}")]
#[throwable_class("ArgumentCountError")]
pub struct ArityError {
    /// Function or `Class::method` being called
    pub function: String,
    /// Number of required parameters
    pub required: usize,
    /// Number of arguments supplied
    pub given: usize,
    message: String,
}

impl ArityError {
    /// Fewer arguments supplied than the signature requires.
    pub fn too_few(function: impl Into<String>, required: usize, given: usize) -> Self {
        let function = function.into();
        let message =
            format!("{function}(): expects at least {required} parameter(s), {given} given");
        Self {
            function,
            required,
            given,
            message,
        }
    }

    /// A required parameter was skipped by named arguments.
    pub fn not_passed(
        function: impl Into<String>,
        position: usize,
        name: &str,
        required: usize,
        given: usize,
    ) -> Self {
        let function = function.into();
        let message = format!("{function}(): Argument #{position} (${name}) not passed");
        Self {
            function,
            required,
            given,
            message,
        }
    }

    /// How many more arguments were needed.
    pub fn deficit(&self) -> usize {
        self.required.saturating_sub(self.given)
    }
}

/// A value did not satisfy a declared parameter or return type.
#[derive(Debug, Clone, PartialEq, Eq, Error, Throwable)]
#[error("{message}")]
#[throwable_class("TypeError")]
pub struct TypeMismatchError {
    /// Declared type as the host spells it (`?int`, `Foo`, ...)
    pub expected: String,
    /// Type name of the supplied value
    pub given: String,
    message: String,
}

impl TypeMismatchError {
    /// An argument failed its parameter type.
    pub fn argument(expected: impl Into<String>, given: impl Into<String>) -> Self {
        let (expected, given) = (expected.into(), given.into());
        let message = format!("type error: must be of type {expected}, {given} given");
        Self {
            expected,
            given,
            message,
        }
    }

    /// A handler result failed the declared return type.
    pub fn return_value(
        function: &str,
        expected: impl Into<String>,
        given: impl Into<String>,
    ) -> Self {
        let (expected, given) = (expected.into(), given.into());
        let message =
            format!("{function}(): Return value must be of type {expected}, {given} returned");
        Self {
            expected,
            given,
            message,
        }
    }

    /// A `never` function returned.
    pub fn never_returned(function: &str) -> Self {
        Self {
            expected: "never".to_string(),
            given: "void".to_string(),
            message: format!("{function}(): never-returning function must not implicitly return"),
        }
    }
}

/// No conversion path between a host value and a native type.
#[derive(Debug, Clone, PartialEq, Eq, Error, Throwable)]
#[error("cannot convert {from} to {to}")]
#[throwable_class("TypeError")]
pub struct ConversionError {
    /// Type name of the host value
    pub from: String,
    /// Native target type
    pub to: String,
}

impl ConversionError {
    /// Create a conversion error.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Projection Errors
// ═══════════════════════════════════════════════════════════════════

/// Clone attempted on a class without the cloneable capability.
#[derive(Debug, Clone, PartialEq, Eq, Error, Throwable)]
#[error("Trying to clone an uncloneable object of class {class}")]
#[throwable_class("Error")]
pub struct CloneNotSupportedError {
    /// Class of the object
    pub class: String,
}

/// Property access violating visibility, readonly or declaration rules.
#[derive(Debug, Clone, PartialEq, Eq, Error, Throwable)]
#[error("{message}")]
#[throwable_class("Error")]
pub struct PropertyAccessError {
    /// Class of the accessed object
    pub class: String,
    /// Property name
    pub property: String,
    message: String,
}

impl PropertyAccessError {
    fn new(class: &str, property: &str, message: String) -> Self {
        Self {
            class: class.to_string(),
            property: property.to_string(),
            message,
        }
    }

    /// Private property accessed outside its declaring class.
    pub fn private(class: &str, property: &str) -> Self {
        Self::new(
            class,
            property,
            format!("Cannot access private property {class}::${property}"),
        )
    }

    /// Protected property accessed outside the class hierarchy.
    pub fn protected(class: &str, property: &str) -> Self {
        Self::new(
            class,
            property,
            format!("Cannot access protected property {class}::${property}"),
        )
    }

    /// Write to a readonly property.
    pub fn readonly(class: &str, property: &str) -> Self {
        Self::new(
            class,
            property,
            format!("Cannot modify readonly property {class}::${property}"),
        )
    }

    /// Dynamic property on a class that forbids them.
    pub fn dynamic(class: &str, property: &str) -> Self {
        Self::new(
            class,
            property,
            format!("Cannot create dynamic property {class}::${property}"),
        )
    }

    /// Static property that no class in the hierarchy declares.
    pub fn undeclared_static(class: &str, property: &str) -> Self {
        Self::new(
            class,
            property,
            format!("Access to undeclared static property {class}::${property}"),
        )
    }
}

// ═══════════════════════════════════════════════════════════════════
// Registry Errors
// ═══════════════════════════════════════════════════════════════════

/// A concrete class left abstract methods unimplemented.
#[derive(Debug, Clone, PartialEq, Eq, Error, Throwable)]
#[throwable_class("Error")]
pub struct InterfaceContractError {
    /// Class being registered
    pub class: String,
    /// Missing methods as `Declaring::method`
    pub missing: Vec<String>,
}

impl fmt::Display for InterfaceContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.missing.len();
        let listed = self.missing.iter().take(3).cloned().collect::<Vec<_>>();
        write!(
            f,
            "Class {} contains {} abstract method{} and must therefore be declared abstract or \
             implement the remaining methods ({}{})",
            self.class,
            n,
            if n == 1 { "" } else { "s" },
            listed.join(", "),
            if n > 3 { ", ..." } else { "" },
        )
    }
}

/// How an enum case was looked up.
#[derive(Debug, Clone, PartialEq)]
pub enum CaseLookup {
    /// By case name
    Name(String),
    /// By backing value
    Value(Value),
}

/// No enum case matches a name or backing value.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct CaseNotFoundError {
    /// Enum class name
    pub enum_name: String,
    /// The failed lookup
    pub lookup: CaseLookup,
}

impl fmt::Display for CaseNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.lookup {
            CaseLookup::Name(name) => write!(f, "Undefined constant {}::{}", self.enum_name, name),
            CaseLookup::Value(Value::String(s)) => write!(
                f,
                "\"{}\" is not a valid backing value for enum {}",
                s, self.enum_name
            ),
            CaseLookup::Value(v) => write!(
                f,
                "{} is not a valid backing value for enum {}",
                v, self.enum_name
            ),
        }
    }
}

impl Throwable for CaseNotFoundError {
    fn class_name(&self) -> &str {
        match self.lookup {
            CaseLookup::Name(_) => "Error",
            CaseLookup::Value(_) => "ValueError",
        }
    }
}

/// A declaration was rejected at module startup or class declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error, Throwable)]
#[error("{message}")]
#[throwable_class("Error")]
pub struct RegistrationError {
    /// What went wrong
    pub message: String,
}

impl RegistrationError {
    /// Create a registration error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════
// Runtime Errors
// ═══════════════════════════════════════════════════════════════════

/// Category of a [`RuntimeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    /// Unknown class name
    ClassNotFound,
    /// Unknown function name
    UndefinedFunction,
    /// Unknown method name
    UndefinedMethod,
    /// Method not visible from the calling scope
    MethodVisibility,
    /// Instance method called statically
    StaticCall,
    /// Abstract method invoked
    AbstractCall,
    /// Interface, abstract class or enum instantiated
    Instantiation,
    /// Unknown class or module constant
    UndefinedConstant,
    /// Object handle no longer live
    InvalidHandle,
    /// Native state missing or of another type
    StateType,
    /// Call nesting limit hit
    StackOverflow,
    /// Non-throwable thrown
    NotThrowable,
    /// Array access on an object without the capability
    NotArrayAccess,
    /// String cast of an object without `__toString`
    NotStringable,
    /// Unknown or duplicated named argument
    NamedArgument,
    /// Function or class declared twice
    Redeclare,
    /// Unknown or read-only ini entry
    Ini,
    /// Array append with no free integer key left
    NextElementOccupied,
}

/// A host-level runtime failure (class `Error`).
#[derive(Debug, Clone, PartialEq, Eq, Error, Throwable)]
#[error("{message}")]
#[throwable_class("Error")]
pub struct RuntimeError {
    /// Category
    pub kind: RuntimeErrorKind,
    /// Host message
    pub message: String,
}

impl RuntimeError {
    /// Create a runtime error.
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Unknown class.
    pub fn class_not_found(name: &str) -> Self {
        Self::new(
            RuntimeErrorKind::ClassNotFound,
            format!("Class \"{name}\" not found"),
        )
    }
}

/// A native panic caught at the call boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Throwable)]
#[error("internal fault in {function}(): {message}")]
#[throwable_class("Error")]
pub struct InternalFault {
    /// Function whose handler panicked
    pub function: String,
    /// Panic payload
    pub message: String,
}

// ═══════════════════════════════════════════════════════════════════
// Crate Error
// ═══════════════════════════════════════════════════════════════════

/// Main error type for hostbind operations.
///
/// Anything not covered by a structured variant goes through `Other` and
/// reaches the host as `ErrorException`.
#[derive(Debug, Error, Throwable)]
#[throwable_class("ErrorException")]
pub enum Error {
    /// Too few or unbound arguments
    #[error(transparent)]
    #[throwable(transparent)]
    Arity(#[from] ArityError),

    /// Argument or return type mismatch
    #[error(transparent)]
    #[throwable(transparent)]
    TypeMismatch(#[from] TypeMismatchError),

    /// Failed native conversion
    #[error(transparent)]
    #[throwable(transparent)]
    Conversion(#[from] ConversionError),

    /// Clone of an uncloneable object
    #[error(transparent)]
    #[throwable(transparent)]
    CloneNotSupported(#[from] CloneNotSupportedError),

    /// Property visibility or declaration violation
    #[error(transparent)]
    #[throwable(transparent)]
    PropertyAccess(#[from] PropertyAccessError),

    /// Unimplemented abstract methods
    #[error(transparent)]
    #[throwable(transparent)]
    InterfaceContract(#[from] InterfaceContractError),

    /// Enum case lookup failure
    #[error(transparent)]
    #[throwable(transparent)]
    CaseNotFound(#[from] CaseNotFoundError),

    /// Rejected declaration
    #[error(transparent)]
    #[throwable(transparent)]
    Registration(#[from] RegistrationError),

    /// Host runtime failure
    #[error(transparent)]
    #[throwable(transparent)]
    Runtime(#[from] RuntimeError),

    /// A host exception, thrown by native code or caught on its way back
    #[error(transparent)]
    #[throwable(transparent)]
    Throw(#[from] Exception),

    /// Caught panic
    #[error(transparent)]
    #[throwable(transparent)]
    InternalFault(#[from] InternalFault),

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Throw any throwable as a host exception.
    pub fn throw(t: impl Throwable) -> Self {
        Error::Throw(Exception::from_throwable(&t))
    }

    /// Wrap a free-form message as an `ErrorException`.
    pub fn other(message: impl fmt::Display) -> Self {
        Error::Other(anyhow::anyhow!("{message}"))
    }

    /// The host exception this error is thrown as.
    pub fn to_exception(&self) -> Exception {
        match self {
            Error::Throw(e) => e.clone(),
            other => Exception::from_throwable(other),
        }
    }

    /// Consume the error into its host exception.
    pub fn into_exception(self) -> Exception {
        match self {
            Error::Throw(e) => e,
            other => Exception::from_throwable(&other),
        }
    }
}

impl From<Infallible> for Error {
    fn from(e: Infallible) -> Self {
        match e {}
    }
}

/// Result type alias for hostbind operations
pub type Result<T> = std::result::Result<T, Error>;
