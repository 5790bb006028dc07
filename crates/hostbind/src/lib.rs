//! # hostbind
//!
//! Value marshalling and object-model projection for native extensions of a
//! dynamically typed, reference-counted host runtime.
//!
//! Extensions declare functions, classes, interfaces, enums, exceptions and
//! ini entries on a [`Module`]. [`Module::startup`] validates and freezes the
//! declarations into a shared [`Registry`]; each worker then drives calls
//! through its own [`Runtime`], which binds arguments, projects native state
//! onto host objects and turns every failure into a host exception.
//!
//! ## Architecture
//!
//! - **ValueModel** ([`value`]): tagged union of every host value
//! - **ArgumentBinder** ([`function::bind`]): arity, nullability and coercion
//! - **ClassRegistry** ([`class`]): class and interface materialization
//! - **ObjectProjection** ([`object`], [`Runtime`]): clone, properties,
//!   iteration, array access, string casts
//! - **EnumRegistry** ([`enums`]): pure and backed enum singletons
//! - **ExceptionBridge** ([`error`], [`exception`]): error taxonomy and throws
//! - **IniRegistry** ([`ini`]): typed configuration entries
//!
//! ## Example
//!
//! ```
//! use hostbind::{DataType, Module, Parameter, Runtime, Value};
//!
//! let mut module = Module::new("demo", "0.1.0", "hostbind");
//! module
//!     .add_function("say_hello", |_, args| {
//!         let name = args.extract::<String>(0)?;
//!         Ok::<_, hostbind::Error>(format!("Hello, {name}!"))
//!     })
//!     .argument(Parameter::new("name").typed(DataType::String));
//!
//! let registry = module.startup().unwrap();
//! let mut rt = Runtime::new(registry);
//! let out = rt.call_function("say_hello", &[Value::from("world")]).unwrap();
//! assert_eq!(out, Value::from("Hello, world!"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate self as hostbind;

pub mod class;
pub mod config;
pub mod constants;
pub mod enums;
pub mod error;
pub mod exception;
pub mod function;
pub mod ini;
pub mod log;
pub mod module;
pub mod object;
pub mod reflection;
pub mod registry;
pub mod runtime;
pub mod value;

// Re-export main types
pub use class::{
    Capabilities, ClassEntry, ClassKind, ClassSpec, InterfaceSpec, MethodEntry, MethodSpec,
    PropertyEntry, PropertySpec, Visibility,
};
pub use config::{DefaultValueMode, EngineConfig};
pub use enums::{BackingKind, EnumCase, EnumSpec};
pub use error::{
    ArityError, CaseLookup, CaseNotFoundError, CloneNotSupportedError, ConversionError, Error,
    InterfaceContractError, InternalFault, PropertyAccessError, RegistrationError, Result,
    RuntimeError, RuntimeErrorKind, Throwable, TypeMismatchError,
};
pub use exception::{Exception, ExceptionSpec};
pub use function::{Arguments, DataType, FunctionSpec, Parameter, ReturnType, Signature};
pub use hostbind_macros::Throwable;
pub use ini::{FromIniValue, IniEntry, IntoIniValue, Policy};
pub use log::{Diagnostic, Level};
pub use module::Module;
pub use object::{HostObject, NativeArrayAccess, NativeIterator, ObjectHeap, ObjectRef};
pub use reflection::{
    ReflectionClass, ReflectionEnum, ReflectionFunction, ReflectionMethod, ReflectionParameter,
    ReflectionProperty, ReflectionType,
};
pub use registry::Registry;
pub use runtime::{Frame, Runtime, ScopeGuard};
pub use value::{
    Array, ArrayKey, ByteString, Callable, Closure, FromValue, Kind, Reference, Value,
};

/// hostbind version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Wrap a value in an infallible handler result.
///
/// Saves naming an error type in closures that never fail.
pub fn ok<T>(value: T) -> std::result::Result<T, std::convert::Infallible> {
    Ok(value)
}
