//! Callable values: named functions, bound methods and native closures

use std::fmt;
use std::sync::Arc;

use super::Value;
use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::runtime::Runtime;

/// Type alias for native closure bodies
pub type ClosureFn = Arc<dyn Fn(&mut Runtime, &[Value]) -> Result<Value> + Send + Sync>;

/// A native closure the host can call.
///
/// Closures skip the binder: they receive raw arguments and run inside
/// the same call frame and fault boundary as registered functions.
#[derive(Clone)]
pub struct Closure {
    /// Name used in diagnostics
    pub name: Arc<str>,

    /// The closure body
    pub func: ClosureFn,
}

impl Closure {
    /// Wrap a native closure.
    pub fn new<F, R, E>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&mut Runtime, &[Value]) -> std::result::Result<R, E> + Send + Sync + 'static,
        R: Into<Value>,
        E: Into<Error>,
    {
        Closure {
            name: name.into(),
            func: Arc::new(move |rt: &mut Runtime, args: &[Value]| {
                f(rt, args).map(Into::into).map_err(Into::into)
            }),
        }
    }
}

/// Something the host can invoke.
#[derive(Clone)]
pub enum Callable {
    /// Global function by name
    Function(String),

    /// Instance method bound to an object
    Method {
        /// Receiver
        object: ObjectRef,
        /// Method name
        method: String,
    },

    /// Static method
    StaticMethod {
        /// Class name
        class: String,
        /// Method name
        method: String,
    },

    /// Native closure
    Closure(Closure),
}

impl Callable {
    /// Callable for a global function.
    pub fn function(name: impl Into<String>) -> Self {
        Callable::Function(name.into())
    }

    /// Callable for a bound method.
    pub fn method(object: ObjectRef, method: impl Into<String>) -> Self {
        Callable::Method {
            object,
            method: method.into(),
        }
    }

    /// Callable for a static method.
    pub fn static_method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Callable::StaticMethod {
            class: class.into(),
            method: method.into(),
        }
    }

    /// Callable wrapping a native closure.
    pub fn closure<F, R, E>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(&mut Runtime, &[Value]) -> std::result::Result<R, E> + Send + Sync + 'static,
        R: Into<Value>,
        E: Into<Error>,
    {
        Callable::Closure(Closure::new(name, f))
    }

    /// Name for diagnostics: `f`, `Class::m` or `{closure}`-style names.
    pub fn name(&self) -> String {
        match self {
            Callable::Function(name) => name.clone(),
            Callable::Method { method, .. } => method.clone(),
            Callable::StaticMethod { class, method } => format!("{class}::{method}"),
            Callable::Closure(c) => c.name.to_string(),
        }
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::Function(a), Callable::Function(b)) => a.eq_ignore_ascii_case(b),
            (
                Callable::Method {
                    object: o1,
                    method: m1,
                },
                Callable::Method {
                    object: o2,
                    method: m2,
                },
            ) => o1 == o2 && m1.eq_ignore_ascii_case(m2),
            (
                Callable::StaticMethod {
                    class: c1,
                    method: m1,
                },
                Callable::StaticMethod {
                    class: c2,
                    method: m2,
                },
            ) => c1.eq_ignore_ascii_case(c2) && m1.eq_ignore_ascii_case(m2),
            (Callable::Closure(a), Callable::Closure(b)) => Arc::ptr_eq(&a.func, &b.func),
            _ => false,
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Function(name) => write!(f, "<fn {name}>"),
            Callable::Method { object, method } => write!(f, "<method {object}->{method}>"),
            Callable::StaticMethod { class, method } => write!(f, "<method {class}::{method}>"),
            Callable::Closure(c) => write!(f, "<closure {}>", c.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_identity() {
        let a = Callable::closure("inc", |_, args| Ok::<_, Error>(args.len() as i64));
        let b = a.clone();
        let c = Callable::closure("inc", |_, args| Ok::<_, Error>(args.len() as i64));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_function_names_case_insensitive() {
        assert_eq!(Callable::function("StrLen"), Callable::function("strlen"));
        assert_eq!(Callable::static_method("A", "make").name(), "A::make");
    }
}
