//! Function and method invocation
//!
//! Every call goes through the same boundary: bind arguments, push a
//! frame, run the handler inside `catch_unwind`, pop the frame, then check
//! the result against the declared return type.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::{Frame, Runtime};
use crate::class::{ClassEntry, MethodEntry, Visibility};
use crate::error::{Error, InternalFault, Result, RuntimeError, RuntimeErrorKind, TypeMismatchError};
use crate::function::{bind, check_return, Handler, Signature};
use crate::object::ObjectRef;
use crate::value::{Callable, Value};

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

fn named_owned(named: &[(&str, Value)]) -> Vec<(String, Value)> {
    named
        .iter()
        .map(|(n, v)| ((*n).to_string(), v.clone()))
        .collect()
}

fn undefined_method(class: &str, method: &str) -> Error {
    RuntimeError::new(
        RuntimeErrorKind::UndefinedMethod,
        format!("Call to undefined method {class}::{method}()"),
    )
    .into()
}

/// One resolved call target, borrowed from a function spec or method entry.
struct Target<'a> {
    display: String,
    signature: &'a Signature,
    handler: &'a Handler,
    this: Option<ObjectRef>,
    scope: Option<Arc<ClassEntry>>,
}

impl Runtime {
    /// Run `body` inside a new frame, turning panics into [`InternalFault`].
    fn guarded<F>(&mut self, frame: Frame, body: F) -> Result<Value>
    where
        F: FnOnce(&mut Runtime) -> Result<Value>,
    {
        let depth = self.frames.len();
        let function = frame.function.clone();
        self.enter_call(frame)?;
        tracing::trace!(function = %function, depth = depth + 1, "enter");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(self)));
        // a panic may unwind past inner frames
        self.frames.truncate(depth);
        tracing::trace!(function = %function, "exit");
        match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(function = %function, message = %message, "handler panicked");
                Err(InternalFault { function, message }.into())
            }
        }
    }

    fn invoke(
        &mut self,
        target: Target<'_>,
        positional: Vec<Value>,
        named: Vec<(String, Value)>,
    ) -> Result<Value> {
        let Target {
            display,
            signature,
            handler,
            this,
            scope,
        } = target;
        let mut args = bind(&*self, &display, signature, positional, named)?;
        let frame = Frame {
            function: display.clone(),
            scope,
            this,
        };
        let value = self.guarded(frame, |rt: &mut Runtime| handler(rt, this, &mut args))?;
        match signature.return_type() {
            Some(declared) if self.registry.config.check_return_types => {
                check_return(&*self, &display, declared, value)
            }
            _ => Ok(value),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════

    /// Call a function with positional arguments.
    pub fn call_function(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        self.call_function_named(name, args, &[])
    }

    /// Call a function with positional and named arguments.
    pub fn call_function_named(
        &mut self,
        name: &str,
        positional: &[Value],
        named: &[(&str, Value)],
    ) -> Result<Value> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        let registry = self.registry.clone();
        let local = self.functions.get(&name.to_ascii_lowercase()).cloned();
        let spec = match registry.function(name).or(local.as_deref()) {
            Some(spec) => spec,
            None => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::UndefinedFunction,
                    format!("Call to undefined function {name}()"),
                )
                .into())
            }
        };
        let target = Target {
            display: spec.name().to_string(),
            signature: &spec.signature,
            handler: &spec.handler,
            this: None,
            scope: None,
        };
        self.invoke(target, positional.to_vec(), named_owned(named))
    }

    /// Call anything callable: a [`Callable`], a function name, a
    /// `"Class::method"` string or a `[object_or_class, method]` pair.
    pub fn call(&mut self, callable: &Value, args: &[Value]) -> Result<Value> {
        match callable.unref() {
            Value::Callable(c) => self.call_callable(&c, args),
            Value::String(s) => {
                let name = s.to_string_lossy();
                match name.split_once("::") {
                    Some((class, method)) => self.call_static(class, method, args),
                    None => self.call_function(&name, args),
                }
            }
            Value::Array(pair) if pair.len() == 2 => {
                let method = pair.get(1).map(Value::to_string).unwrap_or_default();
                match pair.get(0).map(Value::unref) {
                    Some(Value::Object(object)) => self.call_method(object, &method, args),
                    Some(Value::String(class)) => {
                        self.call_static(&class.to_string_lossy(), &method, args)
                    }
                    _ => Err(TypeMismatchError::argument("callable", "array").into()),
                }
            }
            other => Err(TypeMismatchError::argument("callable", other.type_name()).into()),
        }
    }

    /// Invoke a [`Callable`].
    pub fn call_callable(&mut self, callable: &Callable, args: &[Value]) -> Result<Value> {
        match callable {
            Callable::Function(name) => self.call_function(name, args),
            Callable::Method { object, method } => self.call_method(*object, method, args),
            Callable::StaticMethod { class, method } => self.call_static(class, method, args),
            Callable::Closure(closure) => {
                let func = closure.func.clone();
                let frame = Frame {
                    function: closure.name.to_string(),
                    scope: self.scope(),
                    this: self.this(),
                };
                self.guarded(frame, |rt: &mut Runtime| func(rt, args))
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Methods
    // ═══════════════════════════════════════════════════════════════════

    /// Call an instance method.
    pub fn call_method(&mut self, object: ObjectRef, method: &str, args: &[Value]) -> Result<Value> {
        self.call_method_named(object, method, args, &[])
    }

    /// Call an instance method with positional and named arguments.
    pub fn call_method_named(
        &mut self,
        object: ObjectRef,
        method: &str,
        positional: &[Value],
        named: &[(&str, Value)],
    ) -> Result<Value> {
        let class = self.class_of(object)?;
        let entry = class
            .method(method)
            .ok_or_else(|| undefined_method(class.name(), method))?;
        self.check_method_access(&class, entry)?;
        let this = if entry.is_static { None } else { Some(object) };
        let target = self.method_target(entry, this)?;
        self.invoke(target, positional.to_vec(), named_owned(named))
    }

    /// Call a static method.
    pub fn call_static(&mut self, class: &str, method: &str, args: &[Value]) -> Result<Value> {
        self.call_static_named(class, method, args, &[])
    }

    /// Call a static method with positional and named arguments.
    pub fn call_static_named(
        &mut self,
        class: &str,
        method: &str,
        positional: &[Value],
        named: &[(&str, Value)],
    ) -> Result<Value> {
        let class = self.class(class)?;
        let entry = class
            .method(method)
            .ok_or_else(|| undefined_method(class.name(), method))?;
        if !entry.is_static {
            return Err(RuntimeError::new(
                RuntimeErrorKind::StaticCall,
                format!(
                    "Non-static method {}::{}() cannot be called statically",
                    entry.class, entry.name
                ),
            )
            .into());
        }
        self.check_method_access(&class, entry)?;
        let target = self.method_target(entry, None)?;
        self.invoke(target, positional.to_vec(), named_owned(named))
    }

    fn method_target<'a>(
        &self,
        entry: &'a MethodEntry,
        this: Option<ObjectRef>,
    ) -> Result<Target<'a>> {
        let handler = entry.handler.as_ref().ok_or_else(|| -> Error {
            RuntimeError::new(
                RuntimeErrorKind::AbstractCall,
                format!("Cannot call abstract method {}::{}()", entry.class, entry.name),
            )
            .into()
        })?;
        Ok(Target {
            display: format!("{}::{}", entry.class, entry.name),
            signature: &entry.signature,
            handler,
            this,
            scope: self.lookup_class(&entry.class),
        })
    }

    fn check_method_access(&self, class: &ClassEntry, entry: &MethodEntry) -> Result<()> {
        let scope = self.scope();
        if class.permits(&entry.class, entry.visibility, scope.as_deref()) {
            return Ok(());
        }
        let from = match &scope {
            Some(s) => format!("scope {}", s.name()),
            None => "global scope".to_string(),
        };
        let visibility = match entry.visibility {
            Visibility::Private => "private",
            _ => "protected",
        };
        Err(RuntimeError::new(
            RuntimeErrorKind::MethodVisibility,
            format!(
                "Call to {visibility} method {}::{}() from {from}",
                entry.class, entry.name
            ),
        )
        .into())
    }
}
