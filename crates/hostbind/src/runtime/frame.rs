//! Call frames and scope guards

use std::sync::Arc;

use super::Runtime;
use crate::class::ClassEntry;
use crate::error::{Result, RuntimeError, RuntimeErrorKind};
use crate::object::ObjectRef;

/// One entry on the host call stack.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Function or `Class::method` being run
    pub function: String,
    /// Class whose private and protected members are visible
    pub scope: Option<Arc<ClassEntry>>,
    /// Receiver of an instance method
    pub this: Option<ObjectRef>,
}

impl Runtime {
    // ═══════════════════════════════════════════════════════════════════
    // Call Depth Tracking (Stack Overflow Protection)
    // ═══════════════════════════════════════════════════════════════════

    /// Push a frame. Fails once the configured nesting level is reached.
    pub(crate) fn enter_call(&mut self, frame: Frame) -> Result<()> {
        let max = self.registry.config.max_call_depth;
        if self.frames.len() >= max {
            return Err(RuntimeError::new(
                RuntimeErrorKind::StackOverflow,
                format!("Maximum function nesting level of '{max}' reached, aborting!"),
            )
            .into());
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the innermost frame.
    pub(crate) fn exit_call(&mut self) {
        self.frames.pop();
    }

    /// Current call depth.
    pub fn call_depth(&self) -> usize {
        self.frames.len()
    }

    /// The innermost frame, if any.
    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Class scope of the innermost frame; `None` at global scope.
    pub fn scope(&self) -> Option<Arc<ClassEntry>> {
        self.frames.last().and_then(|f| f.scope.clone())
    }

    /// Receiver of the innermost frame
    pub fn this(&self) -> Option<ObjectRef> {
        self.frames.last().and_then(|f| f.this)
    }

    /// Run host code as if from inside `class`, until the guard drops.
    pub fn enter_scope(&mut self, class: &str) -> Result<ScopeGuard<'_>> {
        let scope = self.class(class)?;
        self.enter_call(Frame {
            function: format!("{}::{{closure}}", scope.name()),
            scope: Some(scope),
            this: None,
        })?;
        Ok(ScopeGuard { rt: self })
    }
}

/// RAII guard that pops a class-scope frame when dropped.
///
/// # Example
///
/// ```
/// use hostbind::{ClassSpec, Module, Runtime, Value, Visibility};
///
/// let mut module = Module::new("demo", "0.1.0", "hostbind");
/// let mut secret = ClassSpec::new("Secret");
/// secret.add_property("pin", Visibility::Private, 1234);
/// module.add_class(secret);
///
/// let mut rt = Runtime::new(module.startup().unwrap());
/// let s = rt.new_object("Secret", &[]).unwrap();
/// assert!(rt.get_property(s, "pin").is_err());
/// {
///     let mut inside = rt.enter_scope("Secret").unwrap();
///     assert_eq!(inside.get_property(s, "pin").unwrap(), Value::from(1234));
/// }
/// assert_eq!(rt.call_depth(), 0);
/// ```
pub struct ScopeGuard<'a> {
    rt: &'a mut Runtime,
}

impl<'a> Drop for ScopeGuard<'a> {
    fn drop(&mut self) {
        self.rt.exit_call();
    }
}

impl<'a> std::ops::Deref for ScopeGuard<'a> {
    type Target = Runtime;

    fn deref(&self) -> &Self::Target {
        self.rt
    }
}

impl<'a> std::ops::DerefMut for ScopeGuard<'a> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.rt
    }
}
