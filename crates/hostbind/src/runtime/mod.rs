//! Per-worker host projection
//!
//! A [`Runtime`] is what the host sees of the engine during a request. It
//! owns the worker's object heap, native state table, call frames,
//! host-declared classes and functions, and ini overrides. Everything
//! module-level is read from the shared [`Registry`].

mod call;
mod frame;
mod objects;
mod statics;

pub use frame::{Frame, ScopeGuard};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::class::materialize::materialize;
use crate::class::{ClassEntry, ClassSpec, ClassTable, InterfaceSpec};
use crate::config::{DefaultValueMode, EngineConfig};
use crate::error::{Result, RuntimeError, RuntimeErrorKind};
use crate::function::{FunctionSpec, TypeOracle};
use crate::log::Diagnostic;
use crate::module::seed_statics;
use crate::object::{HostObject, ObjectHeap, ObjectRef, StateTable};
use crate::registry::Registry;
use crate::value::Value;

/// A worker's view of the host runtime.
///
/// # Example
///
/// ```
/// use hostbind::{ClassSpec, Module, Runtime, Value, Visibility};
///
/// let mut module = Module::new("demo", "0.1.0", "hostbind");
/// let mut point = ClassSpec::new("Point");
/// point.add_property("x", Visibility::Public, 0);
/// module.add_class(point);
///
/// let mut rt = Runtime::new(module.startup().unwrap());
/// let p = rt.new_object("Point", &[]).unwrap();
/// rt.set_property(p, "x", Value::from(3)).unwrap();
/// assert_eq!(rt.get_property(p, "x").unwrap(), Value::from(3));
/// ```
pub struct Runtime {
    pub(crate) registry: Arc<Registry>,
    pub(crate) heap: ObjectHeap,
    pub(crate) states: StateTable,
    pub(crate) classes: ClassTable,
    pub(crate) functions: IndexMap<String, Arc<FunctionSpec>>,
    pub(crate) statics: HashMap<(String, String), Value>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) ini: IndexMap<String, String>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) output: Vec<u8>,
}

impl Runtime {
    /// Create a runtime over a started registry.
    ///
    /// Enum case singletons are allocated first, in registration order, so
    /// their handles are identical in every worker.
    pub fn new(registry: Arc<Registry>) -> Self {
        let mut heap = ObjectHeap::new();
        for case in &registry.cases {
            let mut properties = IndexMap::new();
            properties.insert("name".to_string(), Value::from(case.name.as_str()));
            if let Some(value) = &case.value {
                properties.insert("value".to_string(), value.clone());
            }
            let mut object = HostObject::new(case.class.clone(), properties);
            object.pinned = true;
            heap.alloc(object);
        }
        tracing::debug!(
            module = %registry.name,
            cases = registry.cases.len(),
            "runtime created"
        );

        Self {
            registry,
            heap,
            states: StateTable::new(),
            classes: ClassTable::new(),
            functions: IndexMap::new(),
            statics: HashMap::new(),
            frames: Vec::new(),
            ini: IndexMap::new(),
            diagnostics: Vec::new(),
            output: Vec::new(),
        }
    }

    /// The shared registry
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.registry.config
    }

    /// The object heap
    pub fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    // ═══════════════════════════════════════════════════════════════════
    // Class Lookup
    // ═══════════════════════════════════════════════════════════════════

    /// Class, interface or enum by name: registry first, then host-declared.
    pub(crate) fn lookup_class(&self, name: &str) -> Option<Arc<ClassEntry>> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        self.registry
            .class(name)
            .or_else(|| self.classes.get(name))
            .cloned()
    }

    /// Class by name, case-insensitively.
    pub fn class(&self, name: &str) -> Result<Arc<ClassEntry>> {
        self.lookup_class(name)
            .ok_or_else(|| RuntimeError::class_not_found(name).into())
    }

    /// Whether a class, interface or enum of that name exists
    pub fn class_exists(&self, name: &str) -> bool {
        self.lookup_class(name).is_some()
    }

    /// Class of a live object.
    pub fn class_of(&self, object: ObjectRef) -> Result<Arc<ClassEntry>> {
        Ok(self.object(object)?.class.clone())
    }

    /// Host `instanceof`: whether the object's class is, extends or
    /// implements `class`. Dead handles are instances of nothing.
    pub fn instance_of(&self, object: ObjectRef, class: &str) -> bool {
        self.heap
            .get(object)
            .is_some_and(|o| o.class.is_subclass_of(class.strip_prefix('\\').unwrap_or(class)))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Host Declarations
    // ═══════════════════════════════════════════════════════════════════

    /// Declare a host-language function for the rest of the request.
    pub fn define_function(&mut self, function: FunctionSpec) -> Result<()> {
        function.signature.validate()?;
        let key = function.name().to_ascii_lowercase();
        if self.registry.function(&key).is_some() || self.functions.contains_key(&key) {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Redeclare,
                format!("Cannot redeclare function {}()", function.name()),
            )
            .into());
        }
        tracing::debug!(function = function.name(), "function defined");
        self.functions.insert(key, Arc::new(function));
        Ok(())
    }

    /// Whether a function of that name exists
    pub fn function_exists(&self, name: &str) -> bool {
        let name = name.strip_prefix('\\').unwrap_or(name);
        self.registry.function(name).is_some()
            || self.functions.contains_key(&name.to_ascii_lowercase())
    }

    /// Declare a host-language class for the rest of the request.
    ///
    /// Host classes may extend native classes and implement native
    /// interfaces; they go through the same contract checks as module
    /// classes.
    pub fn declare_class<T>(&mut self, class: ClassSpec<T>) -> Result<Arc<ClassEntry>> {
        self.declare(class.def)
    }

    /// Declare a host-language interface for the rest of the request.
    pub fn declare_interface(&mut self, interface: InterfaceSpec) -> Result<Arc<ClassEntry>> {
        self.declare(interface.def)
    }

    fn declare(&mut self, def: crate::class::ClassDef) -> Result<Arc<ClassEntry>> {
        if self.lookup_class(&def.name).is_some() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Redeclare,
                format!(
                    "Cannot declare class {}, because the name is already in use",
                    def.name
                ),
            )
            .into());
        }
        let entry = materialize(def, &|n: &str| self.lookup_class(n), true)?;
        let mut seeded = Vec::new();
        seed_statics(&entry, |class, property, value| {
            seeded.push((class.to_ascii_lowercase(), property.to_string(), value));
        });
        for (class, property, value) in seeded {
            self.statics.insert((class, property), value);
        }
        let entry = Arc::new(entry);
        self.classes.insert(entry.clone());
        Ok(entry)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Request Lifecycle
    // ═══════════════════════════════════════════════════════════════════

    /// Run the module's request-init hook.
    pub fn request_startup(&mut self) -> Result<()> {
        tracing::debug!(module = %self.registry.name, "request startup");
        match self.registry.hooks.request_init.clone() {
            Some(hook) => hook(self),
            None => Ok(()),
        }
    }

    /// Run the request-shutdown hook, then drop everything request-scoped:
    /// unpinned objects and their native state, host declarations and ini
    /// overrides.
    pub fn request_shutdown(&mut self) -> Result<()> {
        let hook = match self.registry.hooks.request_shutdown.clone() {
            Some(hook) => hook(self),
            None => Ok(()),
        };

        let mut freed = 0usize;
        for object in self.heap.unpinned() {
            if self.heap.free(object).is_some() {
                freed += 1;
            }
            self.states.remove(object);
        }
        self.classes = ClassTable::new();
        self.functions.clear();
        self.statics.clear();
        self.frames.clear();
        self.ini.clear();
        tracing::debug!(module = %self.registry.name, freed, "request shutdown");
        hook
    }
}

impl TypeOracle for Runtime {
    fn class_of(&self, object: ObjectRef) -> Option<String> {
        self.heap.get(object).map(|o| o.class.name.clone())
    }

    fn instance_of(&self, object: ObjectRef, class: &str) -> bool {
        Runtime::instance_of(self, object, class)
    }

    fn is_function(&self, name: &str) -> bool {
        self.function_exists(name)
    }

    fn default_value_mode(&self) -> DefaultValueMode {
        self.registry.config.default_value_mode
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("module", &self.registry.name)
            .field("objects", &self.heap.len())
            .field("states", &self.states.len())
            .field("classes", &self.classes.len())
            .field("functions", &self.functions.len())
            .field("depth", &self.frames.len())
            .finish_non_exhaustive()
    }
}
