//! The frozen, process-wide registry
//!
//! A [`Registry`] is built once by [`Module::startup`](crate::Module::startup)
//! and shared by every worker's [`Runtime`] behind an `Arc`. Everything in
//! it is immutable except the static property slots, which live in a
//! concurrent map because workers may run on different threads.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;

use crate::class::{ClassEntry, ClassTable};
use crate::config::EngineConfig;
use crate::constants::ConstantTable;
use crate::error::Result;
use crate::function::FunctionSpec;
use crate::ini::{IniEntry, IniTable};
use crate::runtime::Runtime;
use crate::value::Value;

pub(crate) type ModuleHook = Arc<dyn Fn() + Send + Sync>;
pub(crate) type RequestHook = Arc<dyn Fn(&mut Runtime) -> Result<()> + Send + Sync>;

/// Lifecycle hooks declared on the module.
#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) module_init: Option<ModuleHook>,
    pub(crate) module_shutdown: Option<ModuleHook>,
    pub(crate) request_init: Option<RequestHook>,
    pub(crate) request_shutdown: Option<RequestHook>,
}

/// Static property slots shared by every worker.
///
/// Keyed by declaring class (lowercase) and property name, so a subclass
/// that does not redeclare a static shares its parent's slot.
#[derive(Debug, Default)]
pub(crate) struct StaticSlots {
    slots: DashMap<(String, String), Value>,
}

impl StaticSlots {
    fn key(class: &str, name: &str) -> (String, String) {
        (class.to_ascii_lowercase(), name.to_string())
    }

    pub(crate) fn get(&self, class: &str, name: &str) -> Option<Value> {
        self.slots
            .get(&Self::key(class, name))
            .map(|v| v.value().clone())
    }

    /// Store a value and return the previous one.
    pub(crate) fn set(&self, class: &str, name: &str, value: Value) -> Option<Value> {
        self.slots.insert(Self::key(class, name), value)
    }
}

/// A pinned enum case object, in allocation order.
#[derive(Debug, Clone)]
pub(crate) struct CaseSlot {
    pub(crate) class: Arc<ClassEntry>,
    pub(crate) name: String,
    pub(crate) value: Option<Value>,
}

/// Everything a module registered, frozen.
pub struct Registry {
    pub(crate) name: String,
    pub(crate) version: String,
    pub(crate) author: String,
    pub(crate) infos: IndexMap<String, String>,
    pub(crate) functions: IndexMap<String, FunctionSpec>,
    pub(crate) classes: ClassTable,
    pub(crate) constants: ConstantTable,
    pub(crate) ini: IniTable,
    pub(crate) statics: StaticSlots,
    pub(crate) cases: Vec<CaseSlot>,
    pub(crate) hooks: Hooks,
    pub(crate) config: EngineConfig,
    pub(crate) shut_down: AtomicBool,
}

impl Registry {
    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Module author
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Extra module info rows, as shown by the host's module listing
    pub fn infos(&self) -> &IndexMap<String, String> {
        &self.infos
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Registered function, case-insensitively.
    pub fn function(&self, name: &str) -> Option<&FunctionSpec> {
        self.functions.get(&name.to_ascii_lowercase())
    }

    /// Registered functions in registration order
    pub fn functions(&self) -> impl Iterator<Item = &FunctionSpec> {
        self.functions.values()
    }

    /// Registered class, interface or enum, case-insensitively.
    pub fn class(&self, name: &str) -> Option<&Arc<ClassEntry>> {
        self.classes.get(name)
    }

    /// Every class entry, built-ins first
    pub fn classes(&self) -> impl Iterator<Item = &Arc<ClassEntry>> {
        self.classes.values()
    }

    /// Registered ini entries
    pub fn ini_entries(&self) -> impl Iterator<Item = &IniEntry> {
        self.ini.iter()
    }

    /// Registered module constants
    pub fn constants_iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.constants.iter()
    }

    pub(crate) fn constants(&self) -> &ConstantTable {
        &self.constants
    }

    pub(crate) fn ini(&self) -> &IniTable {
        &self.ini
    }

    pub(crate) fn statics(&self) -> &StaticSlots {
        &self.statics
    }

    /// Run the module shutdown hook. Only the first call has an effect.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::debug!(module = %self.name, "module shutdown");
        if let Some(hook) = &self.hooks.module_shutdown {
            hook();
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has run
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("functions", &self.functions.len())
            .field("classes", &self.classes.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_slots_share_by_declaring_class() {
        let slots = StaticSlots::default();
        assert_eq!(slots.set("Foo", "count", Value::Int(1)), None);
        assert_eq!(slots.get("foo", "count"), Some(Value::Int(1)));
        assert_eq!(slots.set("FOO", "count", Value::Int(2)), Some(Value::Int(1)));
        assert_eq!(slots.get("Foo", "Count"), None);
    }
}
