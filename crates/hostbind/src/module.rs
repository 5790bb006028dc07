//! Module declaration and startup

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::class::materialize::materialize;
use crate::class::{builtins, ClassDef, ClassEntry, ClassSpec, ClassTable, InterfaceSpec};
use crate::config::EngineConfig;
use crate::constants::ConstantTable;
use crate::enums::{CaseEntry, EnumInfo, EnumSpec};
use crate::error::{Error, RegistrationError, Result};
use crate::exception::ExceptionSpec;
use crate::function::{Arguments, FunctionSpec};
use crate::ini::{IniEntry, IniTable, IntoIniValue, Policy};
use crate::registry::{CaseSlot, Hooks, Registry, StaticSlots};
use crate::runtime::Runtime;
use crate::value::Value;

enum Declaration {
    Class(ClassDef),
    Enum(EnumSpec),
}

/// An extension module under construction.
///
/// Declarations are validated and frozen by [`startup`](Self::startup), in
/// the order they were added: a parent class must be added before its
/// subclasses.
pub struct Module {
    name: String,
    version: String,
    author: String,
    infos: IndexMap<String, String>,
    functions: Vec<FunctionSpec>,
    declarations: Vec<Declaration>,
    constants: Vec<(String, Value)>,
    ini: Vec<IniEntry>,
    hooks: Hooks,
    config: EngineConfig,
}

impl Module {
    /// Start declaring a module.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            author: author.into(),
            infos: IndexMap::new(),
            functions: Vec::new(),
            declarations: Vec::new(),
            constants: Vec::new(),
            ini: Vec::new(),
            hooks: Hooks::default(),
            config: EngineConfig::default(),
        }
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Use a custom engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a row to the module info table.
    pub fn add_info(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.infos.insert(key.into(), value.into());
        self
    }

    /// Declare a function.
    pub fn add_function<F, R, E>(&mut self, name: impl Into<String>, handler: F) -> &mut FunctionSpec
    where
        F: Fn(&mut Runtime, &mut Arguments) -> std::result::Result<R, E> + Send + Sync + 'static,
        R: Into<Value>,
        E: Into<Error>,
    {
        self.functions.push(FunctionSpec::new(name, handler));
        let last = self.functions.len() - 1;
        &mut self.functions[last]
    }

    /// Declare a class.
    pub fn add_class<T>(&mut self, class: ClassSpec<T>) -> &mut Self {
        self.declarations.push(Declaration::Class(class.def));
        self
    }

    /// Declare an interface.
    pub fn add_interface(&mut self, interface: InterfaceSpec) -> &mut Self {
        self.declarations.push(Declaration::Class(interface.def));
        self
    }

    /// Declare an enum.
    pub fn add_enum(&mut self, spec: EnumSpec) -> &mut Self {
        self.declarations.push(Declaration::Enum(spec));
        self
    }

    /// Declare an exception class.
    pub fn add_exception(&mut self, spec: ExceptionSpec) -> &mut Self {
        self.declarations.push(Declaration::Class(spec.into_def()));
        self
    }

    /// Declare a module constant.
    pub fn add_constant(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.constants.push((name.into(), value.into()));
        self
    }

    /// Declare an ini entry.
    pub fn add_ini(
        &mut self,
        name: impl Into<String>,
        default: impl IntoIniValue,
        policy: Policy,
    ) -> &mut Self {
        self.ini.push(IniEntry::new(name, default, policy));
        self
    }

    /// Run once after registration.
    pub fn on_module_init(&mut self, f: impl Fn() + Send + Sync + 'static) -> &mut Self {
        self.hooks.module_init = Some(Arc::new(f));
        self
    }

    /// Run once by [`Registry::shutdown`].
    pub fn on_module_shutdown(&mut self, f: impl Fn() + Send + Sync + 'static) -> &mut Self {
        self.hooks.module_shutdown = Some(Arc::new(f));
        self
    }

    /// Run at the start of every request.
    pub fn on_request_init(
        &mut self,
        f: impl Fn(&mut Runtime) -> Result<()> + Send + Sync + 'static,
    ) -> &mut Self {
        self.hooks.request_init = Some(Arc::new(f));
        self
    }

    /// Run at the end of every request.
    pub fn on_request_shutdown(
        &mut self,
        f: impl Fn(&mut Runtime) -> Result<()> + Send + Sync + 'static,
    ) -> &mut Self {
        self.hooks.request_shutdown = Some(Arc::new(f));
        self
    }

    /// Validate every declaration and freeze the module into a registry.
    pub fn startup(self) -> Result<Arc<Registry>> {
        let Module {
            name,
            version,
            author,
            infos,
            functions,
            declarations,
            constants,
            ini,
            hooks,
            config,
        } = self;

        let mut classes = ClassTable::new();
        let statics = StaticSlots::default();
        let mut next_slot: u32 = 0;

        for def in builtins::interfaces().into_iter().chain(builtins::classes()) {
            register_class(&mut classes, &statics, def)?;
        }

        let mut function_table = IndexMap::new();
        for function in functions {
            function.signature.validate()?;
            let key = function.name().to_ascii_lowercase();
            if function_table.contains_key(&key) {
                return Err(RegistrationError::new(format!(
                    "Cannot redeclare function {}()",
                    function.name()
                ))
                .into());
            }
            function_table.insert(key, function);
        }

        for declaration in declarations {
            match declaration {
                Declaration::Class(def) => {
                    register_class(&mut classes, &statics, def)?;
                }
                Declaration::Enum(spec) => {
                    let (def, backing, declared) = spec.into_parts()?;
                    check_unique(&classes, &def.name)?;
                    let mut entry = materialize(def, &|n: &str| classes.get(n).cloned(), false)?;
                    let mut info = EnumInfo {
                        backing,
                        cases: IndexMap::new(),
                    };
                    for (case, value) in declared {
                        let slot = next_slot;
                        next_slot = next_slot
                            .checked_add(1)
                            .ok_or_else(|| RegistrationError::new("Too many enum cases"))?;
                        info.cases.insert(
                            case.clone(),
                            CaseEntry {
                                name: case,
                                value,
                                slot,
                            },
                        );
                    }
                    entry.enum_info = Some(info);
                    classes.insert(Arc::new(entry));
                }
            }
        }

        // Case slots in allocation order.
        let mut case_slots = Vec::with_capacity(next_slot as usize);
        for class in classes.values() {
            if let Some(info) = class.enum_info() {
                for case in info.cases.values() {
                    case_slots.push((
                        case.slot,
                        CaseSlot {
                            class: class.clone(),
                            name: case.name.clone(),
                            value: case.value.clone(),
                        },
                    ));
                }
            }
        }
        case_slots.sort_by_key(|(slot, _)| *slot);

        let mut constant_table = ConstantTable::default();
        for (constant, value) in constants {
            constant_table.insert(constant, value)?;
        }

        let mut ini_table = IniTable::default();
        for entry in ini {
            let entry_name = entry.name().to_string();
            if !ini_table.insert(entry) {
                return Err(RegistrationError::new(format!(
                    "ini entry {entry_name} is already registered"
                ))
                .into());
            }
        }

        tracing::debug!(
            module = %name,
            functions = function_table.len(),
            classes = classes.len(),
            "module started"
        );

        let registry = Registry {
            name,
            version,
            author,
            infos,
            functions: function_table,
            classes,
            constants: constant_table,
            ini: ini_table,
            statics,
            cases: case_slots.into_iter().map(|(_, c)| c).collect(),
            hooks,
            config,
            shut_down: AtomicBool::new(false),
        };
        if let Some(init) = &registry.hooks.module_init {
            init();
        }
        Ok(Arc::new(registry))
    }
}

fn check_unique(classes: &ClassTable, name: &str) -> Result<()> {
    if classes.contains(name) {
        return Err(RegistrationError::new(format!(
            "Cannot declare class {name}, because the name is already in use"
        ))
        .into());
    }
    Ok(())
}

/// Materialize a class into the table and seed its static slots.
fn register_class(classes: &mut ClassTable, statics: &StaticSlots, def: ClassDef) -> Result<()> {
    check_unique(classes, &def.name)?;
    let entry = materialize(def, &|n: &str| classes.get(n).cloned(), false)?;
    seed_statics(&entry, |class, property, value| {
        statics.set(class, property, value);
    });
    classes.insert(Arc::new(entry));
    Ok(())
}

/// Hand every static declared by `entry` itself to `store`.
pub(crate) fn seed_statics(entry: &ClassEntry, mut store: impl FnMut(&str, &str, Value)) {
    for property in entry.static_properties().values() {
        if property.declaring_class() == entry.name() {
            store(entry.name(), property.name(), property.default_value().clone());
        }
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("author", &self.author)
            .field("functions", &self.functions)
            .field("declarations", &self.declarations.len())
            .finish_non_exhaustive()
    }
}
