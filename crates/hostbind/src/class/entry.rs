//! Materialized, immutable class entries

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::Visibility;
use crate::enums::EnumInfo;
use crate::function::{Handler, Signature};
use crate::object::NativeState;
use crate::value::Value;

/// What a class entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// Ordinary (possibly abstract) class
    Class,
    /// Interface
    Interface,
    /// Enum
    Enum,
}

/// Object-level hooks a class opts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// `clone $obj` is allowed
    pub cloneable: bool,
    /// `foreach` drives native iteration
    pub iterable: bool,
    /// `$obj[...]` dispatches to native state
    pub array_access: bool,
    /// `(string) $obj` calls `__toString`
    pub stringable: bool,
}

impl Capabilities {
    pub(crate) fn merge(self, other: Capabilities) -> Capabilities {
        Capabilities {
            cloneable: self.cloneable || other.cloneable,
            iterable: self.iterable || other.iterable,
            array_access: self.array_access || other.array_access,
            stringable: self.stringable || other.stringable,
        }
    }
}

pub(crate) type StateCtor = Arc<dyn Fn() -> NativeState + Send + Sync>;
pub(crate) type StateCloner = Arc<dyn Fn(&(dyn Any + Send)) -> Option<NativeState> + Send + Sync>;

/// Native state construction and clone hooks.
#[derive(Clone)]
pub(crate) struct StateHooks {
    pub(crate) construct: StateCtor,
    pub(crate) clone: Option<StateCloner>,
    pub(crate) type_name: &'static str,
}

impl fmt::Debug for StateHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHooks")
            .field("type_name", &self.type_name)
            .field("cloneable", &self.clone.is_some())
            .finish()
    }
}

/// A property after inheritance.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyEntry {
    pub(crate) name: String,
    pub(crate) class: String,
    pub(crate) visibility: Visibility,
    pub(crate) default: Value,
    pub(crate) is_static: bool,
    pub(crate) readonly: bool,
}

impl PropertyEntry {
    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring class
    pub fn declaring_class(&self) -> &str {
        &self.class
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Declared default
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Whether the property is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether writes are rejected after initialization
    pub fn is_readonly(&self) -> bool {
        self.readonly
    }
}

/// A method after inheritance.
#[derive(Clone)]
pub struct MethodEntry {
    pub(crate) name: String,
    pub(crate) class: String,
    pub(crate) visibility: Visibility,
    pub(crate) is_static: bool,
    pub(crate) is_abstract: bool,
    pub(crate) is_final: bool,
    pub(crate) signature: Signature,
    pub(crate) handler: Option<Handler>,
}

impl MethodEntry {
    /// Method name as declared
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declaring class
    pub fn declaring_class(&self) -> &str {
        &self.class
    }

    /// Visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the method is static
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Whether the method has no body
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether subclasses may not override it
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Declared signature
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodEntry")
            .field("name", &self.name)
            .field("class", &self.class)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("is_abstract", &self.is_abstract)
            .finish_non_exhaustive()
    }
}

/// A class, interface or enum as the host sees it.
///
/// Entries are built once at startup (or at runtime declaration) and never
/// mutated afterwards. Method keys are lowercase; property and constant
/// names are case-sensitive.
#[derive(Debug)]
pub struct ClassEntry {
    pub(crate) name: String,
    pub(crate) kind: ClassKind,
    pub(crate) is_abstract: bool,
    pub(crate) is_final: bool,
    pub(crate) parent: Option<Arc<ClassEntry>>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) properties: IndexMap<String, PropertyEntry>,
    pub(crate) static_properties: IndexMap<String, PropertyEntry>,
    pub(crate) constants: IndexMap<String, Value>,
    pub(crate) methods: IndexMap<String, MethodEntry>,
    pub(crate) capabilities: Capabilities,
    pub(crate) state: Option<StateHooks>,
    pub(crate) enum_info: Option<EnumInfo>,
    pub(crate) user_defined: bool,
}

impl ClassEntry {
    /// An empty concrete class with no members.
    pub(crate) fn bare(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ClassKind::Class,
            is_abstract: false,
            is_final: false,
            parent: None,
            interfaces: Vec::new(),
            properties: IndexMap::new(),
            static_properties: IndexMap::new(),
            constants: IndexMap::new(),
            methods: IndexMap::new(),
            capabilities: Capabilities::default(),
            state: None,
            enum_info: None,
            user_defined: false,
        }
    }

    /// Class name as declared
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class, interface or enum
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    /// Whether this is an enum
    pub fn is_enum(&self) -> bool {
        self.kind == ClassKind::Enum
    }

    /// Whether the class is abstract
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether the class is final
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    /// Whether the host can instantiate it with `new`
    pub fn is_instantiable(&self) -> bool {
        self.kind == ClassKind::Class && !self.is_abstract
    }

    /// Whether the class was declared by host code rather than an extension
    pub fn is_user_defined(&self) -> bool {
        self.user_defined
    }

    /// Parent class
    pub fn parent(&self) -> Option<&Arc<ClassEntry>> {
        self.parent.as_ref()
    }

    /// Every implemented interface, inherited ones included
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Instance properties in declaration order, inherited first
    pub fn properties(&self) -> &IndexMap<String, PropertyEntry> {
        &self.properties
    }

    /// Instance property by name
    pub fn property(&self, name: &str) -> Option<&PropertyEntry> {
        self.properties.get(name)
    }

    /// Static properties
    pub fn static_properties(&self) -> &IndexMap<String, PropertyEntry> {
        &self.static_properties
    }

    /// Static property by name
    pub fn static_property(&self, name: &str) -> Option<&PropertyEntry> {
        self.static_properties.get(name)
    }

    /// Class constants, interface constants included
    pub fn constants(&self) -> &IndexMap<String, Value> {
        &self.constants
    }

    /// Constant by name
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    /// Methods keyed by lowercase name
    pub fn methods(&self) -> &IndexMap<String, MethodEntry> {
        &self.methods
    }

    /// Method by name, case-insensitively
    pub fn method(&self, name: &str) -> Option<&MethodEntry> {
        self.methods.get(&name.to_ascii_lowercase())
    }

    /// Opted-in object hooks
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Whether instances carry native state
    pub fn has_native_state(&self) -> bool {
        self.state.is_some()
    }

    pub(crate) fn enum_info(&self) -> Option<&EnumInfo> {
        self.enum_info.as_ref()
    }

    /// Whether the class is, extends or implements `name`.
    pub fn is_subclass_of(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
            || self.interfaces.iter().any(|i| i.eq_ignore_ascii_case(name))
            || self.parent.as_ref().is_some_and(|p| p.is_subclass_of(name))
    }

    /// Whether instances can be thrown
    pub fn is_throwable(&self) -> bool {
        self.is_subclass_of("Throwable")
    }

    /// This class or the ancestor named `name`.
    pub fn ancestor(&self, name: &str) -> Option<&ClassEntry> {
        if self.name.eq_ignore_ascii_case(name) {
            return Some(self);
        }
        self.parent.as_deref().and_then(|p| p.ancestor(name))
    }

    /// Whether a member declared on `declaring` with `visibility` can be
    /// reached from `scope` on an instance of this class.
    pub(crate) fn permits(
        &self,
        declaring: &str,
        visibility: Visibility,
        scope: Option<&ClassEntry>,
    ) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Private => scope.is_some_and(|s| s.name.eq_ignore_ascii_case(declaring)),
            Visibility::Protected => scope.is_some_and(|s| {
                s.is_subclass_of(declaring)
                    || self
                        .ancestor(declaring)
                        .is_some_and(|d| d.is_subclass_of(&s.name))
            }),
        }
    }
}

/// Case-insensitive class lookup table.
#[derive(Debug, Default, Clone)]
pub(crate) struct ClassTable {
    entries: IndexMap<String, Arc<ClassEntry>>,
}

impl ClassTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Arc<ClassEntry>> {
        self.entries.get(&name.to_ascii_lowercase())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub(crate) fn insert(&mut self, entry: Arc<ClassEntry>) {
        self.entries.insert(entry.name.to_ascii_lowercase(), entry);
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &Arc<ClassEntry>> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
