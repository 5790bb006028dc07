//! Reflection over registered declarations
//!
//! Every view reads straight from the frozen declarations, so what the
//! host reflects is exactly what was registered. Lookups that fail throw
//! `ReflectionException`, as the host does.

use std::fmt;
use std::sync::Arc;

use crate::class::{ClassEntry, ClassKind, MethodEntry, PropertyEntry, Visibility};
use crate::config::DefaultValueMode;
use crate::enums::BackingKind;
use crate::error::{Error, Result};
use crate::exception::Exception;
use crate::function::{apply_default_mode, DataType, Parameter, ReturnType, Signature};
use crate::runtime::Runtime;
use crate::value::Value;

fn reflection_error(message: String) -> Error {
    Error::Throw(Exception::new("ReflectionException", message))
}

// ═══════════════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════════════

/// A declared parameter, property or return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectionType {
    data_type: DataType,
    allows_null: bool,
    display: String,
}

impl ReflectionType {
    fn of_parameter(parameter: &Parameter) -> Option<Self> {
        let data_type = parameter.data_type()?.clone();
        Some(Self {
            display: data_type.display(parameter.is_nullable()),
            allows_null: parameter.allows_null(),
            data_type,
        })
    }

    fn of_return(return_type: &ReturnType) -> Self {
        Self {
            data_type: return_type.data_type().clone(),
            allows_null: return_type.allows_null(),
            display: return_type.type_name(),
        }
    }

    fn of_backing(backing: BackingKind) -> Option<Self> {
        let data_type = match backing {
            BackingKind::None => return None,
            BackingKind::Int => DataType::Int,
            BackingKind::String => DataType::String,
        };
        Some(Self {
            display: data_type.name().to_string(),
            allows_null: false,
            data_type,
        })
    }

    /// Type name without the nullable marker
    pub fn name(&self) -> &str {
        self.data_type.name()
    }

    /// Whether `null` satisfies the type
    pub fn allows_null(&self) -> bool {
        self.allows_null
    }

    /// Whether the type is built in rather than a class
    pub fn is_builtin(&self) -> bool {
        !matches!(self.data_type, DataType::ClassName(_))
    }

    /// Underlying declared type
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

impl fmt::Display for ReflectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Functions and Parameters
// ═══════════════════════════════════════════════════════════════════

/// A declared parameter.
#[derive(Debug, Clone)]
pub struct ReflectionParameter<'a> {
    parameter: &'a Parameter,
    position: usize,
    mode: DefaultValueMode,
}

impl<'a> ReflectionParameter<'a> {
    /// Name without `$`
    pub fn name(&self) -> &'a str {
        self.parameter.name()
    }

    /// Zero-based position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Declared type, if any
    pub fn get_type(&self) -> Option<ReflectionType> {
        ReflectionType::of_parameter(self.parameter)
    }

    /// Whether the parameter declares a type
    pub fn has_type(&self) -> bool {
        self.parameter.data_type().is_some()
    }

    /// Whether `null` is accepted
    pub fn allows_null(&self) -> bool {
        self.parameter.allows_null()
    }

    /// Whether the caller may omit it
    pub fn is_optional(&self) -> bool {
        self.parameter.is_optional()
    }

    /// Whether it collects the remaining arguments
    pub fn is_variadic(&self) -> bool {
        self.parameter.is_variadic()
    }

    /// Whether it binds the caller's slot
    pub fn is_passed_by_reference(&self) -> bool {
        self.parameter.is_by_ref()
    }

    /// Whether a default is declared
    pub fn is_default_value_available(&self) -> bool {
        self.parameter.has_default()
    }

    /// Declared default, in the configured representation.
    pub fn default_value(&self) -> Result<Value> {
        self.parameter
            .default_value()
            .map(|v| apply_default_mode(self.mode, v))
            .ok_or_else(|| reflection_error("Internal error: Failed to retrieve the default value".to_string()))
    }
}

/// A registered function, or the callable part of a method.
#[derive(Debug, Clone)]
pub struct ReflectionFunction<'a> {
    signature: &'a Signature,
    mode: DefaultValueMode,
}

impl<'a> ReflectionFunction<'a> {
    /// Reflect a function visible to the runtime.
    pub fn new(rt: &'a Runtime, name: &str) -> Result<Self> {
        let name = name.strip_prefix('\\').unwrap_or(name);
        let signature = rt
            .registry
            .function(name)
            .map(|f| &f.signature)
            .or_else(|| {
                rt.functions
                    .get(&name.to_ascii_lowercase())
                    .map(|f| &f.signature)
            })
            .ok_or_else(|| reflection_error(format!("Function {name}() does not exist")))?;
        Ok(Self {
            signature,
            mode: rt.config().default_value_mode,
        })
    }

    /// Declared name
    pub fn name(&self) -> &'a str {
        self.signature.name()
    }

    /// Every parameter in order
    pub fn parameters(&self) -> Vec<ReflectionParameter<'a>> {
        self.signature
            .parameters()
            .iter()
            .enumerate()
            .map(|(position, parameter)| ReflectionParameter {
                parameter,
                position,
                mode: self.mode,
            })
            .collect()
    }

    /// Parameter by name
    pub fn parameter(&self, name: &str) -> Option<ReflectionParameter<'a>> {
        self.parameters().into_iter().find(|p| p.name() == name)
    }

    /// Number of declared parameters
    pub fn number_of_parameters(&self) -> usize {
        self.signature.parameters().len()
    }

    /// Number of parameters the caller must pass
    pub fn number_of_required_parameters(&self) -> usize {
        self.signature.required_count()
    }

    /// Declared return type
    pub fn return_type(&self) -> Option<ReflectionType> {
        self.signature.return_type().map(ReflectionType::of_return)
    }

    /// Whether the last parameter is variadic
    pub fn is_variadic(&self) -> bool {
        self.signature.variadic().is_some()
    }
}

// ═══════════════════════════════════════════════════════════════════
// Members
// ═══════════════════════════════════════════════════════════════════

/// A declared method.
#[derive(Debug, Clone)]
pub struct ReflectionMethod<'a> {
    entry: &'a MethodEntry,
    function: ReflectionFunction<'a>,
}

impl<'a> ReflectionMethod<'a> {
    fn new(entry: &'a MethodEntry, mode: DefaultValueMode) -> Self {
        Self {
            entry,
            function: ReflectionFunction {
                signature: &entry.signature,
                mode,
            },
        }
    }

    /// Method name
    pub fn name(&self) -> &'a str {
        &self.entry.name
    }

    /// Declaring class
    pub fn class(&self) -> &'a str {
        &self.entry.class
    }

    /// Whether the method is public
    pub fn is_public(&self) -> bool {
        self.entry.visibility == Visibility::Public
    }

    /// Whether the method is protected
    pub fn is_protected(&self) -> bool {
        self.entry.visibility == Visibility::Protected
    }

    /// Whether the method is private
    pub fn is_private(&self) -> bool {
        self.entry.visibility == Visibility::Private
    }

    /// Whether the method is static
    pub fn is_static(&self) -> bool {
        self.entry.is_static
    }

    /// Whether the method has no body
    pub fn is_abstract(&self) -> bool {
        self.entry.is_abstract
    }

    /// Whether subclasses may not override it
    pub fn is_final(&self) -> bool {
        self.entry.is_final
    }

    /// Whether this is the constructor
    pub fn is_constructor(&self) -> bool {
        self.entry.name.eq_ignore_ascii_case("__construct")
    }

    /// Parameters, return type and arity
    pub fn function(&self) -> &ReflectionFunction<'a> {
        &self.function
    }

    /// Every parameter in order
    pub fn parameters(&self) -> Vec<ReflectionParameter<'a>> {
        self.function.parameters()
    }

    /// Declared return type
    pub fn return_type(&self) -> Option<ReflectionType> {
        self.function.return_type()
    }
}

/// A declared property.
#[derive(Debug, Clone)]
pub struct ReflectionProperty<'a> {
    entry: &'a PropertyEntry,
    mode: DefaultValueMode,
}

impl<'a> ReflectionProperty<'a> {
    /// Property name
    pub fn name(&self) -> &'a str {
        &self.entry.name
    }

    /// Declaring class
    pub fn class(&self) -> &'a str {
        &self.entry.class
    }

    /// Whether the property is public
    pub fn is_public(&self) -> bool {
        self.entry.visibility == Visibility::Public
    }

    /// Whether the property is protected
    pub fn is_protected(&self) -> bool {
        self.entry.visibility == Visibility::Protected
    }

    /// Whether the property is private
    pub fn is_private(&self) -> bool {
        self.entry.visibility == Visibility::Private
    }

    /// Whether the property is static
    pub fn is_static(&self) -> bool {
        self.entry.is_static
    }

    /// Whether the property is readonly
    pub fn is_readonly(&self) -> bool {
        self.entry.readonly
    }

    /// Declared default, in the configured representation
    pub fn default_value(&self) -> Value {
        apply_default_mode(self.mode, self.entry.default.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Classes
// ═══════════════════════════════════════════════════════════════════

/// A registered class, interface or enum.
#[derive(Debug, Clone)]
pub struct ReflectionClass {
    entry: Arc<ClassEntry>,
    mode: DefaultValueMode,
}

impl ReflectionClass {
    /// Reflect a class visible to the runtime.
    pub fn new(rt: &Runtime, name: &str) -> Result<Self> {
        let entry = rt
            .lookup_class(name)
            .ok_or_else(|| reflection_error(format!("Class \"{name}\" does not exist")))?;
        Ok(Self::from_entry(entry, rt.config().default_value_mode))
    }

    fn from_entry(entry: Arc<ClassEntry>, mode: DefaultValueMode) -> Self {
        Self { entry, mode }
    }

    /// The materialized entry
    pub fn entry(&self) -> &Arc<ClassEntry> {
        &self.entry
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Parent class, if any
    pub fn parent_class(&self) -> Option<ReflectionClass> {
        self.entry
            .parent
            .clone()
            .map(|p| Self::from_entry(p, self.mode))
    }

    /// Every implemented interface, flattened
    pub fn interface_names(&self) -> &[String] {
        &self.entry.interfaces
    }

    /// Whether the class implements `interface`
    pub fn implements_interface(&self, interface: &str) -> bool {
        self.entry
            .interfaces
            .iter()
            .any(|i| i.eq_ignore_ascii_case(interface))
    }

    /// Whether the class extends or implements `name`, excluding itself
    pub fn is_subclass_of(&self, name: &str) -> bool {
        !self.entry.name.eq_ignore_ascii_case(name) && self.entry.is_subclass_of(name)
    }

    /// Whether this is an interface
    pub fn is_interface(&self) -> bool {
        self.entry.kind == ClassKind::Interface
    }

    /// Whether this is an enum
    pub fn is_enum(&self) -> bool {
        self.entry.kind == ClassKind::Enum
    }

    /// Whether the class is abstract
    pub fn is_abstract(&self) -> bool {
        self.entry.is_abstract
    }

    /// Whether the class is final
    pub fn is_final(&self) -> bool {
        self.entry.is_final
    }

    /// Whether `new` is allowed
    pub fn is_instantiable(&self) -> bool {
        self.entry.is_instantiable()
    }

    /// Whether instances may be cloned
    pub fn is_cloneable(&self) -> bool {
        self.entry.capabilities.cloneable
    }

    /// Whether instances can be iterated with `foreach` through `Iterator`
    pub fn is_iterable(&self) -> bool {
        self.entry.is_subclass_of("Traversable")
    }

    /// Whether the class was declared by the module rather than host code
    pub fn is_internal(&self) -> bool {
        !self.entry.user_defined
    }

    /// Whether host code declared the class
    pub fn is_user_defined(&self) -> bool {
        self.entry.user_defined
    }

    /// Constants, inherited ones included
    pub fn constants(&self) -> &indexmap::IndexMap<String, Value> {
        &self.entry.constants
    }

    /// Constant by name
    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.entry.constants.get(name)
    }

    /// Whether a method of that name exists
    pub fn has_method(&self, name: &str) -> bool {
        self.entry.method(name).is_some()
    }

    /// Method by name, case-insensitively
    pub fn method(&self, name: &str) -> Result<ReflectionMethod<'_>> {
        self.entry
            .method(name)
            .map(|m| ReflectionMethod::new(m, self.mode))
            .ok_or_else(|| {
                reflection_error(format!("Method {}::{}() does not exist", self.entry.name, name))
            })
    }

    /// Every method, inherited ones included
    pub fn methods(&self) -> Vec<ReflectionMethod<'_>> {
        self.entry
            .methods
            .values()
            .map(|m| ReflectionMethod::new(m, self.mode))
            .collect()
    }

    /// The constructor, if any
    pub fn constructor(&self) -> Option<ReflectionMethod<'_>> {
        self.method("__construct").ok()
    }

    /// Whether an instance or static property of that name exists
    pub fn has_property(&self, name: &str) -> bool {
        self.entry.property(name).is_some() || self.entry.static_property(name).is_some()
    }

    /// Instance or static property by name
    pub fn property(&self, name: &str) -> Result<ReflectionProperty<'_>> {
        self.entry
            .property(name)
            .or_else(|| self.entry.static_property(name))
            .map(|entry| ReflectionProperty {
                entry,
                mode: self.mode,
            })
            .ok_or_else(|| {
                reflection_error(format!("Property {}::${} does not exist", self.entry.name, name))
            })
    }

    /// Every property, instance ones first
    pub fn properties(&self) -> Vec<ReflectionProperty<'_>> {
        self.entry
            .properties
            .values()
            .chain(self.entry.static_properties.values())
            .map(|entry| ReflectionProperty {
                entry,
                mode: self.mode,
            })
            .collect()
    }
}

/// A registered enum.
#[derive(Debug, Clone)]
pub struct ReflectionEnum {
    class: ReflectionClass,
    backing: BackingKind,
}

impl ReflectionEnum {
    /// Reflect an enum visible to the runtime.
    pub fn new(rt: &Runtime, name: &str) -> Result<Self> {
        let class = ReflectionClass::new(rt, name)?;
        let backing = class
            .entry
            .enum_info()
            .map(|info| info.backing)
            .ok_or_else(|| reflection_error(format!("Class \"{}\" is not an enum", class.name())))?;
        Ok(Self { class, backing })
    }

    /// Whether cases carry backing values
    pub fn is_backed(&self) -> bool {
        self.backing != BackingKind::None
    }

    /// Backing type, for backed enums
    pub fn backing_type(&self) -> Option<ReflectionType> {
        ReflectionType::of_backing(self.backing)
    }

    /// Whether a case of that name exists
    pub fn has_case(&self, name: &str) -> bool {
        self.case_names().contains(&name)
    }

    /// Case names in declaration order
    pub fn case_names(&self) -> Vec<&str> {
        self.class
            .entry
            .enum_info()
            .map(|info| info.cases.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

impl std::ops::Deref for ReflectionEnum {
    type Target = ReflectionClass;

    fn deref(&self) -> &Self::Target {
        &self.class
    }
}

impl Runtime {
    /// Shorthand for [`ReflectionClass::new`].
    pub fn reflect_class(&self, name: &str) -> Result<ReflectionClass> {
        ReflectionClass::new(self, name)
    }

    /// Shorthand for [`ReflectionFunction::new`].
    pub fn reflect_function(&self, name: &str) -> Result<ReflectionFunction<'_>> {
        ReflectionFunction::new(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassSpec, InterfaceSpec};
    use crate::config::EngineConfig;
    use crate::module::Module;

    fn runtime(config: EngineConfig) -> Runtime {
        let mut module = Module::new("test", "0.1.0", "tests").with_config(config);
        module
            .add_function("greet", |_, _| crate::ok(()))
            .argument(Parameter::new("name").typed(DataType::String))
            .argument(Parameter::new("times").typed(DataType::Int).nullable().default(1))
            .returns(ReturnType::new(DataType::Void));

        let mut iface = InterfaceSpec::new("IFoo");
        iface.add_method("getValue").returns(ReturnType::new(DataType::Int));
        module.add_interface(iface);

        let mut a = ClassSpec::new("A");
        a.add_property("name", Visibility::Private, "default");
        a.add_property("number", Visibility::Public, 100);
        module.add_class(a);
        Runtime::new(module.startup().unwrap())
    }

    #[test]
    fn test_function_parameters() {
        let rt = runtime(EngineConfig::default());
        let f = rt.reflect_function("GREET").unwrap();
        assert_eq!(f.name(), "greet");
        assert_eq!(f.number_of_parameters(), 2);
        assert_eq!(f.number_of_required_parameters(), 1);
        assert_eq!(f.return_type().unwrap().to_string(), "void");

        let times = f.parameter("times").unwrap();
        assert_eq!(times.position(), 1);
        assert_eq!(times.get_type().unwrap().to_string(), "?int");
        assert_eq!(times.get_type().unwrap().name(), "int");
        assert!(times.allows_null());
        assert!(times.is_optional());
        assert_eq!(times.default_value().unwrap(), Value::Int(1));

        let name = f.parameter("name").unwrap();
        assert!(!name.allows_null());
        assert!(name.default_value().is_err());
    }

    #[test]
    fn test_interface_method_is_public_abstract() {
        let rt = runtime(EngineConfig::default());
        let iface = rt.reflect_class("IFoo").unwrap();
        assert!(iface.is_interface());
        let m = iface.method("getvalue").unwrap();
        assert!(m.is_public());
        assert!(m.is_abstract());
        assert_eq!(m.return_type().unwrap().to_string(), "int");
    }

    #[test]
    fn test_property_flags_and_defaults() {
        let rt = runtime(EngineConfig::default());
        let a = rt.reflect_class("A").unwrap();
        let name = a.property("name").unwrap();
        assert!(name.is_private());
        assert!(!name.is_static());
        assert_eq!(a.property("number").unwrap().default_value(), Value::Int(100));

        let stringified = runtime(EngineConfig::default().default_values(DefaultValueMode::Stringify));
        let a = stringified.reflect_class("A").unwrap();
        assert_eq!(a.property("number").unwrap().default_value(), Value::from("100"));
    }

    #[test]
    fn test_missing_members_throw_reflection_exception() {
        let rt = runtime(EngineConfig::default());
        let err = rt.reflect_class("Nope").unwrap_err();
        assert_eq!(err.to_exception().class(), "ReflectionException");
        assert_eq!(err.to_string(), "Class \"Nope\" does not exist");

        let a = rt.reflect_class("A").unwrap();
        assert_eq!(
            a.method("missing").unwrap_err().to_string(),
            "Method A::missing() does not exist"
        );
        assert!(rt.reflect_function("nope").is_err());
    }

    #[test]
    fn test_exception_hierarchy() {
        let rt = runtime(EngineConfig::default());
        let type_error = rt.reflect_class("ArgumentCountError").unwrap();
        assert_eq!(type_error.parent_class().unwrap().name(), "TypeError");
        assert!(type_error.is_subclass_of("Throwable"));
        assert!(!type_error.is_subclass_of("ArgumentCountError"));
        assert!(type_error.implements_interface("Stringable"));
        assert!(type_error.is_internal());
    }
}
