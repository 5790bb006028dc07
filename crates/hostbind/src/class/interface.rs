//! Interface declarations

use std::fmt;

use super::{ClassDef, ClassKind, MethodSpec, Visibility};
use crate::value::Value;

/// Declaration of an interface: abstract public methods and constants.
///
/// ```
/// use hostbind::{DataType, InterfaceSpec, Parameter};
///
/// let mut foo = InterfaceSpec::new("IFoo");
/// foo.add_method("getValue");
/// foo.add_method("setValue")
///     .argument(Parameter::new("value").typed(DataType::Mixed));
/// assert_eq!(foo.name(), "IFoo");
/// ```
#[derive(Clone)]
pub struct InterfaceSpec {
    pub(crate) def: ClassDef,
}

impl InterfaceSpec {
    /// Declare an interface.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: ClassDef::new(name, ClassKind::Interface),
        }
    }

    /// Interface name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Extend another registered interface.
    pub fn extends(&mut self, interface: impl AsRef<str>) -> &mut Self {
        self.def.implement(interface.as_ref());
        self
    }

    /// Declare an abstract instance method.
    pub fn add_method(&mut self, name: impl Into<String>) -> &mut MethodSpec {
        self.def
            .push_method(MethodSpec::new(name, Visibility::Public, false, None))
    }

    /// Declare an abstract static method.
    pub fn add_static_method(&mut self, name: impl Into<String>) -> &mut MethodSpec {
        self.def
            .push_method(MethodSpec::new(name, Visibility::Public, true, None))
    }

    /// Declare an interface constant.
    pub fn add_constant(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.def.constants.push((name.into(), value.into()));
        self
    }
}

impl fmt::Debug for InterfaceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceSpec")
            .field("name", &self.def.name)
            .field("extends", &self.def.interfaces)
            .field("methods", &self.def.methods)
            .finish()
    }
}
