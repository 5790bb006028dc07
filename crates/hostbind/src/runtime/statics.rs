//! Static properties and class constants
//!
//! Statics of module classes live in the registry's shared slots; statics
//! of host-declared classes live on the runtime and vanish with the
//! request. Either way a slot belongs to the declaring class, so
//! subclasses that do not redeclare a static share it.

use super::objects::visibility_error;
use super::Runtime;
use crate::error::{PropertyAccessError, Result, RuntimeError, RuntimeErrorKind};
use crate::object::ObjectRef;
use crate::value::Value;

impl Runtime {
    /// Resolve `Class::$name` to its declaring class, checking visibility.
    fn static_owner(&self, class: &str, name: &str) -> Result<String> {
        let entry = self.class(class)?;
        let declared = entry
            .static_property(name)
            .ok_or_else(|| PropertyAccessError::undeclared_static(&entry.name, name))?;
        let scope = self.scope();
        if !entry.permits(&declared.class, declared.visibility, scope.as_deref()) {
            return Err(visibility_error(&entry.name, name, declared.visibility));
        }
        Ok(declared.class.clone())
    }

    fn is_module_class(&self, class: &str) -> bool {
        self.registry.class(class).is_some()
    }

    /// `Class::$name`
    pub fn get_static(&self, class: &str, name: &str) -> Result<Value> {
        let owner = self.static_owner(class, name)?;
        let value = if self.is_module_class(&owner) {
            self.registry.statics().get(&owner, name)
        } else {
            self.statics
                .get(&(owner.to_ascii_lowercase(), name.to_string()))
                .cloned()
        };
        Ok(value.unwrap_or_default())
    }

    /// `Class::$name = value`
    pub fn set_static(&mut self, class: &str, name: &str, value: Value) -> Result<()> {
        self.replace_static(class, name, value).map(drop)
    }

    /// Store a static and return the value it replaced.
    pub fn replace_static(&mut self, class: &str, name: &str, value: Value) -> Result<Value> {
        let owner = self.static_owner(class, name)?;
        let previous = if self.is_module_class(&owner) {
            self.registry.statics().set(&owner, name, value)
        } else {
            self.statics
                .insert((owner.to_ascii_lowercase(), name.to_string()), value)
        };
        Ok(previous.unwrap_or_default())
    }

    /// `Class::NAME`. Enum cases resolve to their singleton objects.
    pub fn class_constant(&self, class: &str, name: &str) -> Result<Value> {
        let entry = self.class(class)?;
        if let Some(case) = entry.enum_info().and_then(|info| info.cases.get(name)) {
            return Ok(Value::Object(ObjectRef::new(case.slot, 0)));
        }
        entry.constant(name).cloned().ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::UndefinedConstant,
                format!("Undefined constant {}::{}", entry.name, name),
            )
            .into()
        })
    }
}
