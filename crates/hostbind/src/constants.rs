//! Module-level constants

use indexmap::IndexMap;

use crate::error::{RegistrationError, Result, RuntimeError, RuntimeErrorKind};
use crate::runtime::Runtime;
use crate::value::Value;

/// Whether a value may be stored in a constant: scalars, `null` and
/// arrays of those.
pub(crate) fn is_constant_value(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::String(_) => true,
        Value::Array(a) => a.values().all(is_constant_value),
        _ => false,
    }
}

/// Declared constants, case-sensitive.
#[derive(Debug, Clone, Default)]
pub(crate) struct ConstantTable {
    entries: IndexMap<String, Value>,
}

impl ConstantTable {
    pub(crate) fn insert(&mut self, name: String, value: Value) -> Result<()> {
        if !is_constant_value(&value) {
            return Err(RegistrationError::new(format!(
                "Constant {name} cannot be an {}",
                value.type_name()
            ))
            .into());
        }
        if self.entries.contains_key(&name) {
            return Err(RegistrationError::new(format!("Constant {name} already defined")).into());
        }
        self.entries.insert(name, value);
        Ok(())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

impl Runtime {
    /// Value of a module constant.
    pub fn constant(&self, name: &str) -> Result<Value> {
        self.registry.constants().get(name).cloned().ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::UndefinedConstant,
                format!("Undefined constant \"{name}\""),
            )
            .into()
        })
    }
}
