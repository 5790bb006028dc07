//! Object projection: construction, properties, clone, iteration,
//! array access and string casts

use std::any::type_name;
use std::sync::Arc;

use super::Runtime;
use crate::class::{ClassEntry, Visibility};
use crate::error::{
    CloneNotSupportedError, Error, PropertyAccessError, Result, RuntimeError, RuntimeErrorKind,
    TypeMismatchError,
};
use crate::function::apply_default_mode;
use crate::log::Level;
use crate::object::{HostObject, ObjectRef};
use crate::value::{ByteString, Value};

fn invalid_handle(object: ObjectRef) -> Error {
    RuntimeError::new(
        RuntimeErrorKind::InvalidHandle,
        format!("Object {object} is no longer alive"),
    )
    .into()
}

pub(super) fn visibility_error(class: &str, property: &str, visibility: Visibility) -> Error {
    match visibility {
        Visibility::Private => PropertyAccessError::private(class, property).into(),
        _ => PropertyAccessError::protected(class, property).into(),
    }
}

fn state_error<T>(class: &ClassEntry) -> Error {
    let message = match &class.state {
        Some(hooks) => format!(
            "Native state of {} is {}, not {}",
            class.name,
            hooks.type_name,
            type_name::<T>()
        ),
        None => format!("Objects of class {} carry no native state", class.name),
    };
    RuntimeError::new(RuntimeErrorKind::StateType, message).into()
}

impl Runtime {
    /// A live object.
    pub fn object(&self, object: ObjectRef) -> Result<&HostObject> {
        self.heap.get(object).ok_or_else(|| invalid_handle(object))
    }

    fn object_mut(&mut self, object: ObjectRef) -> Result<&mut HostObject> {
        self.heap.get_mut(object).ok_or_else(|| invalid_handle(object))
    }

    /// Whether the handle still points at a live object
    pub fn is_alive(&self, object: ObjectRef) -> bool {
        self.heap.get(object).is_some()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lifetime
    // ═══════════════════════════════════════════════════════════════════

    /// Allocate an instance without running its constructor: property
    /// defaults are copied in and native state is attached.
    pub(crate) fn instantiate(&mut self, class: &Arc<ClassEntry>) -> Result<ObjectRef> {
        if !class.is_instantiable() {
            let what = if class.is_interface() {
                "interface"
            } else if class.is_enum() {
                "enum"
            } else {
                "abstract class"
            };
            return Err(RuntimeError::new(
                RuntimeErrorKind::Instantiation,
                format!("Cannot instantiate {what} {}", class.name),
            )
            .into());
        }
        let mode = self.registry.config.default_value_mode;
        let properties = class
            .properties
            .values()
            .map(|p| (p.name.clone(), apply_default_mode(mode, p.default.clone())))
            .collect();
        let object = self.heap.alloc(HostObject::new(class.clone(), properties));
        if let Some(hooks) = &class.state {
            self.states.insert(object, (hooks.construct)());
        }
        tracing::trace!(class = %class.name, object = %object, "instantiate");
        Ok(object)
    }

    /// `new Class(...args)`.
    pub fn new_object(&mut self, class: &str, args: &[Value]) -> Result<ObjectRef> {
        let entry = self.class(class)?;
        let object = self.instantiate(&entry)?;
        if entry.method("__construct").is_some() {
            if let Err(e) = self.call_method(object, "__construct", args) {
                self.release(object);
                return Err(e);
            }
        }
        Ok(object)
    }

    /// Free an object and its native state. Returns `false` for pinned or
    /// dead handles.
    pub fn release(&mut self, object: ObjectRef) -> bool {
        let freed = self.heap.free(object).is_some();
        if freed {
            self.states.remove(object);
        }
        freed
    }

    /// `clone $object`.
    ///
    /// Properties are copied. Native state goes through the class's clone
    /// hook. State is type-erased, so it cannot be copied without one: a
    /// class that inherits cloneability but declares its own state type
    /// without [`ClassSpec::cloneable`](crate::ClassSpec::cloneable) gets
    /// freshly constructed state on the copy. A `__clone` method then runs
    /// on the copy.
    pub fn clone_object(&mut self, object: ObjectRef) -> Result<ObjectRef> {
        let source = self.object(object)?;
        let class = source.class.clone();
        if !class.capabilities.cloneable {
            return Err(CloneNotSupportedError {
                class: class.name.clone(),
            }
            .into());
        }
        let properties = source.properties.clone();
        let state = class.state.as_ref().map(|hooks| {
            self.states
                .raw(object)
                .zip(hooks.clone.as_ref())
                .and_then(|(raw, cloner)| cloner(raw))
                .unwrap_or_else(|| (hooks.construct)())
        });

        let copy = self.heap.alloc(HostObject::new(class.clone(), properties));
        if let Some(state) = state {
            self.states.insert(copy, state);
        }
        tracing::trace!(class = %class.name, from = %object, to = %copy, "clone");
        if class.method("__clone").is_some_and(|m| !m.is_static) {
            self.call_method(copy, "__clone", &[])?;
        }
        Ok(copy)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Native State
    // ═══════════════════════════════════════════════════════════════════

    /// The object's native state as `T`.
    pub fn state<T: 'static>(&self, object: ObjectRef) -> Result<&T> {
        let class = self.class_of(object)?;
        self.states
            .get::<T>(object)
            .ok_or_else(|| state_error::<T>(&class))
    }

    /// The object's native state as `T`, mutably.
    pub fn state_mut<T: 'static>(&mut self, object: ObjectRef) -> Result<&mut T> {
        let class = self.class_of(object)?;
        self.states
            .get_mut::<T>(object)
            .ok_or_else(|| state_error::<T>(&class))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Properties
    // ═══════════════════════════════════════════════════════════════════

    /// Read a property slot, ignoring visibility. Missing slots read as
    /// `null`.
    pub fn raw_property(&self, object: ObjectRef, name: &str) -> Result<Value> {
        Ok(self
            .object(object)?
            .properties
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    /// Write a property slot, ignoring visibility and readonly.
    pub fn set_raw_property(&mut self, object: ObjectRef, name: &str, value: Value) -> Result<()> {
        self.object_mut(object)?
            .properties
            .insert(name.to_string(), value);
        Ok(())
    }

    /// `$object->name`, checked against the calling scope.
    ///
    /// Reading an undefined property emits a warning and yields `null`.
    pub fn get_property(&mut self, object: ObjectRef, name: &str) -> Result<Value> {
        let class = self.class_of(object)?;
        if let Some(declared) = class.property(name) {
            let scope = self.scope();
            if !class.permits(&declared.class, declared.visibility, scope.as_deref()) {
                return Err(visibility_error(&class.name, name, declared.visibility));
            }
        }
        let value = self.object(object)?.properties.get(name).cloned();
        match value {
            Some(value) => Ok(value),
            None => {
                self.log(
                    Level::Warning,
                    format!("Undefined property: {}::${}", class.name, name),
                );
                Ok(Value::Null)
            }
        }
    }

    /// `$object->name = value`.
    ///
    /// Readonly properties can only be initialized once, from inside the
    /// declaring class. Dynamic properties are refused on enums and
    /// deprecated on everything but `stdClass`.
    pub fn set_property(&mut self, object: ObjectRef, name: &str, value: Value) -> Result<()> {
        let class = self.class_of(object)?;
        match class.property(name) {
            Some(declared) => {
                let scope = self.scope();
                if !class.permits(&declared.class, declared.visibility, scope.as_deref()) {
                    return Err(visibility_error(&class.name, name, declared.visibility));
                }
                if declared.readonly {
                    let inside = scope
                        .as_ref()
                        .is_some_and(|s| s.name.eq_ignore_ascii_case(&declared.class));
                    if !inside || !self.raw_property(object, name)?.is_null() {
                        return Err(PropertyAccessError::readonly(&class.name, name).into());
                    }
                }
            }
            None if class.is_enum() => {
                return Err(PropertyAccessError::dynamic(&class.name, name).into());
            }
            None => {
                let exists = self.object(object)?.properties.contains_key(name);
                if !exists && !class.is_subclass_of("stdClass") {
                    self.log(
                        Level::Deprecated,
                        format!(
                            "Creation of dynamic property {}::${} is deprecated",
                            class.name, name
                        ),
                    );
                }
            }
        }
        self.set_raw_property(object, name, value)
    }

    /// `isset($object->name)`: visible and not `null`.
    pub fn has_property(&self, object: ObjectRef, name: &str) -> Result<bool> {
        let host = self.object(object)?;
        let class = &host.class;
        if let Some(declared) = class.property(name) {
            let scope = self.scope();
            if !class.permits(&declared.class, declared.visibility, scope.as_deref()) {
                return Ok(false);
            }
        }
        Ok(host.properties.get(name).is_some_and(|v| !v.is_null()))
    }

    /// `unset($object->name)`.
    pub fn unset_property(&mut self, object: ObjectRef, name: &str) -> Result<()> {
        let class = self.class_of(object)?;
        if let Some(declared) = class.property(name) {
            let scope = self.scope();
            if !class.permits(&declared.class, declared.visibility, scope.as_deref()) {
                return Err(visibility_error(&class.name, name, declared.visibility));
            }
            if declared.readonly {
                return Err(PropertyAccessError::readonly(&class.name, name).into());
            }
        }
        self.object_mut(object)?.properties.shift_remove(name);
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Iteration
    // ═══════════════════════════════════════════════════════════════════

    /// `foreach ($object as $key => $value)`, collected.
    ///
    /// `Iterator` objects are driven through their methods; anything else
    /// yields the properties visible from the calling scope.
    pub fn iterate(&mut self, object: ObjectRef) -> Result<Vec<(Value, Value)>> {
        let class = self.class_of(object)?;
        if class.is_subclass_of("Iterator") {
            let mut items = Vec::new();
            self.call_method(object, "rewind", &[])?;
            while self.call_method(object, "valid", &[])?.cast_bool() {
                let value = self.call_method(object, "current", &[])?;
                let key = self.call_method(object, "key", &[])?;
                items.push((key, value));
                self.call_method(object, "next", &[])?;
            }
            return Ok(items);
        }

        let scope = self.scope();
        let visible = |name: &str| match class.property(name) {
            Some(d) => class.permits(&d.class, d.visibility, scope.as_deref()),
            None => true,
        };
        Ok(self
            .object(object)?
            .properties
            .iter()
            .filter(|(name, _)| visible(name.as_str()))
            .map(|(name, value)| (Value::from(name.as_str()), value.clone()))
            .collect())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Array Access
    // ═══════════════════════════════════════════════════════════════════

    fn require_array_access(&self, object: ObjectRef) -> Result<()> {
        let class = self.class_of(object)?;
        if class.is_subclass_of("ArrayAccess") {
            return Ok(());
        }
        Err(RuntimeError::new(
            RuntimeErrorKind::NotArrayAccess,
            format!("Cannot use object of type {} as array", class.name),
        )
        .into())
    }

    /// `$object[$offset]`
    pub fn offset_get(&mut self, object: ObjectRef, offset: &Value) -> Result<Value> {
        self.require_array_access(object)?;
        self.call_method(object, "offsetGet", &[offset.clone()])
    }

    /// `$object[$offset] = $value`; a `None` offset appends.
    pub fn offset_set(&mut self, object: ObjectRef, offset: Option<Value>, value: Value) -> Result<()> {
        self.require_array_access(object)?;
        self.call_method(object, "offsetSet", &[offset.unwrap_or_default(), value])?;
        Ok(())
    }

    /// `isset($object[$offset])`
    pub fn offset_exists(&mut self, object: ObjectRef, offset: &Value) -> Result<bool> {
        self.require_array_access(object)?;
        Ok(self
            .call_method(object, "offsetExists", &[offset.clone()])?
            .cast_bool())
    }

    /// `unset($object[$offset])`
    pub fn offset_unset(&mut self, object: ObjectRef, offset: &Value) -> Result<()> {
        self.require_array_access(object)?;
        self.call_method(object, "offsetUnset", &[offset.clone()])?;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════
    // String Casts
    // ═══════════════════════════════════════════════════════════════════

    /// `(string) $object`, through `__toString`.
    pub fn to_string(&mut self, object: ObjectRef) -> Result<ByteString> {
        let class = self.class_of(object)?;
        if class.method("__toString").is_none() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::NotStringable,
                format!("Object of class {} could not be converted to string", class.name),
            )
            .into());
        }
        match self.call_method(object, "__toString", &[])?.unref() {
            Value::String(s) => Ok(s),
            other => Err(TypeMismatchError::return_value(
                &format!("{}::__toString", class.name),
                "string",
                other.type_name(),
            )
            .into()),
        }
    }

    /// `(string) $value` for any value.
    pub fn cast_to_string(&mut self, value: &Value) -> Result<ByteString> {
        match value.unref() {
            Value::Object(object) => self.to_string(object),
            Value::Callable(_) => Err(RuntimeError::new(
                RuntimeErrorKind::NotStringable,
                "Object of class Closure could not be converted to string",
            )
            .into()),
            other => Ok(other.cast_string().unwrap_or_default()),
        }
    }
}
