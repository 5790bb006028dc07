//! Class and interface declarations
//!
//! A [`ClassSpec`] is the declarative form an extension builds at module
//! init. [`Module::startup`](crate::Module::startup) materializes it into an
//! immutable [`ClassEntry`] with inheritance resolved, interface contracts
//! checked and capability hooks wired to generated methods.

pub(crate) mod builtins;
mod entry;
mod interface;
pub(crate) mod materialize;

pub use entry::{Capabilities, ClassEntry, ClassKind, MethodEntry, PropertyEntry};
pub use interface::InterfaceSpec;

pub(crate) use entry::{ClassTable, StateHooks};

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::{Error, RuntimeError, RuntimeErrorKind};
use crate::function::{
    function_handler, Arguments, DataType, Handler, Parameter, ReturnType, Signature,
};
use crate::object::{NativeArrayAccess, NativeIterator, ObjectRef};
use crate::runtime::Runtime;
use crate::value::{ByteString, Value};

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Visibility {
    /// Visible everywhere
    #[default]
    Public,
    /// Visible to the declaring class and its relatives
    Protected,
    /// Visible to the declaring class only
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        })
    }
}

/// A declared property (instance or static).
#[derive(Debug, Clone)]
pub struct PropertySpec {
    pub(crate) name: String,
    pub(crate) visibility: Visibility,
    pub(crate) default: Value,
    pub(crate) is_static: bool,
    pub(crate) readonly: bool,
}

impl PropertySpec {
    fn new(name: String, visibility: Visibility, default: Value, is_static: bool) -> Self {
        Self {
            name,
            visibility,
            default,
            is_static,
            readonly: false,
        }
    }

    /// Reject writes after initialization.
    pub fn readonly(&mut self) -> &mut Self {
        self.readonly = true;
        self
    }
}

/// A declared method.
#[derive(Clone)]
pub struct MethodSpec {
    pub(crate) signature: Signature,
    pub(crate) visibility: Visibility,
    pub(crate) is_static: bool,
    pub(crate) is_abstract: bool,
    pub(crate) is_final: bool,
    pub(crate) handler: Option<Handler>,
}

impl MethodSpec {
    pub(crate) fn new(
        name: impl Into<String>,
        visibility: Visibility,
        is_static: bool,
        handler: Option<Handler>,
    ) -> Self {
        Self {
            signature: Signature::new(name),
            visibility,
            is_static,
            is_abstract: handler.is_none(),
            is_final: false,
            handler,
        }
    }

    /// Append a parameter.
    pub fn argument(&mut self, parameter: Parameter) -> &mut Self {
        self.signature.parameters.push(parameter);
        self
    }

    /// Append several parameters.
    pub fn arguments(&mut self, parameters: impl IntoIterator<Item = Parameter>) -> &mut Self {
        self.signature.parameters.extend(parameters);
        self
    }

    /// Declare the return type.
    pub fn returns(&mut self, return_type: ReturnType) -> &mut Self {
        self.signature.return_type = Some(return_type);
        self
    }

    /// Forbid overriding in subclasses.
    pub fn final_method(&mut self) -> &mut Self {
        self.is_final = true;
        self
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.signature.name
    }
}

impl fmt::Debug for MethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodSpec")
            .field("signature", &self.signature)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("is_abstract", &self.is_abstract)
            .finish_non_exhaustive()
    }
}

/// Erase an instance-method handler.
pub(crate) fn method_handler<F, R, E>(handler: F) -> Handler
where
    F: Fn(&mut Runtime, ObjectRef, &mut Arguments) -> std::result::Result<R, E>
        + Send
        + Sync
        + 'static,
    R: Into<Value>,
    E: Into<Error>,
{
    Arc::new(
        move |rt: &mut Runtime, this: Option<ObjectRef>, args: &mut Arguments| {
            let this = this.ok_or_else(|| {
                RuntimeError::new(
                    RuntimeErrorKind::StaticCall,
                    format!(
                        "Non-static method {}() cannot be called statically",
                        args.function()
                    ),
                )
            })?;
            handler(rt, this, args).map(Into::into).map_err(Into::into)
        },
    )
}

/// Untyped class declaration shared by classes, interfaces, enums and
/// exceptions.
#[derive(Clone)]
pub(crate) struct ClassDef {
    pub(crate) name: String,
    pub(crate) kind: ClassKind,
    pub(crate) parent: Option<String>,
    pub(crate) interfaces: Vec<String>,
    pub(crate) is_abstract: bool,
    pub(crate) is_final: bool,
    pub(crate) properties: Vec<PropertySpec>,
    pub(crate) constants: Vec<(String, Value)>,
    pub(crate) methods: Vec<MethodSpec>,
    pub(crate) capabilities: Capabilities,
    pub(crate) state: Option<StateHooks>,
}

impl ClassDef {
    pub(crate) fn new(name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            interfaces: Vec::new(),
            is_abstract: false,
            is_final: false,
            properties: Vec::new(),
            constants: Vec::new(),
            methods: Vec::new(),
            capabilities: Capabilities::default(),
            state: None,
        }
    }

    pub(crate) fn implement(&mut self, interface: &str) {
        if !self
            .interfaces
            .iter()
            .any(|i| i.eq_ignore_ascii_case(interface))
        {
            self.interfaces.push(interface.to_string());
        }
    }

    pub(crate) fn push_method(&mut self, method: MethodSpec) -> &mut MethodSpec {
        self.methods.push(method);
        let last = self.methods.len() - 1;
        &mut self.methods[last]
    }

    pub(crate) fn push_property(&mut self, property: PropertySpec) -> &mut PropertySpec {
        self.properties.push(property);
        let last = self.properties.len() - 1;
        &mut self.properties[last]
    }
}

/// Declaration of a class whose instances carry native state `T`.
///
/// ```
/// use hostbind::{ClassSpec, Visibility};
///
/// #[derive(Default, Clone)]
/// struct Counter(i64);
///
/// let mut class = ClassSpec::<Counter>::with_default_state("Counter");
/// class.cloneable();
/// class
///     .add_method("incr", Visibility::Public, |rt, this, _| {
///         rt.state_mut::<Counter>(this)?.0 += 1;
///         Ok::<_, hostbind::Error>(())
///     });
/// class
///     .add_method("get", Visibility::Public, |rt, this, _| {
///         Ok::<_, hostbind::Error>(rt.state::<Counter>(this)?.0)
///     });
/// assert_eq!(class.name(), "Counter");
/// ```
pub struct ClassSpec<T = ()> {
    pub(crate) def: ClassDef,
    _state: PhantomData<fn() -> T>,
}

impl ClassSpec<()> {
    /// A class without native state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            def: ClassDef::new(name, ClassKind::Class),
            _state: PhantomData,
        }
    }
}

impl<T: Default + Send + 'static> ClassSpec<T> {
    /// A class whose instances start with `T::default()`.
    pub fn with_default_state(name: impl Into<String>) -> Self {
        Self::with_state_constructor(name, T::default)
    }
}

impl<T: Send + 'static> ClassSpec<T> {
    /// A class whose instances start with the constructor's result.
    pub fn with_state_constructor(
        name: impl Into<String>,
        constructor: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let mut def = ClassDef::new(name, ClassKind::Class);
        def.state = Some(StateHooks {
            construct: Arc::new(move || Box::new(constructor())),
            clone: None,
            type_name: std::any::type_name::<T>(),
        });
        Self {
            def,
            _state: PhantomData,
        }
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Extend a registered class.
    pub fn extends(&mut self, parent: impl Into<String>) -> &mut Self {
        self.def.parent = Some(parent.into());
        self
    }

    /// Implement a registered interface.
    pub fn implements(&mut self, interface: impl AsRef<str>) -> &mut Self {
        self.def.implement(interface.as_ref());
        self
    }

    /// Mark the class abstract.
    pub fn abstract_class(&mut self) -> &mut Self {
        self.def.is_abstract = true;
        self
    }

    /// Mark the class final.
    pub fn final_class(&mut self) -> &mut Self {
        self.def.is_final = true;
        self
    }

    /// Declare an instance property.
    pub fn add_property(
        &mut self,
        name: impl Into<String>,
        visibility: Visibility,
        default: impl Into<Value>,
    ) -> &mut PropertySpec {
        self.def.push_property(PropertySpec::new(
            name.into(),
            visibility,
            default.into(),
            false,
        ))
    }

    /// Declare a static property.
    pub fn add_static_property(
        &mut self,
        name: impl Into<String>,
        visibility: Visibility,
        default: impl Into<Value>,
    ) -> &mut PropertySpec {
        self.def.push_property(PropertySpec::new(
            name.into(),
            visibility,
            default.into(),
            true,
        ))
    }

    /// Declare a class constant.
    pub fn add_constant(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.def.constants.push((name.into(), value.into()));
        self
    }

    /// Declare an instance method.
    pub fn add_method<F, R, E>(
        &mut self,
        name: impl Into<String>,
        visibility: Visibility,
        handler: F,
    ) -> &mut MethodSpec
    where
        F: Fn(&mut Runtime, ObjectRef, &mut Arguments) -> std::result::Result<R, E>
            + Send
            + Sync
            + 'static,
        R: Into<Value>,
        E: Into<Error>,
    {
        self.def.push_method(MethodSpec::new(
            name,
            visibility,
            false,
            Some(method_handler(handler)),
        ))
    }

    /// Declare a static method.
    pub fn add_static_method<F, R, E>(
        &mut self,
        name: impl Into<String>,
        visibility: Visibility,
        handler: F,
    ) -> &mut MethodSpec
    where
        F: Fn(&mut Runtime, &mut Arguments) -> std::result::Result<R, E> + Send + Sync + 'static,
        R: Into<Value>,
        E: Into<Error>,
    {
        self.def.push_method(MethodSpec::new(
            name,
            visibility,
            true,
            Some(function_handler(handler)),
        ))
    }

    /// Declare an abstract method; the class must be abstract.
    pub fn add_abstract_method(
        &mut self,
        name: impl Into<String>,
        visibility: Visibility,
    ) -> &mut MethodSpec {
        self.def
            .push_method(MethodSpec::new(name, visibility, false, None))
    }

    /// Clone instances with a custom hook that builds the copy's state.
    pub fn clone_with(&mut self, f: impl Fn(&T) -> T + Send + Sync + 'static) -> &mut Self {
        self.def.capabilities.cloneable = true;
        if let Some(state) = &mut self.def.state {
            state.clone = Some(Arc::new(move |any: &(dyn Any + Send)| {
                any.downcast_ref::<T>()
                    .map(|t| Box::new(f(t)) as Box<dyn Any + Send>)
            }));
        }
        self
    }

    /// Make instances string-castable through `__toString`.
    pub fn stringable<F, S, E>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Runtime, ObjectRef) -> std::result::Result<S, E> + Send + Sync + 'static,
        S: Into<ByteString>,
        E: Into<Error>,
    {
        self.def.capabilities.stringable = true;
        self.def.implement("Stringable");
        self.add_method("__toString", Visibility::Public, move |rt, this, _| {
            f(rt, this).map(|s| Value::String(s.into()))
        })
        .returns(ReturnType::new(DataType::String));
        self
    }
}

impl<T: Clone + Send + 'static> ClassSpec<T> {
    /// Clone instances by cloning their native state.
    pub fn cloneable(&mut self) -> &mut Self {
        self.clone_with(T::clone)
    }
}

impl<T: NativeIterator> ClassSpec<T> {
    /// Drive host iteration from the native state.
    pub fn iterable(&mut self) -> &mut Self {
        self.def.capabilities.iterable = true;
        self.def.implement("Iterator");
        self.add_method("current", Visibility::Public, |rt, this, _| {
            Ok::<_, Error>(rt.state::<T>(this)?.current())
        })
        .returns(ReturnType::new(DataType::Mixed));
        self.add_method("key", Visibility::Public, |rt, this, _| {
            Ok::<_, Error>(rt.state::<T>(this)?.key())
        })
        .returns(ReturnType::new(DataType::Mixed));
        self.add_method("next", Visibility::Public, |rt, this, _| {
            rt.state_mut::<T>(this)?.next();
            Ok::<_, Error>(())
        })
        .returns(ReturnType::new(DataType::Void));
        self.add_method("rewind", Visibility::Public, |rt, this, _| {
            rt.state_mut::<T>(this)?.rewind();
            Ok::<_, Error>(())
        })
        .returns(ReturnType::new(DataType::Void));
        self.add_method("valid", Visibility::Public, |rt, this, _| {
            Ok::<_, Error>(rt.state::<T>(this)?.valid())
        })
        .returns(ReturnType::new(DataType::Bool));
        self
    }
}

impl<T: NativeArrayAccess> ClassSpec<T> {
    /// Answer `$obj[...]` from the native state.
    pub fn array_access(&mut self) -> &mut Self {
        self.def.capabilities.array_access = true;
        self.def.implement("ArrayAccess");
        self.add_method("offsetGet", Visibility::Public, |rt, this, args| {
            rt.state::<T>(this)?.offset_get(&args[0])
        })
        .argument(Parameter::new("offset").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Mixed));
        self.add_method("offsetSet", Visibility::Public, |rt, this, args| {
            let offset = Some(args.take(0)).filter(|v| !v.is_null());
            let value = args.take(1);
            rt.state_mut::<T>(this)?.offset_set(offset, value)
        })
        .argument(Parameter::new("offset").typed(DataType::Mixed))
        .argument(Parameter::new("value").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Void));
        self.add_method("offsetExists", Visibility::Public, |rt, this, args| {
            Ok::<_, Error>(rt.state::<T>(this)?.offset_exists(&args[0]))
        })
        .argument(Parameter::new("offset").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Bool));
        self.add_method("offsetUnset", Visibility::Public, |rt, this, args| {
            rt.state_mut::<T>(this)?.offset_unset(&args[0]);
            Ok::<_, Error>(())
        })
        .argument(Parameter::new("offset").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Void));
        self
    }
}

impl<T> fmt::Debug for ClassSpec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassSpec")
            .field("name", &self.def.name)
            .field("parent", &self.def.parent)
            .field("interfaces", &self.def.interfaces)
            .field("methods", &self.def.methods)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Clone)]
    struct Cursor {
        items: Vec<i64>,
        pos: usize,
    }

    impl NativeIterator for Cursor {
        fn current(&self) -> Value {
            self.items.get(self.pos).copied().into()
        }

        fn key(&self) -> Value {
            self.pos.into()
        }

        fn next(&mut self) {
            self.pos += 1;
        }

        fn rewind(&mut self) {
            self.pos = 0;
        }

        fn valid(&self) -> bool {
            self.pos < self.items.len()
        }
    }

    #[test]
    fn test_iterable_generates_protocol_methods() {
        let mut class = ClassSpec::<Cursor>::with_default_state("Cursor");
        class.iterable();
        let names: Vec<_> = class.def.methods.iter().map(MethodSpec::name).collect();
        assert_eq!(names, vec!["current", "key", "next", "rewind", "valid"]);
        assert_eq!(class.def.interfaces, vec!["Iterator".to_string()]);
        assert!(class.def.capabilities.iterable);
    }

    #[test]
    fn test_cloneable_installs_hook() {
        let mut class = ClassSpec::<Cursor>::with_default_state("Cursor");
        assert!(class.def.state.as_ref().unwrap().clone.is_none());
        class.cloneable();
        assert!(class.def.capabilities.cloneable);
        assert!(class.def.state.as_ref().unwrap().clone.is_some());
    }

    #[test]
    fn test_stringable_adds_interface_once() {
        let mut class = ClassSpec::new("Name");
        class.implements("Stringable");
        class.stringable(|_, _| hostbind::ok("x"));
        assert_eq!(class.def.interfaces.len(), 1);
        assert_eq!(class.def.methods[0].name(), "__toString");
    }

    #[test]
    fn test_abstract_method_has_no_handler() {
        let mut class = ClassSpec::new("Shape");
        class.abstract_class();
        class.add_abstract_method("area", Visibility::Public);
        assert!(class.def.methods[0].is_abstract);
        assert!(class.def.methods[0].handler.is_none());
    }
}
