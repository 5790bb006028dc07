//! Classes and interfaces every registry starts with

use super::{ClassDef, ClassKind, ClassSpec, InterfaceSpec, PropertySpec, Visibility};
use crate::error::Error;
use crate::function::{DataType, Parameter, ReturnType};
use crate::value::Value;

fn interface(name: &str) -> InterfaceSpec {
    InterfaceSpec::new(name)
}

/// Core interfaces, in dependency order.
pub(crate) fn interfaces() -> Vec<ClassDef> {
    let traversable = interface("Traversable");

    let mut iterator = interface("Iterator");
    iterator.extends("Traversable");
    for (name, ret) in [
        ("current", DataType::Mixed),
        ("key", DataType::Mixed),
        ("next", DataType::Void),
        ("rewind", DataType::Void),
        ("valid", DataType::Bool),
    ] {
        iterator.add_method(name).returns(ReturnType::new(ret));
    }

    let mut array_access = interface("ArrayAccess");
    array_access
        .add_method("offsetExists")
        .argument(Parameter::new("offset").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Bool));
    array_access
        .add_method("offsetGet")
        .argument(Parameter::new("offset").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Mixed));
    array_access
        .add_method("offsetSet")
        .argument(Parameter::new("offset").typed(DataType::Mixed))
        .argument(Parameter::new("value").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Void));
    array_access
        .add_method("offsetUnset")
        .argument(Parameter::new("offset").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Void));

    let mut stringable = interface("Stringable");
    stringable
        .add_method("__toString")
        .returns(ReturnType::new(DataType::String));

    let mut unit_enum = interface("UnitEnum");
    unit_enum
        .add_static_method("cases")
        .returns(ReturnType::new(DataType::Array));

    let mut backed_enum = interface("BackedEnum");
    backed_enum.extends("UnitEnum");
    backed_enum
        .add_static_method("from")
        .argument(Parameter::new("value").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Object));
    backed_enum
        .add_static_method("tryFrom")
        .argument(Parameter::new("value").typed(DataType::Mixed))
        .returns(ReturnType::new(DataType::Object).nullable());

    let mut throwable = interface("Throwable");
    throwable.extends("Stringable");
    for (name, ret) in [
        ("getMessage", ReturnType::new(DataType::String)),
        ("getCode", ReturnType::new(DataType::Mixed)),
        ("getFile", ReturnType::new(DataType::String)),
        ("getLine", ReturnType::new(DataType::Int)),
        ("getPrevious", ReturnType::new(DataType::class("Throwable")).nullable()),
    ] {
        throwable.add_method(name).returns(ret);
    }

    [
        traversable,
        iterator,
        array_access,
        stringable,
        unit_enum,
        backed_enum,
        throwable,
    ]
    .into_iter()
    .map(|i| i.def)
    .collect()
}

/// `stdClass` and the throwable hierarchy, parents first.
pub(crate) fn classes() -> Vec<ClassDef> {
    let mut std_class = ClassSpec::new("stdClass");
    std_class.def.capabilities.cloneable = true;

    let mut defs = vec![std_class.def, throwable_root("Exception"), throwable_root("Error")];
    for (name, parent) in [
        ("ErrorException", "Exception"),
        ("TypeError", "Error"),
        ("ArgumentCountError", "TypeError"),
        ("ValueError", "Error"),
        ("LogicException", "Exception"),
        ("BadFunctionCallException", "LogicException"),
        ("BadMethodCallException", "BadFunctionCallException"),
        ("RuntimeException", "Exception"),
        ("ReflectionException", "Exception"),
    ] {
        let mut def = ClassDef::new(name, ClassKind::Class);
        def.parent = Some(parent.to_string());
        defs.push(def);
    }
    defs
}

fn property(name: &str, visibility: Visibility, default: impl Into<Value>) -> PropertySpec {
    PropertySpec {
        name: name.to_string(),
        visibility,
        default: default.into(),
        is_static: false,
        readonly: false,
    }
}

/// `Exception` or `Error`: the two roots implementing `Throwable`.
fn throwable_root(name: &str) -> ClassDef {
    let mut class = ClassSpec::new(name);
    class.implements("Throwable");
    class.def.properties = vec![
        property("message", Visibility::Protected, ""),
        property("code", Visibility::Protected, 0),
        property("file", Visibility::Protected, ""),
        property("line", Visibility::Protected, 0),
        property("previous", Visibility::Private, Value::Null),
    ];

    class
        .add_method("__construct", Visibility::Public, |rt, this, args| {
            let message = args.take(0);
            let code = args.take(1);
            let previous = args.take(2);
            rt.set_raw_property(this, "message", message)?;
            if !code.is_null() {
                rt.set_raw_property(this, "code", code)?;
            }
            rt.set_raw_property(this, "previous", previous)?;
            Ok::<_, Error>(())
        })
        .argument(
            Parameter::new("message")
                .typed(DataType::String)
                .default(""),
        )
        .argument(
            Parameter::new("code")
                .typed(DataType::Int)
                .nullable()
                .default(Value::Null),
        )
        .argument(
            Parameter::new("previous")
                .typed(DataType::class("Throwable"))
                .nullable()
                .default(Value::Null),
        );

    for (method, field, ret) in [
        ("getMessage", "message", ReturnType::new(DataType::String)),
        ("getCode", "code", ReturnType::new(DataType::Mixed)),
        ("getFile", "file", ReturnType::new(DataType::String)),
        ("getLine", "line", ReturnType::new(DataType::Int)),
        (
            "getPrevious",
            "previous",
            ReturnType::new(DataType::class("Throwable")).nullable(),
        ),
    ] {
        class
            .add_method(method, Visibility::Public, move |rt, this, _| {
                rt.raw_property(this, field)
            })
            .returns(ret)
            .final_method();
    }

    class
        .add_method("__toString", Visibility::Public, |rt, this, _| {
            let class = rt.class_of(this)?;
            let message = rt.raw_property(this, "message")?;
            Ok::<_, Error>(if message.cast_bool() {
                format!("{}: {}", class.name(), message)
            } else {
                class.name().to_string()
            })
        })
        .returns(ReturnType::new(DataType::String));
    class.def.capabilities.stringable = true;
    class.def
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throwable_roots_are_uncloneable() {
        let defs = classes();
        let exception = defs.iter().find(|d| d.name == "Exception").unwrap();
        assert!(!exception.capabilities.cloneable);
        assert_eq!(exception.interfaces, vec!["Throwable".to_string()]);
        let std_class = defs.iter().find(|d| d.name == "stdClass").unwrap();
        assert!(std_class.capabilities.cloneable);
    }

    #[test]
    fn test_interfaces_precede_dependents() {
        let names: Vec<_> = interfaces().into_iter().map(|d| d.name).collect();
        let pos = |n: &str| names.iter().position(|x| x == n).unwrap();
        assert!(pos("Traversable") < pos("Iterator"));
        assert!(pos("UnitEnum") < pos("BackedEnum"));
        assert!(pos("Stringable") < pos("Throwable"));
    }
}
