//! Argument binding tests

use hostbind::*;
use pretty_assertions::assert_eq;

mod common;

use common::{runtime, thrown};

// ═══════════════════════════════════════════════════════════════════════
// Scalar Parameters
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_null_parameter() {
    let mut rt = runtime();
    let out = rt
        .call_function("integrate_arguments_null", &[Value::Null])
        .unwrap();
    assert_eq!(out, Value::Null);

    let err = rt
        .call_function("integrate_arguments_null", &[Value::Int(1)])
        .unwrap_err();
    assert_eq!(
        thrown(&err),
        (
            "TypeError".to_string(),
            "type error: must be of type null, int given".to_string()
        )
    );
}

#[test]
fn test_long_parameters() {
    let mut rt = runtime();
    let out = rt
        .call_function("integrate_arguments_long", &[Value::Int(1), Value::Int(2)])
        .unwrap();
    assert_eq!(out, Value::Int(3));
}

#[test]
fn test_numeric_string_is_not_an_int() {
    let mut rt = runtime();
    let err = rt
        .call_function("integrate_arguments_long", &[Value::from("1"), Value::Int(2)])
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(ref e) if e.expected == "int" && e.given == "string"));
}

#[test]
fn test_int_widens_to_double() {
    let mut rt = runtime();
    let out = rt
        .call_function("integrate_arguments_double", &[Value::Int(3)])
        .unwrap();
    assert_eq!(out, Value::Float(3.0));
}

#[test]
fn test_string_parameters() {
    let mut rt = runtime();
    let out = rt
        .call_function(
            "integrate_arguments_string",
            &[Value::from("hello"), Value::from("world")],
        )
        .unwrap();
    assert_eq!(out, Value::from("hello, world"));
}

// ═══════════════════════════════════════════════════════════════════════
// Compound Parameters
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_array_parameter_is_copied() {
    let mut rt = runtime();
    let original = Value::list([1, 2]);
    let out = rt
        .call_function("integrate_arguments_array", &[original.clone()])
        .unwrap();

    let arr = out.as_array().unwrap();
    assert_eq!(arr.len(), 4);
    assert_eq!(arr.get("a"), Some(&Value::Int(1)));
    assert_eq!(arr.get("foo"), Some(&Value::from("bar")));
    assert_eq!(original.as_array().unwrap().len(), 2);
}

#[test]
fn test_array_parameter_keeps_key_order() {
    let mut rt = runtime();
    let input: Array = [("a", 1)].into_iter().collect();
    let original = Value::from(input);
    let out = rt
        .call_function("integrate_arguments_array", &[original.clone()])
        .unwrap();

    let entries: Vec<(ArrayKey, Value)> = out
        .as_array()
        .unwrap()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    assert_eq!(
        entries,
        vec![
            (ArrayKey::from("a"), Value::Int(1)),
            (ArrayKey::from("foo"), Value::from("bar")),
        ]
    );
    assert_eq!(original.as_array().unwrap().len(), 1);
}

#[test]
fn test_object_parameter() {
    let mut rt = runtime();
    let source = rt.new_object("stdClass", &[]).unwrap();
    let out = rt
        .call_function("integrate_arguments_object", &[Value::Object(source)])
        .unwrap();

    let copy = out.as_object().unwrap();
    assert_ne!(copy, source);
    assert_eq!(rt.get_property(copy, "foo").unwrap(), Value::from("bar"));
    assert!(!rt.has_property(source, "foo").unwrap());
    assert!(rt.diagnostics().is_empty());
}

// ═══════════════════════════════════════════════════════════════════════
// Optional, Nullable and Named
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_optional_parameter_default() {
    let mut rt = runtime();
    let out = rt
        .call_function("integrate_arguments_optional", &[Value::from("foo")])
        .unwrap();
    assert_eq!(out, Value::from("foo: false"));

    let out = rt
        .call_function(
            "integrate_arguments_optional",
            &[Value::from("foo"), Value::Bool(true)],
        )
        .unwrap();
    assert_eq!(out, Value::from("foo: true"));
}

#[test]
fn test_nullable_parameter() {
    let mut rt = runtime();
    let out = rt
        .call_function("integrate_arguments_nullable", &[Value::Null])
        .unwrap();
    assert_eq!(out, Value::from("none"));

    let out = rt
        .call_function("integrate_arguments_nullable", &[Value::Int(5)])
        .unwrap();
    assert_eq!(out, Value::from("5"));
}

#[test]
fn test_nullable_parameter_is_still_required() {
    let mut rt = runtime();
    let err = rt
        .call_function("integrate_arguments_nullable", &[])
        .unwrap_err();
    assert_eq!(
        thrown(&err),
        (
            "ArgumentCountError".to_string(),
            "integrate_arguments_nullable(): expects at least 1 parameter(s), 0 given".to_string()
        )
    );
}

#[test]
fn test_too_few_arguments() {
    let mut rt = runtime();
    let err = rt
        .call_function("integrate_arguments_long", &[Value::Int(1)])
        .unwrap_err();
    match err {
        Error::Arity(e) => {
            assert_eq!(e.function, "integrate_arguments_long");
            assert_eq!(e.deficit(), 1);
        }
        other => panic!("expected arity error, got {other:?}"),
    }
}

#[test]
fn test_named_arguments() {
    let mut rt = runtime();
    let out = rt
        .call_function_named(
            "integrate_arguments_optional",
            &[],
            &[("b", Value::Bool(true)), ("a", Value::from("x"))],
        )
        .unwrap();
    assert_eq!(out, Value::from("x: true"));
}

#[test]
fn test_named_argument_errors() {
    let mut rt = runtime();
    let err = rt
        .call_function_named(
            "integrate_arguments_optional",
            &[Value::from("x")],
            &[("c", Value::Bool(true))],
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Unknown named parameter $c");

    let err = rt
        .call_function_named(
            "integrate_arguments_optional",
            &[Value::from("x")],
            &[("a", Value::from("y"))],
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Named parameter $a overwrites previous argument"
    );
}

#[test]
fn test_required_parameter_skipped_by_name() {
    let mut rt = runtime();
    let err = rt
        .call_function_named(
            "integrate_arguments_optional",
            &[],
            &[("b", Value::Bool(true))],
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "integrate_arguments_optional(): Argument #1 ($a) not passed"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Variadic and By-Reference
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_variadic_parameter() {
    let mut rt = runtime();
    let out = rt
        .call_function("integrate_sum", &[Value::Int(1), Value::Int(2), Value::Int(3)])
        .unwrap();
    assert_eq!(out, Value::Int(6));
    assert_eq!(rt.call_function("integrate_sum", &[]).unwrap(), Value::Int(0));
}

#[test]
fn test_variadic_values_are_type_checked() {
    let mut rt = runtime();
    let err = rt
        .call_function("integrate_sum", &[Value::Int(1), Value::from("2")])
        .unwrap_err();
    assert!(matches!(err, Error::TypeMismatch(_)));
}

#[test]
fn test_by_reference_parameters() {
    let mut rt = runtime();
    let a = Reference::new(1);
    let b = Reference::new("two");
    rt.call_function(
        "integrate_swap",
        &[Value::Reference(a.clone()), Value::Reference(b.clone())],
    )
    .unwrap();
    assert_eq!(a.get(), Value::from("two"));
    assert_eq!(b.get(), Value::Int(1));
}

// ═══════════════════════════════════════════════════════════════════════
// Callables and Return Types
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_callable_parameter() {
    let mut rt = runtime();
    let out = rt
        .call_function(
            "integrate_apply",
            &[
                Value::from(Callable::function("integrate_arguments_long")),
                Value::Int(2),
                Value::Int(3),
            ],
        )
        .unwrap();
    assert_eq!(out, Value::Int(5));

    let out = rt
        .call_function(
            "integrate_apply",
            &[Value::from("integrate_arguments_string"), Value::from("a"), Value::from("b")],
        )
        .unwrap();
    assert_eq!(out, Value::from("a, b"));
}

#[test]
fn test_unknown_function_name_is_not_callable() {
    let mut rt = runtime();
    let err = rt
        .call_function("integrate_apply", &[Value::from("no_such_function")])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "type error: must be of type callable, string given"
    );
}

#[test]
fn test_return_type_checked() {
    let mut rt = runtime();
    let err = rt.call_function("integrate_bad_return", &[]).unwrap_err();
    assert_eq!(
        thrown(&err),
        (
            "TypeError".to_string(),
            "integrate_bad_return(): Return value must be of type int, string returned".to_string()
        )
    );
}

#[test]
fn test_return_type_check_can_be_disabled() {
    let module = common::module().with_config(EngineConfig::new().return_type_checks(false));
    let mut rt = Runtime::new(module.startup().unwrap());
    let out = rt.call_function("integrate_bad_return", &[]).unwrap();
    assert_eq!(out, Value::from("not an int"));
}
