//! Exception bridge tests

use hostbind::*;
use pretty_assertions::assert_eq;

mod common;

use common::{runtime, thrown};

// ═══════════════════════════════════════════════════════════════════════
// Throwing From Native Code
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_throw_module_exception() {
    let mut rt = runtime();
    let err = rt
        .call_function("integrate_throw", &[Value::from("boom")])
        .unwrap_err();
    let exception = err.to_exception();
    assert_eq!(exception.class(), "IntegrationException");
    assert_eq!(exception.message(), "boom");
    assert_eq!(exception.code(), 42);
}

#[test]
fn test_default_code_is_inherited() {
    let rt = runtime();
    let e = rt.new_exception("IntegrationChildException", "child").unwrap();
    assert_eq!(e.code(), 42);
    assert_eq!(e.class(), "IntegrationChildException");
}

#[test]
fn test_catch_matches_hierarchy() {
    let mut rt = runtime();
    let err = rt
        .call_function("integrate_throw", &[Value::from("boom")])
        .unwrap_err();
    assert!(rt.catches(&err, "IntegrationException"));
    assert!(rt.catches(&err, "Exception"));
    assert!(rt.catches(&err, "Throwable"));
    assert!(!rt.catches(&err, "Error"));
    assert!(!rt.catches(&err, "IntegrationChildException"));
}

#[test]
fn test_engine_errors_map_to_host_classes() {
    let mut rt = runtime();
    let arity = rt.call_function("integrate_arguments_long", &[]).unwrap_err();
    assert!(rt.catches(&arity, "ArgumentCountError"));
    assert!(rt.catches(&arity, "TypeError"));
    assert!(rt.catches(&arity, "Error"));

    let missing = rt.call_function("nope", &[]).unwrap_err();
    assert_eq!(
        thrown(&missing),
        ("Error".to_string(), "Call to undefined function nope()".to_string())
    );
}

#[test]
fn test_free_form_errors_become_error_exception() {
    let err = Error::other("disk on fire");
    assert_eq!(
        thrown(&err),
        ("ErrorException".to_string(), "disk on fire".to_string())
    );
}

#[test]
fn test_non_throwable_class_cannot_be_thrown() {
    let rt = runtime();
    let err = rt.throw_new("B", "nope");
    assert_eq!(
        err.to_string(),
        "Cannot throw objects that do not implement Throwable"
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Panics
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_panic_becomes_internal_fault() {
    let mut rt = runtime();
    let err = rt.call_function("integrate_panic", &[]).unwrap_err();
    assert!(matches!(err, Error::InternalFault(_)));
    assert_eq!(
        thrown(&err),
        (
            "Error".to_string(),
            "internal fault in integrate_panic(): native code gave up".to_string()
        )
    );
    assert_eq!(rt.call_depth(), 0);

    // the runtime stays usable
    let out = rt
        .call_function("integrate_arguments_long", &[Value::Int(1), Value::Int(1)])
        .unwrap();
    assert_eq!(out, Value::Int(2));
}

// ═══════════════════════════════════════════════════════════════════════
// Exception Objects
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_exception_object_round_trip() {
    let mut rt = runtime();
    let cause = Exception::new("RuntimeException", "cause").with_code(3);
    let exception = rt
        .new_exception("IntegrationChildException", "outer")
        .unwrap()
        .with_location("ext.c", 12)
        .with_previous(cause.clone());

    let object = rt.exception_object(&exception).unwrap();
    assert!(rt.instance_of(object, "IntegrationException"));
    assert_eq!(
        rt.call_method(object, "getMessage", &[]).unwrap(),
        Value::from("outer")
    );
    assert_eq!(rt.call_method(object, "getCode", &[]).unwrap(), Value::Int(42));
    assert_eq!(rt.call_method(object, "getLine", &[]).unwrap(), Value::Int(12));

    let back = rt.exception_from_object(object).unwrap();
    assert_eq!(back, exception);
    assert_eq!(back.previous(), Some(&cause));
}

#[test]
fn test_throw_host_object() {
    let mut rt = runtime();
    let object = rt
        .new_object("IntegrationException", &[Value::from("built"), Value::Int(7)])
        .unwrap();
    let err = rt.throw_object(object);
    let exception = err.into_exception();
    assert_eq!(exception.class(), "IntegrationException");
    assert_eq!(exception.message(), "built");
    assert_eq!(exception.code(), 7);

    let b = rt.new_object("B", &[]).unwrap();
    assert_eq!(
        rt.throw_object(b).to_string(),
        "Cannot throw objects that do not implement Throwable"
    );
}

#[test]
fn test_exception_string_cast() {
    let mut rt = runtime();
    let object = rt
        .new_object("IntegrationException", &[Value::from("bad")])
        .unwrap();
    assert_eq!(
        rt.to_string(object).unwrap(),
        ByteString::from("IntegrationException: bad")
    );
    assert_eq!(
        rt.call_method(object, "getCode", &[]).unwrap(),
        Value::Int(42)
    );
}
