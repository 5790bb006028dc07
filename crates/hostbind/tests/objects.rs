//! Object projection tests

use hostbind::*;
use pretty_assertions::assert_eq;

mod common;

use common::{runtime, thrown, Bag};

// ═══════════════════════════════════════════════════════════════════════
// Clone
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_clone_copies_native_state() {
    let mut rt = runtime();
    let original = rt.new_object("Counter", &[]).unwrap();
    assert_eq!(rt.call_method(original, "get", &[]).unwrap(), Value::Int(123456));

    rt.call_method(original, "incr", &[]).unwrap();
    let copy = rt.clone_object(original).unwrap();
    assert_eq!(rt.call_method(copy, "get", &[]).unwrap(), Value::Int(123457));

    rt.call_method(copy, "incr", &[]).unwrap();
    assert_eq!(rt.call_method(copy, "get", &[]).unwrap(), Value::Int(123458));
    assert_eq!(rt.call_method(original, "get", &[]).unwrap(), Value::Int(123457));
}

#[test]
fn test_clone_without_state_hook_constructs_fresh_state() {
    let mut module = common::module();
    let mut tally =
        ClassSpec::<String>::with_state_constructor("Tally", || "fresh".to_string());
    tally.extends("Counter");
    module.add_class(tally);
    let mut rt = Runtime::new(module.startup().unwrap());

    let original = rt.new_object("Tally", &[]).unwrap();
    *rt.state_mut::<String>(original).unwrap() = "used".to_string();
    let copy = rt.clone_object(original).unwrap();
    assert_eq!(rt.state::<String>(copy).unwrap(), "fresh");
    assert_eq!(rt.state::<String>(original).unwrap(), "used");
}

#[test]
fn test_clone_uncloneable() {
    let mut rt = runtime();
    let b = rt.new_object("B", &[]).unwrap();
    let err = rt.clone_object(b).unwrap_err();
    assert_eq!(
        thrown(&err),
        (
            "Error".to_string(),
            "Trying to clone an uncloneable object of class B".to_string()
        )
    );
}

// ═══════════════════════════════════════════════════════════════════════
// Native State
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_native_state_access() {
    let mut rt = runtime();
    let counter = rt.new_object("Counter", &[]).unwrap();
    *rt.state_mut::<i64>(counter).unwrap() = 7;
    assert_eq!(*rt.state::<i64>(counter).unwrap(), 7);

    let err = rt.state::<String>(counter).unwrap_err();
    assert!(err.to_string().starts_with("Native state of Counter is"));

    let b = rt.new_object("B", &[]).unwrap();
    assert_eq!(
        rt.state::<i64>(b).unwrap_err().to_string(),
        "Objects of class B carry no native state"
    );
}

#[test]
fn test_released_handle_is_dead() {
    let mut rt = runtime();
    let b = rt.new_object("B", &[]).unwrap();
    assert!(rt.release(b));
    assert!(!rt.is_alive(b));
    assert!(!rt.release(b));
    assert!(rt.get_property(b, "id").is_err());
}

// ═══════════════════════════════════════════════════════════════════════
// Properties
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_private_property_access() {
    let mut rt = runtime();
    let a = rt
        .new_object("A", &[Value::from("x"), Value::Int(1)])
        .unwrap();
    let err = rt.get_property(a, "name").unwrap_err();
    assert_eq!(err.to_string(), "Cannot access private property A::$name");
    assert_eq!(rt.raw_property(a, "name").unwrap(), Value::from("x"));
}

#[test]
fn test_protected_property_visible_within_hierarchy() {
    let mut rt = runtime();
    let square = rt.new_object("Square", &[]).unwrap();
    let err = rt.get_property(square, "side").unwrap_err();
    assert_eq!(err.to_string(), "Cannot access protected property Square::$side");

    let mut inside = rt.enter_scope("Shape").unwrap();
    assert_eq!(inside.get_property(square, "side").unwrap(), Value::Float(2.0));
    drop(inside);

    let mut unrelated = rt.enter_scope("B").unwrap();
    assert!(unrelated.get_property(square, "side").is_err());
}

#[test]
fn test_undefined_property_warns() {
    let mut rt = runtime();
    let b = rt.new_object("B", &[]).unwrap();
    assert_eq!(rt.get_property(b, "missing").unwrap(), Value::Null);
    let diagnostics = rt.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, Level::Warning);
    assert_eq!(diagnostics[0].message, "Undefined property: B::$missing");
}

#[test]
fn test_dynamic_property_deprecated() {
    let mut rt = runtime();
    let b = rt.new_object("B", &[]).unwrap();
    rt.set_property(b, "extra", Value::Int(1)).unwrap();
    assert_eq!(rt.get_property(b, "extra").unwrap(), Value::Int(1));
    let diagnostics = rt.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].level, Level::Deprecated);
    assert_eq!(
        diagnostics[0].message,
        "Creation of dynamic property B::$extra is deprecated"
    );

    let plain = rt.new_object("stdClass", &[]).unwrap();
    rt.set_property(plain, "extra", Value::Int(1)).unwrap();
    assert!(rt.take_diagnostics().is_empty());
}

#[test]
fn test_readonly_property() {
    let mut rt = runtime();
    let p = rt.new_object("Point", &[Value::Int(3)]).unwrap();
    assert_eq!(rt.get_property(p, "x").unwrap(), Value::Int(3));
    assert_eq!(rt.get_property(p, "y").unwrap(), Value::Int(0));

    let err = rt.set_property(p, "x", Value::Int(4)).unwrap_err();
    assert_eq!(err.to_string(), "Cannot modify readonly property Point::$x");
    assert!(rt.unset_property(p, "x").is_err());
}

#[test]
fn test_isset_and_unset() {
    let mut rt = runtime();
    let b = rt.new_object("B", &[]).unwrap();
    assert!(rt.has_property(b, "id").unwrap());
    rt.unset_property(b, "id").unwrap();
    assert!(!rt.has_property(b, "id").unwrap());
}

// ═══════════════════════════════════════════════════════════════════════
// Iteration
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_iterate_native_iterator() {
    let mut rt = runtime();
    let bag = rt.new_object("Bag", &[]).unwrap();
    rt.state_mut::<Bag>(bag).unwrap().items = vec![Value::from("a"), Value::from("b")];

    let items = rt.iterate(bag).unwrap();
    assert_eq!(
        items,
        vec![
            (Value::Int(0), Value::from("a")),
            (Value::Int(1), Value::from("b")),
        ]
    );
    assert!(rt.instance_of(bag, "Traversable"));
}

#[test]
fn test_iterate_plain_object_yields_visible_properties() {
    let mut rt = runtime();
    let a = rt
        .new_object("A", &[Value::from("x"), Value::Int(1)])
        .unwrap();
    assert!(rt.iterate(a).unwrap().is_empty());

    let mut inside = rt.enter_scope("A").unwrap();
    let keys: Vec<Value> = inside.iterate(a).unwrap().into_iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec![Value::from("name"), Value::from("number")]);
}

// ═══════════════════════════════════════════════════════════════════════
// Array Access
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_array_access() {
    let mut rt = runtime();
    let bag = rt.new_object("Bag", &[]).unwrap();
    rt.offset_set(bag, None, Value::from("first")).unwrap();
    rt.offset_set(bag, None, Value::from("second")).unwrap();
    rt.offset_set(bag, Some(Value::Int(0)), Value::from("zeroth")).unwrap();

    assert_eq!(rt.offset_get(bag, &Value::Int(0)).unwrap(), Value::from("zeroth"));
    assert!(rt.offset_exists(bag, &Value::Int(1)).unwrap());
    rt.offset_unset(bag, &Value::Int(1)).unwrap();
    assert!(!rt.offset_exists(bag, &Value::Int(1)).unwrap());

    let err = rt.offset_get(bag, &Value::Int(9)).unwrap_err();
    assert_eq!(
        thrown(&err),
        ("RuntimeException".to_string(), "No item at 9".to_string())
    );
}

#[test]
fn test_array_access_requires_capability() {
    let mut rt = runtime();
    let b = rt.new_object("B", &[]).unwrap();
    let err = rt.offset_get(b, &Value::Int(0)).unwrap_err();
    assert_eq!(err.to_string(), "Cannot use object of type B as array");
}

// ═══════════════════════════════════════════════════════════════════════
// String Casts
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn test_string_cast() {
    let mut rt = runtime();
    let label = rt.new_object("Label", &[]).unwrap();
    rt.set_property(label, "text", Value::from("hello")).unwrap();
    assert_eq!(rt.to_string(label).unwrap(), ByteString::from("hello"));
    assert_eq!(
        rt.cast_to_string(&Value::Object(label)).unwrap(),
        ByteString::from("hello")
    );
    assert!(rt.instance_of(label, "Stringable"));
    assert_eq!(
        rt.cast_to_string(&Value::Int(12)).unwrap(),
        ByteString::from("12")
    );
    assert_eq!(
        rt.cast_to_string(&Value::Bool(false)).unwrap(),
        ByteString::default()
    );
}

#[test]
fn test_string_cast_unsupported() {
    let mut rt = runtime();
    let b = rt.new_object("B", &[]).unwrap();
    let err = rt.to_string(b).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Object of class B could not be converted to string"
    );
}
