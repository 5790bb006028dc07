//! Turning declarations into class entries
//!
//! Materialization resolves the parent and interfaces, merges inherited
//! members and checks that a concrete class implements every abstract
//! method it inherits. Lookups go through a caller-supplied resolver so the
//! same pass serves module startup and runtime class declarations.

use std::sync::Arc;

use indexmap::IndexMap;

use super::entry::{ClassEntry, MethodEntry, PropertyEntry};
use super::{ClassDef, ClassKind, Visibility};
use crate::error::{InterfaceContractError, RegistrationError, Result};

/// Resolve a registered class by name.
pub(crate) type Resolver<'a> = &'a dyn Fn(&str) -> Option<Arc<ClassEntry>>;

/// Build a class entry from its declaration.
pub(crate) fn materialize(
    def: ClassDef,
    resolve: Resolver<'_>,
    user_defined: bool,
) -> Result<ClassEntry> {
    let ClassDef {
        name,
        kind,
        parent,
        interfaces: declared_interfaces,
        is_abstract,
        is_final,
        properties: declared_properties,
        constants: declared_constants,
        methods: declared_methods,
        capabilities: declared_capabilities,
        state: declared_state,
    } = def;

    if name.is_empty() {
        return Err(RegistrationError::new("Class name must not be empty").into());
    }
    if is_abstract && is_final {
        return Err(RegistrationError::new(format!(
            "Cannot use the final modifier on an abstract class {name}"
        ))
        .into());
    }
    if kind == ClassKind::Interface && !declared_properties.is_empty() {
        return Err(RegistrationError::new(format!(
            "Interface {name} may not include properties"
        ))
        .into());
    }
    for method in &declared_methods {
        method.signature.validate()?;
        if method.is_abstract && kind == ClassKind::Class && !is_abstract {
            return Err(RegistrationError::new(format!(
                "Class {name} declares abstract method {}() and must therefore be declared abstract",
                method.signature.name
            ))
            .into());
        }
    }

    let parent = match parent {
        None => None,
        Some(parent_name) => {
            let entry = resolve(&parent_name)
                .ok_or_else(|| RegistrationError::new(format!("Class \"{parent_name}\" not found")))?;
            if entry.is_interface() {
                return Err(RegistrationError::new(format!(
                    "Class {name} cannot extend interface {}",
                    entry.name
                ))
                .into());
            }
            if entry.is_final || entry.is_enum() {
                return Err(RegistrationError::new(format!(
                    "Class {name} cannot extend final class {}",
                    entry.name
                ))
                .into());
            }
            Some(entry)
        }
    };

    let mut interfaces: Vec<String> = parent
        .as_ref()
        .map(|p| p.interfaces.clone())
        .unwrap_or_default();
    let mut interface_entries = Vec::new();
    for interface in &declared_interfaces {
        let entry = resolve(interface).ok_or_else(|| {
            RegistrationError::new(format!("Interface \"{interface}\" not found"))
        })?;
        if !entry.is_interface() {
            return Err(RegistrationError::new(format!(
                "{name} cannot implement {} - it is not an interface",
                entry.name
            ))
            .into());
        }
        push_unique(&mut interfaces, &entry.name);
        for inherited in &entry.interfaces {
            push_unique(&mut interfaces, inherited);
        }
        interface_entries.push(entry);
    }

    let (mut properties, mut static_properties) = match &parent {
        Some(p) => (p.properties.clone(), p.static_properties.clone()),
        None => (IndexMap::new(), IndexMap::new()),
    };
    for property in declared_properties {
        let entry = PropertyEntry {
            name: property.name.clone(),
            class: name.clone(),
            visibility: property.visibility,
            default: property.default,
            is_static: property.is_static,
            readonly: property.readonly,
        };
        if property.is_static {
            static_properties.insert(property.name, entry);
        } else {
            properties.insert(property.name, entry);
        }
    }

    let mut constants = IndexMap::new();
    for interface in &interface_entries {
        for (k, v) in &interface.constants {
            constants.insert(k.clone(), v.clone());
        }
    }
    if let Some(p) = &parent {
        for (k, v) in &p.constants {
            constants.insert(k.clone(), v.clone());
        }
    }
    for (k, v) in declared_constants {
        constants.insert(k, v);
    }

    let mut methods: IndexMap<String, MethodEntry> = parent
        .as_ref()
        .map(|p| p.methods.clone())
        .unwrap_or_default();
    for interface in &interface_entries {
        for (key, method) in &interface.methods {
            methods
                .entry(key.clone())
                .or_insert_with(|| method.clone());
        }
    }
    for method in declared_methods {
        let key = method.signature.name.to_ascii_lowercase();
        if let Some(existing) = methods.get(&key) {
            if existing.is_final {
                return Err(RegistrationError::new(format!(
                    "Cannot override final method {}::{}()",
                    existing.class, existing.name
                ))
                .into());
            }
            check_override(&name, existing, method.visibility, method.is_static)?;
        }
        methods.insert(
            key,
            MethodEntry {
                name: method.signature.name.clone(),
                class: name.clone(),
                visibility: method.visibility,
                is_static: method.is_static,
                is_abstract: method.is_abstract || kind == ClassKind::Interface,
                is_final: method.is_final,
                signature: method.signature,
                handler: method.handler,
            },
        );
    }

    if kind != ClassKind::Interface && !is_abstract {
        let missing: Vec<String> = methods
            .values()
            .filter(|m| m.is_abstract)
            .map(|m| format!("{}::{}", m.class, m.name))
            .collect();
        if !missing.is_empty() {
            return Err(InterfaceContractError {
                class: name,
                missing,
            }
            .into());
        }
    }

    let capabilities = parent
        .as_ref()
        .map_or(declared_capabilities, |p| {
            p.capabilities.merge(declared_capabilities)
        });
    let state = declared_state.or_else(|| parent.as_ref().and_then(|p| p.state.clone()));

    tracing::debug!(
        class = %name,
        methods = methods.len(),
        properties = properties.len(),
        "materialized class"
    );

    Ok(ClassEntry {
        name,
        kind,
        is_abstract,
        is_final: is_final || kind == ClassKind::Enum,
        parent,
        interfaces,
        properties,
        static_properties,
        constants,
        methods,
        capabilities,
        state,
        enum_info: None,
        user_defined,
    })
}

/// An override keeps the static flag and may only widen visibility.
/// Private parent methods are not inherited, and constructors are exempt
/// unless abstract.
fn check_override(
    class: &str,
    existing: &MethodEntry,
    visibility: Visibility,
    is_static: bool,
) -> Result<()> {
    if existing.visibility == Visibility::Private && !existing.is_abstract {
        return Ok(());
    }
    if existing.is_static != is_static {
        let (from, to) = if existing.is_static {
            ("static", "non static")
        } else {
            ("non static", "static")
        };
        return Err(RegistrationError::new(format!(
            "Cannot make {from} method {}::{}() {to} in class {class}",
            existing.class, existing.name
        ))
        .into());
    }
    if existing.name.eq_ignore_ascii_case("__construct") && !existing.is_abstract {
        return Ok(());
    }
    if strictness(visibility) > strictness(existing.visibility) {
        let weaker = if existing.visibility == Visibility::Public {
            ""
        } else {
            " or weaker"
        };
        return Err(RegistrationError::new(format!(
            "Access level to {class}::{}() must be {} (as in class {}){weaker}",
            existing.name, existing.visibility, existing.class
        ))
        .into());
    }
    Ok(())
}

fn strictness(visibility: Visibility) -> u8 {
    match visibility {
        Visibility::Public => 0,
        Visibility::Protected => 1,
        Visibility::Private => 2,
    }
}

fn push_unique(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n.eq_ignore_ascii_case(name)) {
        list.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{ClassSpec, InterfaceSpec, Visibility};
    use crate::error::Error;
    use crate::value::Value;

    struct Table(Vec<Arc<ClassEntry>>);

    impl Table {
        fn resolve(&self, name: &str) -> Option<Arc<ClassEntry>> {
            self.0
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(name))
                .cloned()
        }

        fn add(&mut self, def: ClassDef) -> Result<Arc<ClassEntry>> {
            let entry = Arc::new(materialize(def, &|n: &str| self.resolve(n), false)?);
            self.0.push(entry.clone());
            Ok(entry)
        }
    }

    fn ifoo() -> InterfaceSpec {
        let mut i = InterfaceSpec::new("IFoo");
        i.add_method("getValue");
        i.add_method("setValue");
        i.add_constant("LIMIT", 3);
        i
    }

    #[test]
    fn test_missing_interface_methods_rejected() {
        let mut table = Table(vec![]);
        table.add(ifoo().def).unwrap();

        let mut foo = ClassSpec::new("Foo");
        foo.implements("IFoo");
        foo.add_method("getValue", Visibility::Public, |_, _, _| hostbind::ok(1));
        let err = table.add(foo.def).unwrap_err();
        match err {
            Error::InterfaceContract(e) => {
                assert_eq!(e.class, "Foo");
                assert_eq!(e.missing, vec!["IFoo::setValue".to_string()]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_inheritance_merges_members() {
        let mut table = Table(vec![]);
        table.add(ifoo().def).unwrap();

        let mut base = ClassSpec::new("Base");
        base.implements("IFoo");
        base.add_property("name", Visibility::Private, "default");
        base.add_method("getValue", Visibility::Public, |_, _, _| hostbind::ok(1));
        base.add_method("setValue", Visibility::Public, |_, _, _| hostbind::ok(()));
        table.add(base.def).unwrap();

        let mut child = ClassSpec::new("Child");
        child.extends("Base");
        child.add_property("extra", Visibility::Public, 1);
        child.add_method("getvalue", Visibility::Public, |_, _, _| hostbind::ok(2));
        let entry = table.add(child.def).unwrap();

        assert!(entry.is_subclass_of("IFoo"));
        assert_eq!(entry.constant("LIMIT"), Some(&Value::Int(3)));
        let props: Vec<_> = entry.properties().keys().cloned().collect();
        assert_eq!(props, vec!["name", "extra"]);
        assert_eq!(entry.property("name").unwrap().declaring_class(), "Base");
        assert_eq!(entry.method("GETVALUE").unwrap().declaring_class(), "Child");
        assert_eq!(entry.method("setValue").unwrap().declaring_class(), "Base");
    }

    #[test]
    fn test_final_parent_rejected() {
        let mut table = Table(vec![]);
        let mut sealed = ClassSpec::new("Sealed");
        sealed.final_class();
        table.add(sealed.def).unwrap();

        let mut child = ClassSpec::new("Child");
        child.extends("Sealed");
        let err = table.add(child.def).unwrap_err();
        assert_eq!(err.to_string(), "Class Child cannot extend final class Sealed");
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let mut table = Table(vec![]);
        let mut child = ClassSpec::new("Child");
        child.extends("Nope");
        let err = table.add(child.def).unwrap_err();
        assert_eq!(err.to_string(), "Class \"Nope\" not found");
    }

    #[test]
    fn test_implementing_a_class_rejected() {
        let mut table = Table(vec![]);
        table.add(ClassSpec::new("Plain").def).unwrap();
        let mut c = ClassSpec::new("C");
        c.implements("Plain");
        let err = table.add(c.def).unwrap_err();
        assert_eq!(err.to_string(), "C cannot implement Plain - it is not an interface");
    }

    #[test]
    fn test_abstract_class_may_defer_methods() {
        let mut table = Table(vec![]);
        table.add(ifoo().def).unwrap();
        let mut shape = ClassSpec::new("Shape");
        shape.abstract_class().implements("IFoo");
        let entry = table.add(shape.def).unwrap();
        assert!(entry.is_abstract());
        assert!(!entry.is_instantiable());
    }

    #[test]
    fn test_final_method_cannot_be_overridden() {
        let mut table = Table(vec![]);
        let mut base = ClassSpec::new("Base");
        base.add_method("id", Visibility::Public, |_, _, _| hostbind::ok(1))
            .final_method();
        table.add(base.def).unwrap();

        let mut child = ClassSpec::new("Child");
        child.extends("Base");
        child.add_method("id", Visibility::Public, |_, _, _| hostbind::ok(2));
        let err = table.add(child.def).unwrap_err();
        assert_eq!(err.to_string(), "Cannot override final method Base::id()");
    }

    fn single_method_interface() -> InterfaceSpec {
        let mut i = InterfaceSpec::new("IFoo");
        i.add_method("getValue");
        i
    }

    #[test]
    fn test_private_implementation_rejected() {
        let mut table = Table(vec![]);
        table.add(single_method_interface().def).unwrap();

        let mut foo = ClassSpec::new("Foo");
        foo.implements("IFoo");
        foo.add_method("getValue", Visibility::Private, |_, _, _| hostbind::ok(1));
        let err = table.add(foo.def).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Access level to Foo::getValue() must be public (as in class IFoo)"
        );
    }

    #[test]
    fn test_static_implementation_rejected() {
        let mut table = Table(vec![]);
        table.add(single_method_interface().def).unwrap();

        let mut foo = ClassSpec::new("Foo");
        foo.implements("IFoo");
        foo.add_static_method("getValue", Visibility::Public, |_, _| hostbind::ok(1));
        let err = table.add(foo.def).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot make non static method IFoo::getValue() static in class Foo"
        );
    }

    #[test]
    fn test_protected_override_may_widen() {
        let mut table = Table(vec![]);
        let mut base = ClassSpec::new("Base");
        base.add_method("hook", Visibility::Protected, |_, _, _| hostbind::ok(1));
        base.add_method("secret", Visibility::Private, |_, _, _| hostbind::ok(1));
        table.add(base.def).unwrap();

        let mut open = ClassSpec::new("Open");
        open.extends("Base");
        open.add_method("hook", Visibility::Public, |_, _, _| hostbind::ok(2));
        open.add_static_method("secret", Visibility::Public, |_, _| hostbind::ok(2));
        assert!(table.add(open.def).is_ok());

        let mut closed = ClassSpec::new("Closed");
        closed.extends("Base");
        closed.add_method("hook", Visibility::Private, |_, _, _| hostbind::ok(3));
        let err = table.add(closed.def).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Access level to Closed::hook() must be protected (as in class Base) or weaker"
        );
    }

    #[test]
    fn test_static_parent_method_stays_static() {
        let mut table = Table(vec![]);
        let mut base = ClassSpec::new("Base");
        base.add_static_method("make", Visibility::Public, |_, _| hostbind::ok(1));
        table.add(base.def).unwrap();

        let mut child = ClassSpec::new("Child");
        child.extends("Base");
        child.add_method("make", Visibility::Public, |_, _, _| hostbind::ok(2));
        let err = table.add(child.def).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot make static method Base::make() non static in class Child"
        );
    }
}
