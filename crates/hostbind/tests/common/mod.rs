//! Shared fixture: one extension module exercising every declaration kind

#![allow(dead_code)]

use hostbind::*;

/// Native state of `Bag`: a list with a cursor.
#[derive(Debug, Default)]
pub struct Bag {
    pub items: Vec<Value>,
    cursor: usize,
}

impl NativeIterator for Bag {
    fn current(&self) -> Value {
        self.items.get(self.cursor).cloned().unwrap_or_default()
    }

    fn key(&self) -> Value {
        Value::from(self.cursor)
    }

    fn next(&mut self) {
        self.cursor += 1;
    }

    fn rewind(&mut self) {
        self.cursor = 0;
    }

    fn valid(&self) -> bool {
        self.cursor < self.items.len()
    }
}

impl NativeArrayAccess for Bag {
    fn offset_get(&self, offset: &Value) -> Result<Value> {
        let index = offset.cast_int();
        usize::try_from(index)
            .ok()
            .and_then(|i| self.items.get(i))
            .cloned()
            .ok_or_else(|| {
                Error::Throw(Exception::new("RuntimeException", format!("No item at {index}")))
            })
    }

    fn offset_set(&mut self, offset: Option<Value>, value: Value) -> Result<()> {
        match offset.map(|o| o.cast_int()) {
            None => self.items.push(value),
            Some(i) => match usize::try_from(i).ok().filter(|&i| i < self.items.len()) {
                Some(i) => self.items[i] = value,
                None => self.items.push(value),
            },
        }
        Ok(())
    }

    fn offset_exists(&self, offset: &Value) -> bool {
        usize::try_from(offset.cast_int()).is_ok_and(|i| i < self.items.len())
    }

    fn offset_unset(&mut self, offset: &Value) {
        if let Ok(i) = usize::try_from(offset.cast_int()) {
            if i < self.items.len() {
                self.items.remove(i);
            }
        }
    }
}

fn argument_functions(module: &mut Module) {
    module
        .add_function("integrate_arguments_null", |_, _| ok(()))
        .argument(Parameter::new("n").typed(DataType::Null));

    module
        .add_function("integrate_arguments_long", |_, args| {
            let a = args.extract::<i64>(0)?;
            let b = args.extract::<i64>(1)?;
            Ok::<_, Error>(a + b)
        })
        .argument(Parameter::new("a").typed(DataType::Int))
        .argument(Parameter::new("b").typed(DataType::Int))
        .returns(ReturnType::new(DataType::Int));

    module
        .add_function("integrate_arguments_double", |_, args| {
            args.extract::<f64>(0)
        })
        .argument(Parameter::new("d").typed(DataType::Float))
        .returns(ReturnType::new(DataType::Float));

    module
        .add_function("integrate_arguments_string", |_, args| {
            let a = args.extract::<String>(0)?;
            let b = args.extract::<String>(1)?;
            Ok::<_, Error>(format!("{a}, {b}"))
        })
        .argument(Parameter::new("a").typed(DataType::String))
        .argument(Parameter::new("b").typed(DataType::String))
        .returns(ReturnType::new(DataType::String));

    module
        .add_function("integrate_arguments_array", |_, args| {
            let mut a = args.extract::<Array>(0)?;
            a.insert("a", 1);
            a.insert("foo", "bar");
            Ok::<_, Error>(a)
        })
        .argument(Parameter::new("arr").typed(DataType::Array))
        .returns(ReturnType::new(DataType::Array));

    module
        .add_function("integrate_arguments_object", |rt, args| {
            let source = args.extract::<ObjectRef>(0)?;
            let copy = rt.clone_object(source)?;
            rt.set_property(copy, "foo", Value::from("bar"))?;
            Ok::<_, Error>(copy)
        })
        .argument(Parameter::new("obj").typed(DataType::Object))
        .returns(ReturnType::new(DataType::Object));

    module
        .add_function("integrate_arguments_optional", |_, args| {
            let a = args.extract::<String>(0)?;
            let b = args.extract::<bool>(1)?;
            Ok::<_, Error>(format!("{a}: {b}"))
        })
        .argument(Parameter::new("a").typed(DataType::String))
        .argument(Parameter::new("b").typed(DataType::Bool).default(false))
        .returns(ReturnType::new(DataType::String));

    module
        .add_function("integrate_arguments_nullable", |_, args| {
            let n = args.extract::<Option<i64>>(0)?;
            Ok::<_, Error>(n.map_or("none".to_string(), |n| n.to_string()))
        })
        .argument(Parameter::new("n").typed(DataType::Int).nullable());

    module
        .add_function("integrate_sum", |_, args| {
            let total = args
                .extra()
                .iter()
                .map(|v| v.as_int().unwrap_or_default())
                .sum::<i64>();
            ok(total)
        })
        .argument(Parameter::new("numbers").typed(DataType::Int).variadic())
        .returns(ReturnType::new(DataType::Int));

    module
        .add_function("integrate_swap", |_, args| {
            let (Some(a), Some(b)) = (args.reference(0), args.reference(1)) else {
                return ok(());
            };
            let first = a.get();
            a.set(b.replace(first));
            ok(())
        })
        .argument(Parameter::new("a").by_ref())
        .argument(Parameter::new("b").by_ref())
        .returns(ReturnType::new(DataType::Void));

    module
        .add_function("integrate_apply", |rt, args| {
            let callable = args[0].clone();
            let rest = args.extra().to_vec();
            rt.call(&callable, &rest)
        })
        .argument(Parameter::new("f").typed(DataType::Callable))
        .argument(Parameter::new("args").variadic());

    module
        .add_function("integrate_bad_return", |_, _| ok("not an int"))
        .returns(ReturnType::new(DataType::Int));

    module.add_function("integrate_panic", |_, _| -> Result<Value> {
        panic!("native code gave up")
    });

    module
        .add_function("integrate_throw", |rt, args| -> Result<Value> {
            let message = args.extract::<String>(0)?;
            Err(rt.throw_new("IntegrationException", message))
        })
        .argument(Parameter::new("message").typed(DataType::String));
}

fn classes(module: &mut Module) {
    // A: private state set by the constructor.
    let mut a = ClassSpec::new("A");
    a.add_property("name", Visibility::Private, "default");
    a.add_property("number", Visibility::Private, 100);
    a.add_method("__construct", Visibility::Public, |rt, this, args| {
        rt.set_property(this, "name", args.take(0))?;
        rt.set_property(this, "number", args.take(1))?;
        Ok::<_, Error>(())
    })
    .argument(Parameter::new("name").typed(DataType::String))
    .argument(Parameter::new("number").typed(DataType::Int));
    a.add_method("speak", Visibility::Public, |rt, this, _| {
        let name = rt.get_property(this, "name")?;
        let number = rt.get_property(this, "number")?;
        Ok::<_, Error>(format!("name: {name}, number: {number}"))
    })
    .returns(ReturnType::new(DataType::String));
    a.add_method("secret", Visibility::Private, |_, _, _| ok("hidden"));
    a.add_static_method("make", Visibility::Public, |rt, args| {
        let name = args[0].clone();
        rt.new_object("A", &[name, Value::Int(1)])
    })
    .argument(Parameter::new("name").typed(DataType::String));
    module.add_class(a);

    // B: no clone capability.
    let mut b = ClassSpec::new("B");
    b.add_property("id", Visibility::Public, 1);
    module.add_class(b);

    // Counter: native state copied on clone.
    let mut counter = ClassSpec::<i64>::with_state_constructor("Counter", || 123456);
    counter.cloneable();
    counter
        .add_method("incr", Visibility::Public, |rt, this, _| {
            *rt.state_mut::<i64>(this)? += 1;
            Ok::<_, Error>(())
        })
        .returns(ReturnType::new(DataType::Void));
    counter
        .add_method("get", Visibility::Public, |rt, this, _| {
            rt.state::<i64>(this).copied()
        })
        .returns(ReturnType::new(DataType::Int));
    module.add_class(counter);

    // Bag: iteration and array access over native state.
    let mut bag = ClassSpec::<Bag>::with_default_state("Bag");
    bag.iterable().array_access();
    module.add_class(bag);

    // Label: string cast.
    let mut label = ClassSpec::new("Label");
    label.add_property("text", Visibility::Public, "");
    label.stringable(|rt, this| rt.raw_property(this, "text").map(|v| v.to_string()));
    module.add_class(label);

    // Point: readonly coordinates.
    let mut point = ClassSpec::new("Point");
    point.add_property("x", Visibility::Public, ()).readonly();
    point.add_property("y", Visibility::Public, ()).readonly();
    point
        .add_method("__construct", Visibility::Public, |rt, this, args| {
            rt.set_property(this, "x", args.take(0))?;
            rt.set_property(this, "y", args.take(1))?;
            Ok::<_, Error>(())
        })
        .argument(Parameter::new("x").typed(DataType::Int))
        .argument(Parameter::new("y").typed(DataType::Int).default(0));
    module.add_class(point);

    // Registry: statics and constants.
    let mut config = ClassSpec::new("Settings");
    config.add_static_property("instances", Visibility::Public, 0);
    config.add_static_property("token", Visibility::Private, "s3cret");
    config.add_constant("VERSION", "1.2.3");
    config.add_static_method("token", Visibility::Public, |rt, _| {
        rt.get_static("Settings", "token")
    });
    module.add_class(config);

    // Interface and its implementation.
    let mut foo_iface = InterfaceSpec::new("IFoo");
    foo_iface
        .add_method("getValue")
        .returns(ReturnType::new(DataType::Int));
    foo_iface.add_constant("ANSWER", 42);
    module.add_interface(foo_iface);

    let mut foo = ClassSpec::new("Foo");
    foo.implements("IFoo");
    foo.add_property("value", Visibility::Protected, 7);
    foo.add_method("getValue", Visibility::Public, |rt, this, _| {
        rt.get_property(this, "value")
    })
    .returns(ReturnType::new(DataType::Int));
    module.add_class(foo);

    // Abstract base with a concrete child.
    let mut shape = ClassSpec::new("Shape");
    shape.abstract_class();
    shape
        .add_abstract_method("area", Visibility::Public)
        .returns(ReturnType::new(DataType::Float));
    shape.add_method("describe", Visibility::Public, |rt, this, _| {
        let area = rt.call_method(this, "area", &[])?;
        Ok::<_, Error>(format!("area {area}"))
    });
    module.add_class(shape);

    let mut square = ClassSpec::new("Square");
    square.extends("Shape");
    square.add_property("side", Visibility::Protected, 2.0);
    square
        .add_method("area", Visibility::Public, |rt, this, _| {
            let side = rt.get_property(this, "side")?.cast_float();
            Ok::<_, Error>(side * side)
        })
        .returns(ReturnType::new(DataType::Float));
    module.add_class(square);
}

fn enums(module: &mut Module) {
    let mut pure = EnumSpec::new("PureEnum", BackingKind::None);
    pure.add_case("One", ());
    pure.add_case("Two", ());
    pure.add_constant("ONE", "one");
    module.add_enum(pure);

    let mut int = EnumSpec::new("IntEnum", BackingKind::Int);
    int.add_case("Low", 1);
    int.add_case("High", 10);
    int.add_method("label", Visibility::Public, |rt, this, _| {
        let name = rt.case_name(this)?;
        Ok::<_, Error>(name.to_ascii_lowercase())
    });
    module.add_enum(int);

    let mut color = EnumSpec::new("StringEnum", BackingKind::String);
    color.add_case("Red", "FF0000");
    color.add_case("Green", "00FF00");
    color.add_case("Blue", "0000FF");
    module.add_enum(color);
}

fn exceptions(module: &mut Module) {
    let mut base = ExceptionSpec::new("IntegrationException");
    base.default_code(42);
    module.add_exception(base);

    let mut child = ExceptionSpec::new("IntegrationChildException");
    child.extends("IntegrationException");
    module.add_exception(child);
}

fn ini(module: &mut Module) {
    module
        .add_ini("integration.enabled", true, Policy::All)
        .add_ini("integration.limit", 100_i64, Policy::User)
        .add_ini("integration.ratio", 1.5_f64, Policy::All)
        .add_ini("integration.name", "hostbind", Policy::All)
        .add_ini("integration.locked", "fixed", Policy::System);
}

/// The full integration module.
pub fn module() -> Module {
    let mut module = Module::new("integration", "1.0.0", "hostbind");
    module.add_info("integration support", "enabled");
    argument_functions(&mut module);
    classes(&mut module);
    enums(&mut module);
    exceptions(&mut module);
    ini(&mut module);
    module
        .add_constant("INTEGRATION_VERSION", "1.0.0")
        .add_constant("INTEGRATION_MAX", 255);
    module
}

/// A fresh request against the integration module.
pub fn runtime() -> Runtime {
    Runtime::new(module().startup().expect("integration module starts"))
}

/// Host class and message of an error, as a script would see them.
pub fn thrown(err: &Error) -> (String, String) {
    let e = err.to_exception();
    (e.class().to_string(), e.message())
}
