//! Argument binding: arity, named arguments, defaults and type coercion
//!
//! Coercion is a fixed priority chain: exact kind, then int to float
//! widening, then `null` for nullable parameters. Anything else is a
//! [`TypeMismatchError`]. The binder never casts.

use std::ops::Index;

use indexmap::IndexMap;

use super::signature::{DataType, Parameter, ReturnType, Signature};
use crate::config::DefaultValueMode;
use crate::error::{
    ArityError, Error, Result, RuntimeError, RuntimeErrorKind, TypeMismatchError,
};
use crate::object::ObjectRef;
use crate::value::{FromValue, Reference, Value};

/// What the binder needs to know about the host's classes and functions.
pub trait TypeOracle {
    /// Class name of a live object
    fn class_of(&self, object: ObjectRef) -> Option<String>;

    /// Whether the object is an instance of `class` (or implements it)
    fn instance_of(&self, object: ObjectRef, class: &str) -> bool;

    /// Whether a string names a callable function
    fn is_function(&self, name: &str) -> bool;

    /// How declared defaults are surfaced
    fn default_value_mode(&self) -> DefaultValueMode {
        DefaultValueMode::Preserve
    }
}

static NULL: Value = Value::Null;

/// Arguments after binding, one slot per declared parameter.
///
/// A slot is empty only for an omitted optional parameter without a
/// default.
#[derive(Debug, Clone)]
pub struct Arguments {
    function: String,
    names: Vec<String>,
    slots: Vec<Option<Value>>,
    extra: Vec<Value>,
    named_extra: IndexMap<String, Value>,
}

impl Arguments {
    /// Function or `Class::method` the arguments were bound for
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Number of declared (non-variadic) parameters
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the signature declares no parameters
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Bound value at `index`, `None` if omitted without a default.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Bound value by parameter name.
    pub fn by_name(&self, name: &str) -> Option<&Value> {
        let index = self.names.iter().position(|n| n == name)?;
        self.get(index)
    }

    /// Whether the caller (or a default) supplied the slot
    pub fn is_passed(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Convert the slot into a native type. Omitted slots read as `null`.
    pub fn extract<T: FromValue>(&self, index: usize) -> Result<T> {
        Ok(T::from_value(self[index].clone())?)
    }

    /// Take the slot's value, leaving it empty.
    pub fn take(&mut self, index: usize) -> Value {
        self.slots
            .get_mut(index)
            .and_then(Option::take)
            .unwrap_or(Value::Null)
    }

    /// The reference slot behind a by-reference parameter.
    pub fn reference(&self, index: usize) -> Option<&Reference> {
        self.get(index).and_then(Value::as_reference)
    }

    /// Arguments captured by the variadic parameter
    pub fn extra(&self) -> &[Value] {
        &self.extra
    }

    /// Named arguments captured by the variadic parameter
    pub fn named_extra(&self) -> &IndexMap<String, Value> {
        &self.named_extra
    }

    /// Every bound value in order, `null` for empty slots.
    pub fn to_values(&self) -> Vec<Value> {
        self.slots
            .iter()
            .map(|s| s.clone().unwrap_or(Value::Null))
            .chain(self.extra.iter().cloned())
            .collect()
    }
}

impl Index<usize> for Arguments {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.get(index).unwrap_or(&NULL)
    }
}

/// Bind supplied arguments to a signature.
///
/// `function` is the name used in diagnostics (`f` or `Class::method`).
pub fn bind(
    oracle: &dyn TypeOracle,
    function: &str,
    signature: &Signature,
    positional: Vec<Value>,
    named: Vec<(String, Value)>,
) -> Result<Arguments> {
    let params = signature.parameters();
    let required = signature.required_count();
    let given = positional.len() + named.len();
    if given < required {
        return Err(ArityError::too_few(function, required, given).into());
    }

    let variadic = signature.variadic();
    let fixed = params.len() - usize::from(variadic.is_some());
    let mut slots: Vec<Option<Value>> = vec![None; fixed];
    let mut extra = Vec::new();
    let mut named_extra = IndexMap::new();

    for (i, value) in positional.into_iter().enumerate() {
        if i < fixed {
            slots[i] = Some(value);
        } else if variadic.is_some() {
            extra.push(value);
        }
    }

    for (name, value) in named {
        match params[..fixed].iter().position(|p| p.name() == name) {
            Some(i) if slots[i].is_some() => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::NamedArgument,
                    format!("Named parameter ${name} overwrites previous argument"),
                )
                .into());
            }
            Some(i) => slots[i] = Some(value),
            None if variadic.is_some() => {
                named_extra.insert(name, value);
            }
            None => {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::NamedArgument,
                    format!("Unknown named parameter ${name}"),
                )
                .into());
            }
        }
    }

    for (i, param) in params[..fixed].iter().enumerate() {
        slots[i] = match slots[i].take() {
            Some(value) => Some(coerce(oracle, param, value)?),
            None => match param.default_value() {
                Some(default) => Some(apply_default_mode(oracle.default_value_mode(), default)),
                None if param.is_required() => {
                    return Err(
                        ArityError::not_passed(function, i + 1, param.name(), required, given)
                            .into(),
                    );
                }
                None => None,
            },
        };
    }

    if let Some(param) = variadic {
        extra = extra
            .into_iter()
            .map(|v| coerce(oracle, param, v))
            .collect::<Result<_>>()?;
        for value in named_extra.values_mut() {
            *value = coerce(oracle, param, std::mem::take(value))?;
        }
    }

    Ok(Arguments {
        function: function.to_string(),
        names: params[..fixed].iter().map(|p| p.name().to_string()).collect(),
        slots,
        extra,
        named_extra,
    })
}

/// Apply the configured representation to a declared default.
pub(crate) fn apply_default_mode(mode: DefaultValueMode, value: Value) -> Value {
    let scalar = matches!(value, Value::Int(_) | Value::Float(_) | Value::Bool(_));
    if mode == DefaultValueMode::Stringify && scalar {
        if let Some(s) = value.cast_string() {
            return Value::String(s);
        }
    }
    value
}

fn coerce(oracle: &dyn TypeOracle, param: &Parameter, value: Value) -> Result<Value> {
    let slot = match &value {
        Value::Reference(r) => Some(r.clone()),
        _ => None,
    };
    let coerced = check(
        oracle,
        param.effective_type(),
        param.allows_null(),
        value.unref(),
    )
    .map_err(|given| {
        TypeMismatchError::argument(
            param
                .data_type()
                .map_or("mixed".to_string(), |t| t.display(param.is_nullable())),
            given,
        )
    })?;

    if param.is_by_ref() {
        let slot = slot.unwrap_or_else(|| Reference::new(Value::Null));
        slot.set(coerced);
        return Ok(Value::Reference(slot));
    }
    Ok(coerced)
}

/// Run the coercion chain. On failure, returns the given type's name.
fn check(
    oracle: &dyn TypeOracle,
    data_type: &DataType,
    allows_null: bool,
    value: Value,
) -> std::result::Result<Value, String> {
    let exact = match (data_type, &value) {
        (DataType::Mixed, _) => true,
        (DataType::Null, Value::Null) => true,
        (DataType::Bool, Value::Bool(_)) => true,
        (DataType::Int, Value::Int(_)) => true,
        (DataType::Float, Value::Float(_)) => true,
        (DataType::String, Value::String(_)) => true,
        (DataType::Array, Value::Array(_)) => true,
        (DataType::Object, Value::Object(_)) => true,
        (DataType::Callable, Value::Callable(_)) => true,
        (DataType::Callable, Value::String(s)) => {
            s.to_str().is_some_and(|name| oracle.is_function(name))
        }
        (DataType::Iterable, Value::Array(_)) => true,
        (DataType::Iterable, Value::Object(o)) => oracle.instance_of(*o, "Traversable"),
        (DataType::ClassName(class), Value::Object(o)) => oracle.instance_of(*o, class),
        _ => false,
    };
    if exact {
        return Ok(value);
    }

    if let (DataType::Float, Value::Int(i)) = (data_type, &value) {
        return Ok(Value::Float(*i as f64));
    }

    if allows_null && matches!(value, Value::Null) {
        return Ok(value);
    }

    Err(given_name(oracle, &value))
}

fn given_name(oracle: &dyn TypeOracle, value: &Value) -> String {
    match value {
        Value::Object(o) => oracle
            .class_of(*o)
            .unwrap_or_else(|| "object".to_string()),
        Value::Callable(_) => "Closure".to_string(),
        other => other.type_name().to_string(),
    }
}

/// Check a handler result against the declared return type.
pub fn check_return(
    oracle: &dyn TypeOracle,
    function: &str,
    return_type: &ReturnType,
    value: Value,
) -> Result<Value> {
    match return_type.data_type() {
        DataType::Void => {
            if value.is_null() {
                Ok(Value::Null)
            } else {
                Err(TypeMismatchError::return_value(
                    function,
                    "void",
                    given_name(oracle, &value.unref()),
                )
                .into())
            }
        }
        DataType::Never => Err(TypeMismatchError::never_returned(function).into()),
        data_type => check(oracle, data_type, return_type.allows_null(), value.unref()).map_err(
            |given| -> Error {
                TypeMismatchError::return_value(function, return_type.type_name(), given).into()
            },
        ),
    }
}
