//! Parameter and return type declarations

use std::fmt;
use std::sync::Arc;

use crate::error::RegistrationError;
use crate::value::Value;

/// A declared parameter or return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    /// Anything, including `null`
    Mixed,
    /// `null` only
    Null,
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `string`
    String,
    /// `array`
    Array,
    /// Any object
    Object,
    /// Callable value or function name
    Callable,
    /// Array or `Traversable` object
    Iterable,
    /// Return only: no value
    Void,
    /// Return only: never returns
    Never,
    /// Instance of a named class or interface
    ClassName(String),
}

impl DataType {
    /// Class type shorthand.
    pub fn class(name: impl Into<String>) -> Self {
        DataType::ClassName(name.into())
    }

    /// The host's spelling of the type
    pub fn name(&self) -> &str {
        match self {
            DataType::Mixed => "mixed",
            DataType::Null => "null",
            DataType::Bool => "bool",
            DataType::Int => "int",
            DataType::Float => "float",
            DataType::String => "string",
            DataType::Array => "array",
            DataType::Object => "object",
            DataType::Callable => "callable",
            DataType::Iterable => "iterable",
            DataType::Void => "void",
            DataType::Never => "never",
            DataType::ClassName(name) => name,
        }
    }

    /// Whether `?T` is meaningful for this type.
    fn can_be_nullable(&self) -> bool {
        !matches!(
            self,
            DataType::Mixed | DataType::Null | DataType::Void | DataType::Never
        )
    }

    /// Spelling with the nullable marker applied.
    pub(crate) fn display(&self, nullable: bool) -> String {
        if nullable && self.can_be_nullable() {
            format!("?{}", self.name())
        } else {
            self.name().to_string()
        }
    }

    /// Whether `null` satisfies the type with the given nullable flag.
    pub(crate) fn accepts_null(&self, nullable: bool) -> bool {
        nullable || matches!(self, DataType::Mixed | DataType::Null)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Type alias for lazily evaluated defaults
pub type DefaultThunk = Arc<dyn Fn() -> Value + Send + Sync>;

/// Default for an optional parameter.
#[derive(Clone)]
pub enum DefaultValue {
    /// Fixed value
    Value(Value),
    /// Computed each time the parameter is omitted
    Lazy(DefaultThunk),
}

impl DefaultValue {
    /// Produce the default.
    pub fn evaluate(&self) -> Value {
        match self {
            DefaultValue::Value(v) => v.clone(),
            DefaultValue::Lazy(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(v) => write!(f, "{v:?}"),
            DefaultValue::Lazy(_) => write!(f, "<lazy>"),
        }
    }
}

/// A declared parameter.
///
/// ```
/// use hostbind::{DataType, Parameter, Value};
///
/// let p = Parameter::new("count").typed(DataType::Int).default(10);
/// assert!(p.is_optional());
/// assert_eq!(p.default_value(), Some(Value::Int(10)));
/// ```
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    data_type: Option<DataType>,
    nullable: bool,
    required: bool,
    default: Option<DefaultValue>,
    variadic: bool,
    by_ref: bool,
}

impl Parameter {
    /// A required, untyped parameter.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            nullable: false,
            required: true,
            default: None,
            variadic: false,
            by_ref: false,
        }
    }

    /// Declare the type.
    pub fn typed(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Allow `null` in addition to the declared type.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Make the parameter optional without a default.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Optional with a fixed default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.required = false;
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Optional with a default computed on demand.
    pub fn default_with(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.required = false;
        self.default = Some(DefaultValue::Lazy(Arc::new(f)));
        self
    }

    /// Capture every remaining argument.
    pub fn variadic(mut self) -> Self {
        self.required = false;
        self.variadic = true;
        self
    }

    /// Receive the caller's slot instead of a copy.
    pub fn by_ref(mut self) -> Self {
        self.by_ref = true;
        self
    }

    /// Parameter name, without `$`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type, if any
    pub fn data_type(&self) -> Option<&DataType> {
        self.data_type.as_ref()
    }

    /// Declared type as the host spells it, if any
    pub fn type_name(&self) -> Option<String> {
        self.data_type.as_ref().map(|t| t.display(self.nullable))
    }

    /// Whether `null` is accepted
    pub fn allows_null(&self) -> bool {
        match &self.data_type {
            None => true,
            Some(t) => t.accepts_null(self.nullable),
        }
    }

    /// Whether the nullable marker was declared
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Whether the caller must supply it
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether it may be omitted
    pub fn is_optional(&self) -> bool {
        !self.required
    }

    /// Whether it captures remaining arguments
    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    /// Whether it is passed by reference
    pub fn is_by_ref(&self) -> bool {
        self.by_ref
    }

    /// Whether a default is declared
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    /// Evaluate the declared default.
    pub fn default_value(&self) -> Option<Value> {
        self.default.as_ref().map(DefaultValue::evaluate)
    }

    /// Declared type for checks; untyped is `mixed`.
    pub(crate) fn effective_type(&self) -> &DataType {
        self.data_type.as_ref().unwrap_or(&DataType::Mixed)
    }
}

/// A declared return type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnType {
    data_type: DataType,
    nullable: bool,
}

impl ReturnType {
    /// Return type of the given kind.
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            nullable: false,
        }
    }

    /// Allow `null` as well.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Declared type
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Whether `null` is allowed
    pub fn allows_null(&self) -> bool {
        self.data_type.accepts_null(self.nullable)
    }

    /// Whether the nullable marker was declared
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Host spelling
    pub fn type_name(&self) -> String {
        self.data_type.display(self.nullable)
    }
}

/// A function or method signature.
#[derive(Debug, Clone)]
pub struct Signature {
    pub(crate) name: String,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) return_type: Option<ReturnType>,
}

impl Signature {
    /// Empty signature for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            return_type: None,
        }
    }

    /// Function or method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameters in order
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Declared return type
    pub fn return_type(&self) -> Option<&ReturnType> {
        self.return_type.as_ref()
    }

    /// Number of parameters the caller must supply
    pub fn required_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.required).count()
    }

    /// The variadic parameter, if declared
    pub fn variadic(&self) -> Option<&Parameter> {
        self.parameters.last().filter(|p| p.variadic)
    }

    /// Reject declarations the host would refuse to compile.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        let mut seen_optional: Option<&str> = None;
        for (i, p) in self.parameters.iter().enumerate() {
            if let Some(t @ (DataType::Void | DataType::Never)) = &p.data_type {
                return Err(RegistrationError::new(format!(
                    "{}(): {} cannot be used as a parameter type",
                    self.name,
                    t.name()
                )));
            }
            if self.parameters[..i].iter().any(|q| q.name == p.name) {
                return Err(RegistrationError::new(format!(
                    "{}(): Redefinition of parameter ${}",
                    self.name, p.name
                )));
            }
            if p.variadic && i + 1 != self.parameters.len() {
                return Err(RegistrationError::new(format!(
                    "{}(): Only the last parameter can be variadic",
                    self.name
                )));
            }
            if p.required {
                if let Some(optional) = seen_optional {
                    return Err(RegistrationError::new(format!(
                        "{}(): required parameter ${} follows optional parameter ${}",
                        self.name, p.name, optional
                    )));
                }
            } else if seen_optional.is_none() {
                seen_optional = Some(&p.name);
            }
        }
        Ok(())
    }
}
