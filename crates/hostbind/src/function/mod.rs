//! Function declarations and argument binding

mod binder;
mod signature;

pub use binder::{bind, check_return, Arguments, TypeOracle};
pub use signature::{DataType, DefaultThunk, DefaultValue, Parameter, ReturnType, Signature};

pub(crate) use binder::apply_default_mode;

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::object::ObjectRef;
use crate::runtime::Runtime;
use crate::value::Value;

/// Type-erased native handler.
///
/// The receiver is `Some` for instance methods and `None` for functions and
/// static methods.
pub type Handler =
    Arc<dyn Fn(&mut Runtime, Option<ObjectRef>, &mut Arguments) -> Result<Value> + Send + Sync>;

/// Erase a function-style handler.
pub(crate) fn function_handler<F, R, E>(handler: F) -> Handler
where
    F: Fn(&mut Runtime, &mut Arguments) -> std::result::Result<R, E> + Send + Sync + 'static,
    R: Into<Value>,
    E: Into<Error>,
{
    Arc::new(
        move |rt: &mut Runtime, _: Option<ObjectRef>, args: &mut Arguments| {
            handler(rt, args).map(Into::into).map_err(Into::into)
        },
    )
}

/// A registered function: signature plus native handler.
#[derive(Clone)]
pub struct FunctionSpec {
    pub(crate) signature: Signature,
    pub(crate) handler: Handler,
}

impl FunctionSpec {
    /// Declare a function.
    pub fn new<F, R, E>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Runtime, &mut Arguments) -> std::result::Result<R, E> + Send + Sync + 'static,
        R: Into<Value>,
        E: Into<Error>,
    {
        Self {
            signature: Signature::new(name),
            handler: function_handler(handler),
        }
    }

    pub(crate) fn from_handler(name: impl Into<String>, handler: Handler) -> Self {
        Self {
            signature: Signature::new(name),
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

    /// Function name
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Full signature
    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

impl fmt::Debug for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSpec")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let mut f = FunctionSpec::new("add", |_, args| {
            Ok::<_, Error>(args.extract::<i64>(0)? + args.extract::<i64>(1)?)
        });
        f.argument(Parameter::new("a").typed(DataType::Int))
            .argument(Parameter::new("b").typed(DataType::Int))
            .returns(ReturnType::new(DataType::Int));

        assert_eq!(f.name(), "add");
        assert_eq!(f.signature().parameters().len(), 2);
        assert_eq!(f.signature().required_count(), 2);
        assert_eq!(
            f.signature().return_type().map(ReturnType::type_name),
            Some("int".to_string())
        );
    }
}
