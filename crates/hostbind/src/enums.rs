//! Pure and backed enums
//!
//! Case objects are singletons: the runtime allocates one pinned object
//! per case before anything else, in registry order, so a case has the
//! same [`ObjectRef`] in every worker and for the whole process.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::class::{
    method_handler, ClassDef, ClassEntry, ClassKind, MethodSpec, PropertySpec, Visibility,
};
use crate::error::{
    CaseLookup, CaseNotFoundError, Error, RegistrationError, Result, RuntimeError,
    RuntimeErrorKind,
};
use crate::function::{function_handler, Arguments, DataType, Parameter, ReturnType};
use crate::object::ObjectRef;
use crate::runtime::Runtime;
use crate::value::Value;

/// Backing type of an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BackingKind {
    /// Pure enum, cases have no value
    #[default]
    None,
    /// Cases carry an int
    Int,
    /// Cases carry a string
    String,
}

impl BackingKind {
    /// Host type name of the backing value
    pub fn type_name(self) -> Option<&'static str> {
        match self {
            BackingKind::None => None,
            BackingKind::Int => Some("int"),
            BackingKind::String => Some("string"),
        }
    }

    fn data_type(self) -> DataType {
        match self {
            BackingKind::None => DataType::Mixed,
            BackingKind::Int => DataType::Int,
            BackingKind::String => DataType::String,
        }
    }

    fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (BackingKind::Int, Value::Int(_)) | (BackingKind::String, Value::String(_))
        )
    }
}

/// Handle naming one declared case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumCase {
    enum_name: String,
    case_name: String,
}

impl EnumCase {
    /// Enum class name
    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }

    /// Case name
    pub fn name(&self) -> &str {
        &self.case_name
    }
}

impl fmt::Display for EnumCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.enum_name, self.case_name)
    }
}

/// A case after registration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CaseEntry {
    pub(crate) name: String,
    pub(crate) value: Option<Value>,
    pub(crate) slot: u32,
}

/// Enum metadata attached to a materialized class entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EnumInfo {
    pub(crate) backing: BackingKind,
    pub(crate) cases: IndexMap<String, CaseEntry>,
}

impl EnumInfo {
    pub(crate) fn case_by_value(&self, value: &Value) -> Option<&CaseEntry> {
        self.cases
            .values()
            .find(|c| c.value.as_ref() == Some(value))
    }
}

/// Declaration of an enum.
///
/// ```
/// use hostbind::{BackingKind, EnumSpec};
///
/// let mut color = EnumSpec::new("Color", BackingKind::String);
/// let red = color.add_case("RED", "FF0000");
/// color.add_case("GREEN", "00FF00");
/// assert_eq!(red.to_string(), "Color::RED");
/// ```
#[derive(Clone)]
pub struct EnumSpec {
    def: ClassDef,
    backing: BackingKind,
    cases: Vec<(String, Value)>,
}

impl EnumSpec {
    /// Declare an enum with the given backing type.
    pub fn new(name: impl Into<String>, backing: BackingKind) -> Self {
        let mut def = ClassDef::new(name, ClassKind::Enum);
        def.is_final = true;
        Self {
            def,
            backing,
            cases: Vec::new(),
        }
    }

    /// Enum name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Backing type
    pub fn backing(&self) -> BackingKind {
        self.backing
    }

    /// Declare a case. Pass `()` for cases of a pure enum.
    pub fn add_case(&mut self, name: impl Into<String>, value: impl Into<Value>) -> EnumCase {
        let case_name = name.into();
        self.cases.push((case_name.clone(), value.into()));
        EnumCase {
            enum_name: self.def.name.clone(),
            case_name,
        }
    }

    /// Declare a constant.
    pub fn add_constant(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.def.constants.push((name.into(), value.into()));
        self
    }

    /// Implement a registered interface.
    pub fn implements(&mut self, interface: impl AsRef<str>) -> &mut Self {
        self.def.implement(interface.as_ref());
        self
    }

    /// Declare a method callable on cases.
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

    /// Validate cases and produce the class declaration plus the case list.
    pub(crate) fn into_parts(self) -> Result<(ClassDef, BackingKind, Vec<(String, Option<Value>)>)> {
        let Self {
            mut def,
            backing,
            cases,
        } = self;
        let enum_name = def.name.clone();

        let mut seen: IndexMap<String, Option<Value>> = IndexMap::new();
        for (case, value) in cases {
            if seen.contains_key(&case) || def.constants.iter().any(|(c, _)| *c == case) {
                return Err(RegistrationError::new(format!(
                    "Cannot redefine class constant {enum_name}::{case}"
                ))
                .into());
            }
            let value = match (backing, value) {
                (BackingKind::None, Value::Null) => None,
                (BackingKind::None, _) => {
                    return Err(RegistrationError::new(format!(
                        "Case {case} of non-backed enum {enum_name} must not have a value"
                    ))
                    .into());
                }
                (_, Value::Null) => {
                    return Err(RegistrationError::new(format!(
                        "Case {case} of backed enum {enum_name} must have a value"
                    ))
                    .into());
                }
                (kind, value) if !kind.accepts(&value) => {
                    return Err(RegistrationError::new(format!(
                        "Enum case type {} does not match enum backing type {}",
                        value.type_name(),
                        kind.type_name().unwrap_or("mixed"),
                    ))
                    .into());
                }
                (_, value) => {
                    if let Some((other, _)) = seen.iter().find(|(_, v)| v.as_ref() == Some(&value))
                    {
                        return Err(RegistrationError::new(format!(
                            "Duplicate value in enum {enum_name} for cases {other} and {case}"
                        ))
                        .into());
                    }
                    Some(value)
                }
            };
            seen.insert(case, value);
        }

        def.implement("UnitEnum");
        def.properties.push(readonly_property("name"));
        let cases_name = enum_name.clone();
        def.push_method(MethodSpec::new(
            "cases",
            Visibility::Public,
            true,
            Some(function_handler(move |rt: &mut Runtime, _: &mut Arguments| {
                let cases = rt.enum_cases(&cases_name)?;
                Ok::<_, Error>(Value::array(cases.into_iter().map(Value::Object).collect()))
            })),
        ))
        .returns(ReturnType::new(DataType::Array));

        if backing != BackingKind::None {
            def.implement("BackedEnum");
            def.properties.push(readonly_property("value"));

            let from_name = enum_name.clone();
            def.push_method(MethodSpec::new(
                "from",
                Visibility::Public,
                true,
                Some(function_handler(move |rt: &mut Runtime, args: &mut Arguments| {
                    rt.enum_from(&from_name, &args[0]).map(Value::Object)
                })),
            ))
            .argument(Parameter::new("value").typed(backing.data_type()))
            .returns(ReturnType::new(DataType::class(enum_name.clone())));

            let try_name = enum_name.clone();
            def.push_method(MethodSpec::new(
                "tryFrom",
                Visibility::Public,
                true,
                Some(function_handler(move |rt: &mut Runtime, args: &mut Arguments| {
                    rt.enum_try_from(&try_name, &args[0]).map(Value::from)
                })),
            ))
            .argument(Parameter::new("value").typed(backing.data_type()))
            .returns(ReturnType::new(DataType::class(enum_name.clone())).nullable());
        }

        Ok((def, backing, seen.into_iter().collect()))
    }
}

fn readonly_property(name: &str) -> PropertySpec {
    PropertySpec {
        name: name.to_string(),
        visibility: Visibility::Public,
        default: Value::Null,
        is_static: false,
        readonly: true,
    }
}

impl fmt::Debug for EnumSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumSpec")
            .field("name", &self.def.name)
            .field("backing", &self.backing)
            .field("cases", &self.cases)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════
// Runtime Lookups
// ═══════════════════════════════════════════════════════════════════

fn enum_info(entry: &ClassEntry) -> Result<&EnumInfo> {
    entry.enum_info().ok_or_else(|| {
        RuntimeError::new(
            RuntimeErrorKind::UndefinedMethod,
            format!("{} is not an enum", entry.name()),
        )
        .into()
    })
}

impl Runtime {
    fn enum_entry(&self, name: &str) -> Result<Arc<ClassEntry>> {
        let entry = self.class(name)?;
        enum_info(&entry)?;
        Ok(entry)
    }

    /// The singleton object of a case, by name.
    pub fn enum_case(&self, enum_name: &str, case: &str) -> Result<ObjectRef> {
        let entry = self.enum_entry(enum_name)?;
        let info = enum_info(&entry)?;
        info.cases
            .get(case)
            .map(|c| ObjectRef::new(c.slot, 0))
            .ok_or_else(|| {
                CaseNotFoundError {
                    enum_name: entry.name().to_string(),
                    lookup: CaseLookup::Name(case.to_string()),
                }
                .into()
            })
    }

    /// The singleton object of a declared case.
    pub fn case(&self, case: &EnumCase) -> Result<ObjectRef> {
        self.enum_case(&case.enum_name, &case.case_name)
    }

    /// Every case in declaration order.
    pub fn enum_cases(&self, enum_name: &str) -> Result<Vec<ObjectRef>> {
        let entry = self.enum_entry(enum_name)?;
        Ok(enum_info(&entry)?
            .cases
            .values()
            .map(|c| ObjectRef::new(c.slot, 0))
            .collect())
    }

    /// The case whose backing value is `value`, or `None`.
    pub fn enum_try_from(&self, enum_name: &str, value: &Value) -> Result<Option<ObjectRef>> {
        let entry = self.enum_entry(enum_name)?;
        let info = enum_info(&entry)?;
        if info.backing == BackingKind::None {
            return Err(RuntimeError::new(
                RuntimeErrorKind::UndefinedMethod,
                format!("Call to undefined method {}::tryFrom()", entry.name()),
            )
            .into());
        }
        Ok(info
            .case_by_value(&value.unref())
            .map(|c| ObjectRef::new(c.slot, 0)))
    }

    /// The case whose backing value is `value`.
    pub fn enum_from(&self, enum_name: &str, value: &Value) -> Result<ObjectRef> {
        self.enum_try_from(enum_name, value)?.ok_or_else(|| {
            CaseNotFoundError {
                enum_name: enum_name.to_string(),
                lookup: CaseLookup::Value(value.unref()),
            }
            .into()
        })
    }

    /// Name of a case object.
    pub fn case_name(&self, case: ObjectRef) -> Result<String> {
        Ok(self.raw_property(case, "name")?.to_string())
    }

    /// Backing value of a case object; `null` for pure enums.
    pub fn case_value(&self, case: ObjectRef) -> Result<Value> {
        let entry = self.class_of(case)?;
        if enum_info(&entry)?.backing == BackingKind::None {
            return Ok(Value::Null);
        }
        self.raw_property(case, "value")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(r: Result<(ClassDef, BackingKind, Vec<(String, Option<Value>)>)>) -> String {
        match r {
            Ok(_) => panic!("expected registration error"),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_pure_enum_parts() {
        let mut spec = EnumSpec::new("Suit", BackingKind::None);
        spec.add_case("Hearts", ());
        spec.add_case("Spades", ());
        let (def, backing, cases) = spec.into_parts().unwrap();
        assert_eq!(backing, BackingKind::None);
        assert_eq!(cases.len(), 2);
        assert_eq!(def.interfaces, vec!["UnitEnum".to_string()]);
        assert!(def.methods.iter().any(|m| m.name() == "cases"));
        assert!(!def.methods.iter().any(|m| m.name() == "from"));
    }

    #[test]
    fn test_backed_enum_generates_from() {
        let mut spec = EnumSpec::new("Level", BackingKind::Int);
        spec.add_case("LOW", 1);
        let (def, _, cases) = spec.into_parts().unwrap();
        assert_eq!(cases[0], ("LOW".to_string(), Some(Value::Int(1))));
        assert!(def.interfaces.contains(&"BackedEnum".to_string()));
        let names: Vec<_> = def.methods.iter().map(MethodSpec::name).collect();
        assert_eq!(names, vec!["cases", "from", "tryFrom"]);
    }

    #[test]
    fn test_duplicate_value_rejected() {
        let mut spec = EnumSpec::new("Level", BackingKind::Int);
        spec.add_case("LOW", 1);
        spec.add_case("ALSO_LOW", 1);
        assert_eq!(
            message(spec.into_parts()),
            "Duplicate value in enum Level for cases LOW and ALSO_LOW"
        );
    }

    #[test]
    fn test_value_rules() {
        let mut pure = EnumSpec::new("Suit", BackingKind::None);
        pure.add_case("Hearts", 1);
        assert_eq!(
            message(pure.into_parts()),
            "Case Hearts of non-backed enum Suit must not have a value"
        );

        let mut backed = EnumSpec::new("Color", BackingKind::String);
        backed.add_case("RED", ());
        assert_eq!(
            message(backed.into_parts()),
            "Case RED of backed enum Color must have a value"
        );

        let mut mismatched = EnumSpec::new("Color", BackingKind::String);
        mismatched.add_case("RED", 1);
        assert_eq!(
            message(mismatched.into_parts()),
            "Enum case type int does not match enum backing type string"
        );
    }

    #[test]
    fn test_duplicate_case_rejected() {
        let mut spec = EnumSpec::new("Suit", BackingKind::None);
        spec.add_case("Hearts", ());
        spec.add_case("Hearts", ());
        assert_eq!(
            message(spec.into_parts()),
            "Cannot redefine class constant Suit::Hearts"
        );
    }
}
