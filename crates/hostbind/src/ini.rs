//! Ini entries
//!
//! Entries are declared on the module with a default and a [`Policy`].
//! Values are stored as strings, the way the host stores them, and parsed on
//! read through [`FromIniValue`]. A runtime override lasts until the end of
//! the request.

use indexmap::IndexMap;

use crate::error::{Result, RuntimeError, RuntimeErrorKind};
use crate::runtime::Runtime;
use crate::value::Value;

/// Where an entry may be changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Anywhere
    All,
    /// From host code at run time
    User,
    /// Per-directory configuration only
    Perdir,
    /// Process configuration only
    System,
}

impl Policy {
    /// Whether `ini_set` may change the entry
    pub fn is_user_modifiable(self) -> bool {
        matches!(self, Policy::All | Policy::User)
    }
}

/// A native value that can be stored as an ini string.
pub trait IntoIniValue {
    /// Host string form
    fn into_ini_value(self) -> String;
}

impl IntoIniValue for bool {
    fn into_ini_value(self) -> String {
        if self { "1" } else { "0" }.to_string()
    }
}

impl IntoIniValue for i64 {
    fn into_ini_value(self) -> String {
        self.to_string()
    }
}

impl IntoIniValue for f64 {
    fn into_ini_value(self) -> String {
        self.to_string()
    }
}

impl IntoIniValue for String {
    fn into_ini_value(self) -> String {
        self
    }
}

impl IntoIniValue for &str {
    fn into_ini_value(self) -> String {
        self.to_string()
    }
}

/// A native type parsed from an ini string. `None` means the entry does
/// not exist.
pub trait FromIniValue: Sized {
    /// Parse the raw value.
    fn from_ini_value(raw: Option<&str>) -> Self;
}

impl FromIniValue for bool {
    fn from_ini_value(raw: Option<&str>) -> Self {
        let Some(raw) = raw else { return false };
        let raw = raw.trim();
        ["on", "yes", "true"]
            .iter()
            .any(|w| raw.eq_ignore_ascii_case(w))
            || i64::from_ini_value(Some(raw)) != 0
    }
}

impl FromIniValue for i64 {
    fn from_ini_value(raw: Option<&str>) -> Self {
        raw.map_or(0, |r| Value::from(r).cast_int())
    }
}

impl FromIniValue for f64 {
    fn from_ini_value(raw: Option<&str>) -> Self {
        raw.map_or(0.0, |r| Value::from(r).cast_float())
    }
}

impl FromIniValue for String {
    fn from_ini_value(raw: Option<&str>) -> Self {
        raw.unwrap_or_default().to_string()
    }
}

impl FromIniValue for Option<String> {
    fn from_ini_value(raw: Option<&str>) -> Self {
        raw.map(str::to_string)
    }
}

/// A declared entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniEntry {
    pub(crate) name: String,
    pub(crate) default: String,
    pub(crate) policy: Policy,
}

impl IniEntry {
    pub(crate) fn new(name: impl Into<String>, default: impl IntoIniValue, policy: Policy) -> Self {
        Self {
            name: name.into(),
            default: default.into_ini_value(),
            policy,
        }
    }

    /// Entry name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared default
    pub fn default_value(&self) -> &str {
        &self.default
    }

    /// Modification policy
    pub fn policy(&self) -> Policy {
        self.policy
    }
}

/// Declared entries, frozen at startup.
#[derive(Debug, Clone, Default)]
pub(crate) struct IniTable {
    entries: IndexMap<String, IniEntry>,
}

impl IniTable {
    pub(crate) fn insert(&mut self, entry: IniEntry) -> bool {
        if self.entries.contains_key(&entry.name) {
            return false;
        }
        self.entries.insert(entry.name.clone(), entry);
        true
    }

    pub(crate) fn get(&self, name: &str) -> Option<&IniEntry> {
        self.entries.get(name)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &IniEntry> {
        self.entries.values()
    }
}

impl Runtime {
    /// Current raw value: the request override, else the default.
    pub fn ini_get_raw(&self, name: &str) -> Option<&str> {
        if let Some(v) = self.ini.get(name) {
            return Some(v.as_str());
        }
        self.registry.ini().get(name).map(IniEntry::default_value)
    }

    /// Current value parsed as `T`.
    pub fn ini_get<T: FromIniValue>(&self, name: &str) -> T {
        T::from_ini_value(self.ini_get_raw(name))
    }

    /// Override an entry for the rest of the request. Returns the previous
    /// value.
    pub fn ini_set(&mut self, name: &str, value: impl IntoIniValue) -> Result<String> {
        let entry = self.registry.ini().get(name).ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::Ini,
                format!("ini entry \"{name}\" is not registered"),
            )
        })?;
        if !entry.policy.is_user_modifiable() {
            return Err(RuntimeError::new(
                RuntimeErrorKind::Ini,
                format!("ini entry \"{name}\" cannot be changed at run time"),
            )
            .into());
        }
        let previous = self
            .ini_get_raw(name)
            .map(str::to_string)
            .unwrap_or_default();
        let value = value.into_ini_value();
        tracing::debug!(entry = name, value = %value, "ini override");
        self.ini.insert(name.to_string(), value);
        Ok(previous)
    }

    /// Drop a request override.
    pub fn ini_restore(&mut self, name: &str) {
        self.ini.shift_remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_ini_value() {
        assert_eq!(true.into_ini_value(), "1");
        assert_eq!(false.into_ini_value(), "0");
        assert_eq!(100_i64.into_ini_value(), "100");
        assert_eq!(200.0_f64.into_ini_value(), "200");
        assert_eq!(1.5_f64.into_ini_value(), "1.5");
    }

    #[test]
    fn test_from_ini_value() {
        assert!(bool::from_ini_value(Some("1")));
        assert!(bool::from_ini_value(Some("On")));
        assert!(!bool::from_ini_value(Some("0")));
        assert!(!bool::from_ini_value(Some("off")));
        assert!(!bool::from_ini_value(None));
        assert_eq!(i64::from_ini_value(Some("100")), 100);
        assert_eq!(i64::from_ini_value(Some("12abc")), 12);
        assert_eq!(i64::from_ini_value(Some("abc")), 0);
        assert_eq!(f64::from_ini_value(Some("200")), 200.0);
        assert_eq!(String::from_ini_value(Some("something")), "something");
        assert_eq!(Option::<String>::from_ini_value(None), None);
    }

    #[test]
    fn test_policy() {
        assert!(Policy::All.is_user_modifiable());
        assert!(Policy::User.is_user_modifiable());
        assert!(!Policy::System.is_user_modifiable());
        assert!(!Policy::Perdir.is_user_modifiable());
    }

    #[test]
    fn test_table_rejects_duplicates() {
        let mut table = IniTable::default();
        assert!(table.insert(IniEntry::new("a.b", 1_i64, Policy::All)));
        assert!(!table.insert(IniEntry::new("a.b", 2_i64, Policy::All)));
        assert_eq!(table.get("a.b").map(IniEntry::default_value), Some("1"));
        assert_eq!(table.iter().count(), 1);
    }
}
