//! Ordered host arrays

use std::fmt;

use indexmap::IndexMap;

use super::{ByteString, Value};
use crate::error::{Result, RuntimeError, RuntimeErrorKind};

/// An array key: integer or byte string.
///
/// Strings holding a canonical decimal integer (`"7"`, `"-3"`, but not
/// `"07"`) are stored as integers, the way the host normalizes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArrayKey {
    /// Integer key
    Int(i64),
    /// String key
    Str(ByteString),
}

impl ArrayKey {
    /// Build a key from a string, normalizing canonical integers.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        let bytes = bytes.as_ref();
        match canonical_int(bytes) {
            Some(i) => ArrayKey::Int(i),
            None => ArrayKey::Str(ByteString::new(bytes)),
        }
    }

    /// Key for a host value used as an array offset; `None` for values
    /// that cannot index an array.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(ArrayKey::Str(ByteString::new(""))),
            Value::Bool(b) => Some(ArrayKey::Int(i64::from(*b))),
            Value::Int(i) => Some(ArrayKey::Int(*i)),
            Value::Float(f) if f.is_finite() => Some(ArrayKey::Int(f.trunc() as i64)),
            Value::String(s) => Some(ArrayKey::from_bytes(s)),
            Value::Reference(r) => ArrayKey::from_value(&r.get()),
            _ => None,
        }
    }

    /// The key as a host value.
    pub fn to_value(&self) -> Value {
        match self {
            ArrayKey::Int(i) => Value::Int(*i),
            ArrayKey::Str(s) => Value::String(s.clone()),
        }
    }
}

fn canonical_int(bytes: &[u8]) -> Option<i64> {
    let digits = bytes.strip_prefix(b"-").unwrap_or(bytes);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if digits.len() > 1 && digits[0] == b'0' {
        return None;
    }
    if bytes == b"-0" {
        return None;
    }
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKey::Int(i) => write!(f, "{i}"),
            ArrayKey::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ArrayKey {
    fn from(i: i64) -> Self {
        ArrayKey::Int(i)
    }
}

impl From<i32> for ArrayKey {
    fn from(i: i32) -> Self {
        ArrayKey::Int(i64::from(i))
    }
}

impl From<usize> for ArrayKey {
    fn from(i: usize) -> Self {
        ArrayKey::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<&str> for ArrayKey {
    fn from(s: &str) -> Self {
        ArrayKey::from_bytes(s)
    }
}

impl From<String> for ArrayKey {
    fn from(s: String) -> Self {
        ArrayKey::from_bytes(s)
    }
}

impl From<ByteString> for ArrayKey {
    fn from(s: ByteString) -> Self {
        match canonical_int(s.as_bytes()) {
            Some(i) => ArrayKey::Int(i),
            None => ArrayKey::Str(s),
        }
    }
}

/// Host array: an insertion-ordered map with unique keys.
///
/// ```
/// use hostbind::{Array, Value};
///
/// let mut arr = Array::new();
/// arr.push("a")?;
/// arr.insert("k", 1);
/// arr.push("b")?;
/// assert_eq!(arr.get(1), Some(&Value::from("b")));
/// assert!(!arr.is_list());
/// # Ok::<(), hostbind::Error>(())
/// ```
#[derive(Clone, Default)]
pub struct Array {
    entries: IndexMap<ArrayKey, Value>,
    next_index: i64,
}

impl Array {
    /// Create an empty array.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a list (keys `0..n`) from values.
    pub fn list<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        let mut arr = Array::new();
        for v in values {
            let key = arr.next_index;
            arr.insert(key, v);
        }
        arr
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the array is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry.
    pub fn get(&self, key: impl Into<ArrayKey>) -> Option<&Value> {
        self.entries.get(&key.into())
    }

    /// Look up an entry for mutation.
    pub fn get_mut(&mut self, key: impl Into<ArrayKey>) -> Option<&mut Value> {
        self.entries.get_mut(&key.into())
    }

    /// Whether a key is present
    pub fn contains_key(&self, key: impl Into<ArrayKey>) -> bool {
        self.entries.contains_key(&key.into())
    }

    /// Insert or overwrite an entry, returning the previous value. An
    /// overwritten key keeps its position.
    pub fn insert(&mut self, key: impl Into<ArrayKey>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        if let ArrayKey::Int(i) = key {
            if i >= self.next_index {
                self.next_index = i.saturating_add(1);
            }
        }
        self.entries.insert(key, value.into())
    }

    /// Append at the next free integer key.
    ///
    /// Fails once the next index is taken, which only happens after the
    /// key `i64::MAX` has been used.
    pub fn push(&mut self, value: impl Into<Value>) -> Result<()> {
        let key = ArrayKey::Int(self.next_index);
        if self.entries.contains_key(&key) {
            return Err(RuntimeError::new(
                RuntimeErrorKind::NextElementOccupied,
                "Cannot add element to the array as the next element is already occupied",
            )
            .into());
        }
        self.next_index = self.next_index.saturating_add(1);
        self.entries.insert(key, value.into());
        Ok(())
    }

    /// Remove an entry, keeping the order of the rest.
    pub fn remove(&mut self, key: impl Into<ArrayKey>) -> Option<Value> {
        self.entries.shift_remove(&key.into())
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArrayKey, &Value)> {
        self.entries.iter()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &ArrayKey> {
        self.entries.keys()
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Whether the keys are exactly `0..len` in order.
    pub fn is_list(&self) -> bool {
        self.entries
            .keys()
            .enumerate()
            .all(|(i, k)| matches!(k, ArrayKey::Int(n) if usize::try_from(*n) == Ok(i)))
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a == b)
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Into<ArrayKey>, V: Into<Value>> FromIterator<(K, V)> for Array {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut arr = Array::new();
        for (k, v) in iter {
            arr.insert(k, v);
        }
        arr
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array::list(iter)
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = (&'a ArrayKey, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, ArrayKey, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
