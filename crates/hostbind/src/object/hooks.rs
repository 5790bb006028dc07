//! Native implementations of the iteration and array-access protocols

use crate::error::Result;
use crate::value::Value;

/// Native state that drives host iteration (`foreach`).
///
/// Declared on a class with [`ClassSpec::iterable`](crate::ClassSpec::iterable),
/// which generates `current`, `key`, `next`, `rewind` and `valid` and
/// makes the class implement `Iterator`.
pub trait NativeIterator: Send + 'static {
    /// Value at the cursor
    fn current(&self) -> Value;

    /// Key at the cursor
    fn key(&self) -> Value;

    /// Advance the cursor.
    fn next(&mut self);

    /// Reset the cursor.
    fn rewind(&mut self);

    /// Whether the cursor points at an element
    fn valid(&self) -> bool;
}

/// Native state that answers `$obj[...]`.
///
/// Declared with [`ClassSpec::array_access`](crate::ClassSpec::array_access),
/// which generates the `offset*` methods and makes the class implement
/// `ArrayAccess`.
pub trait NativeArrayAccess: Send + 'static {
    /// `$obj[$offset]`
    fn offset_get(&self, offset: &Value) -> Result<Value>;

    /// `$obj[$offset] = $value`; `None` offset for `$obj[] = $value`
    fn offset_set(&mut self, offset: Option<Value>, value: Value) -> Result<()>;

    /// `isset($obj[$offset])`
    fn offset_exists(&self, offset: &Value) -> bool;

    /// `unset($obj[$offset])`
    fn offset_unset(&mut self, offset: &Value);
}
