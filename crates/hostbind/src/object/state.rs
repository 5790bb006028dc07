//! Native state side-table

use std::any::Any;
use std::collections::HashMap;

use super::ObjectRef;

/// Type alias for boxed native state
pub type NativeState = Box<dyn Any + Send>;

/// Native instance state keyed by object handle.
///
/// The table never outlives the objects it describes: the runtime drops
/// an entry whenever the host frees the object.
#[derive(Default)]
pub struct StateTable {
    entries: HashMap<ObjectRef, NativeState>,
}

impl StateTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach state to a handle, replacing any previous state.
    pub fn insert(&mut self, object: ObjectRef, state: NativeState) {
        self.entries.insert(object, state);
    }

    /// Detach and return the state.
    pub fn remove(&mut self, object: ObjectRef) -> Option<NativeState> {
        self.entries.remove(&object)
    }

    /// Borrow the raw state.
    pub fn raw(&self, object: ObjectRef) -> Option<&(dyn Any + Send)> {
        self.entries.get(&object).map(|b| b.as_ref())
    }

    /// Borrow the state as `T`.
    pub fn get<T: 'static>(&self, object: ObjectRef) -> Option<&T> {
        self.entries.get(&object)?.downcast_ref()
    }

    /// Mutably borrow the state as `T`.
    pub fn get_mut<T: 'static>(&mut self, object: ObjectRef) -> Option<&mut T> {
        self.entries.get_mut(&object)?.downcast_mut()
    }

    /// Whether the handle carries state
    pub fn contains(&self, object: ObjectRef) -> bool {
        self.entries.contains_key(&object)
    }

    /// Number of objects with state
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for StateTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let mut table = StateTable::new();
        let obj = ObjectRef::new(0, 0);
        table.insert(obj, Box::new(41_i64));
        *table.get_mut::<i64>(obj).unwrap() += 1;
        assert_eq!(table.get::<i64>(obj), Some(&42));
        assert_eq!(table.get::<String>(obj), None);
        assert!(table.remove(obj).is_some());
        assert!(table.is_empty());
    }
}
