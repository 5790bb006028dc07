//! Host objects, handles and native side-data
//!
//! The host owns object lifetime. The engine only ever holds an
//! [`ObjectRef`], a generation-checked index into the runtime's
//! [`ObjectHeap`], and keeps native state in a separate [`StateTable`]
//! keyed by that handle. A freed slot bumps its generation, so stale
//! handles fail instead of aliasing a new object.

mod hooks;
mod state;

pub use hooks::{NativeArrayAccess, NativeIterator};
pub use state::{NativeState, StateTable};

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::class::ClassEntry;
use crate::value::Value;

/// Non-owning handle to a host object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef {
    index: u32,
    generation: u32,
}

impl ObjectRef {
    /// The host's object id (`#1`, `#2`, ...)
    pub fn handle(&self) -> u32 {
        self.index + 1
    }

    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.handle())
    }
}

/// A live host object: its class and property table.
#[derive(Debug, Clone)]
pub struct HostObject {
    pub(crate) class: Arc<ClassEntry>,
    pub(crate) properties: IndexMap<String, Value>,
    pub(crate) pinned: bool,
}

impl HostObject {
    pub(crate) fn new(class: Arc<ClassEntry>, properties: IndexMap<String, Value>) -> Self {
        Self {
            class,
            properties,
            pinned: false,
        }
    }

    /// The object's class
    pub fn class(&self) -> &Arc<ClassEntry> {
        &self.class
    }

    /// Raw property table, ignoring visibility
    pub fn properties(&self) -> &IndexMap<String, Value> {
        &self.properties
    }

    /// Whether the object lives for the whole process
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    object: Option<HostObject>,
}

/// Arena of host objects.
#[derive(Debug, Default)]
pub struct ObjectHeap {
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl ObjectHeap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object and hand out its handle.
    pub fn alloc(&mut self, object: HostObject) -> ObjectRef {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.object = Some(object);
            return ObjectRef::new(index, slot.generation);
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            object: Some(object),
        });
        ObjectRef::new(index, 0)
    }

    /// Look up a live object.
    pub fn get(&self, r: ObjectRef) -> Option<&HostObject> {
        self.slots
            .get(r.index as usize)
            .filter(|s| s.generation == r.generation)
            .and_then(|s| s.object.as_ref())
    }

    /// Look up a live object for mutation.
    pub fn get_mut(&mut self, r: ObjectRef) -> Option<&mut HostObject> {
        self.slots
            .get_mut(r.index as usize)
            .filter(|s| s.generation == r.generation)
            .and_then(|s| s.object.as_mut())
    }

    /// Free an object. Pinned objects are never freed.
    pub fn free(&mut self, r: ObjectRef) -> Option<HostObject> {
        let slot = self
            .slots
            .get_mut(r.index as usize)
            .filter(|s| s.generation == r.generation)?;
        if slot.object.as_ref().is_some_and(|o| o.pinned) {
            return None;
        }
        let object = slot.object.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(r.index);
        Some(object)
    }

    /// Handles of every live, unpinned object.
    pub fn unpinned(&self) -> Vec<ObjectRef> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.object.as_ref().is_some_and(|o| !o.pinned))
            .map(|(i, s)| ObjectRef::new(i as u32, s.generation))
            .collect()
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.object.is_some()).count()
    }

    /// Whether no objects are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassEntry;

    fn object() -> HostObject {
        HostObject::new(Arc::new(ClassEntry::bare("stdClass")), IndexMap::new())
    }

    #[test]
    fn test_stale_handle_rejected() {
        let mut heap = ObjectHeap::new();
        let a = heap.alloc(object());
        assert!(heap.free(a).is_some());
        let b = heap.alloc(object());
        assert_eq!(a.handle(), b.handle());
        assert!(heap.get(a).is_none());
        assert!(heap.get(b).is_some());
        assert!(heap.free(a).is_none());
    }

    #[test]
    fn test_pinned_survive_free() {
        let mut heap = ObjectHeap::new();
        let mut o = object();
        o.pinned = true;
        let pinned = heap.alloc(o);
        let loose = heap.alloc(object());
        assert!(heap.free(pinned).is_none());
        assert_eq!(heap.unpinned(), vec![loose]);
        assert_eq!(heap.len(), 2);
    }

    #[test]
    fn test_handle_display() {
        let mut heap = ObjectHeap::new();
        let a = heap.alloc(object());
        assert_eq!(a.to_string(), "#1");
    }
}
