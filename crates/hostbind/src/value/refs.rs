//! Shared value slots for by-reference passing

use std::sync::{Arc, PoisonError, RwLock};

use super::Value;

/// A slot shared between every holder of the reference.
///
/// Writes through one clone are visible through all others, which is how
/// by-reference parameters hand results back to the caller.
#[derive(Clone, Default)]
pub struct Reference(Arc<RwLock<Value>>);

impl Reference {
    /// Create a reference holding `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        Reference(Arc::new(RwLock::new(value.into())))
    }

    /// Current value
    pub fn get(&self) -> Value {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Overwrite the value.
    pub fn set(&self, value: impl Into<Value>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = value.into();
    }

    /// Overwrite the value, returning the old one.
    pub fn replace(&self, value: impl Into<Value>) -> Value {
        std::mem::replace(
            &mut *self.0.write().unwrap_or_else(PoisonError::into_inner),
            value.into(),
        )
    }

    /// Whether two references share a slot
    pub fn ptr_eq(&self, other: &Reference) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
