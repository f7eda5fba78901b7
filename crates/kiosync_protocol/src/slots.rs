//! Request-scoped typed storage.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

/// A map holding at most one value per type.
///
/// Each request owns its own `Slots`; a stage stores its output here and a
/// later stage of the same request reads it back by type.
#[derive(Default)]
pub struct Slots {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Slots {
    /// Creates empty slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, returning the previous value of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) -> Option<T> {
        self.values
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Returns the stored value of type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns the number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slots").field("len", &self.len()).finish()
    }
}
