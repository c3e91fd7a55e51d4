//! Keyed storage for objects that outlive a single state.
//!
//! States are destroyed on every transition, so data that has to survive
//! from one state to the next is parked here under a string key. The
//! machine owns one store; handlers reach it through
//! [`MachineHandle`](crate::machine::MachineHandle).

use std::any::{type_name, Any};
use std::collections::HashMap;

pub mod error;

pub use error::StoreError;

/// Heterogeneous map from string keys to owned values.
///
/// # Example
///
/// ```rust
/// use evfsm::store::{ObjectStore, StoreError};
///
/// let mut store = ObjectStore::new();
/// store.insert("retries", 3u32);
///
/// assert_eq!(store.get::<u32>("retries"), Ok(&3));
/// assert!(matches!(store.get::<String>("retries"), Err(StoreError::TypeMismatch { .. })));
/// ```
#[derive(Default)]
pub struct ObjectStore {
    objects: HashMap<String, Box<dyn Any + Send>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous object.
    pub fn insert<T: Any + Send>(&mut self, key: impl Into<String>, value: T) {
        self.objects.insert(key.into(), Box::new(value));
    }

    pub fn get<T: Any>(&self, key: &str) -> Result<&T, StoreError> {
        let object = self.objects.get(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;
        object
            .downcast_ref::<T>()
            .ok_or_else(|| StoreError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Result<&mut T, StoreError> {
        let object = self
            .objects
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })?;
        object
            .downcast_mut::<T>()
            .ok_or_else(|| StoreError::TypeMismatch {
                key: key.to_string(),
                expected: type_name::<T>(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    /// Drop the object stored under `key`. Returns whether one was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.objects.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_not_found() {
        let store = ObjectStore::new();
        assert_eq!(
            store.get::<u8>("nope"),
            Err(StoreError::NotFound {
                key: "nope".to_string()
            })
        );
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut store = ObjectStore::new();
        store.insert("name", String::from("door"));
        let err = store.get::<u64>("name").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Object registered with key name is not of requested type u64"
        );
    }

    #[test]
    fn insert_replaces_and_get_mut_mutates() {
        let mut store = ObjectStore::new();
        store.insert("count", 1usize);
        store.insert("count", 10usize);
        *store.get_mut::<usize>("count").unwrap() += 1;
        assert_eq!(store.get::<usize>("count"), Ok(&11));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_reports_presence() {
        let mut store = ObjectStore::new();
        store.insert("k", ());
        assert!(store.contains("k"));
        assert!(store.remove("k"));
        assert!(!store.remove("k"));
        assert!(store.is_empty());
    }
}
