//! State registry: maps state identifiers to factories.

use crate::core::{State, StateId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a fresh instance of a state's data.
pub type StateFactory = Arc<dyn Fn() -> Box<dyn State> + Send + Sync>;

/// Registered name and factory for one state.
#[derive(Clone)]
pub struct StateFactoryEntry {
    name: String,
    construct: StateFactory,
}

impl StateFactoryEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn construct(&self) -> Box<dyn State> {
        (self.construct)()
    }
}

impl fmt::Debug for StateFactoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateFactoryEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct StateRegistry {
    entries: HashMap<StateId, StateFactoryEntry>,
}

impl StateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `factory` under `id`.
    ///
    /// An existing registration is kept unless `override_existing` is set.
    /// An empty `name` defaults to the identifier's text. Returns whether
    /// the factory was stored.
    pub fn register(
        &mut self,
        id: StateId,
        name: &str,
        factory: StateFactory,
        override_existing: bool,
    ) -> bool {
        if !override_existing && self.entries.contains_key(&id) {
            return false;
        }
        let name = if name.is_empty() {
            id.as_str().to_string()
        } else {
            name.to_string()
        };
        self.entries.insert(
            id,
            StateFactoryEntry {
                name,
                construct: factory,
            },
        );
        true
    }

    pub fn lookup(&self, id: &StateId) -> Option<&StateFactoryEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &StateId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn name(&self, id: &StateId) -> Option<&str> {
        self.entries.get(id).map(StateFactoryEntry::name)
    }

    pub fn ids(&self) -> impl Iterator<Item = &StateId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
