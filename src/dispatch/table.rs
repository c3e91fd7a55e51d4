//! Handler table: event id -> handler entries ordered by sequence.

use super::handler::{Handler, HandlerEntry, Scope};
use crate::core::EventId;
use std::collections::HashMap;

/// Multi-map of handlers keyed by event.
///
/// Entries for one event are kept sorted by ascending sequence; entries with
/// equal sequence keep their insertion order.
#[derive(Debug, Default)]
pub struct HandlerTable {
    handlers: HashMap<EventId, Vec<HandlerEntry>>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: EventId, scope: Scope, sequence: i32, handler: Handler) {
        let entries = self.handlers.entry(event).or_default();
        let position = entries.partition_point(|entry| entry.sequence() <= sequence);
        entries.insert(position, HandlerEntry::new(scope, sequence, handler));
    }

    /// Remove every entry exactly matching `(event, sequence, scope)`.
    /// Returns how many were removed.
    pub fn remove(&mut self, event: &EventId, sequence: i32, scope: &Scope) -> usize {
        let Some(entries) = self.handlers.get_mut(event) else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|entry| !(entry.sequence() == sequence && entry.scope() == scope));
        let removed = before - entries.len();
        if entries.is_empty() {
            self.handlers.remove(event);
        }
        removed
    }

    /// Clear the handlers for `event`, or for every event when `None`.
    /// Returns how many entries were removed.
    pub fn remove_all(&mut self, event: Option<&EventId>) -> usize {
        match event {
            Some(event) => self.handlers.remove(event).map_or(0, |entries| entries.len()),
            None => {
                let removed = self.len();
                self.handlers.clear();
                removed
            }
        }
    }

    /// Entries registered for `event`, in dispatch order.
    pub fn entries(&self, event: &EventId) -> &[HandlerEntry] {
        self.handlers.get(event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn events(&self) -> impl Iterator<Item = &EventId> {
        self.handlers.keys()
    }

    /// Total number of entries across all events.
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
