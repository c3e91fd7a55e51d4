//! State transition history tracking.
//!
//! The machine appends a [`StateTransition`] every time it swaps the active
//! state instance. The history is bounded: once `limit` records are held,
//! the oldest record is discarded for each new one.

use super::id::{EventId, StateId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Record of a single state transition.
///
/// # Example
///
/// ```rust
/// use evfsm::core::{EventId, StateId, StateTransition};
/// use chrono::Utc;
///
/// let transition = StateTransition {
///     from: StateId::from_static("Idle"),
///     to: StateId::from_static("Running"),
///     timestamp: Utc::now(),
///     trigger: Some(EventId::from_static("app::GO")),
/// };
/// assert_eq!(transition.to.as_str(), "Running");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state being left; [`StateId::NULL`] on the first entry
    pub from: StateId,
    /// The state being entered
    pub to: StateId,
    /// When the transition occurred
    pub timestamp: DateTime<Utc>,
    /// Event whose handler requested the transition, if any
    pub trigger: Option<EventId>,
}

/// Ordered, bounded history of state transitions.
///
/// # Example
///
/// ```rust
/// use evfsm::core::{StateHistory, StateId, StateTransition};
/// use chrono::Utc;
///
/// let mut history = StateHistory::with_limit(8);
/// history.record(StateTransition {
///     from: StateId::NULL,
///     to: StateId::from_static("Start"),
///     timestamp: Utc::now(),
///     trigger: None,
/// });
/// history.record(StateTransition {
///     from: StateId::from_static("Start"),
///     to: StateId::from_static("End"),
///     timestamp: Utc::now(),
///     trigger: None,
/// });
///
/// let path = history.path();
/// assert_eq!(path.len(), 2);
/// assert_eq!(path[1].as_str(), "End");
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateHistory {
    transitions: VecDeque<StateTransition>,
    limit: usize,
}

impl Default for StateHistory {
    fn default() -> Self {
        Self::with_limit(Self::DEFAULT_LIMIT)
    }
}

impl StateHistory {
    pub const DEFAULT_LIMIT: usize = 64;

    /// Create an empty history keeping at most `limit` records.
    /// A limit of zero disables recording.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            transitions: VecDeque::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Append a transition, evicting the oldest record when full.
    pub fn record(&mut self, transition: StateTransition) {
        if self.limit == 0 {
            return;
        }
        while self.transitions.len() >= self.limit {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// States traversed, in order.
    ///
    /// Starts with the `from` of the oldest retained record unless that is
    /// the null state, then lists the `to` of every record.
    pub fn path(&self) -> Vec<&StateId> {
        let mut path = Vec::new();
        if let Some(first) = self.transitions.front() {
            if !first.from.is_null() {
                path.push(&first.from);
            }
        }
        for transition in &self.transitions {
            path.push(&transition.to);
        }
        path
    }

    /// Time between the oldest and newest retained records.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.transitions.front()?;
        let last = self.transitions.back()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.iter()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn last(&self) -> Option<&StateTransition> {
        self.transitions.back()
    }

    pub fn clear(&mut self) {
        self.transitions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(from: &'static str, to: &'static str) -> StateTransition {
        StateTransition {
            from: StateId::from_static(from),
            to: StateId::from_static(to),
            timestamp: Utc::now(),
            trigger: None,
        }
    }

    #[test]
    fn new_history_is_empty() {
        let history = StateHistory::default();
        assert!(history.is_empty());
        assert!(history.path().is_empty());
        assert!(history.duration().is_none());
        assert_eq!(history.limit(), StateHistory::DEFAULT_LIMIT);
    }

    #[test]
    fn path_skips_null_origin() {
        let mut history = StateHistory::default();
        history.record(record("", "Initial"));
        history.record(record("Initial", "Processing"));

        let path: Vec<&str> = history.path().into_iter().map(StateId::as_str).collect();
        assert_eq!(path, vec!["Initial", "Processing"]);
    }

    #[test]
    fn path_includes_non_null_origin() {
        let mut history = StateHistory::default();
        history.record(record("Initial", "Processing"));
        history.record(record("Processing", "Complete"));

        let path: Vec<&str> = history.path().into_iter().map(StateId::as_str).collect();
        assert_eq!(path, vec!["Initial", "Processing", "Complete"]);
    }

    #[test]
    fn limit_evicts_oldest() {
        let mut history = StateHistory::with_limit(2);
        history.record(record("A", "B"));
        history.record(record("B", "C"));
        history.record(record("C", "D"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.transitions().next().unwrap().from.as_str(), "B");
        assert_eq!(history.last().unwrap().to.as_str(), "D");
    }

    #[test]
    fn zero_limit_records_nothing() {
        let mut history = StateHistory::with_limit(0);
        history.record(record("A", "B"));
        assert!(history.is_empty());
    }

    #[test]
    fn duration_calculates_elapsed_time() {
        let mut history = StateHistory::default();
        history.record(record("A", "B"));
        std::thread::sleep(Duration::from_millis(10));
        history.record(record("B", "C"));

        assert!(history.duration().unwrap() >= Duration::from_millis(10));
    }

    #[test]
    fn history_serializes_correctly() {
        let mut history = StateHistory::default();
        history.record(StateTransition {
            trigger: Some(EventId::from_static("go")),
            ..record("A", "B")
        });

        let json = serde_json::to_string(&history).unwrap();
        let back: StateHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.last(), history.last());
    }
}
