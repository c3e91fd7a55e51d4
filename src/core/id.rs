//! State and event identifiers.
//!
//! Identifiers are interned strings chosen by the embedding application.
//! They are `const` constructible so that an application can declare its
//! states and events as plain `const` items:
//!
//! ```rust
//! use evfsm::core::{EventId, StateId};
//!
//! const IDLE: StateId = StateId::from_static("Idle");
//! const POLL: EventId = EventId::from_static("app::POLL");
//!
//! assert_eq!(IDLE.as_str(), "Idle");
//! assert_ne!(POLL, EventId::TIMEOUT);
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::{Borrow, Cow};
use std::fmt;

/// Identifier naming a state.
///
/// The empty identifier is reserved as [`StateId::NULL`], meaning "no state"
/// when reported by the machine and "stay where you are" when returned from
/// a handler.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(Cow<'static, str>);

impl StateId {
    /// The null state: no active state, or a no-op transition target.
    pub const NULL: StateId = StateId::from_static("");

    /// The state the machine falls back to when an unknown state is requested.
    pub const DEFAULT_ERROR: StateId = StateId::from_static("fsm::DefaultError");

    /// Create an identifier from a static string.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create an identifier from an owned string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for [`StateId::NULL`].
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StateId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("<null>")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl From<&'static str> for StateId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for StateId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Identifier naming a kind of event.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Cow<'static, str>);

impl EventId {
    /// Synthesized by the main loop when the queue stays empty for a full idle period.
    pub const TIMEOUT: EventId = EventId::from_static("fsm::TIMEOUT");

    /// Sentinel that ends the main loop once it has been dispatched.
    pub const STOP: EventId = EventId::from_static("fsm::STOP");

    /// Source tag used for error status messages.
    pub const ERROR_DEFAULT: EventId = EventId::from_static("fsm::ERROR_DEFAULT");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the identifiers the engine reserves for itself.
    pub fn is_reserved(&self) -> bool {
        *self == Self::TIMEOUT || *self == Self::STOP || *self == Self::ERROR_DEFAULT
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EventId {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for EventId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

/// Declare `const` state and event identifiers in one block.
///
/// # Example
///
/// ```
/// use evfsm::define_ids;
///
/// define_ids! {
///     pub state ACTIVE = "Active";
///     pub state INACTIVE = "InActive";
///     pub event POLL = "simple::POLL";
/// }
///
/// assert_eq!(ACTIVE.as_str(), "Active");
/// assert_eq!(POLL.as_str(), "simple::POLL");
/// ```
#[macro_export]
macro_rules! define_ids {
    () => {};
    ($(#[$meta:meta])* $vis:vis state $name:ident = $value:literal; $($rest:tt)*) => {
        $(#[$meta])*
        $vis const $name: $crate::core::StateId = $crate::core::StateId::from_static($value);
        $crate::define_ids!($($rest)*);
    };
    ($(#[$meta:meta])* $vis:vis event $name:ident = $value:literal; $($rest:tt)*) => {
        $(#[$meta])*
        $vis const $name: $crate::core::EventId = $crate::core::EventId::from_static($value);
        $crate::define_ids!($($rest)*);
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    define_ids! {
        state RUNNING = "Running";
        event KICK = "test::KICK";
    }

    #[test]
    fn static_and_owned_ids_compare_by_content() {
        assert_eq!(StateId::from_static("Idle"), StateId::new("Idle"));
        assert_eq!(EventId::from_static("a"), EventId::new(String::from("a")));
    }

    #[test]
    fn owned_id_finds_static_key_in_map() {
        let mut map = HashMap::new();
        map.insert(StateId::from_static("Idle"), 1);
        assert_eq!(map.get(&StateId::new("Idle")), Some(&1));
    }

    #[test]
    fn null_state_is_default_and_distinct() {
        assert!(StateId::default().is_null());
        assert!(!StateId::DEFAULT_ERROR.is_null());
        assert_eq!(StateId::NULL.to_string(), "<null>");
    }

    #[test]
    fn reserved_events_are_flagged() {
        assert!(EventId::TIMEOUT.is_reserved());
        assert!(EventId::STOP.is_reserved());
        assert!(EventId::ERROR_DEFAULT.is_reserved());
        assert!(!KICK.is_reserved());
    }

    #[test]
    fn macro_declares_constants() {
        assert_eq!(RUNNING, StateId::new("Running"));
        assert_eq!(KICK.as_str(), "test::KICK");
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&RUNNING).unwrap();
        assert_eq!(json, "\"Running\"");
        let back: StateId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, RUNNING);
    }
}
