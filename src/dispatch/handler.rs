//! Handler entries and adapters.
//!
//! Every handler has one canonical shape:
//! `Fn(&mut StateInstance, &Message) -> StateId`. The returned id names the
//! state to move to; [`StateId::NULL`] (or the current state's id) means
//! "stay". The functions in this module adapt other call shapes to it at
//! the registration site.

use crate::core::{Message, State, StateId, StateInstance};
use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Canonical handler signature.
pub type Handler = Arc<dyn Fn(&mut StateInstance, &Message) -> StateId + Send + Sync>;

/// Sequence numbers controlling handler order. Lower runs first; any
/// negative sequence is an override that ends dispatch once it has run.
pub struct Sequence;

impl Sequence {
    pub const FIRST: i32 = 0;
    pub const DEFAULT: i32 = 50;
    pub const LAST: i32 = 100;
    pub const OVERRIDE: i32 = -1;
}

/// Which states a handler fires in.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Any,
    State(StateId),
}

impl Scope {
    pub fn matches(&self, state: &StateId) -> bool {
        match self {
            Self::Any => true,
            Self::State(scope) => scope == state,
        }
    }
}

impl From<StateId> for Scope {
    fn from(state: StateId) -> Self {
        if state.is_null() {
            Self::Any
        } else {
            Self::State(state)
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::State(id) => write!(f, "{}", id),
        }
    }
}

/// One registered handler.
#[derive(Clone)]
pub struct HandlerEntry {
    scope: Scope,
    sequence: i32,
    handler: Handler,
}

impl HandlerEntry {
    pub fn new(scope: Scope, sequence: i32, handler: Handler) -> Self {
        Self {
            scope,
            sequence,
            handler,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn sequence(&self) -> i32 {
        self.sequence
    }

    /// Overrides stop the dispatch of their event after running.
    pub fn is_override(&self) -> bool {
        self.sequence < 0
    }

    pub fn call(&self, state: &mut StateInstance, message: &Message) -> StateId {
        (self.handler)(state, message)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("scope", &self.scope)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

/// Wrap a closure that already has the canonical shape.
pub fn from_fn<F>(f: F) -> Handler
where
    F: Fn(&mut StateInstance, &Message) -> StateId + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wrap a closure that never requests a transition.
pub fn stay<F>(f: F) -> Handler
where
    F: Fn(&mut StateInstance, &Message) + Send + Sync + 'static,
{
    Arc::new(move |state: &mut StateInstance, message: &Message| {
        f(state, message);
        StateId::NULL
    })
}

/// Wrap a closure that only looks at the message.
pub fn message_only<F>(f: F) -> Handler
where
    F: Fn(&Message) -> StateId + Send + Sync + 'static,
{
    Arc::new(move |_: &mut StateInstance, message: &Message| f(message))
}

/// A handler that unconditionally requests `target`.
pub fn goto(target: StateId) -> Handler {
    Arc::new(move |_: &mut StateInstance, _: &Message| target.clone())
}

/// Wrap a closure operating on the active state's data as type `T`.
///
/// If the active state's data is not a `T`, the closure is skipped, a
/// warning is logged, and the handler stays put.
pub fn with_data<T, F>(f: F) -> Handler
where
    T: State,
    F: Fn(&mut T, &Message) -> StateId + Send + Sync + 'static,
{
    Arc::new(move |state: &mut StateInstance, message: &Message| {
        let id = state.id().clone();
        match state.data_mut::<T>() {
            Some(data) => f(data, message),
            None => {
                warn!(state = %id, expected = type_name::<T>(), "handler skipped: state data has another type");
                StateId::NULL
            }
        }
    })
}
