//! Build errors for the state machine builder.

use crate::core::{EventId, StateId};
use thiserror::Error;

/// Errors that can occur when building a state machine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("Handler for {event} is scoped to unregistered state {state}. Call .state() for it first")]
    UnregisteredScope { event: EventId, state: StateId },

    #[error("Idle timeout must be greater than zero")]
    ZeroIdleTimeout,
}
