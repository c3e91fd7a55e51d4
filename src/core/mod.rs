//! Core value types of the state machine.
//!
//! This module contains the types every other part of the crate speaks:
//! - State and event identifiers
//! - Messages and their payloads
//! - The `State` trait and live state instances
//! - Status codes and transition history

mod history;
mod id;
mod message;
mod state;
mod status;

pub use history::{StateHistory, StateTransition};
pub use id::{EventId, StateId};
pub use message::{Arg, Message, MessageError};
pub use state::{AsAny, State, StateInstance};
pub use status::{Status, StatusCode};
