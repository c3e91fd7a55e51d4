//! evfsm: an embeddable event-driven state machine runtime
//!
//! An application registers states (as factories for its own state data)
//! and event handlers, then starts the machine in an initial state. Messages
//! are queued from any thread and dispatched one at a time by a single main
//! loop. When the queue stays empty for the idle timeout, the loop delivers
//! a TIMEOUT event, which is how timed behaviour is expressed.
//!
//! # Core Concepts
//!
//! - **State**: host data implementing the `State` trait; exactly one
//!   instance is alive and it is destroyed before its successor is built
//! - **Handler**: a function of the active state and a message returning the
//!   next state id, bound to an event, a scope and a sequence number
//! - **Sequence**: lower numbers run first; negative numbers are overrides
//!   that end the dispatch of their event
//! - **Status**: the last recorded result, queryable at any time
//!
//! # Example
//!
//! ```rust
//! use evfsm::dispatch::handler::{goto, stay};
//! use evfsm::machine::{RunMode, StateMachine};
//! use evfsm::core::StateInstance;
//! use std::sync::{Arc, Mutex};
//!
//! evfsm::define_ids! {
//!     state INACTIVE = "InActive";
//!     state ACTIVE = "Active";
//!     event POLL = "demo::POLL";
//!     event ACTIVATE = "demo::ACTIVATE";
//! }
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//!
//! let mut machine = StateMachine::new();
//! machine.register_state::<()>(INACTIVE, "InActive");
//! machine.register_state::<()>(ACTIVE, "Active");
//! machine.on(POLL, stay(move |state: &mut StateInstance, _| {
//!     sink.lock().unwrap().push(state.name().to_string());
//! }));
//! machine.on_state::<()>(ACTIVATE, INACTIVE, goto(ACTIVE), 50);
//!
//! machine.start(INACTIVE, None, RunMode::Background).unwrap();
//! machine.handle(POLL);
//! machine.handle(ACTIVATE);
//! machine.handle(POLL);
//! machine.stop(true).unwrap();
//!
//! assert_eq!(*seen.lock().unwrap(), vec!["InActive", "Active"]);
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod machine;
pub mod store;

// Re-export commonly used types
pub use builder::{BuildError, StateMachineBuilder};
pub use config::{ConfigError, MachineConfig};
pub use core::{EventId, Message, State, StateHistory, StateId, StateInstance, Status, StatusCode};
pub use dispatch::{Handler, Scope, Sequence};
pub use machine::{MachineError, MachineHandle, RunMode, StateMachine};
pub use store::{ObjectStore, StoreError};
