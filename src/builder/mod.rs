//! Builder API for ergonomic state machine construction.
//!
//! This module provides a fluent builder that collects states, handlers and
//! configuration, validates them together, and produces a ready
//! [`StateMachine`](crate::machine::StateMachine).

pub mod error;
pub mod machine;

pub use error::BuildError;
pub use machine::StateMachineBuilder;
