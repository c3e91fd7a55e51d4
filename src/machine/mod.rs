//! The running machine.
//!
//! This module contains the moving parts behind [`StateMachine`]:
//! - The state registry and the transition engine that owns the active state
//! - The message queue and the main loop that drains it
//! - The cloneable [`MachineHandle`] handed to every state instance

mod error;
mod handle;
mod main_loop;
mod queue;
mod registry;
mod state_machine;
mod transition;

pub use error::MachineError;
pub use handle::MachineHandle;
pub use queue::{MessageQueue, WaitOutcome};
pub use registry::{StateFactory, StateFactoryEntry, StateRegistry};
pub use state_machine::{RunMode, StateMachine};
pub use transition::{DefaultErrorState, TransitionEngine};

use crate::dispatch::{dispatch, DispatchReport, HandlerTable};
use crate::core::Message;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the data if a handler panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Everything the main loop mutates while dispatching.
///
/// Only ever locked for one dispatch at a time, never while waiting on the
/// queue, so producers and status queries stay responsive.
pub(crate) struct Engine {
    pub(crate) transitions: TransitionEngine,
    pub(crate) handlers: HandlerTable,
}

impl Engine {
    pub(crate) fn new(machine: MachineHandle, history_limit: usize) -> Self {
        Self {
            transitions: TransitionEngine::new(machine, history_limit),
            handlers: HandlerTable::new(),
        }
    }

    pub(crate) fn dispatch(&mut self, message: &Message) -> DispatchReport {
        dispatch(&self.handlers, &mut self.transitions, message)
    }
}
