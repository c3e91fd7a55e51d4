//! Transition engine: owns the active state instance and swaps it.
//!
//! The current instance lives in a single `Option` slot. A transition takes
//! the old instance out of the slot and drops it (running its exit hook)
//! before the next state's factory is even called, so two states never
//! coexist.

use super::error::MachineError;
use super::handle::MachineHandle;
use super::registry::{StateFactory, StateRegistry};
use crate::core::{EventId, State, StateHistory, StateId, StateInstance, StateTransition, StatusCode};
use std::sync::Arc;
use tracing::{debug, error};

/// Fallback state entered whenever an unknown state is requested.
///
/// Its entry hook logs the machine's status so the condition is surfaced
/// even when the application registers no handlers for it.
#[derive(Debug, Default)]
pub struct DefaultErrorState;

impl State for DefaultErrorState {
    fn on_enter(&mut self, machine: &MachineHandle) {
        let status = machine.status();
        error!(
            machine = %machine.id(),
            source = %EventId::ERROR_DEFAULT,
            status = %status.code,
            "entered default error state: {}",
            status.message
        );
    }

    fn is_error(&self) -> bool {
        true
    }
}

pub struct TransitionEngine {
    registry: StateRegistry,
    current: Option<StateInstance>,
    previous: StateId,
    history: StateHistory,
    machine: MachineHandle,
}

impl TransitionEngine {
    pub(crate) fn new(machine: MachineHandle, history_limit: usize) -> Self {
        let mut registry = StateRegistry::new();
        let factory: StateFactory = Arc::new(|| -> Box<dyn State> { Box::new(DefaultErrorState) });
        registry.register(StateId::DEFAULT_ERROR, "DefaultErrorHandler", factory, false);

        Self {
            registry,
            current: None,
            previous: StateId::NULL,
            history: StateHistory::with_limit(history_limit),
            machine,
        }
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut StateRegistry {
        &mut self.registry
    }

    pub fn machine(&self) -> &MachineHandle {
        &self.machine
    }

    pub fn current(&self) -> Option<&StateInstance> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut StateInstance> {
        self.current.as_mut()
    }

    /// Id of the active state, or [`StateId::NULL`] when there is none.
    pub fn current_id(&self) -> StateId {
        self.current
            .as_ref()
            .map(|state| state.id().clone())
            .unwrap_or(StateId::NULL)
    }

    pub fn previous_id(&self) -> &StateId {
        &self.previous
    }

    pub fn history(&self) -> &StateHistory {
        &self.history
    }

    /// Move to `next`.
    ///
    /// With `check_first`, a request for the current state or the null
    /// state is a no-op. An unregistered target records
    /// `UnknownStateRequested` and enters the default-error state instead.
    /// Returns the machine status afterwards.
    pub fn transition(&mut self, next: StateId, check_first: bool) -> StatusCode {
        self.transition_on(next, check_first, None)
    }

    pub(crate) fn transition_on(
        &mut self,
        next: StateId,
        check_first: bool,
        trigger: Option<&EventId>,
    ) -> StatusCode {
        let from = self.current_id();
        if check_first && (next.is_null() || next == from) {
            return self.machine.status_code();
        }

        let target = if self.registry.contains(&next) {
            next
        } else {
            self.machine
                .record_error(&MachineError::UnknownStateRequested { requested: next });
            StateId::DEFAULT_ERROR
        };

        let Some(entry) = self.registry.lookup(&target).cloned() else {
            self.release();
            return self
                .machine
                .record_error(&MachineError::CurrentStateUndefined);
        };

        self.release();
        let instance = StateInstance::enter(
            target.clone(),
            entry.name().to_string(),
            self.previous.clone(),
            self.machine.clone(),
            entry.construct(),
        );
        debug!(
            machine = %self.machine.id(),
            from = %from,
            to = %target,
            trigger = ?trigger.map(EventId::as_str),
            "state transition"
        );
        self.history.record(StateTransition {
            from,
            to: target,
            timestamp: instance.entered_at(),
            trigger: trigger.cloned(),
        });
        self.current = Some(instance);
        self.machine.status_code()
    }

    /// Destroy the current instance, if any, remembering it as the previous state.
    pub fn release(&mut self) {
        if let Some(old) = self.current.take() {
            self.previous = old.id().clone();
            drop(old);
        }
    }
}
