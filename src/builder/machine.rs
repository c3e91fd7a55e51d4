//! Builder for constructing state machines.

use crate::builder::error::BuildError;
use crate::config::MachineConfig;
use crate::core::{EventId, State, StateId};
use crate::dispatch::{Handler, Scope, Sequence};
use crate::machine::{StateFactory, StateMachine};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

struct StateRegistration {
    id: StateId,
    name: String,
    factory: StateFactory,
    override_existing: bool,
}

struct HandlerRegistration {
    event: EventId,
    scope: Scope,
    sequence: i32,
    handler: Handler,
}

/// Builder for constructing state machines with a fluent API.
///
/// Registrations are collected and checked together in
/// [`build`](Self::build), so a handler may be declared before the state it
/// is scoped to.
///
/// # Example
///
/// ```rust
/// use evfsm::builder::StateMachineBuilder;
/// use evfsm::dispatch::handler::goto;
/// use evfsm::core::{EventId, StateId};
/// use std::time::Duration;
///
/// const GREEN: StateId = StateId::from_static("Green");
/// const RED: StateId = StateId::from_static("Red");
///
/// let machine = StateMachineBuilder::new()
///     .idle_timeout(Duration::from_millis(500))
///     .state::<()>(GREEN, "Green")
///     .state::<()>(RED, "Red")
///     .on_state(EventId::TIMEOUT, GREEN, goto(RED))
///     .on_state(EventId::TIMEOUT, RED, goto(GREEN))
///     .build()
///     .unwrap();
///
/// assert_eq!(machine.timeout(), Duration::from_millis(500));
/// ```
pub struct StateMachineBuilder {
    config: MachineConfig,
    states: Vec<StateRegistration>,
    handlers: Vec<HandlerRegistration>,
}

impl StateMachineBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: MachineConfig::default(),
            states: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = Some(name.into());
        self
    }

    /// Add a state whose data is built with `T::default()`.
    pub fn state<T: State + Default>(self, id: StateId, name: &str) -> Self {
        let factory: StateFactory = Arc::new(|| -> Box<dyn State> { Box::new(T::default()) });
        self.state_with(id, name, factory)
    }

    /// Add a state with an explicit factory.
    pub fn state_with(mut self, id: StateId, name: &str, factory: StateFactory) -> Self {
        self.states.push(StateRegistration {
            id,
            name: name.to_string(),
            factory,
            override_existing: false,
        });
        self
    }

    /// Replace the built-in default-error state.
    pub fn error_state<T: State + Default>(mut self, name: &str) -> Self {
        let factory: StateFactory = Arc::new(|| -> Box<dyn State> { Box::new(T::default()) });
        self.states.push(StateRegistration {
            id: StateId::DEFAULT_ERROR,
            name: name.to_string(),
            factory,
            override_existing: true,
        });
        self
    }

    /// Add a handler with an explicit sequence and scope.
    pub fn handler(
        mut self,
        event: EventId,
        scope: impl Into<Scope>,
        sequence: i32,
        handler: Handler,
    ) -> Self {
        self.handlers.push(HandlerRegistration {
            event,
            scope: scope.into(),
            sequence,
            handler,
        });
        self
    }

    /// Add a handler that fires in every state at the default sequence.
    pub fn on(self, event: EventId, handler: Handler) -> Self {
        self.handler(event, Scope::Any, Sequence::DEFAULT, handler)
    }

    /// Add a handler that fires while `state` is active, at the default sequence.
    pub fn on_state(self, event: EventId, state: StateId, handler: Handler) -> Self {
        self.handler(event, Scope::State(state), Sequence::DEFAULT, handler)
    }

    /// Build the state machine.
    /// Returns an error if a handler is scoped to an unknown state or the
    /// idle timeout is zero.
    pub fn build(self) -> Result<StateMachine, BuildError> {
        self.validate()?;

        let mut machine = StateMachine::with_config(self.config);
        for state in self.states {
            machine.register_state_with(state.id, &state.name, state.factory, state.override_existing);
        }
        for registration in self.handlers {
            machine.register_event_handler(
                registration.event,
                registration.handler,
                registration.sequence,
                registration.scope,
            );
        }

        Ok(machine)
    }

    fn validate(&self) -> Result<(), BuildError> {
        if self.config.idle_timeout.is_zero() {
            return Err(BuildError::ZeroIdleTimeout);
        }

        let default_error = StateId::DEFAULT_ERROR;
        let known: HashSet<&StateId> = self
            .states
            .iter()
            .map(|state| &state.id)
            .chain(std::iter::once(&default_error))
            .collect();
        for registration in &self.handlers {
            if let Scope::State(state) = &registration.scope {
                if !known.contains(state) {
                    return Err(BuildError::UnregisteredScope {
                        event: registration.event.clone(),
                        state: state.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for StateMachineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
