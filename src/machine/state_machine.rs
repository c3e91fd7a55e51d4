//! The state machine facade.

use super::error::MachineError;
use super::handle::MachineHandle;
use super::main_loop;
use super::registry::StateFactory;
use super::{lock, Engine};
use crate::config::MachineConfig;
use crate::core::{EventId, Message, State, StateHistory, StateId, StateInstance, Status, StatusCode};
use crate::dispatch::{Handler, Scope, Sequence};
use crate::store::StoreError;
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, info_span, warn};
use uuid::Uuid;

/// Where [`StateMachine::start`] runs the main loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    /// Spawn a dedicated worker thread and return immediately
    #[default]
    Background,
    /// Run the loop on the calling thread until a handler stops it
    Blocking,
}

/// An event-driven state machine.
///
/// States are registered as factories; exactly one state instance is alive
/// while the machine runs. Messages are queued with [`handle`](Self::handle)
/// and dispatched in FIFO order by a single main loop, either on a worker
/// thread or on the caller's thread.
///
/// # Example
///
/// ```rust
/// use evfsm::dispatch::handler::goto;
/// use evfsm::machine::{RunMode, StateMachine};
/// use evfsm::core::{EventId, StateId};
///
/// const OFF: StateId = StateId::from_static("Off");
/// const ON: StateId = StateId::from_static("On");
/// const TOGGLE: EventId = EventId::from_static("lamp::TOGGLE");
///
/// let mut machine = StateMachine::new();
/// machine.register_state::<()>(OFF, "Off");
/// machine.register_state::<()>(ON, "On");
/// machine.on_state::<()>(TOGGLE, OFF, goto(ON), 50);
/// machine.on_state::<()>(TOGGLE, ON, goto(OFF), 50);
///
/// machine.start(OFF, None, RunMode::Background).unwrap();
/// machine.handle(TOGGLE);
/// machine.stop(true).unwrap();
/// assert_eq!(machine.previous_state_id(), ON);
/// ```
pub struct StateMachine {
    handle: MachineHandle,
    engine: Arc<Mutex<Engine>>,
    worker: Option<JoinHandle<()>>,
    config: MachineConfig,
}

impl StateMachine {
    pub fn new() -> Self {
        Self::with_config(MachineConfig::default())
    }

    pub fn with_config(config: MachineConfig) -> Self {
        let handle = MachineHandle::new(&config);
        let engine = Engine::new(handle.clone(), config.history_limit);
        Self {
            handle,
            engine: Arc::new(Mutex::new(engine)),
            worker: None,
            config,
        }
    }

    pub fn id(&self) -> Uuid {
        self.handle.id()
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// A cloneable handle for feeding the machine from other threads.
    pub fn machine_handle(&self) -> MachineHandle {
        self.handle.clone()
    }

    // Registration

    /// Register a state whose data is built with `T::default()`.
    ///
    /// Returns `false` and keeps the existing entry if `id` is already known.
    pub fn register_state<T: State + Default>(&mut self, id: StateId, name: &str) -> bool {
        let factory: StateFactory = Arc::new(|| -> Box<dyn State> { Box::new(T::default()) });
        self.register_state_with(id, name, factory, false)
    }

    /// Register a state with an explicit factory, optionally replacing an
    /// existing registration.
    pub fn register_state_with(
        &mut self,
        id: StateId,
        name: &str,
        factory: StateFactory,
        override_existing: bool,
    ) -> bool {
        lock(&self.engine)
            .transitions
            .registry_mut()
            .register(id, name, factory, override_existing)
    }

    pub fn register_event_handler(
        &mut self,
        event: EventId,
        handler: Handler,
        sequence: i32,
        scope: impl Into<Scope>,
    ) {
        lock(&self.engine)
            .handlers
            .add(event, scope.into(), sequence, handler);
    }

    /// Register `handler` for `event` in every state at the default sequence.
    pub fn on(&mut self, event: EventId, handler: Handler) {
        self.register_event_handler(event, handler, Sequence::DEFAULT, Scope::Any);
    }

    /// Register `handler` for `event` while `state` is active, registering
    /// `state` with `T::default()` data if it is not known yet.
    pub fn on_state<T: State + Default>(
        &mut self,
        event: EventId,
        state: StateId,
        handler: Handler,
        sequence: i32,
    ) {
        self.register_state::<T>(state.clone(), "");
        self.register_event_handler(event, handler, sequence, Scope::State(state));
    }

    /// Remove every handler matching `(event, sequence, scope)`.
    pub fn remove_event_handler(
        &mut self,
        event: &EventId,
        sequence: i32,
        scope: impl Into<Scope>,
    ) -> usize {
        lock(&self.engine)
            .handlers
            .remove(event, sequence, &scope.into())
    }

    /// Remove the handlers for `event`, or every handler when `None`.
    pub fn remove_all_handlers(&mut self, event: Option<&EventId>) -> usize {
        lock(&self.engine).handlers.remove_all(event)
    }

    // Control

    /// Enter `initial` and run the main loop.
    ///
    /// `timeout` replaces the idle timeout when given; a zero timeout is
    /// rejected before any state is entered. Messages queued before
    /// the call, including a STOP, are dispatched once the loop runs. If
    /// `initial` is not registered, the machine lands in the default-error
    /// state, the error is returned, and no loop is started. Starting a
    /// running machine only records a warning.
    pub fn start(
        &mut self,
        initial: StateId,
        timeout: Option<Duration>,
        mode: RunMode,
    ) -> Result<(), MachineError> {
        if self.handle.is_running() {
            return Err(self.fail(MachineError::AlreadyRunning));
        }
        self.join_worker()?;

        if let Some(timeout) = timeout {
            if let Err(err) = self.handle.set_timeout(timeout) {
                return Err(self.fail(err));
            }
        }

        {
            let mut engine = lock(&self.engine);
            engine.transitions.transition(initial.clone(), false);
            if engine.transitions.current_id() != initial {
                return Err(MachineError::UnknownStateRequested { requested: initial });
            }
        }

        let span = info_span!("fsm", machine = %self.id());
        self.handle.set_running(true);
        info!(machine = %self.id(), state = %initial, ?mode, "starting state machine");

        match mode {
            RunMode::Blocking => {
                let _entered = span.enter();
                main_loop::run(&self.engine, &self.handle);
                Ok(())
            }
            RunMode::Background => {
                let engine = Arc::clone(&self.engine);
                let machine = self.handle.clone();
                let name = self
                    .config
                    .thread_name
                    .clone()
                    .unwrap_or_else(|| "evfsm-worker".to_string());
                let spawned = thread::Builder::new().name(name).spawn(move || {
                    let _entered = span.enter();
                    main_loop::run(&engine, &machine);
                });
                match spawned {
                    Ok(worker) => {
                        self.worker = Some(worker);
                        Ok(())
                    }
                    Err(err) => {
                        self.handle.set_running(false);
                        lock(&self.engine).transitions.release();
                        Err(self.fail(MachineError::SpawnFailed(err.to_string())))
                    }
                }
            }
        }
    }

    /// Ask the main loop to stop.
    ///
    /// Enqueues STOP behind every message already queued, unless a STOP is
    /// already pending. With `wait`, blocks until the worker has dispatched it
    /// and exited.
    pub fn stop(&mut self, wait: bool) -> Result<(), MachineError> {
        if !self.handle.is_running() && self.worker.is_none() {
            return Err(self.fail(MachineError::NotRunning));
        }
        self.handle.stop_if_running();
        if wait {
            self.join_worker()?;
        }
        Ok(())
    }

    /// Enqueue a message or bare event. Never waits for processing.
    pub fn handle(&self, message: impl Into<Message>) {
        self.handle.handle(message);
    }

    pub fn timeout(&self) -> Duration {
        self.handle.timeout()
    }

    /// Change the idle timeout. A zero timeout is rejected and recorded.
    pub fn set_timeout(&self, timeout: Duration) -> Result<(), MachineError> {
        self.handle.set_timeout(timeout).map_err(|err| self.fail(err))
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_running()
    }

    // Status

    /// Result of the last failed operation, or OK.
    ///
    /// The status is sticky: a dispatch error stays visible while later
    /// messages are handled successfully, until [`reset_status`](Self::reset_status)
    /// is called. It is not reset at the start of each message.
    pub fn status(&self) -> Status {
        self.handle.status()
    }

    pub fn status_code(&self) -> StatusCode {
        self.handle.status_code()
    }

    pub fn status_message(&self) -> String {
        self.handle.status().message
    }

    pub fn reset_status(&self) {
        self.handle.reset_status();
    }

    // Current state

    /// Id of the active state, or [`StateId::NULL`] when none is active.
    pub fn current_state_id(&self) -> StateId {
        lock(&self.engine).transitions.current_id()
    }

    pub fn current_state_name(&self) -> Option<String> {
        lock(&self.engine)
            .transitions
            .current()
            .map(|state| state.name().to_string())
    }

    pub fn has_current_state(&self) -> bool {
        lock(&self.engine).transitions.current().is_some()
    }

    /// Run `f` against the active state instance, if there is one.
    ///
    /// Blocks while a message is being dispatched.
    pub fn with_current_state<R>(&self, f: impl FnOnce(&StateInstance) -> R) -> Option<R> {
        lock(&self.engine).transitions.current().map(f)
    }

    pub fn previous_state_id(&self) -> StateId {
        lock(&self.engine).transitions.previous_id().clone()
    }

    /// Registered name of the previous state.
    pub fn previous_state_name(&self) -> Option<String> {
        let engine = lock(&self.engine);
        let previous = engine.transitions.previous_id();
        engine.transitions.registry().name(previous).map(str::to_string)
    }

    /// Snapshot of the recorded transitions.
    pub fn history(&self) -> StateHistory {
        lock(&self.engine).transitions.history().clone()
    }

    // Shared objects

    pub fn register_object<T: Any + Send>(&self, key: impl Into<String>, value: T) {
        self.handle.register_object(key, value);
    }

    pub fn with_object<T: Any, R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Result<R, StoreError> {
        self.handle.with_object(key, f)
    }

    pub fn remove_object(&self, key: &str) -> bool {
        self.handle.remove_object(key)
    }

    fn fail(&self, error: MachineError) -> MachineError {
        self.handle.record_error(&error);
        error
    }

    fn join_worker(&mut self) -> Result<(), MachineError> {
        match self.worker.take() {
            Some(worker) => worker
                .join()
                .map_err(|_| self.fail(MachineError::WorkerPanicked)),
            None => Ok(()),
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("handle", &self.handle)
            .field("config", &self.config)
            .field("worker", &self.worker.is_some())
            .finish()
    }
}

impl Drop for StateMachine {
    fn drop(&mut self) {
        self.handle.stop_if_running();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(machine = %self.id(), "worker panicked before shutdown");
            }
        }
    }
}
