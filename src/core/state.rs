//! States and live state instances.
//!
//! Host-defined state data implements [`State`]. The machine wraps the
//! data in a [`StateInstance`] when the state is entered and drops the
//! instance when the state is left. Exactly one instance is alive at a time.

use super::id::StateId;
use crate::machine::MachineHandle;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::fmt;
use std::time::Duration;

/// Upcast helper so boxed states can be downcast to their concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Trait for host-defined state data.
///
/// All hooks have empty defaults, so a plain struct only needs an empty
/// `impl State for MyState {}`. The unit type is a ready-made state with no
/// data.
///
/// # Example
///
/// ```rust
/// use evfsm::core::State;
/// use evfsm::machine::MachineHandle;
///
/// #[derive(Default)]
/// struct Connected {
///     packets: usize,
/// }
///
/// impl State for Connected {
///     fn on_enter(&mut self, _machine: &MachineHandle) {
///         self.packets = 0;
///     }
/// }
/// ```
pub trait State: AsAny + Send + 'static {
    /// Called once, right after the instance is constructed.
    fn on_enter(&mut self, _machine: &MachineHandle) {}

    /// Called once, right before the instance is destroyed.
    fn on_exit(&mut self, _machine: &MachineHandle) {}

    /// Whether this state represents an error condition.
    fn is_error(&self) -> bool {
        false
    }
}

impl State for () {}

impl dyn State {
    pub fn downcast_ref<T: State>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    pub fn downcast_mut<T: State>(&mut self) -> Option<&mut T> {
        AsAny::as_any_mut(self).downcast_mut::<T>()
    }
}

/// The live instance of the active state.
///
/// Dropping an instance runs the state's `on_exit` hook, so replacing the
/// machine's current instance always finishes the old state before the new
/// one is built.
pub struct StateInstance {
    id: StateId,
    name: String,
    entered_at: DateTime<Utc>,
    previous: StateId,
    machine: MachineHandle,
    data: Box<dyn State>,
}

impl StateInstance {
    /// Wrap freshly constructed state data and run its entry hook.
    pub(crate) fn enter(
        id: StateId,
        name: String,
        previous: StateId,
        machine: MachineHandle,
        data: Box<dyn State>,
    ) -> Self {
        let mut instance = Self {
            id,
            name,
            entered_at: Utc::now(),
            previous,
            machine,
            data,
        };
        instance.data.on_enter(&instance.machine);
        instance
    }

    pub fn id(&self) -> &StateId {
        &self.id
    }

    /// Name the state was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wall-clock time at which the state was entered.
    pub fn entered_at(&self) -> DateTime<Utc> {
        self.entered_at
    }

    /// Time spent in this state so far.
    pub fn elapsed(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.entered_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// State that was active before this one, or [`StateId::NULL`].
    pub fn previous_id(&self) -> &StateId {
        &self.previous
    }

    /// Back-reference to the owning machine.
    pub fn machine(&self) -> &MachineHandle {
        &self.machine
    }

    pub fn data<T: State>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    pub fn data_mut<T: State>(&mut self) -> Option<&mut T> {
        self.data.downcast_mut::<T>()
    }

    pub fn is_error(&self) -> bool {
        self.data.is_error()
    }

    /// Skip the remaining handlers for the event currently being dispatched.
    pub fn stop_processing(&self) {
        self.machine.stop_processing_current_event();
    }
}

impl Drop for StateInstance {
    fn drop(&mut self) {
        self.data.on_exit(&self.machine);
    }
}

impl fmt::Debug for StateInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateInstance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entered_at", &self.entered_at)
            .field("previous", &self.previous)
            .finish_non_exhaustive()
    }
}
