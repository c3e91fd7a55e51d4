//! Dispatch of one message against the handler table.

use super::table::HandlerTable;
use crate::core::{Message, StatusCode};
use crate::machine::{MachineError, TransitionEngine};
use tracing::{debug, trace};

/// Summary of what a single dispatch did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchReport {
    /// Machine status after the dispatch
    pub status: StatusCode,
    /// Number of handlers invoked
    pub invoked: usize,
    /// Number of transitions applied
    pub transitions: usize,
    /// Whether an override or an explicit stop ended the pass early
    pub short_circuited: bool,
}

/// Run the handlers for `message` against the active state.
///
/// Entries run in ascending sequence order. An entry scoped to a state only
/// fires while that state is active, and the check is repeated for every
/// entry, so a transition requested by one handler is visible to the
/// entries after it. A handler's target is applied immediately when it is
/// neither null nor the state that was active when the handler was called.
/// The pass ends after an override entry runs or after a handler asks to
/// stop processing. An event with no handlers is ignored.
pub fn dispatch(
    table: &HandlerTable,
    engine: &mut TransitionEngine,
    message: &Message,
) -> DispatchReport {
    let machine = engine.machine().clone();
    machine.begin_dispatch();

    let mut report = DispatchReport {
        status: machine.status_code(),
        invoked: 0,
        transitions: 0,
        short_circuited: false,
    };

    if engine.current().is_none() {
        report.status = machine.record_error(&MachineError::CurrentStateUndefined);
        return report;
    }

    let entries = table.entries(message.event());
    if entries.is_empty() {
        trace!(event = %message.event(), "no handlers registered, event ignored");
        return report;
    }

    for entry in entries {
        let Some(state) = engine.current_mut() else {
            machine.record_error(&MachineError::CurrentStateUndefined);
            break;
        };
        if !entry.scope().matches(state.id()) {
            continue;
        }

        let active = state.id().clone();
        let next = entry.call(state, message);
        report.invoked += 1;

        if !next.is_null() && next != active {
            engine.transition_on(next, true, Some(message.event()));
            report.transitions += 1;
        }

        if entry.is_override() || machine.take_stop_processing() {
            debug!(
                event = %message.event(),
                sequence = entry.sequence(),
                "dispatch ended early"
            );
            report.short_circuited = true;
            break;
        }
    }

    report.status = machine.status_code();
    report
}
