//! The main loop: wait, drain, dispatch, until STOP.

use super::handle::MachineHandle;
use super::queue::WaitOutcome;
use super::{lock, Engine};
use std::sync::Mutex;
use tracing::{debug, info, trace};

/// Clears the running flag and the pending stop request however the loop
/// exits, including by panic.
struct RunningGuard<'a>(&'a MachineHandle);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_run();
    }
}

/// Run until a STOP message has been dispatched.
///
/// The engine lock is held for one message at a time and never across the
/// idle wait. After STOP has been dispatched the active state is released
/// and any messages still queued are left for the next start.
pub(crate) fn run(engine: &Mutex<Engine>, machine: &MachineHandle) {
    let _running = RunningGuard(machine);
    info!(timeout = ?machine.timeout(), "main loop started");

    loop {
        let timeout = machine.timeout();
        if machine.queue().wait(timeout) == WaitOutcome::TimedOut {
            trace!(?timeout, "idle period elapsed, dispatching timeout");
        }

        while let Some(message) = machine.queue().try_pop() {
            let mut guard = lock(engine);
            let report = guard.dispatch(&message);
            debug!(
                event = %message.event(),
                invoked = report.invoked,
                transitions = report.transitions,
                status = %report.status,
                "message dispatched"
            );

            if message.is_stop() {
                guard.transitions.release();
                info!(
                    previous = %guard.transitions.previous_id(),
                    pending = machine.queue().len(),
                    "main loop stopped"
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MachineConfig;
    use crate::core::{EventId, Message, State, StateId, StateInstance};
    use crate::dispatch::handler::{stay, Scope, Sequence};
    use crate::machine::StateFactory;
    use std::sync::Arc;
    use std::time::Duration;

    const IDLE: StateId = StateId::from_static("Idle");
    const PING: EventId = EventId::from_static("test::PING");

    fn engine(config: &MachineConfig) -> (Mutex<Engine>, MachineHandle) {
        let machine = MachineHandle::new(config);
        let mut engine = Engine::new(machine.clone(), 8);
        let factory: StateFactory = Arc::new(|| -> Box<dyn State> { Box::new(()) });
        engine.transitions.registry_mut().register(IDLE, "", factory, false);
        engine.transitions.transition(IDLE, false);
        (Mutex::new(engine), machine)
    }

    fn count(engine: &Mutex<Engine>, event: EventId) -> Arc<Mutex<Vec<EventId>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        lock(engine).handlers.add(
            event,
            Scope::Any,
            Sequence::DEFAULT,
            stay(move |_: &mut StateInstance, message| {
                sink.lock().unwrap().push(message.event().clone());
            }),
        );
        seen
    }

    #[test]
    fn drains_in_order_then_stops() {
        let (engine, machine) = engine(&MachineConfig::default());
        let seen = count(&engine, PING);
        machine.handle(Message::new(PING).with_param("n", "1"));
        machine.handle(PING);
        machine.stop();
        machine.handle(PING);
        machine.set_running(true);

        run(&engine, &machine);

        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(!machine.is_running());
        assert!(lock(&engine).transitions.current().is_none());
        assert_eq!(machine.queue().len(), 1);

        // The next stop request belongs to the next run.
        machine.stop();
        assert_eq!(machine.queue().len(), 2);
    }

    #[test]
    fn idle_wait_synthesizes_timeout() {
        let config = MachineConfig::default().with_idle_timeout(Duration::from_millis(5));
        let (engine, machine) = engine(&config);
        let timeouts = Arc::new(Mutex::new(0usize));
        let sink = timeouts.clone();
        lock(&engine).handlers.add(
            EventId::TIMEOUT,
            Scope::Any,
            Sequence::DEFAULT,
            stay(move |state: &mut StateInstance, _| {
                let mut count = sink.lock().unwrap();
                *count += 1;
                if *count == 3 {
                    state.machine().stop();
                }
            }),
        );

        run(&engine, &machine);

        assert_eq!(*timeouts.lock().unwrap(), 3);
    }
}
