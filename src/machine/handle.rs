//! Cloneable back-reference to a running machine.
//!
//! A [`MachineHandle`] owns nothing but the parts of the machine that are
//! safe to touch from any thread: the message queue, the status record, the
//! idle timeout, the running flag and the object store. Every state
//! instance carries one, so handlers can enqueue follow-up messages, stop
//! the machine from inside the loop, or read shared objects.

use super::error::MachineError;
use super::lock;
use super::queue::MessageQueue;
use crate::config::MachineConfig;
use crate::core::{Message, Status, StatusCode};
use crate::store::{ObjectStore, StoreError};
use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

struct Shared {
    id: Uuid,
    queue: MessageQueue,
    status: Mutex<Status>,
    timeout_ms: AtomicU64,
    running: AtomicBool,
    /// Set while a STOP is queued or being dispatched for the current run
    stop_requested: Mutex<bool>,
    stop_processing: AtomicBool,
    objects: Mutex<ObjectStore>,
}

#[derive(Clone)]
pub struct MachineHandle {
    shared: Arc<Shared>,
}

impl MachineHandle {
    pub(crate) fn new(config: &MachineConfig) -> Self {
        let handle = Self {
            shared: Arc::new(Shared {
                id: Uuid::new_v4(),
                queue: MessageQueue::new(),
                status: Mutex::new(Status::ok()),
                timeout_ms: AtomicU64::new(0),
                running: AtomicBool::new(false),
                stop_requested: Mutex::new(false),
                stop_processing: AtomicBool::new(false),
                objects: Mutex::new(ObjectStore::new()),
            }),
        };
        if config.idle_timeout.is_zero() {
            warn!(
                default = ?MachineConfig::DEFAULT_IDLE_TIMEOUT,
                "zero idle timeout configured, using default"
            );
            handle.store_timeout(MachineConfig::DEFAULT_IDLE_TIMEOUT);
        } else {
            handle.store_timeout(config.idle_timeout);
        }
        handle
    }

    /// Unique id of the owning machine, used to tag log output.
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Enqueue a message for the main loop. Never waits for processing.
    pub fn handle(&self, message: impl Into<Message>) {
        self.shared.queue.push(message.into());
    }

    /// Enqueue the STOP sentinel, unless one is already pending.
    ///
    /// A STOP counts as pending from the moment it is queued until the main
    /// loop that dispatches it has exited, so repeated requests during
    /// shutdown cannot leak a STOP into the next run.
    pub fn stop(&self) {
        let mut requested = lock(&self.shared.stop_requested);
        if !*requested {
            *requested = true;
            self.shared.queue.push(Message::stop());
        }
    }

    /// Like [`stop`](Self::stop), but only while the main loop is running.
    pub(crate) fn stop_if_running(&self) {
        let mut requested = lock(&self.shared.stop_requested);
        if self.is_running() && !*requested {
            *requested = true;
            self.shared.queue.push(Message::stop());
        }
    }

    /// Mark the main loop as exited and accept a new stop request.
    pub(crate) fn finish_run(&self) {
        let mut requested = lock(&self.shared.stop_requested);
        self.shared.running.store(false, Ordering::SeqCst);
        *requested = false;
    }

    pub fn queue(&self) -> &MessageQueue {
        &self.shared.queue
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub(crate) fn set_running(&self, running: bool) {
        self.shared.running.store(running, Ordering::SeqCst);
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.shared.timeout_ms.load(Ordering::Relaxed))
    }

    /// Change the idle timeout. Takes effect from the next idle wait.
    ///
    /// A zero timeout would turn the idle wait into a busy loop and is
    /// rejected; the current timeout is kept.
    pub fn set_timeout(&self, timeout: Duration) -> Result<(), MachineError> {
        if timeout.is_zero() {
            return Err(MachineError::ZeroIdleTimeout);
        }
        self.store_timeout(timeout);
        Ok(())
    }

    /// Stored at millisecond resolution, never below one millisecond.
    fn store_timeout(&self, timeout: Duration) {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX).max(1);
        self.shared.timeout_ms.store(millis, Ordering::Relaxed);
    }

    /// Last recorded status.
    ///
    /// Errors are sticky: successful messages dispatched afterwards do not
    /// clear them, only [`reset_status`](Self::reset_status) does.
    pub fn status(&self) -> Status {
        lock(&self.shared.status).clone()
    }

    pub fn status_code(&self) -> StatusCode {
        lock(&self.shared.status).code
    }

    pub fn reset_status(&self) {
        *lock(&self.shared.status) = Status::ok();
    }

    /// Record `error` as the machine status and log it.
    pub(crate) fn record_error(&self, error: &MachineError) -> StatusCode {
        let code = error.status_code();
        warn!(machine = %self.id(), status = %code, "{}", error);
        *lock(&self.shared.status) = Status {
            code,
            message: error.to_string(),
        };
        code
    }

    /// Skip the remaining handlers for the event currently being dispatched.
    pub fn stop_processing_current_event(&self) {
        self.shared.stop_processing.store(true, Ordering::SeqCst);
    }

    pub(crate) fn begin_dispatch(&self) {
        self.shared.stop_processing.store(false, Ordering::SeqCst);
    }

    pub(crate) fn take_stop_processing(&self) -> bool {
        self.shared.stop_processing.swap(false, Ordering::SeqCst)
    }

    /// Store an object that outlives individual states.
    pub fn register_object<T: Any + Send>(&self, key: impl Into<String>, value: T) {
        lock(&self.shared.objects).insert(key, value);
    }

    /// Run `f` against the object stored under `key`.
    pub fn with_object<T: Any, R>(
        &self,
        key: &str,
        f: impl FnOnce(&T) -> R,
    ) -> Result<R, StoreError> {
        let objects = lock(&self.shared.objects);
        objects.get::<T>(key).map(f)
    }

    /// Run `f` against a mutable reference to the object stored under `key`.
    pub fn with_object_mut<T: Any, R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut T) -> R,
    ) -> Result<R, StoreError> {
        let mut objects = lock(&self.shared.objects);
        objects.get_mut::<T>(key).map(f)
    }

    pub fn remove_object(&self, key: &str) -> bool {
        lock(&self.shared.objects).remove(key)
    }
}

impl fmt::Debug for MachineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineHandle")
            .field("id", &self.id())
            .field("running", &self.is_running())
            .field("queued", &self.shared.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EventId, StateId};

    fn handle() -> MachineHandle {
        MachineHandle::new(&MachineConfig::default())
    }

    #[test]
    fn timeout_comes_from_config() {
        let config = MachineConfig::default().with_idle_timeout(Duration::from_millis(750));
        let handle = MachineHandle::new(&config);
        assert_eq!(handle.timeout(), Duration::from_millis(750));

        handle.set_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(handle.timeout(), Duration::from_secs(2));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let handle = handle();
        assert_eq!(
            handle.set_timeout(Duration::ZERO),
            Err(MachineError::ZeroIdleTimeout)
        );
        assert_eq!(handle.timeout(), MachineConfig::DEFAULT_IDLE_TIMEOUT);

        handle.set_timeout(Duration::from_micros(300)).unwrap();
        assert_eq!(handle.timeout(), Duration::from_millis(1));

        let config = MachineConfig::default().with_idle_timeout(Duration::ZERO);
        let handle = MachineHandle::new(&config);
        assert_eq!(handle.timeout(), MachineConfig::DEFAULT_IDLE_TIMEOUT);
    }

    #[test]
    fn pending_stop_is_queued_once() {
        let handle = handle();
        handle.stop();
        handle.clone().stop();
        assert_eq!(handle.queue().len(), 1);

        // Popping the STOP does not end the request; the loop exiting does.
        assert!(handle.queue().try_pop().unwrap().is_stop());
        handle.stop();
        assert!(handle.queue().is_empty());

        handle.finish_run();
        handle.stop();
        assert_eq!(handle.queue().len(), 1);
    }

    #[test]
    fn stop_if_running_ignores_idle_machine() {
        let handle = handle();
        handle.stop_if_running();
        assert!(handle.queue().is_empty());

        handle.set_running(true);
        handle.stop_if_running();
        handle.stop_if_running();
        assert_eq!(handle.queue().len(), 1);

        handle.finish_run();
        assert!(!handle.is_running());
    }

    #[test]
    fn clones_share_the_same_queue() {
        let handle = handle();
        let other = handle.clone();
        other.handle(EventId::from_static("test::X"));
        other.stop();
        assert_eq!(handle.id(), other.id());
        assert_eq!(handle.queue().len(), 2);
        assert!(handle.queue().try_pop().is_some());
        assert!(handle.queue().try_pop().unwrap().is_stop());
    }

    #[test]
    fn recorded_error_is_visible_until_reset() {
        let handle = handle();
        let code = handle.record_error(&MachineError::UnknownStateRequested {
            requested: StateId::from_static("Nowhere"),
        });
        assert_eq!(code, StatusCode::UnknownStateRequested);
        assert_eq!(handle.status_code(), StatusCode::UnknownStateRequested);
        assert!(handle.status().message.contains("Nowhere"));

        handle.reset_status();
        assert_eq!(handle.status(), Status::ok());
    }

    #[test]
    fn stop_processing_flag_is_consumed_once() {
        let handle = handle();
        handle.begin_dispatch();
        assert!(!handle.take_stop_processing());
        handle.stop_processing_current_event();
        assert!(handle.take_stop_processing());
        assert!(!handle.take_stop_processing());
    }

    #[test]
    fn objects_are_shared_between_clones() {
        let handle = handle();
        handle.register_object("visits", 0u32);
        handle
            .clone()
            .with_object_mut::<u32, _>("visits", |v| *v += 1)
            .unwrap();
        assert_eq!(handle.with_object::<u32, _>("visits", |v| *v), Ok(1));
        assert!(handle.remove_object("visits"));
        assert!(matches!(
            handle.with_object::<u32, _>("visits", |v| *v),
            Err(StoreError::NotFound { .. })
        ));
    }
}
