//! Thread-safe FIFO of pending messages.
//!
//! Any number of producers may push; exactly one consumer (the main loop)
//! pops. Producers only hold the lock long enough to append.

use super::lock;
use crate::core::Message;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;
/// What [`MessageQueue::wait`] found when it returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// At least one message was already queued or arrived in time
    Ready,
    /// The queue stayed empty for the whole period; a TIMEOUT message was enqueued
    TimedOut,
}

/// Mutex-protected message queue with an availability condition.
#[derive(Debug, Default)]
pub struct MessageQueue {
    messages: Mutex<VecDeque<Message>>,
    available: Condvar,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a message and wake the consumer.
    pub fn push(&self, message: Message) {
        lock(&self.messages).push_back(message);
        self.available.notify_one();
    }

    /// Dequeue the oldest message without blocking.
    pub fn try_pop(&self) -> Option<Message> {
        lock(&self.messages).pop_front()
    }

    /// Block until a message is available or `timeout` elapses.
    ///
    /// When the period elapses with the queue still empty, a single TIMEOUT
    /// message is appended while the lock is held, so it is ordered after
    /// everything enqueued before the wait and before anything enqueued
    /// afterwards.
    pub fn wait(&self, timeout: Duration) -> WaitOutcome {
        let guard = lock(&self.messages);
        let (mut messages, _) = self
            .available
            .wait_timeout_while(guard, timeout, |messages| messages.is_empty())
            .unwrap_or_else(PoisonError::into_inner);

        if messages.is_empty() {
            messages.push_back(Message::timeout());
            WaitOutcome::TimedOut
        } else {
            WaitOutcome::Ready
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.messages).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.messages).is_empty()
    }

    /// Whether any queued message matches `predicate`.
    pub fn any<F>(&self, predicate: F) -> bool
    where
        F: FnMut(&Message) -> bool,
    {
        lock(&self.messages).iter().any(predicate)
    }

    /// Drop every queued message. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let mut messages = lock(&self.messages);
        let dropped = messages.len();
        messages.clear();
        dropped
    }
}
