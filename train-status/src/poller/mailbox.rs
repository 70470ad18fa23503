//! Single-slot, latest-wins mailbox.
//!
//! The poller's trigger queue has capacity one: a newer trigger
//! overwrites an unconsumed older one, so bursts of external events can
//! never build a backlog of poll cycles. The consumer blocks only while
//! the slot is empty.

use std::sync::{Mutex, PoisonError};

use tokio::sync::Notify;

/// A conflated channel of capacity one.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    notify: Notify,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    /// Put a value in the slot, replacing any unconsumed one.
    pub fn send(&self, value: T) {
        *self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(value);
        self.notify.notify_one();
    }

    /// Take the current value, waiting while the slot is empty.
    pub async fn recv(&self) -> T {
        loop {
            // Check before waiting: notify_one stores a permit when no
            // waiter is registered, so a send landing between the check
            // and the await is not lost.
            if let Some(value) = self
                .slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
            {
                return value;
            }
            self.notify.notified().await;
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
