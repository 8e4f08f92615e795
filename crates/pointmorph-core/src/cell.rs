//! Latest-value handoff between the gesture producer thread and the frame loop.

use std::sync::{Arc, Mutex, MutexGuard};

/// Single-slot mailbox. Publishing overwrites any value the reader has not
/// taken yet, so the reader always sees the newest one.
#[derive(Debug)]
pub struct LatestCell<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for LatestCell<T> {
    fn clone(&self) -> Self {
        Self { slot: Arc::clone(&self.slot) }
    }
}

impl<T> Default for LatestCell<T> {
    fn default() -> Self {
        Self { slot: Arc::new(Mutex::new(None)) }
    }
}

impl<T> LatestCell<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // Poisoning is ignored: the slot only ever holds a whole value or nothing.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the pending value. Returns `true` if an unread value was dropped.
    pub fn publish(&self, value: T) -> bool {
        self.lock().replace(value).is_some()
    }

    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }
}
