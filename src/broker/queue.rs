//! Single-slot request queue
//!
//! Holds at most one waiting request. Pushing while a request waits replaces
//! it, which is what debounces keystroke-rate input: however fast fragments
//! arrive, at most one is in flight and one is waiting.
//!
//! The queue also owns the worker's activity flag. Both live under the same
//! lock so that the worker deciding to go idle and a submitter deciding
//! whether to start a worker can never interleave.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::broker::request::Request;

#[derive(Debug, Default)]
struct QueueState {
    slot: Option<Request>,
    running: bool,
}

/// What happened when a request was pushed
#[derive(Debug)]
pub struct Pushed {
    /// The waiting request that was dropped, if any
    pub replaced: Option<Request>,
    /// The caller must start a worker; the queue already counts it as running
    pub start_worker: bool,
}

#[derive(Debug, Default)]
pub struct RequestQueue {
    state: Mutex<QueueState>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put `request` in the slot, replacing whatever waited there
    pub fn push(&self, request: Request) -> Pushed {
        let mut state = self.lock();
        let replaced = state.slot.replace(request);
        let start_worker = !state.running;
        state.running = true;
        Pushed {
            replaced,
            start_worker,
        }
    }

    /// Take the waiting request for the worker
    ///
    /// Returns `None` when the slot is empty and marks the worker idle in the
    /// same critical section; the worker must exit after a `None`.
    pub fn next(&self) -> Option<Request> {
        let mut state = self.lock();
        let next = state.slot.take();
        if next.is_none() {
            state.running = false;
        }
        next
    }

    /// End the current worker run early, handing back any waiting request
    pub fn stop(&self) -> Option<Request> {
        let mut state = self.lock();
        state.running = false;
        state.slot.take()
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn is_empty(&self) -> bool {
        self.lock().slot.is_none()
    }
}
