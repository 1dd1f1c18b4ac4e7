use std::{
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};
use tracing::warn;

/// Opaque fire-and-forget unit of work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

struct SlotState {
    occupant: Option<Task>,
    closed: bool,
}

/// Capacity-1 rendezvous between submitters and workers.
///
/// Every state change is broadcast with `notify_all`, so waiters are woken in
/// no particular order: a submitter that blocked first is not guaranteed to be
/// served first.
pub(crate) struct HandoffSlot {
    state: Mutex<SlotState>,
    changed: Condvar,
}

impl HandoffSlot {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(SlotState {
                occupant: None,
                closed: false,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("handoff slot lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Blocks until the slot is empty, then places `task` in it.
    ///
    /// Hands the task back if the slot was closed before it could be placed.
    pub(crate) fn submit(&self, task: Task) -> Result<(), Task> {
        let mut state = self.lock();
        while state.occupant.is_some() && !state.closed {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.closed {
            return Err(task);
        }
        state.occupant = Some(task);
        drop(state);
        self.changed.notify_all();
        Ok(())
    }

    /// Takes the pending task without waiting.
    pub(crate) fn try_claim(&self) -> Option<Task> {
        let task = self.lock().occupant.take()?;
        self.changed.notify_all();
        Some(task)
    }

    /// Waits up to `timeout` for a task and takes it.
    ///
    /// Returns `None` on timeout, as soon as the slot is closed and empty, or
    /// once `give_up` holds on an empty slot. `give_up` is evaluated under the
    /// slot lock, so a state change published before [`wake_all`](Self::wake_all)
    /// is never missed. A task left in a closed slot is still handed out.
    pub(crate) fn claim<F>(&self, timeout: Duration, give_up: F) -> Option<Task>
    where
        F: Fn() -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut state = self.lock();
        while state.occupant.is_none() {
            if state.closed || give_up() {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .changed
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            state = guard;
        }
        let task = state.occupant.take();
        drop(state);
        self.changed.notify_all();
        task
    }

    /// Wakes every waiter so it re-evaluates its own exit condition.
    pub(crate) fn wake_all(&self) {
        let _state = self.lock();
        self.changed.notify_all();
    }

    pub(crate) fn is_occupied(&self) -> bool {
        self.lock().occupant.is_some()
    }

    /// Refuses further submissions and wakes every waiter.
    pub(crate) fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_all();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
