use super::model::WorkerRole;
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard,
    },
    thread::JoinHandle,
};
use tracing::warn;

/// Roster entry for one worker thread.
pub(crate) struct WorkerHandle {
    id: usize,
    role: WorkerRole,
    active: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub(crate) fn new(
        id: usize,
        role: WorkerRole,
        active: Arc<AtomicBool>,
        thread: JoinHandle<()>,
    ) -> Self {
        Self {
            id,
            role,
            active,
            thread: Some(thread),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub(crate) fn role(&self) -> WorkerRole {
        self.role
    }

    /// True until the underlying thread has returned.
    pub(crate) fn is_alive(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Asks the worker to stop after its current task.
    pub(crate) fn close(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Joins a thread that has already finished.
    fn reap(mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!(worker = self.id, role = %self.role, "worker thread exited by panic");
            }
        }
    }
}

/// Worker registry shared by the controller and the scaling monitor.
pub(crate) struct Roster {
    workers: Mutex<Vec<WorkerHandle>>,
    next_id: AtomicUsize,
}

impl Roster {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            workers: Mutex::new(Vec::with_capacity(capacity)),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Ids start at 1 and are never reused.
    pub(crate) fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<WorkerHandle>> {
        self.workers.lock().unwrap_or_else(|poisoned| {
            warn!("worker roster lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn core_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|w| w.role() == WorkerRole::Core)
            .count()
    }

    pub(crate) fn close_all(&self) {
        for worker in self.lock().iter() {
            worker.close();
        }
    }
}

/// Removes every record whose thread has exited, keeping the order of the
/// survivors, and returns the id and role of each one removed.
pub(crate) fn reap_finished(workers: &mut Vec<WorkerHandle>) -> Vec<(usize, WorkerRole)> {
    if workers.iter().all(WorkerHandle::is_alive) {
        return Vec::new();
    }
    let mut reaped = Vec::new();
    let mut kept = Vec::with_capacity(workers.len());
    for worker in workers.drain(..) {
        if worker.is_alive() {
            kept.push(worker);
        } else {
            reaped.push((worker.id(), worker.role()));
            worker.reap();
        }
    }
    *workers = kept;
    reaped
}
