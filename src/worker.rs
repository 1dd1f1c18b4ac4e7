use super::{
    handle::WorkerHandle,
    model::WorkerRole,
    pool::Shared,
    slot::Task,
};
use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};
use tracing::{debug, debug_span, error, info, trace};

/// One pool thread. Core and overflow workers share this loop and differ only
/// in their [`WorkerRole`] retirement policy.
pub(crate) struct Worker {
    id: usize,
    role: WorkerRole,
    active: Arc<AtomicBool>,
    shared: Arc<Shared>,
}

/// Keeps the live-thread counter honest on every exit path.
struct LiveGuard<'a>(&'a AtomicUsize);

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Worker {
    /// Starts a named worker thread and returns its roster record.
    pub(crate) fn spawn(shared: &Arc<Shared>, role: WorkerRole) -> io::Result<WorkerHandle> {
        let id = shared.roster.next_id();
        let active = Arc::new(AtomicBool::new(true));
        let worker = Worker {
            id,
            role,
            active: active.clone(),
            shared: shared.clone(),
        };

        shared.live.fetch_add(1, Ordering::AcqRel);
        let spawned = thread::Builder::new()
            .name(format!("{}-{}", shared.config.thread_name_prefix, id))
            .spawn(move || worker.run());

        match spawned {
            Ok(thread) => Ok(WorkerHandle::new(id, role, active, thread)),
            Err(e) => {
                shared.live.fetch_sub(1, Ordering::AcqRel);
                Err(e)
            }
        }
    }

    fn run(self) {
        let _live = LiveGuard(&self.shared.live);
        let _span = debug_span!("worker", id = self.id, role = %self.role).entered();
        debug!("worker started");

        let slot = &self.shared.slot;
        let core_pool_size = self.shared.config.core_pool_size;

        while self.active.load(Ordering::Acquire) {
            if let Some(task) = slot.try_claim() {
                self.execute(task);
                continue;
            }

            let assigned = self.shared.assigned.load(Ordering::Acquire);
            if self.role.should_retire(assigned, core_pool_size) {
                info!(assigned, core_pool_size, "worker is not needed any more");
                return;
            }

            let retire = || {
                self.role
                    .should_retire(self.shared.assigned.load(Ordering::Acquire), core_pool_size)
            };
            match slot.claim(self.shared.config.idle_wait, retire) {
                Some(task) => self.execute(task),
                None if slot.is_closed() => break,
                None => {}
            }
        }

        // A task placed before the slot closed was accepted; run it before leaving.
        if slot.is_closed() {
            if let Some(task) = slot.try_claim() {
                self.execute(task);
            }
        }
        debug!("worker stopped");
    }

    fn execute(&self, task: Task) {
        let shared = &self.shared;
        shared.assigned.fetch_add(1, Ordering::AcqRel);
        trace!("task claimed");

        let outcome = panic::catch_unwind(AssertUnwindSafe(task));

        let assigned = shared.assigned.fetch_sub(1, Ordering::AcqRel) - 1;
        if assigned < shared.config.core_pool_size {
            // Idle overflow workers parked on the slot may now be surplus.
            shared.slot.wake_all();
        }
        match outcome {
            Ok(()) => {
                shared.completed.fetch_add(1, Ordering::Relaxed);
                trace!("task finished");
            }
            Err(payload) => {
                shared.failed.fetch_add(1, Ordering::Relaxed);
                error!(panic = %panic_message(payload.as_ref()), "task panicked");
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
