use super::{
    handle::reap_finished,
    model::WorkerRole,
    pool::Shared,
    worker::Worker,
};
use std::{
    io,
    sync::{atomic::Ordering, Arc, Condvar, Mutex, PoisonError},
    thread,
    time::{Duration, Instant},
};
use tracing::{debug, error};

/// Background loop that grows the roster under load and reaps exited workers.
///
/// It polls on a fixed interval instead of reacting to slot events, so the
/// interval bounds both scale-up latency and reap latency. Shorter intervals
/// react faster at the cost of more wake-ups on an idle pool.
pub(crate) struct ScalingMonitor {
    shared: Arc<Shared>,
}

impl ScalingMonitor {
    pub(crate) fn spawn(shared: &Arc<Shared>) -> io::Result<thread::JoinHandle<()>> {
        let monitor = ScalingMonitor {
            shared: shared.clone(),
        };
        thread::Builder::new()
            .name(format!("{}-monitor", shared.config.thread_name_prefix))
            .spawn(move || monitor.run())
    }

    fn run(self) {
        debug!(interval = ?self.shared.config.monitor_interval, "scaling monitor started");
        loop {
            if self.shared.roster.len() == 0 {
                break;
            }
            thread::sleep(self.shared.config.monitor_interval);
            self.tick();
        }
        debug!("roster drained, scaling monitor stopped");
        self.shared.termination.signal();
    }

    /// One scale-up decision followed by one reap pass.
    pub(crate) fn tick(&self) {
        let shared = &self.shared;
        let config = &shared.config;
        let mut workers = shared.roster.lock();

        // At most one new worker per tick.
        if !shared.shutdown.load(Ordering::Acquire)
            && shared.slot.is_occupied()
            && shared.assigned.load(Ordering::Acquire) >= config.core_pool_size
            && workers.len() < config.max_pool_size
        {
            match Worker::spawn(shared, WorkerRole::Overflow) {
                Ok(worker) => {
                    debug!(worker = worker.id(), roster = workers.len() + 1, "overflow worker spawned");
                    workers.push(worker);
                }
                Err(e) => error!(error = %e, "failed to spawn overflow worker, will retry"),
            }
        }

        for (id, role) in reap_finished(&mut workers) {
            debug!(
                worker = id,
                %role,
                active = shared.live.load(Ordering::Acquire),
                roster = workers.len(),
                "worker reaped"
            );
        }
    }
}

/// Одноразовый флаг: поднимается, когда монитор завершился после опустошения ростера.
pub(crate) struct Termination {
    done: Mutex<bool>,
    cond: Condvar,
}

impl Termination {
    pub(crate) fn new() -> Self {
        Self {
            done: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn signal(&self) {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.cond.notify_all();
    }

    pub(crate) fn is_done(&self) -> bool {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        while !*done {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            done = self
                .cond
                .wait_timeout(done, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}
