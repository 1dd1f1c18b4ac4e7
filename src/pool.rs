use super::{
    errors::{PoolError, PoolResult},
    handle::Roster,
    model::{PoolMetrics, WorkerRole},
    monitor::{ScalingMonitor, Termination},
    slot::{HandoffSlot, Task},
    worker::Worker,
};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use crossbeam::utils::CachePadded;
use tracing::{debug, info, warn};

pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_IDLE_WAIT: Duration = Duration::from_millis(500);

/// Конфигурация пула потоков.
/// Семантику меняют только два размера, остальное влияет на задержки и имена потоков.
#[derive(Debug, Clone)]
pub struct Config {
    pub core_pool_size: usize,
    pub max_pool_size: usize,
    /// Такт монитора масштабирования.
    pub monitor_interval: Duration,
    /// How long an idle worker sleeps on the slot before re-checking its flags.
    pub idle_wait: Duration,
    pub thread_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        let num_cpus = num_cpus::get();
        Self::new(num_cpus, num_cpus * 2)
    }
}

impl Config {
    pub fn new(core_pool_size: usize, max_pool_size: usize) -> Self {
        Self {
            core_pool_size,
            max_pool_size,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            idle_wait: DEFAULT_IDLE_WAIT,
            thread_name_prefix: "pool-worker".to_string(),
        }
    }

    pub fn cpu_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self::new(num_cpus, num_cpus)
    }

    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self::new(num_cpus, num_cpus * 4)
    }

    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    pub fn with_idle_wait(mut self, wait: Duration) -> Self {
        self.idle_wait = wait;
        self
    }

    pub fn with_thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.core_pool_size == 0 {
            return Err(PoolError::InvalidConfig(
                "core_pool_size must be positive".into(),
            ));
        }
        if self.max_pool_size < self.core_pool_size {
            return Err(PoolError::InvalidConfig(format!(
                "max_pool_size {} is below core_pool_size {}",
                self.max_pool_size, self.core_pool_size
            )));
        }
        if self.monitor_interval.is_zero() || self.idle_wait.is_zero() {
            return Err(PoolError::InvalidConfig(
                "monitor_interval and idle_wait must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// State shared by the controller, the workers and the monitor.
pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) slot: HandoffSlot,
    pub(crate) roster: Roster,
    /// Воркеры, которые сейчас выполняют задачу.
    pub(crate) assigned: CachePadded<AtomicUsize>,
    /// Worker threads that have started and not yet returned.
    pub(crate) live: AtomicUsize,
    pub(crate) completed: AtomicUsize,
    pub(crate) failed: AtomicUsize,
    pub(crate) rejected: AtomicUsize,
    pub(crate) shutdown: AtomicBool,
    pub(crate) termination: Termination,
}

/// Elastic pool of OS threads fed through a single-slot handoff.
///
/// `core_pool_size` workers live for the whole life of the pool. When every
/// core worker is busy and a task is still waiting in the slot, the scaling
/// monitor adds one overflow worker per tick, up to `max_pool_size`. Overflow
/// workers retire as soon as they find the slot empty while fewer than
/// `core_pool_size` workers are busy.
///
/// The saturation check in [`execute`](Self::execute) reads the assigned
/// count without holding the slot lock. Two callers can both pass the check
/// at the boundary, so the pool may briefly accept one task more than
/// `max_pool_size` busy workers would suggest; the extra task waits in the
/// slot like any other.
pub struct ThreadPool {
    shared: Arc<Shared>,
}

impl ThreadPool {
    pub fn new(core_pool_size: usize, max_pool_size: usize) -> PoolResult<Self> {
        Self::with_config(Config::new(core_pool_size, max_pool_size))
    }

    pub fn with_config(config: Config) -> PoolResult<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            slot: HandoffSlot::new(),
            roster: Roster::new(config.max_pool_size),
            assigned: CachePadded::new(AtomicUsize::new(0)),
            live: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            rejected: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            termination: Termination::new(),
            config,
        });
        let pool = ThreadPool { shared };

        {
            let mut workers = pool.shared.roster.lock();
            for _ in 0..pool.shared.config.core_pool_size {
                match Worker::spawn(&pool.shared, WorkerRole::Core) {
                    Ok(worker) => workers.push(worker),
                    Err(e) => {
                        drop(workers);
                        pool.shutdown();
                        return Err(e.into());
                    }
                }
            }
        }

        if let Err(e) = ScalingMonitor::spawn(&pool.shared) {
            pool.shutdown();
            return Err(e.into());
        }

        debug!(
            core = pool.shared.config.core_pool_size,
            max = pool.shared.config.max_pool_size,
            "thread pool started"
        );
        Ok(pool)
    }

    /// Hands `f` to an idle worker.
    ///
    /// Blocks while another submitted task is still waiting to be claimed.
    /// Fails fast with [`PoolError::Saturated`] when every worker the pool may
    /// own is busy, and with [`PoolError::ShutDown`] once shutdown started.
    pub fn execute<F>(&self, f: F) -> PoolResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.execute_task(Box::new(f))
    }

    pub fn execute_task(&self, task: Task) -> PoolResult<()> {
        let shared = &self.shared;
        if shared.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::ShutDown);
        }

        let assigned = shared.assigned.load(Ordering::Acquire);
        let max = shared.config.max_pool_size;
        if assigned >= max {
            let rejected_total = shared.rejected.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(assigned, max, rejected_total, "task rejected, pool saturated");
            return Err(PoolError::Saturated { assigned, max });
        }

        shared.slot.submit(task).map_err(|_| PoolError::ShutDown)
    }

    /// Starts teardown and returns immediately.
    ///
    /// Blocked submitters are released with [`PoolError::ShutDown`]. Workers
    /// finish their current task, run the task left in the slot if any, and
    /// exit. The monitor stops once it has reaped them all.
    pub fn shutdown(&self) {
        let shared = &self.shared;
        if shared.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }
        info!(
            active = shared.live.load(Ordering::Acquire),
            assigned = shared.assigned.load(Ordering::Acquire),
            "thread pool shutting down"
        );
        shared.slot.close();
        shared.roster.close_all();
    }

    /// Waits until every worker has exited and been reaped after
    /// [`shutdown`](Self::shutdown). Returns `false` on timeout.
    pub fn await_termination(&self, timeout: Duration) -> bool {
        self.shared.termination.wait(timeout)
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.load(Ordering::Acquire)
    }

    pub fn is_terminated(&self) -> bool {
        self.shared.termination.is_done()
    }

    /// Worker threads currently running, busy or idle.
    pub fn active_thread_count(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    /// Worker threads currently executing a task.
    pub fn assigned_thread_count(&self) -> usize {
        self.shared.assigned.load(Ordering::Acquire)
    }

    pub fn core_pool_size(&self) -> usize {
        self.shared.config.core_pool_size
    }

    pub fn max_pool_size(&self) -> usize {
        self.shared.config.max_pool_size
    }

    /// Records in the roster, including exited workers not yet reaped.
    pub fn roster_len(&self) -> usize {
        self.shared.roster.len()
    }

    pub fn core_worker_count(&self) -> usize {
        self.shared.roster.core_count()
    }

    pub fn rejected_count(&self) -> usize {
        self.shared.rejected.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> PoolMetrics {
        let shared = &self.shared;
        PoolMetrics {
            active_threads: shared.live.load(Ordering::Acquire),
            assigned_threads: shared.assigned.load(Ordering::Acquire),
            roster_len: shared.roster.len(),
            core_pool_size: shared.config.core_pool_size,
            max_pool_size: shared.config.max_pool_size,
            completed_tasks: shared.completed.load(Ordering::Relaxed),
            failed_tasks: shared.failed.load(Ordering::Relaxed),
            rejected_tasks: shared.rejected.load(Ordering::Relaxed),
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
