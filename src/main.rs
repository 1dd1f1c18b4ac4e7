use handoff_pool::{Config, PoolError, ThreadPool};
use std::{
    thread,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const CORE_POOL_SIZE: usize = 3;
const MAX_POOL_SIZE: usize = 6;
const TASK_COUNT: usize = 50;

fn main() -> Result<(), PoolError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();

    let now = Instant::now();
    let pool = ThreadPool::with_config(Config::new(CORE_POOL_SIZE, MAX_POOL_SIZE))?;

    for i in 1..=TASK_COUNT {
        let name = format!("task-{i}");
        let res = pool.execute(move || {
            let worker = thread::current().name().unwrap_or("?").to_string();
            info!(%worker, task = %name, "executing");
            thread::sleep(Duration::from_millis(200));
            info!(%worker, task = %name, "finished");
        });
        if let Err(e) = res {
            warn!(task = i, error = %e, "task not accepted");
        }
    }

    let m = pool.metrics();
    info!(
        active = m.active_threads,
        assigned = m.assigned_threads,
        rejected = m.rejected_tasks,
        "all tasks submitted"
    );

    pool.shutdown();
    if !pool.await_termination(Duration::from_secs(10)) {
        warn!(active = pool.active_thread_count(), "pool did not drain within 10s");
    }
    info!(elapsed = ?now.elapsed(), completed = pool.metrics().completed_tasks, "done");
    Ok(())
}
