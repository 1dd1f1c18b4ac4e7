//! Elastic thread pool fed through a single-slot handoff
//!
//! # Features
//! - Fixed set of core workers plus overflow workers up to a hard maximum
//! - Capacity-1 handoff slot: submitters block while a task waits to be claimed
//! - Fail-fast rejection once every permitted worker is busy
//! - Periodic scaling monitor that grows the roster and reaps exited workers
//! - Panics inside tasks are caught, counted and logged; workers survive them
//! - Non-blocking shutdown with an optional wait for full termination

pub mod errors;
mod handle;
pub mod model;
mod monitor;
pub mod pool;
mod slot;
mod worker;

pub use errors::{PoolError, PoolResult};
pub use model::{PoolMetrics, WorkerRole};
pub use pool::{Config, ThreadPool};
pub use slot::Task;
