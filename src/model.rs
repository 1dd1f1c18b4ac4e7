use std::fmt;

/// Whether a worker is part of the fixed core or was added to absorb a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerRole {
    Core,
    Overflow,
}

impl WorkerRole {
    /// Overflow workers retire as soon as the core alone can carry the load.
    #[inline]
    pub fn should_retire(self, assigned: usize, core_pool_size: usize) -> bool {
        match self {
            WorkerRole::Core => false,
            WorkerRole::Overflow => assigned < core_pool_size,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkerRole::Core => "core",
            WorkerRole::Overflow => "overflow",
        }
    }
}

impl fmt::Display for WorkerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the pool. Fields are read independently and may be
/// slightly out of step with each other.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub active_threads: usize,
    pub assigned_threads: usize,
    pub roster_len: usize,
    pub core_pool_size: usize,
    pub max_pool_size: usize,
    pub completed_tasks: usize,
    pub failed_tasks: usize,
    pub rejected_tasks: usize,
}

impl PoolMetrics {
    pub fn utilization(&self) -> f64 {
        if self.active_threads == 0 {
            return 0.0;
        }
        self.assigned_threads as f64 / self.active_threads as f64
    }

    pub fn overflow_threads(&self) -> usize {
        self.active_threads.saturating_sub(self.core_pool_size)
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.failed_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}
