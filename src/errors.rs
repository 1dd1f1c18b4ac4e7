use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum PoolError {
    /// Every worker the pool may own is already running a task.
    #[error("pool saturated: {assigned} of {max} workers busy")]
    Saturated { assigned: usize, max: usize },
    #[error("pool is shut down")]
    ShutDown,
    #[error("invalid pool config: {0}")]
    InvalidConfig(String),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),
}

impl From<std::io::Error> for PoolError {
    fn from(e: std::io::Error) -> Self {
        PoolError::Spawn(e.to_string())
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
