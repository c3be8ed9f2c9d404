//! Error types for shard operations

use thiserror::Error;

/// Result type alias for shard operations
pub type Result<T> = std::result::Result<T, ShardError>;

/// Error types that can occur while loading or searching a shard
#[derive(Error, Debug)]
pub enum ShardError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Non-finite component at index {index}")]
    NonFiniteComponent { index: usize },

    #[error("Shard has not been frozen; call freeze() before searching")]
    NotFrozen,

    #[error("Frozen layout is stale: {pending} insert(s) since the last freeze()")]
    StaleLayout { pending: usize },

    #[error("Shard is busy: a search is in flight, mutation rejected")]
    ConcurrentMutation,

    #[error("Worker {worker} failed: {source}")]
    WorkerFailure {
        worker: usize,
        #[source]
        source: Box<ShardError>,
    },

    #[error("Search cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Shard lock poisoned")]
    LockPoisoned,

    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
