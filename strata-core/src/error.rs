use thiserror::Error;

/// The main result type for strata-core operations.
pub type StrataResult<T> = Result<T, StrataError>;

/// Enum representing possible errors within the strata-core library.
#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("graph is empty, cannot perform search")]
    EmptyGraph,

    #[error("Distance function failed: {0}")]
    Distance(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}
