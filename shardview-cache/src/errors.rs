use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-layer errors. `Clone` because results are handed to every caller
/// waiting on the same in-flight computation; wrapped errors are carried as
/// strings for that reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("serialization failed for key '{0}': {1}")]
    Serialization(String, String),

    #[error("remote cache error: {0}")]
    Remote(String),

    #[error("compute failed for key '{0}': {1}")]
    Compute(String, String),

    #[error("in-flight computation for key '{0}' was dropped")]
    InFlightDropped(String),

    #[error("batch compute returned {got} values for {expected} missing items")]
    BatchLengthMismatch { expected: usize, got: usize },
}
