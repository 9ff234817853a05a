use thiserror::Error;

/// Infrastructure-level storage error.
///
/// Everything here is a 5xx-class failure for the request that hits it;
/// the authorization core never retries these inline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage call timed out")]
    Timeout,

    /// The circuit breaker is open; calls fail fast instead of queuing.
    #[error("storage circuit open")]
    CircuitOpen,

    #[error("internal storage error: {0}")]
    Internal(String),
}
