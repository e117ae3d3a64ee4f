// Central Error Type for the dispatch queue

use thiserror::Error;

/// Dispatch-level error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No idle worker and the buffer is at capacity. Never retried internally.
    #[error("Queue saturated: no idle worker and buffer at capacity ({buffered}/{capacity})")]
    Saturated { capacity: usize, buffered: usize },

    /// The core broke one of its own invariants (e.g. binding to a busy worker)
    #[error("Invariant violation: {0}")]
    InvariantViolation(#[from] crate::domain::DomainError),

    /// The queue was dropped while the item was still buffered
    #[error("Dispatch queue dropped before the submission was bound")]
    QueueDropped,

    #[error("Configuration error: {0}")]
    Config(String),

    /// No async runtime to execute the event; it was never admitted
    #[error("No async runtime available to execute the submission")]
    NoRuntime,
}

impl DispatchError {
    /// True for the normal back-pressure rejection (caller may retry later)
    pub fn is_saturation(&self) -> bool {
        matches!(self, DispatchError::Saturated { .. })
    }
}

/// Result type alias using DispatchError
pub type Result<T> = std::result::Result<T, DispatchError>;

impl From<config::ConfigError> for DispatchError {
    fn from(err: config::ConfigError) -> Self {
        DispatchError::Config(err.to_string())
    }
}
