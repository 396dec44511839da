//! Error types for the reasoning capability.

use thiserror::Error;

/// Result type alias for reasoning operations.
pub type Result<T> = std::result::Result<T, ReasonError>;

/// Failure modes of the external reasoning capability.
///
/// Both variants are transient from the orchestrator's point of view and
/// are retried with backoff before failing the cycle.
#[derive(Debug, Clone, Error)]
pub enum ReasonError {
    /// The reasoner did not answer within its time budget.
    #[error("reasoner timed out after {elapsed_ms}ms")]
    Timeout {
        /// Milliseconds spent before giving up.
        elapsed_ms: u64,
    },

    /// The reasoner could not be reached or crashed mid-query.
    #[error("reasoner unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = ReasonError::Timeout { elapsed_ms: 30_000 };
        assert!(err.to_string().contains("30000ms"));
    }

    #[test]
    fn test_unavailable_display() {
        let err = ReasonError::Unavailable("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
