//! Error types for the weakening engine.

use thiserror::Error;

/// Result alias for weakening operations.
pub type Result<T> = std::result::Result<T, WeakenError>;

/// Errors from the bounded repair search.
#[derive(Debug, Error)]
pub enum WeakenError {
    /// The search exhausted its candidate budget without finding a
    /// consistent repair. Reported as a cycle outcome, never swallowed.
    #[error("no consistent repair found after {candidates_tried} candidates")]
    NoRepairFound { candidates_tried: usize },

    /// The caller handed the engine a justification it cannot act on,
    /// such as an axiom that is neither in the base version nor among
    /// the proposed axioms.
    #[error("invalid repair request: {0}")]
    InvalidState(String),

    /// The consistency check of a candidate failed outright.
    #[error(transparent)]
    Reason(#[from] mend_reason::ReasonError),
}
