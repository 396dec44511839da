//! Unified error type for the repair engine.
//!
//! Every component error converts losslessly into [`MendError`]; the
//! orchestrator additionally folds expected failures into cycle outcomes
//! instead of returning them, so callers of `run_cycle` only ever see a
//! completed [`crate::Cycle`].

use thiserror::Error;

/// Result alias for engine-level operations.
pub type Result<T> = std::result::Result<T, MendError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum MendError {
    /// Snapshot store or persistence failure.
    #[error("store error: {0}")]
    Store(#[from] mend_store::StoreError),

    /// Reasoner failure that survived retrying.
    #[error("reasoner error: {0}")]
    Reason(#[from] mend_reason::ReasonError),

    /// Weakening search failure.
    #[error("weakening error: {0}")]
    Weaken(#[from] mend_weaken::WeakenError),

    /// Generation or assessment failure.
    #[error("council error: {0}")]
    Council(#[from] mend_council::CouncilError),

    /// Decision gate failure.
    #[error("gate error: {0}")]
    Gate(#[from] mend_council::GateError),

    /// An external collaborator kept failing past the retry budget.
    #[error("'{operation}' failed after {attempts} attempt(s): {reason}")]
    ExternalService {
        operation: String,
        attempts: u32,
        reason: String,
    },

    /// A generated candidate sentence did not parse. Never retried.
    #[error("invalid axiom syntax: {0}")]
    InvalidAxiomSyntax(String),

    /// Consolidation could not complete even after re-deriving against
    /// the moved base version.
    #[error("consolidation failed: {0}")]
    Consolidation(String),

    /// Configuration problem at construction time.
    #[error("configuration error: {0}")]
    Config(String),
}
