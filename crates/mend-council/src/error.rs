//! Error types for generation, assessment, and gating.

use thiserror::Error;

/// Result alias for council operations.
pub type Result<T> = std::result::Result<T, CouncilError>;

/// Errors from the generation and assessment capabilities.
#[derive(Debug, Error)]
pub enum CouncilError {
    /// The generator could not produce a candidate sentence.
    #[error("generation failed: {0}")]
    Generation(String),

    /// An assessor could not evaluate the candidate.
    #[error("assessment by '{assessor}' failed: {reason}")]
    Assessment { assessor: String, reason: String },

    /// A scripted source ran out of candidates.
    #[error("candidate source exhausted")]
    Exhausted,
}

/// Errors from a decision gate backend.
#[derive(Debug, Error)]
pub enum GateError {
    /// No decision arrived within the allotted time.
    #[error("decision gate timed out after {waited_ms}ms")]
    Timeout { waited_ms: u64 },

    /// The other side of the gate hung up.
    #[error("decision gate closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assessment_display_names_assessor() {
        let err = CouncilError::Assessment {
            assessor: "domain".into(),
            reason: "no ontology context".into(),
        };
        assert_eq!(
            err.to_string(),
            "assessment by 'domain' failed: no ontology context"
        );
    }

    #[test]
    fn test_gate_timeout_display() {
        let err = GateError::Timeout { waited_ms: 30_000 };
        assert!(err.to_string().contains("30000ms"));
    }
}
