//! Assessor framework for candidate axiom review.
//!
//! Defines the [`Assessor`] trait and supporting types for building
//! reviewers that score a candidate axiom before it is checked for
//! logical consistency.

pub mod builtin;

use crate::error::Result;
use mend_store::{Axiom, OntologyVersion};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized quality score for an assessment.
///
/// Ranges from 0.0 (implausible or malformed) to 1.0 (fully convincing).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score(f64);

impl Score {
    /// Creates a new score.
    ///
    /// # Arguments
    /// * `value` - Quality level between 0.0 and 1.0
    ///
    /// # Panics
    /// Panics if value is outside the valid range.
    pub fn new(value: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&value),
            "Score must be between 0.0 and 1.0"
        );
        Self(value)
    }

    /// Creates a score, clamping into the valid range instead of
    /// panicking. Used by rubric-style scorers that sum bonuses.
    pub fn clamped(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Returns the score value.
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// One assessor's verdict on a candidate axiom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// Name of the assessor that produced this verdict.
    pub assessor: String,
    /// The perspective the assessor reviews from.
    pub role: String,
    /// Quality score.
    pub score: Score,
    /// Reasoning behind the score.
    pub commentary: String,
}

impl Assessment {
    /// Creates a new assessment.
    pub fn new(
        assessor: impl Into<String>,
        role: impl Into<String>,
        score: Score,
        commentary: impl Into<String>,
    ) -> Self {
        Self {
            assessor: assessor.into(),
            role: role.into(),
            score,
            commentary: commentary.into(),
        }
    }
}

/// Mean score across a set of assessments, `None` when empty.
pub fn mean_score(assessments: &[Assessment]) -> Option<f64> {
    if assessments.is_empty() {
        return None;
    }
    let total: f64 = assessments.iter().map(|a| a.score.value()).sum();
    Some(total / assessments.len() as f64)
}

/// Trait for candidate axiom reviewers.
///
/// Assessors inspect a parsed candidate against the current ontology
/// version and score its plausibility from one perspective. They never
/// mutate anything and never block the cycle on their own.
///
/// # Implementors
///
/// - [`builtin::DomainAssessor`]: vocabulary grounding in the ontology
/// - [`builtin::LinguisticAssessor`]: structural well-formedness
pub trait Assessor: Send + Sync {
    /// Returns the name of this assessor.
    fn name(&self) -> &str;

    /// Returns the perspective this assessor reviews from.
    fn role(&self) -> &str;

    /// Assesses a candidate axiom against an ontology version.
    ///
    /// # Errors
    ///
    /// [`crate::CouncilError::Assessment`] when the assessor cannot form
    /// a verdict at all; a low score is not an error.
    fn assess(&self, axiom: &Axiom, version: &OntologyVersion) -> Result<Assessment>;
}
