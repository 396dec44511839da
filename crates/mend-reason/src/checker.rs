//! # Isolated Consistency Checking
//!
//! The [`ConsistencyChecker`] answers "would this change break the
//! ontology" without ever touching the active version. Every check builds
//! a throwaway [`WorkingCopy`] of the snapshot under test, overlays the
//! candidate change, hands the materialized view to the configured
//! [`Reasoner`], and discards the copy regardless of the outcome. The
//! active snapshot is bit-for-bit unchanged after any number of checks.

use crate::error::Result;
use crate::reasoner::Reasoner;
use mend_store::{Axiom, AxiomForm, OntologyVersion, WorkingCopy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Outcome of a consistency check over an isolated view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyResult {
    /// Whether the checked view is logically consistent.
    pub consistent: bool,
    /// Axioms implicated in the contradiction. Empty when consistent.
    ///
    /// When the reasoner names a conflict set this is that set. When it
    /// cannot, the checker falls back to a conservative justification:
    /// the overlaid axioms plus every view axiom sharing a class or
    /// property with one of them.
    pub justification: Vec<Axiom>,
}

impl ConsistencyResult {
    /// A consistent result with an empty justification.
    pub fn consistent() -> Self {
        ConsistencyResult {
            consistent: true,
            justification: Vec::new(),
        }
    }
}

/// Checks candidate changes against an ontology snapshot in isolation.
pub struct ConsistencyChecker {
    reasoner: Box<dyn Reasoner>,
}

impl std::fmt::Debug for ConsistencyChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsistencyChecker")
            .field("reasoner", &self.reasoner.name())
            .finish()
    }
}

impl ConsistencyChecker {
    /// Creates a checker around a reasoning capability.
    pub fn new(reasoner: Box<dyn Reasoner>) -> Self {
        ConsistencyChecker { reasoner }
    }

    /// Name of the underlying reasoner, for logs and audit records.
    pub fn reasoner_name(&self) -> &str {
        self.reasoner.name()
    }

    /// Checks `base` with `extra` axioms overlaid.
    ///
    /// An empty `extra` checks the snapshot as-is.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::ReasonError`] from the reasoner. The working
    /// copy is discarded either way.
    pub fn check(&self, base: &Arc<OntologyVersion>, extra: &[Axiom]) -> Result<ConsistencyResult> {
        self.check_delta(base, &[], extra)
    }

    /// Checks `base` with `removed` forms masked out and `added` axioms
    /// overlaid. This is the shape a repair candidate takes before it is
    /// ever promoted.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::ReasonError`] from the reasoner.
    pub fn check_delta(
        &self,
        base: &Arc<OntologyVersion>,
        removed: &[AxiomForm],
        added: &[Axiom],
    ) -> Result<ConsistencyResult> {
        let mut copy = WorkingCopy::new(Arc::clone(base));
        for form in removed {
            copy.remove(form);
        }
        for axiom in added {
            copy.add(axiom.clone());
        }
        let view = copy.effective_axioms();

        debug!(
            reasoner = self.reasoner.name(),
            base_version = base.number(),
            removed = removed.len(),
            added = added.len(),
            view_size = view.len(),
            "checking isolated view"
        );

        let verdict = self.reasoner.check(&view)?;
        if verdict.consistent {
            return Ok(ConsistencyResult::consistent());
        }

        let justification = match verdict.conflict {
            Some(conflict) if !conflict.is_empty() => conflict,
            _ => fallback_justification(&view, added),
        };
        Ok(ConsistencyResult {
            consistent: false,
            justification,
        })
    }
}

/// Conservative justification when the reasoner gives no explanation:
/// the overlaid axioms plus every view axiom structurally touching one of
/// them. With nothing overlaid the whole view is suspect.
fn fallback_justification(view: &[Axiom], added: &[Axiom]) -> Vec<Axiom> {
    if added.is_empty() {
        return view.to_vec();
    }
    let mut justification: Vec<Axiom> = view
        .iter()
        .filter(|axiom| added.iter().any(|extra| axiom.form.touches(&extra.form)))
        .cloned()
        .collect();
    for extra in added {
        if !justification.contains(extra) {
            justification.push(extra.clone());
        }
    }
    justification.sort();
    justification
}
