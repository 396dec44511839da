//! # Bounded Repair Search
//!
//! Given an inconsistent candidate change and the justification for the
//! contradiction, [`WeakeningEngine::repair`] searches for a substitution
//! of base-resident justification axioms that restores consistency with
//! the least information loss.
//!
//! Proposed axioms are new evidence: every candidate keeps them verbatim
//! and only weakens axioms the ontology already asserts. Single-axiom
//! substitutions are tried before pairs, pairs before triples, up to the
//! combination bound; within a phase candidates are ordered by ascending
//! total loss, with rule declaration order and enumeration order breaking
//! ties. The first candidate the consistency checker verifies wins. The
//! search is fully deterministic.

use crate::error::{Result, WeakenError};
use crate::rules::{weakenings, Hierarchy, Substitution};
use mend_reason::{ConsistencyChecker, ConsistencyResult};
use mend_store::{Axiom, AxiomForm, OntologyVersion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Default cap on substituted axioms per candidate.
pub const DEFAULT_MAX_COMBINATION_SIZE: usize = 2;
/// Default cap on verified candidates per repair call.
pub const DEFAULT_MAX_CANDIDATES: usize = 256;

/// A consistent weakened replacement for an inconsistent change.
///
/// Only ever surfaced with `verified.consistent == true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairProposal {
    /// Base axiom forms the repair removes.
    pub removed: Vec<AxiomForm>,
    /// Axioms the repair adds: the proposed axioms verbatim plus the
    /// weakened replacements (provenance `Repaired`).
    pub added: Vec<Axiom>,
    /// The verification result for `(base − removed) ∪ added`.
    pub verified: ConsistencyResult,
    /// Total information loss of the applied substitutions.
    pub information_loss: f64,
    /// Human-readable description of what was weakened and how.
    pub rationale: String,
}

/// One fully-specified candidate: which axioms to substitute, and how.
struct Candidate {
    substitutions: Vec<(AxiomForm, Substitution)>,
    loss: f64,
}

impl Candidate {
    fn removed(&self) -> Vec<AxiomForm> {
        self.substitutions.iter().map(|(f, _)| f.clone()).collect()
    }

    fn replacements(&self) -> Vec<Axiom> {
        self.substitutions
            .iter()
            .filter_map(|(_, s)| s.replacement.clone())
            .map(Axiom::repaired)
            .collect()
    }

    fn rationale(&self) -> String {
        self.substitutions
            .iter()
            .map(|(form, sub)| match &sub.replacement {
                Some(replacement) => {
                    format!("weakened '{form}' into '{replacement}' ({})", sub.rule.name())
                }
                None => format!("retracted '{form}' ({})", sub.rule.name()),
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Deterministic bounded search over the weakening rule space.
pub struct WeakeningEngine {
    checker: ConsistencyChecker,
    max_combination_size: usize,
    max_candidates: usize,
}

impl std::fmt::Debug for WeakeningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakeningEngine")
            .field("max_combination_size", &self.max_combination_size)
            .field("max_candidates", &self.max_candidates)
            .finish()
    }
}

impl WeakeningEngine {
    /// Creates an engine with default search bounds.
    pub fn new(checker: ConsistencyChecker) -> Self {
        WeakeningEngine {
            checker,
            max_combination_size: DEFAULT_MAX_COMBINATION_SIZE,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }

    /// Overrides the search bounds. Both bounds must be at least one.
    pub fn with_limits(mut self, max_combination_size: usize, max_candidates: usize) -> Self {
        assert!(max_combination_size >= 1, "combination size must be >= 1");
        assert!(max_candidates >= 1, "candidate budget must be >= 1");
        self.max_combination_size = max_combination_size;
        self.max_candidates = max_candidates;
        self
    }

    /// Searches for a consistent weakening of the change `base ∪ proposed`
    /// given the `justification` of its inconsistency.
    ///
    /// # Panics
    ///
    /// Panics if `justification` is empty. Callers only invoke the engine
    /// after an inconsistent check, which always carries a justification.
    ///
    /// # Errors
    ///
    /// [`WeakenError::InvalidState`] when a justification axiom is neither
    /// in `base` nor among `proposed`;
    /// [`WeakenError::NoRepairFound`] when the bounded search exhausts
    /// without a verified candidate;
    /// [`WeakenError::Reason`] when verification itself fails.
    pub fn repair(
        &self,
        base: &Arc<OntologyVersion>,
        proposed: &[Axiom],
        justification: &[Axiom],
    ) -> Result<RepairProposal> {
        assert!(
            !justification.is_empty(),
            "repair invoked with empty justification"
        );

        for axiom in justification {
            let known = base.contains(&axiom.form) || proposed.iter().any(|p| p == axiom);
            if !known {
                return Err(WeakenError::InvalidState(format!(
                    "justification axiom '{}' is neither in version {} nor proposed",
                    axiom.form,
                    base.number()
                )));
            }
        }

        // Only axioms the ontology already asserts are up for weakening.
        let mut targets: Vec<&AxiomForm> = justification
            .iter()
            .map(|a| &a.form)
            .filter(|form| base.contains(form))
            .collect();
        targets.dedup();

        let mut view: Vec<Axiom> = base.axioms().to_vec();
        view.extend(proposed.iter().cloned());
        let hierarchy = Hierarchy::from_axioms(&view);

        let options: Vec<Vec<Substitution>> = targets
            .iter()
            .map(|form| weakenings(form, &hierarchy))
            .collect();

        debug!(
            base_version = base.number(),
            targets = targets.len(),
            "starting weakening search"
        );

        let mut tried = 0usize;
        let depth_bound = self.max_combination_size.min(targets.len());
        for size in 1..=depth_bound {
            let mut phase = Vec::new();
            for combo in combinations(targets.len(), size) {
                enumerate_products(&combo, &targets, &options, &mut phase);
            }
            // Stable sort keeps rule declaration and enumeration order
            // among equal-loss candidates.
            phase.sort_by(|a, b| a.loss.total_cmp(&b.loss));

            for candidate in phase {
                if tried >= self.max_candidates {
                    return Err(WeakenError::NoRepairFound {
                        candidates_tried: tried,
                    });
                }
                tried += 1;

                let removed = candidate.removed();
                let mut added = proposed.to_vec();
                added.extend(candidate.replacements());

                let verified = self.checker.check_delta(base, &removed, &added)?;
                if verified.consistent {
                    info!(
                        base_version = base.number(),
                        candidates_tried = tried,
                        information_loss = candidate.loss,
                        "repair found"
                    );
                    return Ok(RepairProposal {
                        removed,
                        added,
                        verified,
                        information_loss: candidate.loss,
                        rationale: candidate.rationale(),
                    });
                }
            }
        }

        Err(WeakenError::NoRepairFound {
            candidates_tried: tried,
        })
    }
}

/// Index combinations of size `k` out of `n`, in lexicographic order.
fn combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(k);
    fn recurse(start: usize, n: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..n {
            current.push(i);
            recurse(i + 1, n, k, current, out);
            current.pop();
        }
    }
    recurse(0, n, k, &mut current, &mut out);
    out
}

/// Expands the cartesian product of substitution options for one index
/// combination into concrete candidates.
fn enumerate_products(
    combo: &[usize],
    targets: &[&AxiomForm],
    options: &[Vec<Substitution>],
    out: &mut Vec<Candidate>,
) {
    fn recurse(
        position: usize,
        combo: &[usize],
        targets: &[&AxiomForm],
        options: &[Vec<Substitution>],
        current: &mut Vec<(AxiomForm, Substitution)>,
        out: &mut Vec<Candidate>,
    ) {
        if position == combo.len() {
            let loss = current.iter().map(|(_, s)| s.loss).sum();
            out.push(Candidate {
                substitutions: current.clone(),
                loss,
            });
            return;
        }
        let index = combo[position];
        for substitution in &options[index] {
            current.push((targets[index].clone(), substitution.clone()));
            recurse(position + 1, combo, targets, options, current, out);
            current.pop();
        }
    }
    let mut current = Vec::with_capacity(combo.len());
    recurse(0, combo, targets, options, &mut current, out);
}
