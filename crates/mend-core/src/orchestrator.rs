//! The cycle orchestrator.
//!
//! Drives one candidate through the full pipeline:
//!
//! ```text
//! GENERATE -> ASSESS -> CHECK_CONSISTENCY -> DECIDE_1
//!     DECIDE_1: accept + consistent    -> CONSOLIDATE
//!               evolve or inconsistent -> WEAKEN -> DECIDE_2
//!               reject                 -> REJECTED
//!     DECIDE_2: accept -> CONSOLIDATE
//!               otherwise -> REJECTED
//! ```
//!
//! Expected failures never escape: [`Orchestrator::run_cycle`] always
//! returns a completed [`Cycle`] whose outcome records what happened.
//! Nothing before CONSOLIDATE mutates the active version.

use crate::config::{GateConfig, RetryConfig};
use crate::consolidate::consolidate;
use crate::cycle::{Cycle, CycleOutcome, CycleStage};
use crate::error::MendError;
use crate::retry::with_backoff;
use mend_council::{
    Assessor, Choice, CouncilError, DecisionGate, DomainAssessor, GatePayload, Generator,
    LinguisticAssessor,
};
use mend_reason::ConsistencyChecker;
use mend_store::{parse_axiom, Axiom, OntologyVersion, SnapshotStore, StoreError};
use mend_weaken::{WeakenError, WeakeningEngine};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Orchestrates generation, assessment, checking, weakening, gating, and
/// consolidation for one candidate at a time.
pub struct Orchestrator {
    store: Arc<SnapshotStore>,
    checker: ConsistencyChecker,
    weakener: WeakeningEngine,
    generator: Box<dyn Generator>,
    assessors: Vec<Box<dyn Assessor>>,
    gate: Box<dyn DecisionGate>,
    retry: RetryConfig,
    gate_config: GateConfig,
}

impl Orchestrator {
    /// Creates an orchestrator with the default assessor pair (domain
    /// plus linguistic).
    pub fn new(
        store: Arc<SnapshotStore>,
        checker: ConsistencyChecker,
        weakener: WeakeningEngine,
        generator: Box<dyn Generator>,
        gate: Box<dyn DecisionGate>,
        retry: RetryConfig,
        gate_config: GateConfig,
    ) -> Self {
        Orchestrator {
            store,
            checker,
            weakener,
            generator,
            assessors: vec![
                Box::new(DomainAssessor::new()),
                Box::new(LinguisticAssessor::new()),
            ],
            gate,
            retry,
            gate_config,
        }
    }

    /// Replaces the assessor set.
    pub fn with_assessors(mut self, assessors: Vec<Box<dyn Assessor>>) -> Self {
        self.assessors = assessors;
        self
    }

    /// Runs one full cycle and returns its record.
    ///
    /// Expected failure modes (rejections, gate timeouts, exhausted
    /// retries, no repair found) become cycle outcomes; only contract
    /// violations panic. An audit entry is appended for every completed
    /// cycle when the store is persistent.
    pub fn run_cycle(&self) -> Cycle {
        let started = Instant::now();
        let base = self.store.current();
        let mut cycle = Cycle::new(base.number());

        cycle.outcome = self.drive(&base, &mut cycle);
        cycle.duration_ms = elapsed_ms(started);

        if let Some(storage) = self.store.storage() {
            if let Err(err) = storage.append_audit(&cycle.to_audit_entry()) {
                warn!(cycle = %cycle.cycle_id, error = %err, "audit append failed");
            }
        }

        info!(
            cycle = %cycle.cycle_id,
            source_version = cycle.source_version,
            outcome = %cycle.outcome,
            duration_ms = cycle.duration_ms,
            "cycle complete"
        );
        cycle
    }

    fn drive(&self, base: &Arc<OntologyVersion>, cycle: &mut Cycle) -> CycleOutcome {
        // GENERATE
        let stage = Instant::now();
        let sentence = match with_backoff(
            &self.retry,
            "generate",
            || self.generator.propose(base),
            |e| !matches!(e, CouncilError::Exhausted),
        ) {
            Ok(sentence) => sentence,
            Err(err) => {
                cycle.record_stage(CycleStage::Generate, err.to_string(), elapsed_ms(stage));
                return CycleOutcome::Failed {
                    error: err.to_string(),
                };
            }
        };
        cycle.sentence = Some(sentence.clone());

        let proposed = match parse_candidate(&sentence) {
            Ok(proposed) => proposed,
            Err(err) => {
                cycle.record_stage(CycleStage::Generate, err.to_string(), elapsed_ms(stage));
                return CycleOutcome::Failed {
                    error: err.to_string(),
                };
            }
        };
        cycle.proposed = proposed.clone();
        cycle.record_stage(
            CycleStage::Generate,
            format!("{} axiom(s) from '{sentence}'", proposed.len()),
            elapsed_ms(stage),
        );

        // ASSESS
        let stage = Instant::now();
        for assessor in &self.assessors {
            for axiom in &proposed {
                let assessment = with_backoff(
                    &self.retry,
                    assessor.name(),
                    || assessor.assess(axiom, base),
                    |_| true,
                );
                match assessment {
                    Ok(assessment) => cycle.assessments.push(assessment),
                    Err(err) => {
                        cycle.record_stage(CycleStage::Assess, err.to_string(), elapsed_ms(stage));
                        return CycleOutcome::Failed {
                            error: err.to_string(),
                        };
                    }
                }
            }
        }
        cycle.record_stage(
            CycleStage::Assess,
            format!("{} assessments collected", cycle.assessments.len()),
            elapsed_ms(stage),
        );

        // CHECK_CONSISTENCY
        let stage = Instant::now();
        let consistency = match with_backoff(
            &self.retry,
            "consistency-check",
            || self.checker.check(base, &proposed),
            |_| true,
        ) {
            Ok(result) => result,
            Err(err) => {
                cycle.record_stage(
                    CycleStage::CheckConsistency,
                    err.to_string(),
                    elapsed_ms(stage),
                );
                return CycleOutcome::Failed {
                    error: err.to_string(),
                };
            }
        };
        cycle.consistency = Some(consistency.clone());
        cycle.record_stage(
            CycleStage::CheckConsistency,
            if consistency.consistent {
                "consistent".to_string()
            } else {
                format!(
                    "inconsistent, justification of {} axiom(s)",
                    consistency.justification.len()
                )
            },
            elapsed_ms(stage),
        );

        // DECIDE_1
        let stage = Instant::now();
        let payload = GatePayload::Candidate {
            axiom: proposed[0].clone(),
            assessments: cycle.assessments.clone(),
            consistency: consistency.clone(),
        };
        let decision = match self.gate.decide(&payload, self.gate_config.timeout()) {
            Ok(decision) => decision,
            Err(err) => {
                cycle.record_stage(CycleStage::FirstDecision, err.to_string(), elapsed_ms(stage));
                return CycleOutcome::Rejected {
                    reason: err.to_string(),
                };
            }
        };
        cycle.decisions.push(decision.clone());
        cycle.record_stage(
            CycleStage::FirstDecision,
            format!("{}: {}", decision.choice, decision.rationale),
            elapsed_ms(stage),
        );

        let (removed, added) = match decision.choice {
            Choice::Reject => {
                return CycleOutcome::Rejected {
                    reason: decision.rationale,
                }
            }
            Choice::Accept if consistency.consistent => (Vec::new(), proposed.clone()),
            Choice::Evolve if consistency.consistent => {
                // Nothing to weaken; there is no justification to
                // hand the engine.
                return CycleOutcome::Rejected {
                    reason: "evolution requested for a consistent candidate".to_string(),
                };
            }
            // An inconsistent candidate never reaches consolidation
            // verbatim, even on an accepting gate.
            Choice::Accept | Choice::Evolve => {
                // WEAKEN
                let stage = Instant::now();
                let proposal =
                    match self
                        .weakener
                        .repair(base, &proposed, &consistency.justification)
                    {
                        Ok(proposal) => proposal,
                        Err(WeakenError::NoRepairFound { candidates_tried }) => {
                            let reason =
                                format!("no repair found after {candidates_tried} candidate(s)");
                            cycle.record_stage(CycleStage::Weaken, &reason, elapsed_ms(stage));
                            return CycleOutcome::Rejected { reason };
                        }
                        Err(err) => {
                            cycle.record_stage(
                                CycleStage::Weaken,
                                err.to_string(),
                                elapsed_ms(stage),
                            );
                            return CycleOutcome::Failed {
                                error: err.to_string(),
                            };
                        }
                    };
                cycle.repair = Some(proposal.clone());
                cycle.record_stage(CycleStage::Weaken, proposal.rationale.clone(), elapsed_ms(stage));

                // DECIDE_2
                let stage = Instant::now();
                let payload = GatePayload::Repair {
                    proposal: proposal.clone(),
                };
                let decision = match self.gate.decide(&payload, self.gate_config.timeout()) {
                    Ok(decision) => decision,
                    Err(err) => {
                        cycle.record_stage(
                            CycleStage::SecondDecision,
                            err.to_string(),
                            elapsed_ms(stage),
                        );
                        return CycleOutcome::Rejected {
                            reason: err.to_string(),
                        };
                    }
                };
                cycle.decisions.push(decision.clone());
                cycle.record_stage(
                    CycleStage::SecondDecision,
                    format!("{}: {}", decision.choice, decision.rationale),
                    elapsed_ms(stage),
                );

                if decision.choice != Choice::Accept {
                    return CycleOutcome::Rejected {
                        reason: decision.rationale,
                    };
                }
                (proposal.removed, proposal.added)
            }
        };

        // CONSOLIDATE
        let stage = Instant::now();
        match consolidate(&self.store, &self.checker, base, &removed, &added) {
            Ok(version) => {
                cycle.record_stage(
                    CycleStage::Consolidate,
                    format!("promoted version {}", version.number()),
                    elapsed_ms(stage),
                );
                CycleOutcome::Done {
                    version: version.number(),
                }
            }
            Err(err) => {
                cycle.record_stage(CycleStage::Consolidate, err.to_string(), elapsed_ms(stage));
                CycleOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("generator", &self.generator.name())
            .field("gate", &self.gate.name())
            .field("assessors", &self.assessors.len())
            .finish()
    }
}

/// Parses a candidate sentence into proposed axioms. Sentences may carry
/// several axioms separated by `;`, the way a generated proposal names a
/// new concept and places it in the hierarchy in one breath.
fn parse_candidate(sentence: &str) -> Result<Vec<Axiom>, MendError> {
    let mut axioms = Vec::new();
    for part in sentence.split(';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let form = parse_axiom(part).map_err(|err| match err {
            StoreError::AxiomSyntax(msg) => MendError::InvalidAxiomSyntax(msg),
            other => MendError::Store(other),
        })?;
        axioms.push(Axiom::proposed(form));
    }
    if axioms.is_empty() {
        return Err(MendError::InvalidAxiomSyntax(format!(
            "candidate sentence is empty: '{sentence}'"
        )));
    }
    Ok(axioms)
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
