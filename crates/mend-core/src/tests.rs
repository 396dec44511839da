//! Cross-component scenario tests for the engine.
//!
//! These exercise the full pipeline end to end against the pneumonia
//! fixture: an inconsistent proposal that gets repaired, a clean
//! addition, a stalled reasoner, and an unrepairable clash.

use crate::{Mend, MendConfig, Orchestrator, RetryConfig};
use mend_council::{
    channel_gate, AutoPolicy, Choice, Decision, DecisionGate, GateError, GatePayload,
    ScriptedGenerator,
};
use mend_reason::{ConsistencyChecker, ReasonError, Reasoner, ReasonerVerdict, StructuralReasoner};
use mend_store::{parse_axiom, Axiom, AxiomForm, SnapshotStore, Storage};
use mend_weaken::WeakeningEngine;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SCENARIO_A: &str = "Pneumonia ⊑ ∃causedBy.NovelVirusX; NovelVirusX ⊑ Virus";

fn parse(s: &str) -> AxiomForm {
    parse_axiom(s).unwrap()
}

fn seed() -> Vec<Axiom> {
    [
        "Virus ⊑ Pathogen",
        "Bacterium ⊑ Pathogen",
        "Virus ⊓ Bacterium ⊑ ⊥",
        "Pneumonia ⊑ ∀causedBy.Bacterium",
    ]
    .iter()
    .map(|s| Axiom::existing(parse(s)))
    .collect()
}

fn unattended(script: &[&str]) -> Mend {
    let generator = ScriptedGenerator::new(script.to_vec());
    Mend::unattended(MendConfig::default(), seed(), Box::new(generator)).unwrap()
}

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        base_backoff_ms: 1,
        multiplier: 2,
    }
}

#[test]
fn test_inconsistent_proposal_is_repaired_and_consolidated() {
    let mend = unattended(&[SCENARIO_A]);
    let cycle = mend.run_cycle();

    assert_eq!(cycle.result_version(), Some(2));
    assert_eq!(cycle.decisions.len(), 2);
    assert_eq!(cycle.decisions[0].choice, Choice::Evolve);
    assert_eq!(cycle.decisions[1].choice, Choice::Accept);

    let repair = cycle.repair.as_ref().expect("weakening ran");
    assert_eq!(repair.removed, vec![parse("Pneumonia ⊑ ∀causedBy.Bacterium")]);

    let current = mend.current();
    assert_eq!(current.number(), 2);
    assert!(current.contains(&parse("Pneumonia ⊑ ∃causedBy.Pathogen")));
    assert!(current.contains(&parse("Pneumonia ⊑ ∃causedBy.NovelVirusX")));
    assert!(current.contains(&parse("NovelVirusX ⊑ Virus")));
    assert!(!current.contains(&parse("Pneumonia ⊑ ∀causedBy.Bacterium")));
}

#[test]
fn test_consistent_proposal_is_added_verbatim() {
    let mend = unattended(&["NovelVirusX ⊑ Virus"]);
    let cycle = mend.run_cycle();

    assert_eq!(cycle.result_version(), Some(2));
    assert_eq!(cycle.decisions.len(), 1);
    assert_eq!(cycle.decisions[0].choice, Choice::Accept);
    assert!(cycle.repair.is_none());

    let current = mend.current();
    assert!(current.contains(&parse("NovelVirusX ⊑ Virus")));
    assert_eq!(current.axioms().len(), 5);
}

/// Reasoner that times out on every call, counting invocations.
struct Stalled {
    calls: Arc<AtomicU32>,
}

impl Reasoner for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    fn check(&self, _axioms: &[Axiom]) -> mend_reason::Result<ReasonerVerdict> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ReasonError::Timeout { elapsed_ms: 1_000 })
    }
}

#[test]
fn test_reasoner_triple_timeout_fails_cycle_with_one_audit_entry() {
    let storage = Storage::temporary().unwrap();
    let store = Arc::new(SnapshotStore::with_storage(seed(), storage.clone()).unwrap());
    let calls = Arc::new(AtomicU32::new(0));

    let orchestrator = Orchestrator::new(
        Arc::clone(&store),
        ConsistencyChecker::new(Box::new(Stalled {
            calls: Arc::clone(&calls),
        })),
        WeakeningEngine::new(ConsistencyChecker::new(Box::new(StructuralReasoner::new()))),
        Box::new(ScriptedGenerator::new([SCENARIO_A])),
        Box::new(AutoPolicy::new()),
        fast_retry(),
        Default::default(),
    );

    let digest_before = store.current().digest();
    let cycle = orchestrator.run_cycle();

    assert_eq!(cycle.outcome.label(), "failed");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.current().number(), 1);
    assert_eq!(store.current().digest(), digest_before);

    let entries = storage.audit_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].outcome, "failed");
    assert_eq!(entries[0].result_version, None);
}

#[test]
fn test_unrepairable_clash_is_rejected_not_crashed() {
    // The contradiction lives entirely inside the proposal, so no
    // weakening of the base can help.
    let mend = unattended(&["X ⊑ A; X ⊑ B; A ⊓ B ⊑ ⊥"]);
    let cycle = mend.run_cycle();

    match &cycle.outcome {
        crate::CycleOutcome::Rejected { reason } => {
            assert!(reason.contains("no repair found"), "reason: {reason}");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(mend.current().number(), 1);
}

#[test]
fn test_gate_timeout_rejects_cycle() {
    let (gate, operator) = channel_gate();
    let mut config = MendConfig::default();
    config.gate.timeout_ms = 20;

    let mend = Mend::new(
        config,
        seed(),
        Box::new(ScriptedGenerator::new([SCENARIO_A])),
        Box::new(gate),
    )
    .unwrap();

    let cycle = mend.run_cycle();
    match &cycle.outcome {
        crate::CycleOutcome::Rejected { reason } => {
            assert!(reason.contains("timed out"), "reason: {reason}");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(mend.current().number(), 1);
    drop(operator);
}

/// Gate that asks for evolution, then rejects the repair.
struct EvolveThenReject {
    calls: Mutex<u32>,
}

impl DecisionGate for EvolveThenReject {
    fn name(&self) -> &str {
        "evolve-then-reject"
    }

    fn decide(&self, _payload: &GatePayload, _timeout: Duration) -> Result<Decision, GateError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        Ok(if *calls == 1 {
            Decision::new(Choice::Evolve, "try a repair")
        } else {
            Decision::new(Choice::Reject, "repair declined")
        })
    }
}

#[test]
fn test_rejected_repair_leaves_version_untouched() {
    let mend = Mend::new(
        MendConfig::default(),
        seed(),
        Box::new(ScriptedGenerator::new([SCENARIO_A])),
        Box::new(EvolveThenReject {
            calls: Mutex::new(0),
        }),
    )
    .unwrap();

    let digest_before = mend.current().digest();
    let cycle = mend.run_cycle();

    // Weakening ran and produced a verified proposal, but nothing was
    // promoted.
    assert!(cycle.repair.is_some());
    assert_eq!(cycle.outcome.label(), "rejected");
    assert_eq!(mend.current().number(), 1);
    assert_eq!(mend.current().digest(), digest_before);
}

/// Gate that accepts everything it is shown.
struct AlwaysAccept;

impl DecisionGate for AlwaysAccept {
    fn name(&self) -> &str {
        "always-accept"
    }

    fn decide(&self, _payload: &GatePayload, _timeout: Duration) -> Result<Decision, GateError> {
        Ok(Decision::new(Choice::Accept, "approved"))
    }
}

#[test]
fn test_accepting_an_inconsistent_candidate_still_repairs() {
    let mend = Mend::new(
        MendConfig::default(),
        seed(),
        Box::new(ScriptedGenerator::new([SCENARIO_A])),
        Box::new(AlwaysAccept),
    )
    .unwrap();

    let cycle = mend.run_cycle();

    // An accepting gate never lets a clashing candidate through
    // verbatim; the repair path runs and its outcome is promoted.
    assert!(matches!(
        cycle.outcome,
        crate::CycleOutcome::Done { version: 2 }
    ));
    assert!(cycle.repair.is_some());
    let current = mend.current();
    assert!(!current.contains(&parse("Pneumonia ⊑ ∀causedBy.Bacterium")));
    assert!(current.contains(&parse("Pneumonia ⊑ ∃causedBy.Pathogen")));
}

#[test]
fn test_persistent_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("mend.db");

    {
        let mut config = MendConfig::default();
        config.store.persist = true;
        config.store.db_path = db_path.clone();
        let mend = Mend::new(
            config,
            seed(),
            Box::new(ScriptedGenerator::new(["NovelVirusX ⊑ Virus"])),
            Box::new(AlwaysAccept),
        )
        .unwrap();

        let cycle = mend.run_cycle();
        assert!(cycle.outcome.is_done());
        assert_eq!(mend.audit_entries().unwrap().len(), 1);
    }

    // The engine is gone; the promoted version and its audit trail are not.
    let storage = Storage::open(&db_path).unwrap();
    let latest = storage.latest_version().unwrap().unwrap();
    assert_eq!(latest.number(), 2);
    assert!(latest.contains(&parse("NovelVirusX ⊑ Virus")));
    assert_eq!(storage.audit_len(), 1);
}

#[test]
fn test_reopened_engine_resumes_instead_of_reseeding() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("mend.db");
    let persistent = |script: &[&str]| {
        let mut config = MendConfig::default();
        config.store.persist = true;
        config.store.db_path = db_path.clone();
        Mend::new(
            config,
            seed(),
            Box::new(ScriptedGenerator::new(script.to_vec())),
            Box::new(AlwaysAccept),
        )
        .unwrap()
    };

    {
        let first = persistent(&["NovelVirusX ⊑ Virus"]);
        assert!(first.run_cycle().outcome.is_done());
        assert_eq!(first.current().number(), 2);
    }

    // A second engine over the same database picks up at v2, seed
    // ignored, and keeps consolidating from there.
    let second = persistent(&["Fungus ⊑ Pathogen"]);
    assert_eq!(second.current().number(), 2);
    assert!(second.current().contains(&parse("NovelVirusX ⊑ Virus")));

    let cycle = second.run_cycle();
    assert!(matches!(
        cycle.outcome,
        crate::CycleOutcome::Done { version: 3 }
    ));
    let current = second.current();
    assert!(current.contains(&parse("NovelVirusX ⊑ Virus")));
    assert!(current.contains(&parse("Fungus ⊑ Pathogen")));

    // Durable v2 is intact, not rewritten by the second run.
    let persisted_v2 = second
        .store()
        .storage()
        .unwrap()
        .load_version(2)
        .unwrap()
        .unwrap();
    assert!(persisted_v2.contains(&parse("NovelVirusX ⊑ Virus")));
    assert!(!persisted_v2.contains(&parse("Fungus ⊑ Pathogen")));
}

#[test]
fn test_versions_increment_by_one_per_consolidation() {
    let mend = unattended(&["NovelVirusX ⊑ Virus", "Fungus ⊑ Pathogen"]);
    let cycles = mend.run_cycles(2);

    assert_eq!(cycles[0].result_version(), Some(2));
    assert_eq!(cycles[1].result_version(), Some(3));
    assert_eq!(mend.current().number(), 3);
}

#[test]
fn test_replay_yields_identical_versions() {
    let script = [SCENARIO_A, "Fungus ⊑ Pathogen"];
    let first = unattended(&script);
    let second = unattended(&script);

    first.run_cycles(2);
    second.run_cycles(2);

    assert_eq!(first.current().number(), second.current().number());
    assert_eq!(first.current().digest(), second.current().digest());
}

#[test]
fn test_exhausted_generator_fails_without_retry() {
    let mend = unattended(&[]);
    let cycle = mend.run_cycle();

    match &cycle.outcome {
        crate::CycleOutcome::Failed { error } => {
            assert!(error.contains("after 1 attempt"), "error: {error}");
            assert!(error.contains("exhausted"), "error: {error}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn test_malformed_candidate_fails_immediately() {
    let mend = unattended(&["certainly! here is an axiom"]);
    let cycle = mend.run_cycle();

    assert_eq!(cycle.outcome.label(), "failed");
    assert_eq!(mend.current().number(), 1);
}

#[test]
fn test_low_scoring_candidate_rejected_by_threshold() {
    let mut config = MendConfig::default();
    config.gate.min_score = Some(0.99);
    let mend = Mend::unattended(
        config,
        seed(),
        Box::new(ScriptedGenerator::new(["NovelVirusX ⊑ Virus"])),
    )
    .unwrap();

    let cycle = mend.run_cycle();
    assert_eq!(cycle.outcome.label(), "rejected");
    assert_eq!(mend.current().number(), 1);
}
