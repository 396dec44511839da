//! # mend-core: The OntoMend Engine
//!
//! Wires the OntoMend components into one facade and drives the
//! candidate lifecycle from generation to consolidation.
//!
//! ## Architecture
//!
//! ```text
//!                  +------------------+
//!                  |       Mend       |  facade
//!                  +--------+---------+
//!                           |
//!                  +--------v---------+
//!                  |   Orchestrator   |  one cycle at a time
//!                  +-+-----+----+---+-+
//!                    |     |    |   |
//!         +----------+     |    |   +-----------+
//!         v                v    v               v
//!  +-------------+  +-----------+------+  +-----------+
//!  |  Generator  |  | Assessors | Gate |  | Weakening |
//!  | (candidate  |  | (domain,  | (acc/|  |  Engine   |
//!  |  sentences) |  |  ling.)   | evo/ |  | (repairs) |
//!  +-------------+  |           | rej) |  +-----+-----+
//!                   +-----------+------+        |
//!                  +------------------+         |
//!                  |  SnapshotStore   |<--------+
//!                  |  (CAS versions,  |  verified deltas only
//!                  |   audit mirror)  |
//!                  +------------------+
//! ```
//!
//! ## Guarantees
//!
//! - `run_cycle` always returns a completed [`Cycle`]; expected failures
//!   (rejections, timeouts, exhausted searches) are outcomes, not panics.
//! - The active version only ever changes at consolidation, by
//!   compare-and-swap, by exactly one number.
//! - Every completed cycle appends one audit entry when persistence is
//!   enabled, in consolidation order.

mod config;
mod consolidate;
mod cycle;
mod error;
mod orchestrator;
mod retry;
#[cfg(test)]
mod tests;

pub use config::{GateConfig, MendConfig, RetryConfig, SearchConfig, StoreConfig};
pub use consolidate::consolidate;
pub use cycle::{Cycle, CycleOutcome, CycleStage, StageRecord};
pub use error::{MendError, Result};
pub use orchestrator::Orchestrator;
pub use retry::with_backoff;

use mend_council::{AutoPolicy, DecisionGate, Generator};
use mend_reason::{ConsistencyChecker, StructuralReasoner};
use mend_store::{AuditEntry, Axiom, OntologyVersion, SnapshotStore, Storage};
use mend_weaken::WeakeningEngine;
use std::sync::Arc;
use tracing::info;

/// The unified OntoMend facade.
///
/// Owns the snapshot store and the orchestrator, wired from a
/// [`MendConfig`]. The shipped structural reasoner backs both the
/// consistency checker and the weakening engine's verifier.
///
/// # Example
///
/// ```rust
/// use mend_core::{Mend, MendConfig};
/// use mend_council::ScriptedGenerator;
/// use mend_store::{parse_axiom, Axiom};
///
/// let seed = vec![Axiom::existing(parse_axiom("Virus ⊑ Pathogen").unwrap())];
/// let generator = ScriptedGenerator::new(["NovelVirusX ⊑ Virus"]);
/// let mend = Mend::unattended(MendConfig::default(), seed, Box::new(generator)).unwrap();
///
/// let cycle = mend.run_cycle();
/// assert!(cycle.outcome.is_done());
/// assert_eq!(mend.current().number(), 2);
/// ```
pub struct Mend {
    store: Arc<SnapshotStore>,
    orchestrator: Orchestrator,
}

impl Mend {
    /// Creates an engine with an explicit decision gate backend.
    ///
    /// With persistence enabled, a non-empty database takes precedence
    /// over `seed`: the engine resumes from the latest persisted version.
    ///
    /// # Errors
    ///
    /// Fails when the persistent store cannot be opened.
    pub fn new(
        config: MendConfig,
        seed: Vec<Axiom>,
        generator: Box<dyn Generator>,
        gate: Box<dyn DecisionGate>,
    ) -> Result<Self> {
        let store = if config.store.persist {
            let storage = Storage::open(&config.store.db_path)?;
            Arc::new(SnapshotStore::with_storage(seed, storage)?)
        } else {
            Arc::new(SnapshotStore::new(seed))
        };

        let checker = ConsistencyChecker::new(Box::new(StructuralReasoner::new()));
        let verifier = ConsistencyChecker::new(Box::new(StructuralReasoner::new()));
        let weakener = WeakeningEngine::new(verifier).with_limits(
            config.search.max_combination_size,
            config.search.max_candidates,
        );

        info!(
            version = store.current().number(),
            axioms = store.current().axioms().len(),
            persistent = config.store.persist,
            "engine initialized"
        );

        let orchestrator = Orchestrator::new(
            Arc::clone(&store),
            checker,
            weakener,
            generator,
            gate,
            config.retry.clone(),
            config.gate.clone(),
        );

        Ok(Mend {
            store,
            orchestrator,
        })
    }

    /// Creates an engine gated by the unattended [`AutoPolicy`], honoring
    /// `config.gate.min_score` when set.
    ///
    /// # Errors
    ///
    /// Fails when the persistent store cannot be opened.
    pub fn unattended(
        config: MendConfig,
        seed: Vec<Axiom>,
        generator: Box<dyn Generator>,
    ) -> Result<Self> {
        let policy = match config.gate.min_score {
            Some(threshold) => AutoPolicy::new().with_min_score(threshold),
            None => AutoPolicy::new(),
        };
        Mend::new(config, seed, generator, Box::new(policy))
    }

    /// Runs one candidate cycle.
    pub fn run_cycle(&self) -> Cycle {
        self.orchestrator.run_cycle()
    }

    /// Runs up to `count` cycles and returns their records.
    pub fn run_cycles(&self, count: usize) -> Vec<Cycle> {
        (0..count).map(|_| self.run_cycle()).collect()
    }

    /// The active ontology version.
    pub fn current(&self) -> Arc<OntologyVersion> {
        self.store.current()
    }

    /// The underlying snapshot store.
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// The audit log, oldest first. Empty for in-memory engines.
    ///
    /// # Errors
    ///
    /// Fails when the persistent log cannot be read.
    pub fn audit_entries(&self) -> Result<Vec<AuditEntry>> {
        match self.store.storage() {
            Some(storage) => Ok(storage.audit_entries()?),
            None => Ok(Vec::new()),
        }
    }
}

impl std::fmt::Debug for Mend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mend")
            .field("active_version", &self.store.current().number())
            .finish()
    }
}
