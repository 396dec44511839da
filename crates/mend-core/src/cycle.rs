//! The per-candidate cycle record.
//!
//! A [`Cycle`] accumulates everything that happened to one candidate:
//! the generated sentence, the parsed axioms, assessments, consistency
//! verdicts, gate decisions, the repair (if any), a stage-by-stage log,
//! and the terminal outcome. It is the value `run_cycle` returns and the
//! payload of the audit record.

use mend_council::{Assessment, Decision};
use mend_reason::ConsistencyResult;
use mend_store::{AuditEntry, Axiom};
use mend_weaken::RepairProposal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// The stages a cycle can pass through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleStage {
    /// Pulling a candidate sentence from the generator.
    Generate,
    /// Scoring the parsed candidate.
    Assess,
    /// Isolated consistency check.
    CheckConsistency,
    /// First gate ruling, on the assessed candidate.
    FirstDecision,
    /// Bounded weakening search.
    Weaken,
    /// Second gate ruling, on the repair proposal.
    SecondDecision,
    /// Compare-and-swap promotion of the accepted delta.
    Consolidate,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CycleStage::Generate => "generate",
            CycleStage::Assess => "assess",
            CycleStage::CheckConsistency => "check-consistency",
            CycleStage::FirstDecision => "first-decision",
            CycleStage::Weaken => "weaken",
            CycleStage::SecondDecision => "second-decision",
            CycleStage::Consolidate => "consolidate",
        };
        write!(f, "{name}")
    }
}

/// One line of the cycle's stage log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageRecord {
    /// Which stage ran.
    pub stage: CycleStage,
    /// What it concluded.
    pub detail: String,
    /// How long it took.
    pub elapsed_ms: u64,
}

/// Terminal state of a cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CycleOutcome {
    /// The change was consolidated into a new version.
    Done { version: u64 },
    /// The change was declined; the ontology is unchanged.
    Rejected { reason: String },
    /// An unexpected failure ended the cycle; the ontology is unchanged.
    Failed { error: String },
}

impl CycleOutcome {
    /// `true` when the cycle produced a new version.
    pub fn is_done(&self) -> bool {
        matches!(self, CycleOutcome::Done { .. })
    }

    /// Stable label for logs and audit records.
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Done { .. } => "done",
            CycleOutcome::Rejected { .. } => "rejected",
            CycleOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for CycleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleOutcome::Done { version } => write!(f, "done (version {version})"),
            CycleOutcome::Rejected { reason } => write!(f, "rejected: {reason}"),
            CycleOutcome::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Everything that happened to one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    /// Unique id for this cycle.
    pub cycle_id: Uuid,
    /// The active version number when the cycle started.
    pub source_version: u64,
    /// The raw sentence the generator produced.
    pub sentence: Option<String>,
    /// The parsed candidate axioms.
    pub proposed: Vec<Axiom>,
    /// Assessor verdicts.
    pub assessments: Vec<Assessment>,
    /// The isolated consistency check of the candidate.
    pub consistency: Option<ConsistencyResult>,
    /// Gate decisions, in order (at most two).
    pub decisions: Vec<Decision>,
    /// The verified repair, when weakening ran and succeeded.
    pub repair: Option<RepairProposal>,
    /// Stage-by-stage log.
    pub stages: Vec<StageRecord>,
    /// Terminal outcome.
    pub outcome: CycleOutcome,
    /// Wall-clock duration of the whole cycle.
    pub duration_ms: u64,
}

impl Cycle {
    /// Starts an empty cycle record against `source_version`.
    pub fn new(source_version: u64) -> Self {
        Cycle {
            cycle_id: Uuid::new_v4(),
            source_version,
            sentence: None,
            proposed: Vec::new(),
            assessments: Vec::new(),
            consistency: None,
            decisions: Vec::new(),
            repair: None,
            stages: Vec::new(),
            outcome: CycleOutcome::Failed {
                error: "cycle did not run".to_string(),
            },
            duration_ms: 0,
        }
    }

    /// Appends a stage log line.
    pub fn record_stage(&mut self, stage: CycleStage, detail: impl Into<String>, elapsed_ms: u64) {
        self.stages.push(StageRecord {
            stage,
            detail: detail.into(),
            elapsed_ms,
        });
    }

    /// The version this cycle produced, if it consolidated.
    pub fn result_version(&self) -> Option<u64> {
        match &self.outcome {
            CycleOutcome::Done { version } => Some(*version),
            _ => None,
        }
    }

    /// Builds the audit record for this cycle. The full cycle report
    /// rides in the entry's `detail` field.
    pub fn to_audit_entry(&self) -> AuditEntry {
        AuditEntry {
            cycle_id: self.cycle_id,
            source_version: self.source_version,
            result_version: self.result_version(),
            outcome: self.outcome.label().to_string(),
            detail: serde_json::to_value(self).unwrap_or(serde_json::Value::Null),
            duration_ms: self.duration_ms,
            recorded_at_ms: epoch_ms(),
        }
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
