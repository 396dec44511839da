//! # mend-council: Review and Decision Capabilities for OntoMend
//!
//! The roles that surround the core repair loop: producing candidate
//! sentences, scoring them from independent perspectives, and ruling on
//! whether a change enters the ontology. Each role is a narrow trait
//! with a deterministic shipped implementation, so the engine runs
//! unattended and tests never depend on an external service.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`Generator`] / [`ScriptedGenerator`] | Candidate sentence source |
//! | [`Assessor`] | Scoring perspective contract |
//! | [`DomainAssessor`] | Vocabulary grounding heuristics |
//! | [`LinguisticAssessor`] | Structural well-formedness rubric |
//! | [`DecisionGate`] | Accept/evolve/reject checkpoint contract |
//! | [`AutoPolicy`] | Unattended gate policy |
//! | [`ChannelGate`] | Interactive gate over a channel pair |

mod assessor;
mod error;
mod gate;
mod generator;

pub use assessor::builtin::{DomainAssessor, LinguisticAssessor};
pub use assessor::{mean_score, Assessment, Assessor, Score};
pub use error::{CouncilError, GateError, Result};
pub use gate::{
    channel_gate, AutoPolicy, ChannelGate, Choice, Decision, DecisionGate, GateAnswer,
    GateOperator, GatePayload, GateRequest,
};
pub use generator::{Generator, ScriptedGenerator};
