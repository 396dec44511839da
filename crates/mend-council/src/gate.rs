//! Decision gate: the accept/evolve/reject checkpoint.
//!
//! Every cycle passes through the gate twice at most: once with the
//! assessed candidate and its consistency verdict, and once more with a
//! repair proposal when weakening was needed. Interactive review and
//! unattended policy share the same [`DecisionGate`] contract, so the
//! orchestrator's state machine never branches on who is answering.

use crate::assessor::{mean_score, Assessment};
use crate::error::GateError;
use mend_reason::ConsistencyResult;
use mend_store::Axiom;
use mend_weaken::RepairProposal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// The three possible gate outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    /// Take the change as-is.
    Accept,
    /// Search for a weakened form instead of rejecting outright.
    Evolve,
    /// Discard the change.
    Reject,
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Accept => write!(f, "ACCEPT"),
            Choice::Evolve => write!(f, "EVOLVE"),
            Choice::Reject => write!(f, "REJECT"),
        }
    }
}

/// A decision returned by a gate backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    /// The outcome chosen.
    pub choice: Choice,
    /// Why it was chosen.
    pub rationale: String,
}

impl Decision {
    /// Creates a decision.
    pub fn new(choice: Choice, rationale: impl Into<String>) -> Self {
        Decision {
            choice,
            rationale: rationale.into(),
        }
    }
}

/// What the gate is being asked to rule on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GatePayload {
    /// First checkpoint: an assessed candidate with its verdict.
    Candidate {
        axiom: Axiom,
        assessments: Vec<Assessment>,
        consistency: ConsistencyResult,
    },
    /// Second checkpoint: a verified repair proposal.
    Repair { proposal: RepairProposal },
}

/// The accept/evolve/reject checkpoint contract.
pub trait DecisionGate: Send + Sync {
    /// Returns the name of this gate backend.
    fn name(&self) -> &str;

    /// Rules on a payload, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// [`GateError::Timeout`] when no answer arrives in time;
    /// [`GateError::Closed`] when the answering side is gone. Both map
    /// to a rejected cycle, never to a pending one.
    fn decide(&self, payload: &GatePayload, timeout: Duration) -> Result<Decision, GateError>;
}

/// Unattended policy gate.
///
/// Accepts consistent candidates, asks for evolution on inconsistent
/// ones, and accepts verified repairs. An optional minimum mean
/// assessment score rejects weak candidates before any of that.
#[derive(Debug, Default)]
pub struct AutoPolicy {
    min_score: Option<f64>,
}

impl AutoPolicy {
    /// Creates the default policy with no score threshold.
    pub fn new() -> Self {
        AutoPolicy { min_score: None }
    }

    /// Rejects candidates whose mean assessment score is below
    /// `threshold`.
    pub fn with_min_score(mut self, threshold: f64) -> Self {
        self.min_score = Some(threshold);
        self
    }
}

impl DecisionGate for AutoPolicy {
    fn name(&self) -> &str {
        "auto-policy"
    }

    fn decide(&self, payload: &GatePayload, _timeout: Duration) -> Result<Decision, GateError> {
        let decision = match payload {
            GatePayload::Candidate {
                assessments,
                consistency,
                ..
            } => {
                if let (Some(threshold), Some(mean)) = (self.min_score, mean_score(assessments)) {
                    if mean < threshold {
                        return Ok(Decision::new(
                            Choice::Reject,
                            format!("mean assessment score {mean:.2} below threshold {threshold:.2}"),
                        ));
                    }
                }
                if consistency.consistent {
                    Decision::new(Choice::Accept, "candidate is consistent with the ontology")
                } else {
                    Decision::new(
                        Choice::Evolve,
                        format!(
                            "candidate conflicts with {} axiom(s), requesting repair",
                            consistency.justification.len()
                        ),
                    )
                }
            }
            GatePayload::Repair { proposal } => {
                if proposal.verified.consistent {
                    Decision::new(
                        Choice::Accept,
                        format!(
                            "verified repair, information loss {:.2}",
                            proposal.information_loss
                        ),
                    )
                } else {
                    Decision::new(Choice::Reject, "repair proposal failed verification")
                }
            }
        };
        debug!(choice = %decision.choice, "auto policy decided");
        Ok(decision)
    }
}

/// A request forwarded to whoever answers an interactive gate.
#[derive(Debug)]
pub struct GateRequest {
    /// Correlates the eventual [`GateAnswer`] with this request.
    pub id: u64,
    /// The payload under review.
    pub payload: GatePayload,
}

/// An operator's ruling on one [`GateRequest`].
#[derive(Debug)]
pub struct GateAnswer {
    /// The `id` of the request being answered.
    pub request_id: u64,
    /// The ruling itself.
    pub decision: Decision,
}

/// Interactive gate backed by a channel pair.
///
/// `decide` forwards the payload to the operator side and blocks for an
/// answer up to the timeout. Requests carry a correlation id; an answer
/// to a request that already timed out is discarded, never applied to a
/// later payload. A silent or disconnected operator turns into
/// [`GateError::Timeout`] or [`GateError::Closed`], both of which
/// reject the cycle instead of leaving it pending.
pub struct ChannelGate {
    requests: Sender<GateRequest>,
    answers: Mutex<Receiver<GateAnswer>>,
    next_id: AtomicU64,
}

/// Operator side of a [`ChannelGate`].
pub struct GateOperator {
    /// Incoming review requests.
    pub requests: Receiver<GateRequest>,
    /// Outgoing answers, each tagged with the request it rules on.
    pub answers: Sender<GateAnswer>,
}

impl GateOperator {
    /// Answers `request` with `decision`.
    ///
    /// # Errors
    ///
    /// [`GateError::Closed`] when the gate side is gone.
    pub fn answer(&self, request: &GateRequest, decision: Decision) -> Result<(), GateError> {
        self.answers
            .send(GateAnswer {
                request_id: request.id,
                decision,
            })
            .map_err(|_| GateError::Closed)
    }
}

/// Creates a connected gate/operator pair.
pub fn channel_gate() -> (ChannelGate, GateOperator) {
    let (request_tx, request_rx) = mpsc::channel();
    let (answer_tx, answer_rx) = mpsc::channel();
    (
        ChannelGate {
            requests: request_tx,
            answers: Mutex::new(answer_rx),
            next_id: AtomicU64::new(1),
        },
        GateOperator {
            requests: request_rx,
            answers: answer_tx,
        },
    )
}

impl DecisionGate for ChannelGate {
    fn name(&self) -> &str {
        "channel"
    }

    fn decide(&self, payload: &GatePayload, timeout: Duration) -> Result<Decision, GateError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();
        self.requests
            .send(GateRequest {
                id,
                payload: payload.clone(),
            })
            .map_err(|_| GateError::Closed)?;

        let answers = self.answers.lock().expect("gate lock poisoned");
        loop {
            let remaining = timeout.saturating_sub(started.elapsed());
            match answers.recv_timeout(remaining) {
                Ok(answer) if answer.request_id == id => return Ok(answer.decision),
                Ok(answer) => {
                    // Late ruling on a request that already timed out.
                    warn!(
                        request_id = answer.request_id,
                        expected = id,
                        "discarding stale gate answer"
                    );
                }
                Err(RecvTimeoutError::Timeout) => {
                    let waited_ms = started.elapsed().as_millis() as u64;
                    warn!(waited_ms, "gate timed out");
                    return Err(GateError::Timeout { waited_ms });
                }
                Err(RecvTimeoutError::Disconnected) => return Err(GateError::Closed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessor::Score;
    use mend_store::parse_axiom;
    use std::thread;

    fn candidate_payload(consistent: bool) -> GatePayload {
        GatePayload::Candidate {
            axiom: Axiom::proposed(parse_axiom("Pneumonia ⊑ ∃causedBy.NovelVirusX").unwrap()),
            assessments: vec![
                Assessment::new("domain-expert", "domain plausibility", Score::new(0.75), ""),
                Assessment::new("linguistic-insight", "well-formedness", Score::new(1.0), ""),
            ],
            consistency: if consistent {
                ConsistencyResult::consistent()
            } else {
                ConsistencyResult {
                    consistent: false,
                    justification: vec![Axiom::existing(
                        parse_axiom("Pneumonia ⊑ ∀causedBy.Bacterium").unwrap(),
                    )],
                }
            },
        }
    }

    #[test]
    fn test_auto_policy_accepts_consistent_candidate() {
        let decision = AutoPolicy::new()
            .decide(&candidate_payload(true), Duration::from_millis(1))
            .unwrap();
        assert_eq!(decision.choice, Choice::Accept);
    }

    #[test]
    fn test_auto_policy_evolves_inconsistent_candidate() {
        let decision = AutoPolicy::new()
            .decide(&candidate_payload(false), Duration::from_millis(1))
            .unwrap();
        assert_eq!(decision.choice, Choice::Evolve);
    }

    #[test]
    fn test_auto_policy_rejects_below_threshold() {
        let decision = AutoPolicy::new()
            .with_min_score(0.9)
            .decide(&candidate_payload(true), Duration::from_millis(1))
            .unwrap();
        assert_eq!(decision.choice, Choice::Reject);
        assert!(decision.rationale.contains("below threshold"));
    }

    #[test]
    fn test_channel_gate_round_trip() {
        let (gate, operator) = channel_gate();
        let handle = thread::spawn(move || {
            let request = operator.requests.recv().unwrap();
            assert!(matches!(request.payload, GatePayload::Candidate { .. }));
            operator
                .answer(&request, Decision::new(Choice::Accept, "looks right"))
                .unwrap();
        });

        let decision = gate
            .decide(&candidate_payload(true), Duration::from_secs(1))
            .unwrap();
        assert_eq!(decision.choice, Choice::Accept);
        handle.join().unwrap();
    }

    #[test]
    fn test_channel_gate_stale_answer_not_applied_to_next_request() {
        let (gate, operator) = channel_gate();

        // The first review times out unanswered.
        let err = gate
            .decide(&candidate_payload(false), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, GateError::Timeout { .. }));

        // The operator rules on the first request late, then on the
        // second in time. The late ruling must not leak into the
        // second review.
        let handle = thread::spawn(move || {
            let first = operator.requests.recv().unwrap();
            operator
                .answer(&first, Decision::new(Choice::Reject, "rejecting the first candidate"))
                .unwrap();
            let second = operator.requests.recv().unwrap();
            operator
                .answer(&second, Decision::new(Choice::Accept, "second candidate is fine"))
                .unwrap();
        });

        let decision = gate
            .decide(&candidate_payload(true), Duration::from_secs(1))
            .unwrap();
        assert_eq!(decision.choice, Choice::Accept);
        assert_eq!(decision.rationale, "second candidate is fine");
        handle.join().unwrap();
    }

    #[test]
    fn test_channel_gate_timeout() {
        let (gate, _operator) = channel_gate();
        let err = gate
            .decide(&candidate_payload(true), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, GateError::Timeout { .. }));
    }

    #[test]
    fn test_channel_gate_closed_operator() {
        let (gate, operator) = channel_gate();
        drop(operator);
        let err = gate
            .decide(&candidate_payload(true), Duration::from_millis(10))
            .unwrap_err();
        assert!(matches!(err, GateError::Closed));
    }
}
