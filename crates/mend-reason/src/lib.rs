//! # mend-reason: Isolated Consistency Checking for OntoMend
//!
//! Decides whether a candidate change to the ontology is logically
//! admissible, without ever mutating the active snapshot. The checker
//! branches a throwaway working copy, overlays the change, asks a
//! pluggable reasoner for a verdict, and discards the copy.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`Reasoner`] | Trait for an external reasoning engine |
//! | [`StructuralReasoner`] | Deterministic built-in structural reasoner |
//! | [`ConsistencyChecker`] | Isolation layer over a reasoner |
//! | [`ConsistencyResult`] | Verdict plus justification axioms |
//!
//! ## Isolation Guarantee
//!
//! `check` and `check_delta` never write through to the snapshot store.
//! After any sequence of checks, regardless of verdicts or reasoner
//! failures, the active version's digest is unchanged.
//!
//! ## Quick Start
//!
//! ```rust
//! use mend_reason::{ConsistencyChecker, StructuralReasoner};
//! use mend_store::{parse_axiom, Axiom, OntologyVersion};
//! use std::sync::Arc;
//!
//! let base = Arc::new(OntologyVersion::new(
//!     1,
//!     vec![Axiom::existing(
//!         parse_axiom("Pneumonia ⊑ ∀causedBy.Bacterium").unwrap(),
//!     )],
//! ));
//! let checker = ConsistencyChecker::new(Box::new(StructuralReasoner::new()));
//! let result = checker.check(&base, &[]).unwrap();
//! assert!(result.consistent);
//! ```

mod checker;
mod error;
mod reasoner;

pub use checker::{ConsistencyChecker, ConsistencyResult};
pub use error::{ReasonError, Result};
pub use reasoner::{Reasoner, ReasonerVerdict, StructuralReasoner};
