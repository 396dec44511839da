//! # mend-weaken: Axiom Weakening for OntoMend
//!
//! When a proposed change makes the ontology inconsistent, this crate
//! searches for the least-destructive modification of the existing axioms
//! that restores consistency while keeping the new evidence intact.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`WeakeningRule`] | Closed set of per-shape transformations |
//! | [`weakenings`] | Enumerate substitutions for one axiom |
//! | [`Hierarchy`] | Subclass ladder the generalization rules climb |
//! | [`WeakeningEngine`] | Bounded, deterministic repair search |
//! | [`RepairProposal`] | Verified repair with loss score and rationale |
//!
//! ## Determinism
//!
//! Rule declaration order, strict-ancestor ordering (distance, then
//! name), phased combination sizes, and stable loss sorting make the
//! search a pure function of its inputs: the same base, proposal, and
//! justification always yield the same repair.

mod engine;
mod error;
mod rules;

pub use engine::{
    RepairProposal, WeakeningEngine, DEFAULT_MAX_CANDIDATES, DEFAULT_MAX_COMBINATION_SIZE,
};
pub use error::{Result, WeakenError};
pub use rules::{weakenings, Hierarchy, Substitution, WeakeningRule};
