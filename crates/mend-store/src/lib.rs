//! # Ontology Snapshot Store
//!
//! Versioned, copy-on-write representation of the knowledge base, plus the
//! typed axiom model and durable persistence shared by every OntoMend
//! component.
//!
//! ## Components
//!
//! | Component | Purpose |
//! |-----------|---------|
//! | [`Axiom`] / [`AxiomForm`] | Description Logic axioms as value objects |
//! | [`parse_axiom`] | DL sentence parsing for generated candidates |
//! | [`OntologyVersion`] | immutable, digest-addressable snapshots |
//! | [`SnapshotStore`] / [`WorkingCopy`] | CAS promotion + isolated overlays |
//! | [`Storage`] | sled-backed version + audit persistence |
//!
//! ## Isolation guarantees
//!
//! Speculative work (consistency checks, repair-candidate evaluation) runs
//! against [`WorkingCopy`] overlays that share the base version
//! structurally and are discarded when the operation returns. The active
//! version changes only through [`SnapshotStore::promote`], which is a
//! compare-and-swap on the version number: concurrent cycles never share
//! mutable state, only the version pointer.
//!
//! ## Quick start
//!
//! ```rust
//! use mend_store::{parse_axiom, Axiom, SnapshotStore};
//!
//! let store = SnapshotStore::new(vec![
//!     Axiom::existing(parse_axiom("Virus ⊑ Pathogen")?),
//!     Axiom::existing(parse_axiom("Virus ⊓ Bacterium ⊑ ⊥")?),
//! ]);
//!
//! let next = store.promote(1, &[], &[
//!     Axiom::proposed(parse_axiom("NovelVirusX ⊑ Virus")?),
//! ])?;
//! assert_eq!(next.number(), 2);
//! # Ok::<(), mend_store::StoreError>(())
//! ```

mod models;
mod parse;
mod storage;
mod store;

pub use models::{
    AuditEntry, Axiom, AxiomForm, OntologyVersion, Provenance, Result, StoreError, VersionDigest,
    DIGEST_SIZE,
};
pub use parse::parse_axiom;
pub use storage::Storage;
pub use store::{SnapshotStore, WorkingCopy};
