//! # Core Data Models for the Snapshot Store
//!
//! This module defines the fundamental types shared across OntoMend:
//! axioms as value objects, immutable ontology versions, and audit records.
//! Each type is designed so that speculative work can never corrupt the
//! active knowledge base.
//!
//! ## Invariants
//!
//! - **Value semantics**: two axioms compare equal when their logical form
//!   is equal, regardless of where they came from.
//! - **Immutability**: an [`OntologyVersion`] is never mutated after
//!   creation; evolution happens by promoting a new version.
//! - **Append-only audit**: [`AuditEntry`] records are written once and
//!   never edited.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash as StdHash, Hasher};
use thiserror::Error;
use uuid::Uuid;

/// SHA-256 digest size in bytes.
pub const DIGEST_SIZE: usize = 32;

/// A 32-byte SHA-256 digest of an ontology version's canonical form.
///
/// Used to assert bit-identical replay results: two versions built from the
/// same base by the same decisions have equal digests.
pub type VersionDigest = [u8; DIGEST_SIZE];

/// Errors produced by the snapshot store and its persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Optimistic-concurrency collision: the promotion base is no longer
    /// the active version. The caller must re-read and retry.
    #[error("version conflict: promotion based on v{expected}, but v{actual} is active")]
    VersionConflict {
        /// The version number the caller derived its delta from.
        expected: u64,
        /// The version number that is actually active.
        actual: u64,
    },

    /// A version number that was never created (or not persisted).
    #[error("unknown ontology version v{0}")]
    UnknownVersion(u64),

    /// A candidate axiom string could not be parsed as a known DL shape.
    #[error("unparseable axiom: {0}")]
    AxiomSyntax(String),

    /// Underlying sled database failure.
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    /// Record (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Where an axiom came from.
///
/// Provenance is carried for audit purposes only; it never participates in
/// axiom equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Present in the knowledge base before this cycle.
    Existing,
    /// Proposed by the generation capability during this cycle.
    Proposed,
    /// Produced by the weakening search as a replacement.
    Repaired,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Existing => write!(f, "existing"),
            Provenance::Proposed => write!(f, "proposed"),
            Provenance::Repaired => write!(f, "repaired"),
        }
    }
}

/// The logical form of a Description Logic axiom.
///
/// A closed set of shapes: the weakening search enumerates transformations
/// per shape, so the set must stay finite and matchable.
///
/// # Example
///
/// ```rust
/// use mend_store::AxiomForm;
///
/// let ax = AxiomForm::some_values("Pneumonia", "causedBy", "Bacterium");
/// assert_eq!(ax.to_string(), "Pneumonia ⊑ ∃causedBy.Bacterium");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, StdHash, Serialize, Deserialize)]
pub enum AxiomForm {
    /// `A ⊑ B`: simple class subsumption.
    SubClassOf {
        /// Subsumed class.
        sub: String,
        /// Subsuming class.
        sup: String,
    },
    /// `A ⊑ ∃p.F`: existential restriction.
    SomeValuesFrom {
        /// Restricted class.
        sub: String,
        /// Object property.
        property: String,
        /// Filler class.
        filler: String,
    },
    /// `A ⊑ ∀p.F`: universal restriction.
    AllValuesFrom {
        /// Restricted class.
        sub: String,
        /// Object property.
        property: String,
        /// Filler class.
        filler: String,
    },
    /// `A ⊓ B ⊑ ⊥`: class disjointness. The pair is stored normalized
    /// (lexicographically smaller name first) so the axiom is order-free.
    DisjointWith {
        /// Lexicographically smaller class name.
        left: String,
        /// Lexicographically larger class name.
        right: String,
    },
    /// `A ⊑ ≤n p`: maximum cardinality restriction.
    MaxCardinality {
        /// Restricted class.
        sub: String,
        /// Object property.
        property: String,
        /// Upper bound on fillers.
        n: u32,
    },
    /// `A ⊑ ≥n p`: minimum cardinality restriction.
    MinCardinality {
        /// Restricted class.
        sub: String,
        /// Object property.
        property: String,
        /// Lower bound on fillers.
        n: u32,
    },
}

impl AxiomForm {
    /// Creates a subsumption axiom `sub ⊑ sup`.
    pub fn sub_class_of(sub: impl Into<String>, sup: impl Into<String>) -> Self {
        AxiomForm::SubClassOf {
            sub: sub.into(),
            sup: sup.into(),
        }
    }

    /// Creates an existential restriction `sub ⊑ ∃property.filler`.
    pub fn some_values(
        sub: impl Into<String>,
        property: impl Into<String>,
        filler: impl Into<String>,
    ) -> Self {
        AxiomForm::SomeValuesFrom {
            sub: sub.into(),
            property: property.into(),
            filler: filler.into(),
        }
    }

    /// Creates a universal restriction `sub ⊑ ∀property.filler`.
    pub fn all_values(
        sub: impl Into<String>,
        property: impl Into<String>,
        filler: impl Into<String>,
    ) -> Self {
        AxiomForm::AllValuesFrom {
            sub: sub.into(),
            property: property.into(),
            filler: filler.into(),
        }
    }

    /// Creates a disjointness axiom. The pair is normalized so that
    /// `disjoint("B", "A") == disjoint("A", "B")`.
    pub fn disjoint(a: impl Into<String>, b: impl Into<String>) -> Self {
        let (a, b) = (a.into(), b.into());
        if a <= b {
            AxiomForm::DisjointWith { left: a, right: b }
        } else {
            AxiomForm::DisjointWith { left: b, right: a }
        }
    }

    /// Creates a maximum cardinality restriction `sub ⊑ ≤n property`.
    pub fn max_cardinality(sub: impl Into<String>, property: impl Into<String>, n: u32) -> Self {
        AxiomForm::MaxCardinality {
            sub: sub.into(),
            property: property.into(),
            n,
        }
    }

    /// Creates a minimum cardinality restriction `sub ⊑ ≥n property`.
    pub fn min_cardinality(sub: impl Into<String>, property: impl Into<String>, n: u32) -> Self {
        AxiomForm::MinCardinality {
            sub: sub.into(),
            property: property.into(),
            n,
        }
    }

    /// Returns every class name this axiom mentions.
    pub fn classes(&self) -> Vec<&str> {
        match self {
            AxiomForm::SubClassOf { sub, sup } => vec![sub, sup],
            AxiomForm::SomeValuesFrom { sub, filler, .. }
            | AxiomForm::AllValuesFrom { sub, filler, .. } => vec![sub, filler],
            AxiomForm::DisjointWith { left, right } => vec![left, right],
            AxiomForm::MaxCardinality { sub, .. } | AxiomForm::MinCardinality { sub, .. } => {
                vec![sub]
            }
        }
    }

    /// Returns the object property this axiom mentions, if any.
    pub fn property(&self) -> Option<&str> {
        match self {
            AxiomForm::SomeValuesFrom { property, .. }
            | AxiomForm::AllValuesFrom { property, .. }
            | AxiomForm::MaxCardinality { property, .. }
            | AxiomForm::MinCardinality { property, .. } => Some(property),
            _ => None,
        }
    }

    /// Returns true if this axiom mentions a class or property that `other`
    /// also mentions. Used for the conservative justification fallback.
    pub fn touches(&self, other: &AxiomForm) -> bool {
        let shared_class = self
            .classes()
            .iter()
            .any(|c| other.classes().contains(c));
        let shared_property = match (self.property(), other.property()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        shared_class || shared_property
    }
}

impl fmt::Display for AxiomForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AxiomForm::SubClassOf { sub, sup } => write!(f, "{sub} ⊑ {sup}"),
            AxiomForm::SomeValuesFrom {
                sub,
                property,
                filler,
            } => write!(f, "{sub} ⊑ ∃{property}.{filler}"),
            AxiomForm::AllValuesFrom {
                sub,
                property,
                filler,
            } => write!(f, "{sub} ⊑ ∀{property}.{filler}"),
            AxiomForm::DisjointWith { left, right } => write!(f, "{left} ⊓ {right} ⊑ ⊥"),
            AxiomForm::MaxCardinality { sub, property, n } => {
                write!(f, "{sub} ⊑ ≤{n} {property}")
            }
            AxiomForm::MinCardinality { sub, property, n } => {
                write!(f, "{sub} ⊑ ≥{n} {property}")
            }
        }
    }
}

/// A single formal logical statement with provenance.
///
/// Axioms are value objects: equality, hashing, and ordering consider only
/// the logical [`AxiomForm`], never the provenance tag.
///
/// # Example
///
/// ```rust
/// use mend_store::{Axiom, AxiomForm};
///
/// let a = Axiom::existing(AxiomForm::sub_class_of("Virus", "Pathogen"));
/// let b = Axiom::proposed(AxiomForm::sub_class_of("Virus", "Pathogen"));
/// assert_eq!(a, b); // same logical form
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Axiom {
    /// The logical form.
    pub form: AxiomForm,
    /// Where the axiom came from. Excluded from equality.
    pub provenance: Provenance,
}

impl Axiom {
    /// Creates an axiom already present in the knowledge base.
    pub fn existing(form: AxiomForm) -> Self {
        Axiom {
            form,
            provenance: Provenance::Existing,
        }
    }

    /// Creates an axiom proposed by the generation capability.
    pub fn proposed(form: AxiomForm) -> Self {
        Axiom {
            form,
            provenance: Provenance::Proposed,
        }
    }

    /// Creates an axiom produced by the weakening search.
    pub fn repaired(form: AxiomForm) -> Self {
        Axiom {
            form,
            provenance: Provenance::Repaired,
        }
    }
}

impl PartialEq for Axiom {
    fn eq(&self, other: &Self) -> bool {
        self.form == other.form
    }
}

impl Eq for Axiom {}

impl StdHash for Axiom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.form.hash(state);
    }
}

impl PartialOrd for Axiom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Axiom {
    fn cmp(&self, other: &Self) -> Ordering {
        self.form.cmp(&other.form)
    }
}

impl fmt::Display for Axiom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.form.fmt(f)
    }
}

impl From<AxiomForm> for Axiom {
    fn from(form: AxiomForm) -> Self {
        Axiom::existing(form)
    }
}

/// An immutable snapshot of the knowledge base.
///
/// Identified by a monotonically increasing version number. Created only by
/// promotion; never mutated afterwards; superseded versions remain
/// inspectable for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyVersion {
    /// Monotonically increasing version identifier.
    number: u64,
    /// The full axiom set, kept sorted and deduplicated by logical form.
    axioms: Vec<Axiom>,
}

impl OntologyVersion {
    /// Builds a version from an axiom set. Axioms are sorted by logical
    /// form and deduplicated, so construction is canonical: the same set
    /// always yields the same representation (and digest).
    pub fn new(number: u64, mut axioms: Vec<Axiom>) -> Self {
        axioms.sort();
        axioms.dedup();
        OntologyVersion { number, axioms }
    }

    /// Returns the version number.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Returns the axioms of this version, in canonical order.
    pub fn axioms(&self) -> &[Axiom] {
        &self.axioms
    }

    /// True if this version contains an axiom with the given logical form.
    pub fn contains(&self, form: &AxiomForm) -> bool {
        self.axioms.iter().any(|a| &a.form == form)
    }

    /// SHA-256 digest over the canonical rendering of this version.
    ///
    /// Two versions with the same number, axiom forms, and provenance tags
    /// have equal digests; this backs the replay-determinism guarantee.
    pub fn digest(&self) -> VersionDigest {
        let mut hasher = Sha256::new();
        hasher.update(self.number.to_be_bytes());
        for axiom in &self.axioms {
            hasher.update(axiom.form.to_string().as_bytes());
            hasher.update(b"\t");
            hasher.update(axiom.provenance.to_string().as_bytes());
            hasher.update(b"\n");
        }
        hasher.finalize().into()
    }
}

/// One immutable record per completed cycle.
///
/// Appended at consolidation time (or when a cycle terminates without
/// consolidating); append order is the only externally observable total
/// order across cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The cycle this record belongs to.
    pub cycle_id: Uuid,
    /// The active version number when the cycle started.
    pub source_version: u64,
    /// The version the cycle produced, if it consolidated.
    pub result_version: Option<u64>,
    /// Terminal outcome label (`done`, `rejected`, `failed`).
    pub outcome: String,
    /// Stage-by-stage detail: assessments, consistency result, decisions,
    /// repair summary, errors.
    pub detail: serde_json::Value,
    /// Wall-clock duration of the cycle in milliseconds.
    pub duration_ms: u64,
    /// Unix-epoch milliseconds when the record was appended.
    pub recorded_at_ms: u64,
}
