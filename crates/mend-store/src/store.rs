//! # Versioned Snapshot Store
//!
//! Holds the active [`OntologyVersion`] behind a compare-and-swap pointer
//! and hands out cheap isolated [`WorkingCopy`] overlays for speculative
//! work.
//!
//! ## Concurrency model
//!
//! - Exactly one version is active at any instant; readers get an `Arc`
//!   and never observe partial updates.
//! - [`SnapshotStore::promote`] is the single writer. It validates the
//!   caller's base version under the write lock and fails with
//!   [`StoreError::VersionConflict`] if another promotion won the race;
//!   callers re-read and retry.
//! - Working copies share the base axioms structurally (`Arc`) and never
//!   write back; their mutations reach the store only through an explicit
//!   `promote`.

use crate::models::{Axiom, AxiomForm, OntologyVersion, Result, StoreError};
use crate::storage::Storage;
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// A short-lived, isolated overlay on top of an ontology version.
///
/// Exists for the duration of one consistency query or one repair-candidate
/// evaluation; owned exclusively by the operation that created it and
/// discarded when that operation returns, success or failure alike.
///
/// # Example
///
/// ```rust
/// use mend_store::{Axiom, AxiomForm, SnapshotStore};
///
/// let store = SnapshotStore::new(vec![Axiom::existing(AxiomForm::sub_class_of("A", "B"))]);
/// let base = store.current();
///
/// let mut copy = store.branch(&base);
/// copy.add(Axiom::proposed(AxiomForm::sub_class_of("B", "C")));
/// assert_eq!(copy.effective_axioms().len(), 2);
///
/// drop(copy); // nothing reached the store
/// assert_eq!(store.current().axioms().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct WorkingCopy {
    /// The version this copy was branched from (structurally shared).
    base: Arc<OntologyVersion>,
    /// Logical forms masked out of the base.
    removed: Vec<AxiomForm>,
    /// Axioms overlaid on top of the base.
    added: Vec<Axiom>,
}

impl WorkingCopy {
    /// Creates a working copy over `base` with an empty overlay.
    pub fn new(base: Arc<OntologyVersion>) -> Self {
        WorkingCopy {
            base,
            removed: Vec::new(),
            added: Vec::new(),
        }
    }

    /// Returns the version this copy was branched from.
    pub fn base(&self) -> &Arc<OntologyVersion> {
        &self.base
    }

    /// Overlays an axiom. Duplicates of an axiom already visible in the
    /// effective view are ignored.
    pub fn add(&mut self, axiom: Axiom) {
        self.removed.retain(|form| form != &axiom.form);
        if !self.base.contains(&axiom.form) && !self.added.contains(&axiom) {
            self.added.push(axiom);
        }
    }

    /// Masks an axiom form out of the effective view.
    pub fn remove(&mut self, form: &AxiomForm) {
        self.added.retain(|a| &a.form != form);
        if self.base.contains(form) && !self.removed.contains(form) {
            self.removed.push(form.clone());
        }
    }

    /// Materializes the effective axiom view: base minus removals plus
    /// additions, in canonical order.
    pub fn effective_axioms(&self) -> Vec<Axiom> {
        let mut axioms: Vec<Axiom> = self
            .base
            .axioms()
            .iter()
            .filter(|a| !self.removed.contains(&a.form))
            .cloned()
            .chain(self.added.iter().cloned())
            .collect();
        axioms.sort();
        axioms.dedup();
        axioms
    }
}

/// The versioned, copy-on-write knowledge base store.
///
/// # Thread safety
///
/// `SnapshotStore` is `Send + Sync`; independent cycles share one store via
/// `Arc` and race only at `promote`, which is CAS-guarded by the version
/// number.
pub struct SnapshotStore {
    /// The active version pointer. Swapped wholesale at promotion.
    active: RwLock<Arc<OntologyVersion>>,
    /// Every version ever promoted, for audit inspection.
    history: RwLock<Vec<Arc<OntologyVersion>>>,
    /// Optional durable mirror for promoted versions.
    storage: Option<Storage>,
}

impl SnapshotStore {
    /// Creates a store whose initial active version (v1) holds `axioms`.
    pub fn new(axioms: Vec<Axiom>) -> Self {
        let initial = Arc::new(OntologyVersion::new(1, axioms));
        info!(version = 1, axioms = initial.axioms().len(), "snapshot store initialized");
        SnapshotStore {
            active: RwLock::new(Arc::clone(&initial)),
            history: RwLock::new(vec![initial]),
            storage: None,
        }
    }

    /// Creates a store that mirrors every promoted version into `storage`.
    ///
    /// An empty database is seeded with v1 from `axioms`, persisted
    /// immediately. A non-empty database wins over the seed: the store
    /// resumes with the persisted history and its highest version active,
    /// so superseded versions survive restarts untouched.
    pub fn with_storage(axioms: Vec<Axiom>, storage: Storage) -> Result<Self> {
        let persisted = storage.all_versions()?;
        if let Some(latest) = persisted.last() {
            info!(
                version = latest.number(),
                versions = persisted.len(),
                "resuming from persisted history"
            );
            let history: Vec<Arc<OntologyVersion>> =
                persisted.into_iter().map(Arc::new).collect();
            let active = Arc::clone(history.last().expect("history is non-empty"));
            return Ok(SnapshotStore {
                active: RwLock::new(active),
                history: RwLock::new(history),
                storage: Some(storage),
            });
        }

        let store = SnapshotStore::new(axioms);
        storage.persist_version(&store.current())?;
        Ok(SnapshotStore {
            storage: Some(storage),
            ..store
        })
    }

    /// Returns the active version.
    pub fn current(&self) -> Arc<OntologyVersion> {
        Arc::clone(&self.active.read().expect("store lock poisoned"))
    }

    /// Returns a superseded (or the active) version by number.
    pub fn get(&self, number: u64) -> Result<Arc<OntologyVersion>> {
        self.history
            .read()
            .expect("store lock poisoned")
            .iter()
            .find(|v| v.number() == number)
            .cloned()
            .ok_or(StoreError::UnknownVersion(number))
    }

    /// Branches an isolated [`WorkingCopy`] off `version`. O(1): the base
    /// axiom set is shared structurally, only the overlay is owned.
    pub fn branch(&self, version: &Arc<OntologyVersion>) -> WorkingCopy {
        WorkingCopy::new(Arc::clone(version))
    }

    /// Atomically installs a new active version derived from version
    /// `base_number` minus `removed` plus `added`.
    ///
    /// # Errors
    ///
    /// [`StoreError::VersionConflict`] if `base_number` is no longer the
    /// active version; the caller must re-read the current version,
    /// re-derive its delta, and retry. No partial update is ever visible.
    pub fn promote(
        &self,
        base_number: u64,
        removed: &[AxiomForm],
        added: &[Axiom],
    ) -> Result<Arc<OntologyVersion>> {
        let mut active = self.active.write().expect("store lock poisoned");
        if active.number() != base_number {
            debug!(
                expected = base_number,
                actual = active.number(),
                "promotion lost the version race"
            );
            return Err(StoreError::VersionConflict {
                expected: base_number,
                actual: active.number(),
            });
        }

        let axioms: Vec<Axiom> = active
            .axioms()
            .iter()
            .filter(|a| !removed.contains(&a.form))
            .cloned()
            .chain(added.iter().cloned())
            .collect();
        let next = Arc::new(OntologyVersion::new(active.number() + 1, axioms));

        // Persist before the pointer swap so readers never see an active
        // version that durable storage does not know about.
        if let Some(storage) = &self.storage {
            storage.persist_version(&next)?;
        }

        self.history
            .write()
            .expect("store lock poisoned")
            .push(Arc::clone(&next));
        *active = Arc::clone(&next);

        info!(
            version = next.number(),
            removed = removed.len(),
            added = added.len(),
            axioms = next.axioms().len(),
            "promoted new active version"
        );
        Ok(next)
    }

    /// Returns the durable storage mirror, if configured.
    pub fn storage(&self) -> Option<&Storage> {
        self.storage.as_ref()
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("active_version", &self.current().number())
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}
