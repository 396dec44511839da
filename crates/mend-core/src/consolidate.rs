//! Consolidation: promoting an accepted delta into a new version.
//!
//! Promotion is optimistic. If another cycle won the version race, the
//! delta is re-derived against the new current version, re-verified for
//! consistency there, and promoted exactly once more. A second conflict
//! or a failed re-verification fails the cycle; the store is never left
//! in a partial state either way.

use crate::error::{MendError, Result};
use mend_reason::ConsistencyChecker;
use mend_store::{Axiom, AxiomForm, OntologyVersion, SnapshotStore, StoreError};
use std::sync::Arc;
use tracing::{info, warn};

/// Promotes `(base − removed) ∪ added` as the next active version.
pub fn consolidate(
    store: &SnapshotStore,
    checker: &ConsistencyChecker,
    base: &Arc<OntologyVersion>,
    removed: &[AxiomForm],
    added: &[Axiom],
) -> Result<Arc<OntologyVersion>> {
    match store.promote(base.number(), removed, added) {
        Ok(version) => Ok(version),
        Err(StoreError::VersionConflict { expected, actual }) => {
            warn!(
                expected,
                actual, "consolidation lost the version race, re-deriving"
            );
            let current = store.current();

            // The base moved under us, so the verification that justified
            // this delta no longer applies. Check it against the new base
            // before trying again.
            let reverified = checker.check_delta(&current, removed, added)?;
            if !reverified.consistent {
                return Err(MendError::Consolidation(format!(
                    "delta verified against version {} is inconsistent against current version {}",
                    base.number(),
                    current.number()
                )));
            }

            let version = store.promote(current.number(), removed, added)?;
            info!(
                version = version.number(),
                "consolidated after one conflict retry"
            );
            Ok(version)
        }
        Err(other) => Err(other.into()),
    }
}
