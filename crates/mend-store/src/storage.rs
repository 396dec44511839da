//! # Durable Storage Layer
//!
//! Sled-backed persistence for promoted ontology versions and the
//! append-only audit log. The core only relies on "append succeeds or
//! fails"; the byte format here is an implementation detail of this crate.
//!
//! ## Storage structure
//!
//! | Tree | Key | Value | Purpose |
//! |------|-----|-------|---------|
//! | `versions` | big-endian version number | serialized `OntologyVersion` | durable snapshots |
//! | `audit` | big-endian sequence number | serialized `AuditEntry` | append-only audit trail |
//!
//! Audit keys are assigned from a monotonic sequence at append time; the
//! key order is the consolidation order, which is the only externally
//! observable total order across cycles.

use crate::models::{AuditEntry, OntologyVersion, Result};
use std::path::Path;
use tracing::debug;

/// Tree name for persisted ontology versions.
const VERSION_TREE: &str = "versions";

/// Tree name for the append-only audit log.
const AUDIT_TREE: &str = "audit";

/// Wrapper around a sled database for version and audit persistence.
///
/// # Thread safety
///
/// The underlying sled database is thread-safe; clones share the same
/// database handle.
///
/// # Example
///
/// ```rust
/// use mend_store::{Axiom, AxiomForm, OntologyVersion, Storage};
///
/// let storage = Storage::temporary().unwrap();
/// let v = OntologyVersion::new(1, vec![Axiom::existing(AxiomForm::sub_class_of("A", "B"))]);
///
/// storage.persist_version(&v).unwrap();
/// let loaded = storage.load_version(1).unwrap().unwrap();
/// assert_eq!(loaded, v);
/// ```
#[derive(Clone)]
pub struct Storage {
    /// The underlying sled database.
    db: sled::Db,

    /// Tree for serialized ontology versions.
    versions: sled::Tree,

    /// Tree for serialized audit entries.
    audit: sled::Tree,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`](crate::StoreError::Database) if the
    /// path is invalid, permissions are insufficient, or the database is
    /// corrupted.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = sled::open(path)?;
        let versions = db.open_tree(VERSION_TREE)?;
        let audit = db.open_tree(AUDIT_TREE)?;
        Ok(Storage { db, versions, audit })
    }

    /// Creates a temporary in-memory storage for testing. Data is lost
    /// when the last clone is dropped.
    pub fn temporary() -> Result<Self> {
        let config = sled::Config::new().temporary(true);
        let db = config.open()?;
        let versions = db.open_tree(VERSION_TREE)?;
        let audit = db.open_tree(AUDIT_TREE)?;
        Ok(Storage { db, versions, audit })
    }

    /// Persists a promoted ontology version.
    ///
    /// Re-persisting the same version number overwrites with identical
    /// content; versions themselves are immutable.
    pub fn persist_version(&self, version: &OntologyVersion) -> Result<()> {
        let key = version.number().to_be_bytes();
        let bytes = serde_json::to_vec(version)?;
        self.versions.insert(key, bytes)?;
        debug!(version = version.number(), "version persisted");
        Ok(())
    }

    /// Loads a persisted version by number, if present.
    pub fn load_version(&self, number: u64) -> Result<Option<OntologyVersion>> {
        match self.versions.get(number.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns the highest persisted version, if any.
    pub fn latest_version(&self) -> Result<Option<OntologyVersion>> {
        match self.versions.last()? {
            Some((_, bytes)) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Returns every persisted version in number order.
    pub fn all_versions(&self) -> Result<Vec<OntologyVersion>> {
        let mut versions = Vec::new();
        for item in self.versions.iter() {
            let (_, bytes) = item?;
            versions.push(serde_json::from_slice(&bytes)?);
        }
        Ok(versions)
    }

    /// Appends an audit entry, returning its sequence number.
    ///
    /// Entries are never edited or deleted after this call returns.
    pub fn append_audit(&self, entry: &AuditEntry) -> Result<u64> {
        let seq = self.db.generate_id()?;
        let bytes = serde_json::to_vec(entry)?;
        self.audit.insert(seq.to_be_bytes(), bytes)?;
        debug!(seq, cycle_id = %entry.cycle_id, outcome = %entry.outcome, "audit entry appended");
        Ok(seq)
    }

    /// Returns all audit entries in append order.
    pub fn audit_entries(&self) -> Result<Vec<AuditEntry>> {
        let mut entries = Vec::new();
        for item in self.audit.iter() {
            let (_, bytes) = item?;
            entries.push(serde_json::from_slice(&bytes)?);
        }
        Ok(entries)
    }

    /// Returns the number of audit entries recorded.
    pub fn audit_len(&self) -> usize {
        self.audit.len()
    }

    /// Returns the number of persisted versions.
    pub fn version_count(&self) -> usize {
        self.versions.len()
    }

    /// Flushes all pending writes to disk, returning the bytes flushed.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("versions", &self.version_count())
            .field("audit_entries", &self.audit_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Axiom, AxiomForm};
    use uuid::Uuid;

    fn version(n: u64) -> OntologyVersion {
        OntologyVersion::new(n, vec![Axiom::existing(AxiomForm::sub_class_of("A", "B"))])
    }

    fn entry(outcome: &str) -> AuditEntry {
        AuditEntry {
            cycle_id: Uuid::new_v4(),
            source_version: 1,
            result_version: Some(2),
            outcome: outcome.to_string(),
            detail: serde_json::json!({ "stage": "test" }),
            duration_ms: 12,
            recorded_at_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_persist_and_load_version() {
        let storage = Storage::temporary().unwrap();
        storage.persist_version(&version(1)).unwrap();

        let loaded = storage.load_version(1).unwrap().unwrap();
        assert_eq!(loaded.number(), 1);
        assert!(storage.load_version(7).unwrap().is_none());
    }

    #[test]
    fn test_latest_version() {
        let storage = Storage::temporary().unwrap();
        assert!(storage.latest_version().unwrap().is_none());

        storage.persist_version(&version(1)).unwrap();
        storage.persist_version(&version(2)).unwrap();
        assert_eq!(storage.latest_version().unwrap().unwrap().number(), 2);
    }

    #[test]
    fn test_audit_append_order() {
        let storage = Storage::temporary().unwrap();
        storage.append_audit(&entry("done")).unwrap();
        storage.append_audit(&entry("rejected")).unwrap();
        storage.append_audit(&entry("failed")).unwrap();

        let entries = storage.audit_entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].outcome, "done");
        assert_eq!(entries[1].outcome, "rejected");
        assert_eq!(entries[2].outcome, "failed");
        assert_eq!(storage.audit_len(), 3);
    }

    #[test]
    fn test_audit_entry_round_trip() {
        let storage = Storage::temporary().unwrap();
        let original = entry("done");
        storage.append_audit(&original).unwrap();

        let loaded = &storage.audit_entries().unwrap()[0];
        assert_eq!(loaded.cycle_id, original.cycle_id);
        assert_eq!(loaded.result_version, Some(2));
        assert_eq!(loaded.detail["stage"], "test");
    }
}
