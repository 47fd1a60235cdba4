//! Deduplication result types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Live artifacts sharing one content hash, with the chosen survivor.
///
/// Derived on demand; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Shared SHA-256 (lowercase hex)
    pub sha256: String,
    /// Artifact that survives reconciliation
    pub keep_id: Uuid,
    /// Artifacts to be retired in favor of `keep_id`
    pub duplicate_ids: Vec<Uuid>,
}

impl DuplicateGroup {
    /// Total number of artifacts in the group, survivor included.
    pub fn len(&self) -> usize {
        self.duplicate_ids.len() + 1
    }

    /// Groups always contain a survivor.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// What a single reconcile transaction changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// Retired artifact
    pub duplicate_id: Uuid,
    /// Survivor
    pub keep_id: Uuid,
    /// Foreign-key references repointed from duplicate to survivor
    pub references_moved: u64,
    /// Whether the primary flag moved to the survivor
    pub primary_transferred: bool,
}
