//! Deleted photoset tombstones.

use crate::SubjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Records that a user deleted (part of) a photoset so batch downloaders
/// do not bring it back. Never mutated, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeletedPhotosetMarker {
    /// Subject the photoset belonged to
    pub subject_id: SubjectId,
    /// Photoset identifier
    pub photoset_id: String,
    /// When the first deletion was recorded
    pub deleted_at: DateTime<Utc>,
}
