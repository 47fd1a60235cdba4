//! Domain types for the Rolodex media vault.
//!
//! A [`MediaArtifact`] is one stored image or video together with the ledger
//! metadata that says who it belongs to, where its bytes live, and how it got
//! there. Everything else in the workspace reads or writes these types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod artifact;
mod batch;
mod duplicate;
mod kinds;
mod photoset;

pub use artifact::{MediaArtifact, MediaMetadataUpdate, NewMediaArtifact, StorageLocation};
pub use batch::{
    BatchOptions, BatchReport, DEFAULT_BATCH_SIZE, DEFAULT_MAX_ERROR_SAMPLES, SkipReason,
};
pub use duplicate::{DuplicateGroup, ReconcileOutcome};
pub use kinds::{MediaSource, MediaType, ProviderKind};
pub use photoset::DeletedPhotosetMarker;

/// Identifier of the person an artifact belongs to.
pub type SubjectId = i64;
