//! The media ledger: table of record for every artifact.

use async_trait::async_trait;
use rolodex_core::{
    DeletedPhotosetMarker, MediaArtifact, MediaMetadataUpdate, NewMediaArtifact, ProviderKind,
    ReconcileOutcome, StorageLocation, SubjectId,
};
use rolodex_error::RolodexResult;
use uuid::Uuid;

/// Persistence contract for media artifacts.
///
/// Implementations own the invariants that need a transaction: unique live
/// locations, a single primary per subject, immutable hashes, and the
/// all-or-nothing duplicate reconcile.
#[async_trait]
pub trait MediaLedger: Send + Sync {
    // Writes

    /// Insert a new artifact.
    ///
    /// Fails with `DatabaseErrorKind::Conflict` if a live artifact already
    /// occupies the same location.
    async fn insert(&self, new: NewMediaArtifact) -> RolodexResult<MediaArtifact>;

    /// Apply user-editable metadata. Unknown ids are `NotFound`.
    async fn update_metadata(
        &self,
        id: Uuid,
        update: &MediaMetadataUpdate,
    ) -> RolodexResult<MediaArtifact>;

    /// Set or clear the favorite flag. Unknown ids are `NotFound`.
    async fn set_favorite(&self, id: Uuid, favorite: bool) -> RolodexResult<MediaArtifact>;

    /// Clear every other live primary of the artifact's subject and mark this one,
    /// in one transaction.
    ///
    /// Returns `None` if the artifact does not exist or is soft-deleted.
    async fn set_primary(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>>;

    /// Record a photoset marker (if any), clear the primary flag and set `deleted_at`.
    ///
    /// Returns `false` if the artifact is unknown or already soft-deleted.
    async fn soft_delete(&self, id: Uuid) -> RolodexResult<bool>;

    /// Record a photoset marker (if any) and remove the row.
    ///
    /// Returns the removed row, or `None` if it did not exist.
    async fn hard_delete(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>>;

    /// Fill in a missing content hash. A different hash on an already-hashed
    /// artifact is a `Conflict`; the same hash is a no-op.
    async fn record_sha256(&self, id: Uuid, sha256: &str) -> RolodexResult<()>;

    /// Move an artifact to a new location, provided it still lives at `from`.
    ///
    /// Fails with `Conflict` if the row moved since it was read or if a live
    /// artifact already occupies `to`.
    async fn relocate(
        &self,
        id: Uuid,
        from: &StorageLocation,
        to: &StorageLocation,
    ) -> RolodexResult<MediaArtifact>;

    /// Repoint every foreign-key reference from `duplicate_id` to `keep_id` and
    /// soft-delete the duplicate, in one transaction.
    ///
    /// If the duplicate was primary and the survivor has the same subject, the
    /// primary flag moves to the survivor in the same transaction.
    async fn reconcile_duplicate(
        &self,
        duplicate_id: Uuid,
        keep_id: Uuid,
    ) -> RolodexResult<ReconcileOutcome>;

    // Reads

    /// Fetch an artifact, live or soft-deleted.
    async fn get(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>>;

    /// Live artifacts of a subject, newest upload first.
    async fn list_live_for_subject(&self, subject_id: SubjectId)
    -> RolodexResult<Vec<MediaArtifact>>;

    /// Live artifact of a subject that was downloaded from `url`.
    async fn find_live_by_source_url(
        &self,
        subject_id: SubjectId,
        url: &str,
    ) -> RolodexResult<Option<MediaArtifact>>;

    /// Oldest live artifact with this hash, optionally restricted to one subject.
    async fn find_live_by_sha256(
        &self,
        sha256: &str,
        subject_id: Option<SubjectId>,
    ) -> RolodexResult<Option<MediaArtifact>>;

    /// Live artifact at an exact location.
    async fn find_live_by_location(
        &self,
        location: &StorageLocation,
    ) -> RolodexResult<Option<MediaArtifact>>;

    /// Number of rows, live or not, pointing at a location.
    async fn count_at_location(&self, location: &StorageLocation) -> RolodexResult<u64>;

    /// Relative paths of every live artifact on a provider.
    async fn live_paths(&self, provider: ProviderKind) -> RolodexResult<Vec<String>>;

    /// Relative paths of every row on a provider, soft-deleted ones included.
    async fn recorded_paths(&self, provider: ProviderKind) -> RolodexResult<Vec<String>>;

    /// Page of live artifacts on a provider, ordered by id, strictly after `after`.
    async fn list_live_by_provider(
        &self,
        provider: ProviderKind,
        after: Option<Uuid>,
        limit: usize,
    ) -> RolodexResult<Vec<MediaArtifact>>;

    /// Live artifacts grouped by hash, groups with more than one member only.
    ///
    /// Groups and members are in first-seen order (`created_at`, then `id`).
    async fn live_hash_groups(&self) -> RolodexResult<Vec<(String, Vec<Uuid>)>>;

    /// Number of foreign-key references dependent tables hold to an artifact.
    async fn count_references(&self, id: Uuid) -> RolodexResult<u64>;

    /// Whether the user deleted this photoset.
    async fn is_photoset_deleted(
        &self,
        subject_id: SubjectId,
        photoset_id: &str,
    ) -> RolodexResult<bool>;

    /// Every photoset marker for a subject.
    async fn deleted_photosets(
        &self,
        subject_id: SubjectId,
    ) -> RolodexResult<Vec<DeletedPhotosetMarker>>;
}
