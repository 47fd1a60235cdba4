//! In-process ledger.
//!
//! Every operation runs under one mutex, so each call is a serializable
//! transaction: multi-step writes validate everything before mutating.

use async_trait::async_trait;
use chrono::Utc;
use rolodex_core::{
    DeletedPhotosetMarker, MediaArtifact, MediaMetadataUpdate, NewMediaArtifact, ProviderKind,
    ReconcileOutcome, StorageLocation, SubjectId,
};
use rolodex_error::{DatabaseError, RolodexResult, ValidationError};
use rolodex_interface::{MediaLedger, SubjectDirectory};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

/// A row in a dependent table pointing at an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceLink {
    /// Dependent table
    pub table: String,
    /// Row id within the dependent table
    pub row_id: i64,
    /// Referenced artifact
    pub media_id: Uuid,
}

#[derive(Debug, Default)]
struct LedgerState {
    artifacts: HashMap<Uuid, (u64, MediaArtifact)>,
    markers: BTreeMap<(SubjectId, String), DeletedPhotosetMarker>,
    references: Vec<ReferenceLink>,
    next_sequence: u64,
}

impl LedgerState {
    fn live(&self) -> impl Iterator<Item = &MediaArtifact> {
        self.artifacts.values().map(|(_, a)| a).filter(|a| a.is_live())
    }

    /// Live artifacts in first-seen order.
    fn live_first_seen(&self) -> Vec<&MediaArtifact> {
        let mut rows: Vec<_> = self
            .artifacts
            .values()
            .filter(|(_, a)| a.is_live())
            .collect();
        rows.sort_by(|(sa, a), (sb, b)| a.created_at.cmp(&b.created_at).then(sa.cmp(sb)));
        rows.into_iter().map(|(_, a)| a).collect()
    }

    fn live_at(&self, location: &StorageLocation) -> Option<&MediaArtifact> {
        self.live().find(|a| {
            a.storage_provider == location.provider && a.relative_path == location.relative_path
        })
    }

    fn artifact(&self, id: Uuid) -> Option<&MediaArtifact> {
        self.artifacts.get(&id).map(|(_, a)| a)
    }

    fn artifact_mut(&mut self, id: Uuid) -> Option<&mut MediaArtifact> {
        self.artifacts.get_mut(&id).map(|(_, a)| a)
    }

    fn record_marker(&mut self, artifact: &MediaArtifact) {
        if let Some(photoset_id) = &artifact.photoset_id {
            self.markers
                .entry((artifact.subject_id, photoset_id.clone()))
                .or_insert_with(|| DeletedPhotosetMarker {
                    subject_id: artifact.subject_id,
                    photoset_id: photoset_id.clone(),
                    deleted_at: Utc::now(),
                });
        }
    }
}

/// Mutex-guarded in-memory implementation of [`MediaLedger`].
///
/// Also models dependent tables as a list of [`ReferenceLink`]s so the
/// deduplication engine's reference counting can be exercised.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<LedgerState>,
}

impl MemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependent-table row pointing at `media_id`.
    pub async fn link_reference(&self, table: impl Into<String>, row_id: i64, media_id: Uuid) {
        self.state.lock().await.references.push(ReferenceLink {
            table: table.into(),
            row_id,
            media_id,
        });
    }

    /// Dependent-table rows currently pointing at `media_id`.
    pub async fn references_to(&self, media_id: Uuid) -> Vec<ReferenceLink> {
        self.state
            .lock()
            .await
            .references
            .iter()
            .filter(|r| r.media_id == media_id)
            .cloned()
            .collect()
    }

    /// Number of rows, live or soft-deleted.
    pub async fn len(&self) -> usize {
        self.state.lock().await.artifacts.len()
    }

    /// Whether the ledger holds no rows at all.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MediaLedger for MemoryLedger {
    async fn insert(&self, new: NewMediaArtifact) -> RolodexResult<MediaArtifact> {
        let mut state = self.state.lock().await;

        let location = StorageLocation::new(new.storage_provider, new.relative_path.clone());
        if let Some(existing) = state.live_at(&location) {
            return Err(DatabaseError::conflict(format!(
                "{} already tracked by artifact {}",
                location, existing.id
            ))
            .into());
        }

        let artifact = MediaArtifact::from_new(Uuid::new_v4(), new, Utc::now());
        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state
            .artifacts
            .insert(artifact.id, (sequence, artifact.clone()));

        tracing::debug!(artifact_id = %artifact.id, %location, "Inserted ledger row");
        Ok(artifact)
    }

    async fn update_metadata(
        &self,
        id: Uuid,
        update: &MediaMetadataUpdate,
    ) -> RolodexResult<MediaArtifact> {
        let mut state = self.state.lock().await;
        let artifact = state
            .artifact_mut(id)
            .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))?;
        update.apply_to(artifact);
        Ok(artifact.clone())
    }

    async fn set_favorite(&self, id: Uuid, favorite: bool) -> RolodexResult<MediaArtifact> {
        let mut state = self.state.lock().await;
        let artifact = state
            .artifact_mut(id)
            .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))?;
        artifact.is_favorite = favorite;
        Ok(artifact.clone())
    }

    async fn set_primary(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>> {
        let mut state = self.state.lock().await;

        let subject_id = match state.artifact(id) {
            Some(a) if a.is_live() => a.subject_id,
            _ => return Ok(None),
        };

        for (_, artifact) in state.artifacts.values_mut() {
            if artifact.subject_id == subject_id && artifact.is_live() {
                artifact.is_primary = artifact.id == id;
            }
        }

        Ok(state.artifact(id).cloned())
    }

    async fn soft_delete(&self, id: Uuid) -> RolodexResult<bool> {
        let mut state = self.state.lock().await;

        let artifact = match state.artifact(id) {
            Some(a) if a.is_live() => a.clone(),
            _ => return Ok(false),
        };

        state.record_marker(&artifact);
        if let Some(row) = state.artifact_mut(id) {
            row.deleted_at = Some(Utc::now());
            row.is_primary = false;
        }
        Ok(true)
    }

    async fn hard_delete(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>> {
        let mut state = self.state.lock().await;

        let Some(artifact) = state.artifact(id).cloned() else {
            return Ok(None);
        };

        state.record_marker(&artifact);
        state.artifacts.remove(&id);
        Ok(Some(artifact))
    }

    async fn record_sha256(&self, id: Uuid, sha256: &str) -> RolodexResult<()> {
        let mut state = self.state.lock().await;
        let artifact = state
            .artifact_mut(id)
            .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))?;

        match &artifact.sha256 {
            None => {
                artifact.sha256 = Some(sha256.to_string());
                Ok(())
            }
            Some(existing) if existing == sha256 => Ok(()),
            Some(existing) => Err(DatabaseError::conflict(format!(
                "artifact {} already hashed as {}",
                id, existing
            ))
            .into()),
        }
    }

    async fn relocate(
        &self,
        id: Uuid,
        from: &StorageLocation,
        to: &StorageLocation,
    ) -> RolodexResult<MediaArtifact> {
        let mut state = self.state.lock().await;

        let current = state
            .artifact(id)
            .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))?
            .location();
        if &current != from {
            return Err(DatabaseError::conflict(format!(
                "artifact {} is at {}, expected {}",
                id, current, from
            ))
            .into());
        }
        if let Some(occupant) = state.live_at(to)
            && occupant.id != id
        {
            return Err(DatabaseError::conflict(format!(
                "{} already tracked by artifact {}",
                to, occupant.id
            ))
            .into());
        }

        let artifact = state
            .artifact_mut(id)
            .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))?;
        artifact.storage_provider = to.provider;
        artifact.relative_path = to.relative_path.clone();
        Ok(artifact.clone())
    }

    async fn reconcile_duplicate(
        &self,
        duplicate_id: Uuid,
        keep_id: Uuid,
    ) -> RolodexResult<ReconcileOutcome> {
        if duplicate_id == keep_id {
            return Err(ValidationError::new(
                "duplicate_id",
                "an artifact cannot be reconciled into itself",
            )
            .into());
        }

        let mut state = self.state.lock().await;

        // Validate everything before mutating anything
        let duplicate = match state.artifact(duplicate_id) {
            Some(a) if a.is_live() => a.clone(),
            _ => {
                return Err(
                    DatabaseError::not_found(format!("live artifact {}", duplicate_id)).into(),
                );
            }
        };
        let keep = match state.artifact(keep_id) {
            Some(a) if a.is_live() => a.clone(),
            _ => return Err(DatabaseError::not_found(format!("live artifact {}", keep_id)).into()),
        };

        let mut references_moved = 0;
        for link in state.references.iter_mut() {
            if link.media_id == duplicate_id {
                link.media_id = keep_id;
                references_moved += 1;
            }
        }

        let primary_transferred = duplicate.is_primary && duplicate.subject_id == keep.subject_id;
        if primary_transferred && let Some(survivor) = state.artifact_mut(keep_id) {
            survivor.is_primary = true;
        }

        state.record_marker(&duplicate);
        if let Some(row) = state.artifact_mut(duplicate_id) {
            row.deleted_at = Some(Utc::now());
            row.is_primary = false;
        }

        Ok(ReconcileOutcome {
            duplicate_id,
            keep_id,
            references_moved,
            primary_transferred,
        })
    }

    async fn get(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>> {
        Ok(self.state.lock().await.artifact(id).cloned())
    }

    async fn list_live_for_subject(
        &self,
        subject_id: SubjectId,
    ) -> RolodexResult<Vec<MediaArtifact>> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .live()
            .filter(|a| a.subject_id == subject_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_live_by_source_url(
        &self,
        subject_id: SubjectId,
        url: &str,
    ) -> RolodexResult<Option<MediaArtifact>> {
        let state = self.state.lock().await;
        Ok(state
            .live_first_seen()
            .into_iter()
            .find(|a| a.subject_id == subject_id && a.source_url.as_deref() == Some(url))
            .cloned())
    }

    async fn find_live_by_sha256(
        &self,
        sha256: &str,
        subject_id: Option<SubjectId>,
    ) -> RolodexResult<Option<MediaArtifact>> {
        let state = self.state.lock().await;
        Ok(state
            .live_first_seen()
            .into_iter()
            .filter(|a| subject_id.is_none_or(|s| a.subject_id == s))
            .find(|a| a.sha256.as_deref() == Some(sha256))
            .cloned())
    }

    async fn find_live_by_location(
        &self,
        location: &StorageLocation,
    ) -> RolodexResult<Option<MediaArtifact>> {
        Ok(self.state.lock().await.live_at(location).cloned())
    }

    async fn count_at_location(&self, location: &StorageLocation) -> RolodexResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .artifacts
            .values()
            .filter(|(_, a)| {
                a.storage_provider == location.provider
                    && a.relative_path == location.relative_path
            })
            .count() as u64)
    }

    async fn live_paths(&self, provider: ProviderKind) -> RolodexResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .live()
            .filter(|a| a.storage_provider == provider)
            .map(|a| a.relative_path.clone())
            .collect())
    }

    async fn recorded_paths(&self, provider: ProviderKind) -> RolodexResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state
            .artifacts
            .values()
            .filter(|(_, a)| a.storage_provider == provider)
            .map(|(_, a)| a.relative_path.clone())
            .collect())
    }

    async fn list_live_by_provider(
        &self,
        provider: ProviderKind,
        after: Option<Uuid>,
        limit: usize,
    ) -> RolodexResult<Vec<MediaArtifact>> {
        let state = self.state.lock().await;
        let mut rows: Vec<_> = state
            .live()
            .filter(|a| a.storage_provider == provider)
            .filter(|a| after.is_none_or(|after| a.id > after))
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.id);
        rows.truncate(limit);
        Ok(rows)
    }

    async fn live_hash_groups(&self) -> RolodexResult<Vec<(String, Vec<Uuid>)>> {
        let state = self.state.lock().await;

        let mut groups: Vec<(String, Vec<Uuid>)> = Vec::new();
        for artifact in state.live_first_seen() {
            let Some(sha256) = &artifact.sha256 else {
                continue;
            };
            match groups.iter_mut().find(|(hash, _)| hash == sha256) {
                Some((_, ids)) => ids.push(artifact.id),
                None => groups.push((sha256.clone(), vec![artifact.id])),
            }
        }
        groups.retain(|(_, ids)| ids.len() > 1);
        Ok(groups)
    }

    async fn count_references(&self, id: Uuid) -> RolodexResult<u64> {
        let state = self.state.lock().await;
        Ok(state.references.iter().filter(|r| r.media_id == id).count() as u64)
    }

    async fn is_photoset_deleted(
        &self,
        subject_id: SubjectId,
        photoset_id: &str,
    ) -> RolodexResult<bool> {
        let state = self.state.lock().await;
        Ok(state
            .markers
            .contains_key(&(subject_id, photoset_id.to_string())))
    }

    async fn deleted_photosets(
        &self,
        subject_id: SubjectId,
    ) -> RolodexResult<Vec<DeletedPhotosetMarker>> {
        let state = self.state.lock().await;
        Ok(state
            .markers
            .values()
            .filter(|m| m.subject_id == subject_id)
            .cloned()
            .collect())
    }
}

/// In-memory subject table: id → handle.
#[derive(Debug, Default)]
pub struct MemorySubjectDirectory {
    subjects: Mutex<BTreeMap<SubjectId, String>>,
}

impl MemorySubjectDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory from `(id, handle)` pairs.
    pub fn with_subjects<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = (SubjectId, S)>,
        S: Into<String>,
    {
        Self {
            subjects: Mutex::new(
                subjects
                    .into_iter()
                    .map(|(id, handle)| (id, handle.into()))
                    .collect(),
            ),
        }
    }

    /// Add or rename a subject.
    pub async fn add(&self, id: SubjectId, handle: impl Into<String>) {
        self.subjects.lock().await.insert(id, handle.into());
    }
}

#[async_trait]
impl SubjectDirectory for MemorySubjectDirectory {
    async fn find_by_handle(&self, handle: &str) -> RolodexResult<Option<SubjectId>> {
        let subjects = self.subjects.lock().await;
        Ok(subjects
            .iter()
            .find(|(_, h)| h.eq_ignore_ascii_case(handle))
            .map(|(id, _)| *id))
    }

    async fn exists(&self, id: SubjectId) -> RolodexResult<bool> {
        Ok(self.subjects.lock().await.contains_key(&id))
    }
}
