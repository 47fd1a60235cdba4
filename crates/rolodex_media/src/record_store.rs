//! Ingestion and CRUD for media artifacts.

use crate::mime::{OCTET_STREAM, extension_for, extension_of, resolve_mime};
use crate::{IngestConfig, MediaFetcher, PlaceholderDetector};
use chrono::Utc;
use rolodex_core::{
    DeletedPhotosetMarker, MediaArtifact, MediaMetadataUpdate, MediaSource, NewMediaArtifact,
    StorageLocation, SubjectId,
};
use rolodex_error::{DatabaseError, RolodexResult, ValidationError};
use rolodex_interface::MediaLedger;
use rolodex_storage::{StorageProviders, compute_sha256};
use std::sync::Arc;
use uuid::Uuid;

/// Orchestrates ingestion (fetch or upload, placeholder filtering, physical
/// write, ledger insert) and the read, update and delete operations on
/// artifacts.
#[derive(Clone)]
pub struct MediaRecordStore {
    ledger: Arc<dyn MediaLedger>,
    providers: StorageProviders,
    fetcher: Arc<dyn MediaFetcher>,
    placeholders: Arc<dyn PlaceholderDetector>,
    config: IngestConfig,
}

impl std::fmt::Debug for MediaRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaRecordStore")
            .field("providers", &self.providers)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Storage key for a new artifact: `{subject}/{subject}_{millis}_{tag}.{ext}`.
fn artifact_key(subject_id: SubjectId, tag: &str, extension: &str) -> String {
    format!(
        "{subject}/{subject}_{millis}_{tag}.{ext}",
        subject = subject_id,
        millis = Utc::now().timestamp_millis(),
        tag = tag,
        ext = extension
    )
}

/// First eight hex digits of the SHA-256 of `value`.
fn hash8(value: &[u8]) -> String {
    let mut digest = compute_sha256(value);
    digest.truncate(8);
    digest
}

impl MediaRecordStore {
    /// Create a record store.
    pub fn new(
        ledger: Arc<dyn MediaLedger>,
        providers: StorageProviders,
        fetcher: Arc<dyn MediaFetcher>,
        placeholders: Arc<dyn PlaceholderDetector>,
        config: IngestConfig,
    ) -> Self {
        Self {
            ledger,
            providers,
            fetcher,
            placeholders,
            config,
        }
    }

    /// The ledger this store writes to.
    pub fn ledger(&self) -> &Arc<dyn MediaLedger> {
        &self.ledger
    }

    /// The configured storage providers.
    pub fn providers(&self) -> &StorageProviders {
        &self.providers
    }

    /// Download `url` and store it for `subject_id`.
    ///
    /// Returns `Ok(None)` when there is nothing to do: the URL or payload is a
    /// known placeholder, the URL was already ingested for this subject, the
    /// same bytes are already stored for this subject, or the download failed.
    /// Failures after a successful download are errors.
    #[tracing::instrument(skip(self, source, mime_type), fields(source = %source))]
    pub async fn ingest_from_url(
        &self,
        url: &str,
        subject_id: SubjectId,
        source: MediaSource,
        mime_type: Option<&str>,
    ) -> RolodexResult<Option<MediaArtifact>> {
        if self.placeholders.is_placeholder_url(url) {
            tracing::info!("Skipping placeholder URL");
            return Ok(None);
        }

        if let Some(existing) = self.ledger.find_live_by_source_url(subject_id, url).await? {
            tracing::info!(artifact_id = %existing.id, "URL already ingested for subject");
            return Ok(None);
        }

        let fetched =
            match tokio::time::timeout(self.config.fetch_timeout(), self.fetcher.fetch(url)).await
            {
                Ok(Ok(fetched)) => fetched,
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Fetch failed");
                    return Ok(None);
                }
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = self.config.fetch_timeout().as_secs(),
                        "Fetch timed out"
                    );
                    return Ok(None);
                }
            };

        if fetched.bytes.is_empty() {
            tracing::warn!("Fetched empty payload");
            return Ok(None);
        }

        if self.placeholders.is_placeholder_bytes(&fetched.bytes) {
            tracing::info!(len = fetched.bytes.len(), "Skipping placeholder payload");
            return Ok(None);
        }

        let sha256 = compute_sha256(&fetched.bytes);
        if let Some(existing) = self
            .ledger
            .find_live_by_sha256(&sha256, Some(subject_id))
            .await?
        {
            tracing::info!(artifact_id = %existing.id, "Content already stored for subject");
            return Ok(None);
        }

        let mime = resolve_mime(
            mime_type,
            &fetched.bytes,
            fetched.content_type.as_deref(),
            Some(url),
        );
        let extension = if mime == OCTET_STREAM {
            extension_of(url).unwrap_or_else(|| extension_for(&mime))
        } else {
            extension_for(&mime)
        };
        let key = artifact_key(subject_id, &hash8(url.as_bytes()), &extension);

        let mut new = NewMediaArtifact::new(
            subject_id,
            self.providers.default_kind(),
            key,
            source,
            mime,
            fetched.bytes.len() as i64,
        );
        new.source_url = Some(url.to_string());
        new.sha256 = Some(sha256);

        let artifact = self.store(new, &fetched.bytes).await?;
        tracing::info!(
            artifact_id = %artifact.id,
            key = %artifact.relative_path,
            "Ingested media from URL"
        );
        Ok(Some(artifact))
    }

    /// Store an explicit upload. Uploads are trusted: no placeholder or
    /// duplicate checks run.
    ///
    /// # Errors
    ///
    /// Empty payloads are a validation error.
    #[tracing::instrument(
        skip(self, data, mime_type, source),
        fields(len = data.len(), source = %source)
    )]
    pub async fn ingest_upload(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
        subject_id: SubjectId,
        source: MediaSource,
    ) -> RolodexResult<MediaArtifact> {
        if data.is_empty() {
            return Err(ValidationError::new("file", "upload is empty").into());
        }

        let sha256 = compute_sha256(data);
        let mime = resolve_mime(Some(mime_type), data, None, Some(filename));
        let extension = extension_of(filename).unwrap_or_else(|| extension_for(&mime));
        let key = artifact_key(subject_id, &sha256[..8], &extension);

        let mut new = NewMediaArtifact::new(
            subject_id,
            self.providers.default_kind(),
            key,
            source,
            mime,
            data.len() as i64,
        );
        if !filename.is_empty() {
            new.original_filename = Some(filename.to_string());
        }
        new.sha256 = Some(sha256);

        let artifact = self.store(new, data).await?;
        tracing::info!(artifact_id = %artifact.id, key = %artifact.relative_path, "Stored upload");
        Ok(artifact)
    }

    /// Write bytes to the default provider, then insert the ledger row.
    ///
    /// If the insert fails, the freshly written object is removed unless some
    /// ledger row already points at it.
    async fn store(&self, new: NewMediaArtifact, data: &[u8]) -> RolodexResult<MediaArtifact> {
        let provider = self.providers.get(new.storage_provider)?;
        provider
            .write(&new.relative_path, data, &new.mime_type)
            .await?;

        let location = StorageLocation::new(new.storage_provider, new.relative_path.clone());
        match self.ledger.insert(new).await {
            Ok(artifact) => Ok(artifact),
            Err(e) => {
                if let Ok(0) = self.ledger.count_at_location(&location).await
                    && let Err(cleanup) = provider.delete(&location.relative_path).await
                {
                    tracing::warn!(
                        key = %location,
                        error = %cleanup,
                        "Failed to remove unrecorded object"
                    );
                }
                Err(e)
            }
        }
    }

    /// Fetch an artifact, live or soft-deleted.
    pub async fn get(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>> {
        self.ledger.get(id).await
    }

    /// Live artifacts of a subject, newest upload first.
    pub async fn list_for_subject(
        &self,
        subject_id: SubjectId,
    ) -> RolodexResult<Vec<MediaArtifact>> {
        self.ledger.list_live_for_subject(subject_id).await
    }

    /// The subject's primary artifact, falling back to the most recent one
    /// (capture time, else upload time).
    pub async fn get_primary(
        &self,
        subject_id: SubjectId,
    ) -> RolodexResult<Option<MediaArtifact>> {
        let live = self.ledger.list_live_for_subject(subject_id).await?;
        if let Some(primary) = live.iter().find(|a| a.is_primary) {
            return Ok(Some(primary.clone()));
        }
        Ok(live
            .into_iter()
            .max_by(|a, b| a.recency().cmp(&b.recency()).then(b.id.cmp(&a.id))))
    }

    /// Make an artifact its subject's only primary.
    ///
    /// Returns `None` if the artifact does not exist or is soft-deleted.
    #[tracing::instrument(skip(self))]
    pub async fn set_primary(&self, id: Uuid) -> RolodexResult<Option<MediaArtifact>> {
        self.ledger.set_primary(id).await
    }

    /// Apply user-editable metadata.
    pub async fn update_metadata(
        &self,
        id: Uuid,
        update: &MediaMetadataUpdate,
    ) -> RolodexResult<MediaArtifact> {
        self.ledger.update_metadata(id, update).await
    }

    /// Star or unstar an artifact.
    pub async fn set_favorite(&self, id: Uuid, favorite: bool) -> RolodexResult<MediaArtifact> {
        self.ledger.set_favorite(id, favorite).await
    }

    /// Hide an artifact. Bytes and row stay; the primary flag is cleared.
    ///
    /// Returns `false` for unknown or already soft-deleted artifacts.
    #[tracing::instrument(skip(self))]
    pub async fn soft_delete(&self, id: Uuid) -> RolodexResult<bool> {
        self.ledger.soft_delete(id).await
    }

    /// Remove the ledger row, then the bytes if no other row points at them.
    ///
    /// Byte deletion is best effort: failures are logged. Returns `false` for
    /// unknown artifacts.
    #[tracing::instrument(skip(self))]
    pub async fn hard_delete(&self, id: Uuid) -> RolodexResult<bool> {
        let Some(artifact) = self.ledger.hard_delete(id).await? else {
            return Ok(false);
        };

        let location = artifact.location();
        let remaining = self.ledger.count_at_location(&location).await?;
        if remaining > 0 {
            tracing::info!(key = %location, remaining, "Bytes still referenced, keeping object");
            return Ok(true);
        }

        match self.providers.get(location.provider) {
            Ok(provider) => match provider.delete(&location.relative_path).await {
                Ok(()) => tracing::debug!(key = %location, "Deleted object"),
                Err(e) if e.is_not_found() => {
                    tracing::debug!(key = %location, "Object already gone");
                }
                Err(e) => tracing::warn!(key = %location, error = %e, "Failed to delete object"),
            },
            Err(e) => tracing::warn!(key = %location, error = %e, "No provider for object"),
        }
        Ok(true)
    }

    /// Oldest live artifact with this content hash.
    pub async fn find_by_sha256(&self, sha256: &str) -> RolodexResult<Option<MediaArtifact>> {
        self.ledger.find_live_by_sha256(sha256, None).await
    }

    /// Read an artifact's bytes from its provider.
    pub async fn read_bytes(&self, id: Uuid) -> RolodexResult<Vec<u8>> {
        let artifact = self
            .ledger
            .get(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found(format!("artifact {}", id)))?;
        self.providers
            .get(artifact.storage_provider)?
            .read(&artifact.relative_path)
            .await
    }

    /// Whether the user deleted this photoset; batch downloaders check this
    /// before re-importing.
    pub async fn is_photoset_deleted(
        &self,
        subject_id: SubjectId,
        photoset_id: &str,
    ) -> RolodexResult<bool> {
        self.ledger.is_photoset_deleted(subject_id, photoset_id).await
    }

    /// Every photoset the user deleted for a subject.
    pub async fn deleted_photosets(
        &self,
        subject_id: SubjectId,
    ) -> RolodexResult<Vec<DeletedPhotosetMarker>> {
        self.ledger.deleted_photosets(subject_id).await
    }
}
