//! The ledger row describing one stored file.

use crate::{MediaSource, MediaType, ProviderKind, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical record of one stored image or video.
///
/// `(storage_provider, relative_path)` resolves to exactly one physical byte
/// stream; no two live artifacts share that pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaArtifact {
    /// Unique identifier
    pub id: Uuid,
    /// Person this artifact belongs to
    pub subject_id: SubjectId,
    /// Backend holding the bytes
    pub storage_provider: ProviderKind,
    /// Provider-scoped key
    pub relative_path: String,
    /// Provenance
    pub source: MediaSource,
    /// URL the bytes were downloaded from, if any
    pub source_url: Option<String>,
    /// Filename supplied by the uploader, if any
    pub original_filename: Option<String>,
    /// MIME type (e.g., "image/jpeg")
    pub mime_type: String,
    /// Image or video
    pub media_type: MediaType,
    /// Size of the stored bytes
    pub file_size_bytes: i64,
    /// Image width in pixels
    pub width: Option<i32>,
    /// Image height in pixels
    pub height: Option<i32>,
    /// Video duration
    pub duration_seconds: Option<f64>,
    /// SHA-256 of the content (lowercase hex); immutable once set
    pub sha256: Option<String>,
    /// When the depicted moment happened
    pub captured_at: Option<DateTime<Utc>>,
    /// When the artifact was ingested
    pub uploaded_at: DateTime<Utc>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Designated representative image for the subject
    pub is_primary: bool,
    /// Starred by the user
    pub is_favorite: bool,
    /// Soft-delete marker; `None` means live
    pub deleted_at: Option<DateTime<Utc>>,
    /// Batch the artifact was downloaded with
    pub photoset_id: Option<String>,
    /// User-supplied title
    pub title: Option<String>,
    /// User-supplied description
    pub description: Option<String>,
}

impl MediaArtifact {
    /// Build a ledger row from insert values.
    pub fn from_new(id: Uuid, new: NewMediaArtifact, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            subject_id: new.subject_id,
            storage_provider: new.storage_provider,
            relative_path: new.relative_path,
            source: new.source,
            source_url: new.source_url,
            original_filename: new.original_filename,
            media_type: MediaType::from_mime(&new.mime_type),
            mime_type: new.mime_type,
            file_size_bytes: new.file_size_bytes,
            width: new.width,
            height: new.height,
            duration_seconds: new.duration_seconds,
            sha256: new.sha256,
            captured_at: new.captured_at,
            uploaded_at: new.uploaded_at.unwrap_or(created_at),
            created_at,
            is_primary: false,
            is_favorite: false,
            deleted_at: None,
            photoset_id: new.photoset_id,
            title: new.title,
            description: None,
        }
    }

    /// Whether the artifact has not been soft-deleted.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Last path segment of `relative_path`.
    pub fn basename(&self) -> &str {
        self.relative_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.relative_path)
    }

    /// Timestamp used to pick a fallback primary: capture time, else upload time.
    pub fn recency(&self) -> DateTime<Utc> {
        self.captured_at.unwrap_or(self.uploaded_at)
    }

    /// Where the bytes live.
    pub fn location(&self) -> StorageLocation {
        StorageLocation::new(self.storage_provider, self.relative_path.clone())
    }
}

/// A provider plus a provider-scoped key.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("{}:{}", provider, relative_path)]
pub struct StorageLocation {
    /// Backend
    pub provider: ProviderKind,
    /// Key within the backend
    pub relative_path: String,
}

impl StorageLocation {
    /// Create a location.
    pub fn new(provider: ProviderKind, relative_path: impl Into<String>) -> Self {
        Self {
            provider,
            relative_path: relative_path.into(),
        }
    }
}

/// Values for inserting a new ledger row. The ledger assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMediaArtifact {
    /// Owner
    pub subject_id: SubjectId,
    /// Backend holding the bytes
    pub storage_provider: ProviderKind,
    /// Provider-scoped key
    pub relative_path: String,
    /// Provenance
    pub source: MediaSource,
    /// Origin URL
    pub source_url: Option<String>,
    /// Uploader's filename
    pub original_filename: Option<String>,
    /// MIME type; also determines `media_type`
    pub mime_type: String,
    /// Size in bytes
    pub file_size_bytes: i64,
    /// Image width
    pub width: Option<i32>,
    /// Image height
    pub height: Option<i32>,
    /// Video duration
    pub duration_seconds: Option<f64>,
    /// Content hash if known
    pub sha256: Option<String>,
    /// Capture time if known
    pub captured_at: Option<DateTime<Utc>>,
    /// Ingestion time; defaults to the insert time
    pub uploaded_at: Option<DateTime<Utc>>,
    /// Download batch
    pub photoset_id: Option<String>,
    /// Title
    pub title: Option<String>,
}

impl NewMediaArtifact {
    /// Minimal insert values; optional columns start empty.
    pub fn new(
        subject_id: SubjectId,
        storage_provider: ProviderKind,
        relative_path: impl Into<String>,
        source: MediaSource,
        mime_type: impl Into<String>,
        file_size_bytes: i64,
    ) -> Self {
        Self {
            subject_id,
            storage_provider,
            relative_path: relative_path.into(),
            source,
            source_url: None,
            original_filename: None,
            mime_type: mime_type.into(),
            file_size_bytes,
            width: None,
            height: None,
            duration_seconds: None,
            sha256: None,
            captured_at: None,
            uploaded_at: None,
            photoset_id: None,
            title: None,
        }
    }
}

/// User-editable metadata. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadataUpdate {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// Corrected capture time
    pub captured_at: Option<DateTime<Utc>>,
    /// Photoset assignment
    pub photoset_id: Option<String>,
}

impl MediaMetadataUpdate {
    /// Apply the update to an artifact in place.
    pub fn apply_to(&self, artifact: &mut MediaArtifact) {
        if let Some(title) = &self.title {
            artifact.title = Some(title.clone());
        }
        if let Some(description) = &self.description {
            artifact.description = Some(description.clone());
        }
        if let Some(captured_at) = self.captured_at {
            artifact.captured_at = Some(captured_at);
        }
        if let Some(photoset_id) = &self.photoset_id {
            artifact.photoset_id = Some(photoset_id.clone());
        }
    }
}
